use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name every displacement is copied to inside its output directory.
pub const POSCAR_COPY_NAME: &str = "POSCAR";
/// File name of the force report inside each output directory.
pub const REPORT_NAME: &str = "vasprun.xml";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to read directory '{path}': {source}", path = path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid displacement prefix '{prefix}': {source}")]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: globset::Error,
    },
}

/// One displacement to process: its ordinal and the paths derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displacement {
    /// 1-based ordinal.
    pub ordinal: usize,
    /// `<dir>/<prefix>.POSCAR.<ordinal padded>`.
    pub input_path: PathBuf,
    /// `<dir>/disp-<ordinal padded>`.
    pub output_dir: PathBuf,
}

impl Displacement {
    pub fn poscar_copy_path(&self) -> PathBuf {
        self.output_dir.join(POSCAR_COPY_NAME)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_NAME)
    }
}

/// The ordered displacements found for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplacementSet {
    pub prefix: String,
    /// Zero-padding width, the number of decimal digits of the total count.
    pub width: usize,
    pub displacements: Vec<Displacement>,
}

impl DisplacementSet {
    pub fn len(&self) -> usize {
        self.displacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displacements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Displacement> {
        self.displacements.iter()
    }
}

impl<'a> IntoIterator for &'a DisplacementSet {
    type Item = &'a Displacement;
    type IntoIter = std::slice::Iter<'a, Displacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub fn ordinal_width(count: usize) -> usize {
    count.to_string().len()
}

pub fn input_file_name(prefix: &str, ordinal: usize, width: usize) -> String {
    format!("{}.POSCAR.{:0width$}", prefix, ordinal, width = width)
}

pub fn output_dir_name(ordinal: usize, width: usize) -> String {
    format!("disp-{:0width$}", ordinal, width = width)
}

fn displacement_matcher(prefix: &str) -> Result<GlobMatcher, DiscoveryError> {
    let pattern = format!("{}.POSCAR.*", globset::escape(prefix));
    Glob::new(&pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| DiscoveryError::InvalidPrefix {
            prefix: prefix.to_string(),
            source,
        })
}

/// Counts the displacement files for `prefix` in `dir` and lays out the run.
///
/// Only names whose suffix after `<prefix>.POSCAR.` is all digits are counted. The
/// returned paths are built from the count, so a gap in the numbering shows up as
/// a missing input when that ordinal is processed. No matches yields an empty set.
pub fn discover(dir: &Path, prefix: &str) -> Result<DisplacementSet, DiscoveryError> {
    let matcher = displacement_matcher(prefix)?;
    let stem = format!("{}.POSCAR.", prefix);

    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut matched = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !matcher.is_match(name) {
            continue;
        }
        let suffix = &name[stem.len()..];
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            debug!("Ignoring '{}': suffix is not an ordinal.", name);
            continue;
        }
        matched.push(name.to_string());
    }
    matched.sort();
    debug!("Matched displacement files: {:?}", matched);

    let count = matched.len();
    let width = ordinal_width(count);
    let displacements = (1..=count)
        .map(|ordinal| Displacement {
            ordinal,
            input_path: dir.join(input_file_name(prefix, ordinal, width)),
            output_dir: dir.join(output_dir_name(ordinal, width)),
        })
        .collect();

    Ok(DisplacementSet {
        prefix: prefix.to_string(),
        width,
        displacements,
    })
}
