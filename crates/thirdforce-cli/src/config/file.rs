use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEvaluatorConfig {
    pub kind: Option<String>,
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub lj_params: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub prefix: Option<String>,
    pub model: Option<String>,
    pub device: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub evaluator: Option<FileEvaluatorConfig>,
}

impl FileConfig {
    /// Reads a TOML config. Relative paths inside it are resolved against the
    /// directory containing the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        if let Some(base) = path.parent() {
            config.working_dir = config.working_dir.map(|p| resolve_against(base, p));
            if let Some(evaluator) = config.evaluator.as_mut() {
                evaluator.lj_params = evaluator.lj_params.take().map(|p| resolve_against(base, p));
            }
        }
        Ok(config)
    }
}

fn resolve_against(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_all_keys_and_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thirdforce.toml");
        fs::write(
            &path,
            r#"
prefix = "4TH"
model = "small.model"
device = "cuda"
working-dir = "runs"

[evaluator]
kind = "lennard-jones"
command = "python3"
args = ["wrapper.py", "{model}"]
lj-params = "lj.toml"
"#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.prefix.as_deref(), Some("4TH"));
        assert_eq!(config.device.as_deref(), Some("cuda"));
        assert_eq!(config.working_dir, Some(dir.path().join("runs")));
        let evaluator = config.evaluator.unwrap();
        assert_eq!(evaluator.kind.as_deref(), Some("lennard-jones"));
        assert_eq!(evaluator.args.unwrap(), vec!["wrapper.py", "{model}"]);
        assert_eq!(evaluator.lj_params, Some(dir.path().join("lj.toml")));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.toml");
        fs::write(&path, "working-dir = \"/srv/phonons\"\n").unwrap();
        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.working_dir, Some(PathBuf::from("/srv/phonons")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.toml");
        fs::write(&path, "threads = 4\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("absent.toml")),
            Err(CliError::Io(_))
        ));
    }
}
