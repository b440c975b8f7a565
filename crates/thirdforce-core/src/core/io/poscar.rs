use crate::core::io::traits::StructureFile;
use crate::core::models::element::{Element, UnknownElement};
use crate::core::models::structure::{Site, Structure};
use nalgebra::{Matrix3, Vector3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateMode {
    #[default]
    Direct,
    Cartesian,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoscarMetadata {
    /// Coordinate mode the file was written in.
    pub coordinate_mode: CoordinateMode,
    /// Per-site `T`/`F` flags when the file carries a `Selective dynamics` block.
    pub selective_dynamics: Option<Vec<[bool; 3]>>,
}

#[derive(Debug, Error)]
pub enum PoscarError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PoscarParseErrorKind,
    },
    #[error("No species line and the comment line does not name {expected} element(s)")]
    MissingSpecies { expected: usize },
    #[error("Unknown element on line {line}: {source}")]
    UnknownElement {
        line: usize,
        #[source]
        source: UnknownElement,
    },
    #[error("Lattice vectors are linearly dependent")]
    SingularLattice,
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum PoscarParseErrorKind {
    #[error("File ended while reading the {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("Invalid float '{value}'")]
    InvalidFloat { value: String },
    #[error("Invalid atom count '{value}'")]
    InvalidCount { value: String },
    #[error("Expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("Scale factor must be a single non-zero value or three positive values")]
    InvalidScale,
    #[error("{species} species name(s) but {counts} count(s)")]
    CountMismatch { species: usize, counts: usize },
    #[error("Invalid selective dynamics flag '{value}'")]
    InvalidFlag { value: String },
}

fn parse_error(line: usize, kind: PoscarParseErrorKind) -> PoscarError {
    PoscarError::Parse { line, kind }
}

fn parse_float(token: &str, line: usize) -> Result<f64, PoscarError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(parse_error(
            line,
            PoscarParseErrorKind::InvalidFloat {
                value: token.into(),
            },
        )),
    }
}

fn parse_vector(line_str: &str, line: usize) -> Result<Vector3<f64>, PoscarError> {
    let tokens: Vec<&str> = line_str.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(parse_error(
            line,
            PoscarParseErrorKind::TooFewFields {
                expected: 3,
                found: tokens.len(),
            },
        ));
    }
    Ok(Vector3::new(
        parse_float(tokens[0], line)?,
        parse_float(tokens[1], line)?,
        parse_float(tokens[2], line)?,
    ))
}

fn parse_flag(token: &str, line: usize) -> Result<bool, PoscarError> {
    match token.trim_start_matches('.').chars().next() {
        Some('T' | 't') => Ok(true),
        Some('F' | 'f') => Ok(false),
        _ => Err(parse_error(
            line,
            PoscarParseErrorKind::InvalidFlag {
                value: token.into(),
            },
        )),
    }
}

struct LineCursor {
    lines: Vec<String>,
    next: usize,
}

impl LineCursor {
    fn new(reader: &mut impl BufRead) -> io::Result<Self> {
        let lines = reader.lines().collect::<io::Result<Vec<_>>>()?;
        Ok(Self { lines, next: 0 })
    }

    /// Returns the 1-based line number and content of the next line.
    fn next_line(&mut self, expected: &'static str) -> Result<(usize, &str), PoscarError> {
        let index = self.next;
        let content = self
            .lines
            .get(index)
            .ok_or_else(|| parse_error(index + 1, PoscarParseErrorKind::UnexpectedEnd { expected }))?;
        self.next += 1;
        Ok((index + 1, content.as_str()))
    }
}

/// Scale factors per Cartesian axis, resolved against the raw lattice.
fn resolve_scale(
    scale_line: &str,
    line: usize,
    raw_lattice: &Matrix3<f64>,
) -> Result<Vector3<f64>, PoscarError> {
    let tokens: Vec<&str> = scale_line.split_whitespace().collect();
    match tokens.len() {
        0 => Err(parse_error(
            line,
            PoscarParseErrorKind::TooFewFields {
                expected: 1,
                found: 0,
            },
        )),
        1 | 2 => {
            let scale = parse_float(tokens[0], line)?;
            if scale > 0.0 {
                Ok(Vector3::repeat(scale))
            } else if scale < 0.0 {
                // Negative scale is the target cell volume.
                let raw_volume = raw_lattice.determinant().abs();
                if raw_volume == 0.0 {
                    return Err(PoscarError::SingularLattice);
                }
                Ok(Vector3::repeat((-scale / raw_volume).cbrt()))
            } else {
                Err(parse_error(line, PoscarParseErrorKind::InvalidScale))
            }
        }
        _ => {
            let factors = Vector3::new(
                parse_float(tokens[0], line)?,
                parse_float(tokens[1], line)?,
                parse_float(tokens[2], line)?,
            );
            if factors.iter().any(|&f| f <= 0.0) {
                return Err(parse_error(line, PoscarParseErrorKind::InvalidScale));
            }
            Ok(factors)
        }
    }
}

fn parse_counts(line_str: &str, line: usize) -> Result<Vec<usize>, PoscarError> {
    line_str
        .split_whitespace()
        .map(|token| {
            token.parse::<usize>().map_err(|_| {
                parse_error(
                    line,
                    PoscarParseErrorKind::InvalidCount {
                        value: token.into(),
                    },
                )
            })
        })
        .collect()
}

fn looks_like_counts(line_str: &str) -> bool {
    line_str
        .split_whitespace()
        .next()
        .is_some_and(|token| token.parse::<usize>().is_ok())
}

fn species_from_comment(comment: &str, expected: usize) -> Result<Vec<Element>, PoscarError> {
    let tokens: Vec<&str> = comment.split_whitespace().collect();
    if tokens.len() < expected {
        return Err(PoscarError::MissingSpecies { expected });
    }
    tokens[..expected]
        .iter()
        .map(|token| Element::from_symbol(token))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| PoscarError::MissingSpecies { expected })
}

pub struct PoscarFile;

impl StructureFile for PoscarFile {
    type Metadata = PoscarMetadata;
    type Error = PoscarError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut cursor = LineCursor::new(reader)?;
        let mut metadata = PoscarMetadata::default();

        let comment = cursor.next_line("comment line")?.1.trim().to_string();

        let (scale_line_num, scale_line) = cursor.next_line("scale factor")?;
        let scale_line = scale_line.to_string();

        let mut raw_lattice = Matrix3::zeros();
        for row in 0..3 {
            let (line, content) = cursor.next_line("lattice vectors")?;
            let vector = parse_vector(content, line)?;
            raw_lattice.set_row(row, &vector.transpose());
        }

        let scale = resolve_scale(&scale_line, scale_line_num, &raw_lattice)?;
        let lattice = raw_lattice * Matrix3::from_diagonal(&scale);
        if lattice.determinant().abs() < 1e-12 {
            return Err(PoscarError::SingularLattice);
        }

        let (line, content) = cursor.next_line("species or counts line")?;
        let (species, counts) = if looks_like_counts(content) {
            let counts = parse_counts(content, line)?;
            let species = species_from_comment(&comment, counts.len())?;
            (species, counts)
        } else {
            let species = content
                .split_whitespace()
                .map(|token| {
                    Element::from_symbol(token)
                        .map_err(|source| PoscarError::UnknownElement { line, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let (count_line, count_content) = cursor.next_line("counts line")?;
            let counts = parse_counts(count_content, count_line)?;
            if counts.len() != species.len() {
                return Err(parse_error(
                    count_line,
                    PoscarParseErrorKind::CountMismatch {
                        species: species.len(),
                        counts: counts.len(),
                    },
                ));
            }
            (species, counts)
        };

        let num_atoms: usize = counts.iter().sum();
        if num_atoms == 0 {
            return Err(PoscarError::Inconsistency(
                "POSCAR declares no atoms".to_string(),
            ));
        }

        let (_, mut mode_line) = cursor.next_line("coordinate mode line")?;
        let selective = mode_line.trim_start().starts_with(['S', 's']);
        if selective {
            mode_line = cursor.next_line("coordinate mode line")?.1;
        }
        metadata.coordinate_mode = match mode_line.trim_start().chars().next() {
            Some('C' | 'c' | 'K' | 'k') => CoordinateMode::Cartesian,
            _ => CoordinateMode::Direct,
        };

        let to_frac = match metadata.coordinate_mode {
            CoordinateMode::Direct => None,
            CoordinateMode::Cartesian => Some(
                lattice
                    .transpose()
                    .try_inverse()
                    .ok_or(PoscarError::SingularLattice)?,
            ),
        };

        let mut sites = Vec::with_capacity(num_atoms);
        let mut flags = Vec::new();
        let site_species = species
            .iter()
            .zip(&counts)
            .flat_map(|(&element, &count)| std::iter::repeat_n(element, count));
        for element in site_species {
            let (line, content) = cursor.next_line("atomic coordinates")?;
            let coords = parse_vector(content, line)?;
            let frac = match &to_frac {
                None => coords,
                Some(inverse) => inverse * coords.component_mul(&scale),
            };
            if selective {
                let tokens: Vec<&str> = content.split_whitespace().collect();
                if tokens.len() < 6 {
                    return Err(parse_error(
                        line,
                        PoscarParseErrorKind::TooFewFields {
                            expected: 6,
                            found: tokens.len(),
                        },
                    ));
                }
                flags.push([
                    parse_flag(tokens[3], line)?,
                    parse_flag(tokens[4], line)?,
                    parse_flag(tokens[5], line)?,
                ]);
            }
            sites.push(Site {
                species: element,
                frac,
            });
        }
        if selective {
            metadata.selective_dynamics = Some(flags);
        }

        Ok((Structure::new(comment, lattice, sites), metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        if let Some(flags) = &metadata.selective_dynamics {
            if flags.len() != structure.num_atoms() {
                return Err(PoscarError::Inconsistency(format!(
                    "{} selective dynamics entries for {} atoms",
                    flags.len(),
                    structure.num_atoms()
                )));
            }
        }

        writeln!(writer, "{}", structure.comment)?;
        writeln!(writer, "   1.0")?;
        for row in 0..3 {
            let v = structure.lattice_vector(row);
            writeln!(writer, "  {:22.16}{:22.16}{:22.16}", v.x, v.y, v.z)?;
        }

        let runs = structure.species_runs();
        let symbols: String = runs
            .iter()
            .map(|(element, _)| format!("{:>5}", element.symbol()))
            .collect();
        let counts: String = runs.iter().map(|(_, n)| format!("{:>5}", n)).collect();
        writeln!(writer, "{}", symbols)?;
        writeln!(writer, "{}", counts)?;

        if metadata.selective_dynamics.is_some() {
            writeln!(writer, "Selective dynamics")?;
        }
        let positions: Vec<Vector3<f64>> = match metadata.coordinate_mode {
            CoordinateMode::Direct => {
                writeln!(writer, "Direct")?;
                structure.fractional_positions().copied().collect()
            }
            CoordinateMode::Cartesian => {
                writeln!(writer, "Cartesian")?;
                structure.cartesian_positions()
            }
        };

        for (index, p) in positions.iter().enumerate() {
            write!(writer, "  {:22.16}{:22.16}{:22.16}", p.x, p.y, p.z)?;
            if let Some(flags) = &metadata.selective_dynamics {
                let [a, b, c] = flags[index].map(|f| if f { 'T' } else { 'F' });
                write!(writer, "   {} {} {}", a, b, c)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(structure, &PoscarMetadata::default(), writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TOLERANCE: f64 = 1e-10;

    fn read(text: &str) -> Result<(Structure, PoscarMetadata), PoscarError> {
        PoscarFile::read_from(&mut Cursor::new(text.as_bytes()))
    }

    const SI_DIMER: &str = "\
Si2 displaced
   1.0
     5.43 0.0 0.0
     0.0 5.43 0.0
     0.0 0.0 5.43
   Si
   2
Direct
  0.01 0.0 0.0
  0.25 0.25 -0.25
";

    #[test]
    fn reads_vasp5_direct_file() {
        let (s, meta) = read(SI_DIMER).unwrap();
        assert_eq!(s.comment, "Si2 displaced");
        assert_eq!(s.num_atoms(), 2);
        assert_eq!(s.sites[0].species.symbol(), "Si");
        assert_eq!(meta.coordinate_mode, CoordinateMode::Direct);
        assert!(meta.selective_dynamics.is_none());
        assert!((s.lattice[(1, 1)] - 5.43).abs() < TOLERANCE);
        assert!((s.sites[0].frac - Vector3::new(0.01, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn fractional_coordinates_are_kept_as_parsed() {
        let (s, _) = read(SI_DIMER).unwrap();
        assert!((s.sites[1].frac.z + 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn vasp4_file_takes_species_from_comment() {
        let text = "\
Na Cl
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
1 1
Direct
0.0 0.0 0.0
0.5 0.5 0.5
";
        let (s, _) = read(text).unwrap();
        assert_eq!(s.sites[0].species.symbol(), "Na");
        assert_eq!(s.sites[1].species.symbol(), "Cl");
    }

    #[test]
    fn vasp4_file_without_symbols_in_comment_is_rejected() {
        let text = "\
some title
1.0
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
1 1
Direct
0.0 0.0 0.0
0.5 0.5 0.5
";
        assert!(matches!(
            read(text),
            Err(PoscarError::MissingSpecies { expected: 2 })
        ));
    }

    #[test]
    fn cartesian_coordinates_are_scaled_and_converted() {
        let text = "\
cart
2.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Ar
1
Cartesian
1.0 2.0 0.5
";
        let (s, meta) = read(text).unwrap();
        assert_eq!(meta.coordinate_mode, CoordinateMode::Cartesian);
        assert!((s.lattice[(0, 0)] - 4.0).abs() < TOLERANCE);
        assert!((s.sites[0].frac - Vector3::new(0.5, 1.0, 0.25)).norm() < TOLERANCE);
    }

    #[test]
    fn negative_scale_sets_cell_volume() {
        let text = "\
vol
-64.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
Cu
1
Direct
0.0 0.0 0.0
";
        let (s, _) = read(text).unwrap();
        assert!((s.volume() - 64.0).abs() < 1e-9);
        assert!((s.lattice[(2, 2)] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn selective_dynamics_flags_are_read() {
        let text = "\
sd
1.0
3.0 0.0 0.0
0.0 3.0 0.0
0.0 0.0 3.0
O H
1 1
Selective dynamics
Direct
0.0 0.0 0.0 T T F
0.1 0.0 0.0 F F T
";
        let (s, meta) = read(text).unwrap();
        assert_eq!(s.num_atoms(), 2);
        assert_eq!(
            meta.selective_dynamics,
            Some(vec![[true, true, false], [false, false, true]])
        );
    }

    #[test]
    fn malformed_coordinate_reports_line_number() {
        let text = SI_DIMER.replace("0.25 0.25 -0.25", "0.25 abc -0.25");
        match read(&text) {
            Err(PoscarError::Parse {
                line: 10,
                kind: PoscarParseErrorKind::InvalidFloat { value },
            }) => assert_eq!(value, "abc"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated_file_reports_unexpected_end() {
        let text: String = SI_DIMER.lines().take(9).map(|l| format!("{l}\n")).collect();
        assert!(matches!(
            read(&text),
            Err(PoscarError::Parse {
                kind: PoscarParseErrorKind::UnexpectedEnd { .. },
                ..
            })
        ));
    }

    #[test]
    fn species_and_count_lengths_must_agree() {
        let text = SI_DIMER.replace("   Si\n", "   Si O\n");
        assert!(matches!(
            read(&text),
            Err(PoscarError::Parse {
                line: 7,
                kind: PoscarParseErrorKind::CountMismatch { species: 2, counts: 1 },
            })
        ));
    }

    #[test]
    fn unknown_element_is_rejected() {
        let text = SI_DIMER.replace("   Si\n", "   Qq\n");
        assert!(matches!(
            read(&text),
            Err(PoscarError::UnknownElement { line: 6, .. })
        ));
    }

    #[test]
    fn zero_scale_is_rejected() {
        let text = SI_DIMER.replace("   1.0\n", "   0.0\n");
        assert!(matches!(
            read(&text),
            Err(PoscarError::Parse {
                line: 2,
                kind: PoscarParseErrorKind::InvalidScale,
            })
        ));
    }

    #[test]
    fn written_file_reads_back_to_same_structure() {
        let (original, _) = read(SI_DIMER).unwrap();
        let mut buffer = Vec::new();
        PoscarFile::write_structure_to(&original, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Direct"));

        let (reread, _) = read(&text).unwrap();
        assert_eq!(reread.num_atoms(), original.num_atoms());
        assert!((reread.lattice - original.lattice).norm() < TOLERANCE);
        for (a, b) in reread.sites.iter().zip(&original.sites) {
            assert_eq!(a.species, b.species);
            assert!((a.frac - b.frac).norm() < TOLERANCE);
        }
    }

    #[test]
    fn writing_rejects_mismatched_selective_flags() {
        let (s, _) = read(SI_DIMER).unwrap();
        let meta = PoscarMetadata {
            coordinate_mode: CoordinateMode::Direct,
            selective_dynamics: Some(vec![[true; 3]]),
        };
        let mut buffer = Vec::new();
        assert!(matches!(
            PoscarFile::write_to(&s, &meta, &mut buffer),
            Err(PoscarError::Inconsistency(_))
        ));
    }
}
