//! The reduced `vasprun.xml` report read back by `thirdorder.py reap`.
//!
//! Only the two arrays the reaper looks at are emitted: the fractional positions
//! inside `<structure>` and the per-atom forces. Every number is a 15-character
//! fixed field with 8 decimals.

use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Structure has {positions} atom(s) but {forces} force vector(s) were given")]
    LengthMismatch { positions: usize, forces: usize },
}

/// Formats one numeric field exactly as `{:15.8f}` would: right-aligned, at least
/// 15 characters wide, 8 digits after the decimal point.
pub fn format_field(value: f64) -> String {
    format!("{:15.8}", value)
}

fn format_row(v: &Vector3<f64>) -> String {
    format!("{}{}{}", format_field(v.x), format_field(v.y), format_field(v.z))
}

/// A report format producing one file per evaluated displacement.
pub trait ReportWriter {
    /// Writes the report for `structure` and its `forces` (same atom order).
    fn write_report(
        &self,
        structure: &Structure,
        forces: &[Vector3<f64>],
        writer: &mut dyn Write,
    ) -> Result<(), ReportError>;

    /// Creates or truncates `path` and writes the report into it.
    fn write_report_to_path(
        &self,
        structure: &Structure,
        forces: &[Vector3<f64>],
        path: &Path,
    ) -> Result<(), ReportError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_report(structure, forces, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VasprunReport;

impl ReportWriter for VasprunReport {
    fn write_report(
        &self,
        structure: &Structure,
        forces: &[Vector3<f64>],
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        if structure.num_atoms() != forces.len() {
            return Err(ReportError::LengthMismatch {
                positions: structure.num_atoms(),
                forces: forces.len(),
            });
        }

        writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(writer, "<modeling>")?;
        writeln!(writer, "  <calculation>")?;
        writeln!(writer, "    <structure>")?;
        writeln!(writer, r#"      <varray name="positions">"#)?;
        for frac in structure.fractional_positions() {
            writeln!(writer, "        <v>{}</v>", format_row(frac))?;
        }
        writeln!(writer, "      </varray>")?;
        writeln!(writer, "    </structure>")?;
        writeln!(writer, r#"    <varray name="forces">"#)?;
        for force in forces {
            writeln!(writer, "      <v>{}</v>", format_row(force))?;
        }
        writeln!(writer, "    </varray>")?;
        writeln!(writer, "  </calculation>")?;
        writeln!(writer, "</modeling>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::Element;
    use crate::core::models::structure::Site;
    use nalgebra::Matrix3;

    fn two_atom_structure() -> Structure {
        let si = Element::from_symbol("Si").unwrap();
        Structure::new(
            "Si2",
            Matrix3::from_diagonal_element(5.43),
            vec![
                Site {
                    species: si,
                    frac: Vector3::new(0.0, 0.0, 0.0),
                },
                Site {
                    species: si,
                    frac: Vector3::new(0.25, 0.25, -0.25),
                },
            ],
        )
    }

    #[test]
    fn field_is_fifteen_wide_with_eight_decimals() {
        assert_eq!(format_field(0.5), "     0.50000000");
        assert_eq!(format_field(-1.25), "    -1.25000000");
        assert_eq!(format_field(123456.789), "123456.78900000");
        assert_eq!(format_field(0.123456789), "     0.12345679");
    }

    #[test]
    fn field_keeps_sign_of_values_rounding_to_zero() {
        assert_eq!(format_field(-0.0), "    -0.00000000");
        assert_eq!(format_field(-1e-12), "    -0.00000000");
    }

    #[test]
    fn field_grows_beyond_width_without_separators() {
        let field = format_field(-12345678.5);
        assert_eq!(field, "-12345678.50000000");
        assert!(!field.contains(','));
    }

    #[test]
    fn report_matches_fixed_template() {
        let structure = two_atom_structure();
        let forces = vec![Vector3::new(0.1, -0.2, 0.0), Vector3::new(-0.1, 0.2, 0.0)];
        let mut buffer = Vec::new();
        VasprunReport
            .write_report(&structure, &forces, &mut buffer)
            .unwrap();

        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<modeling>
  <calculation>
    <structure>
      <varray name=\"positions\">
        <v>     0.00000000     0.00000000     0.00000000</v>
        <v>     0.25000000     0.25000000    -0.25000000</v>
      </varray>
    </structure>
    <varray name=\"forces\">
      <v>     0.10000000    -0.20000000     0.00000000</v>
      <v>    -0.10000000     0.20000000     0.00000000</v>
    </varray>
  </calculation>
</modeling>
";
        assert_eq!(String::from_utf8(buffer).unwrap(), expected);
    }

    #[test]
    fn mismatched_force_count_is_rejected() {
        let structure = two_atom_structure();
        let forces = vec![Vector3::zeros()];
        let mut buffer = Vec::new();
        let result = VasprunReport.write_report(&structure, &forces, &mut buffer);
        assert!(matches!(
            result,
            Err(ReportError::LengthMismatch {
                positions: 2,
                forces: 1
            })
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn writing_to_path_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vasprun.xml");
        std::fs::write(&path, "stale content that is much longer than nothing").unwrap();

        let structure = two_atom_structure();
        let forces = vec![Vector3::zeros(); 2];
        VasprunReport
            .write_report_to_path(&structure, &forces, &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(!content.contains("stale"));
        assert_eq!(content.matches("<v>").count(), 4);
    }
}
