use super::traits::{ForceEvaluator, ForceFieldError};
use crate::core::io::poscar::PoscarFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Runs a force model as a child process, once per structure.
///
/// The child receives the structure as POSCAR text on stdin and must print one line
/// per atom with three whitespace-separated force components (eV/Angstrom) on stdout.
/// Blank lines and lines starting with `#` are ignored. Arguments may contain the
/// placeholders `{model}`, `{device}` and `{natoms}`.
#[derive(Debug, Clone)]
pub struct ExternalEvaluator {
    program: String,
    args: Vec<String>,
    model: String,
    device: String,
}

impl ExternalEvaluator {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        model: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            model: model.into(),
            device: device.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders substituted for `structure`.
    pub fn resolved_args(&self, structure: &Structure) -> Vec<String> {
        let natoms = structure.num_atoms().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{model}", &self.model)
                    .replace("{device}", &self.device)
                    .replace("{natoms}", &natoms)
            })
            .collect()
    }
}

/// Parses evaluator stdout into exactly `expected` force vectors.
pub fn parse_forces(output: &str, expected: usize) -> Result<Vec<Vector3<f64>>, ForceFieldError> {
    let mut forces = Vec::with_capacity(expected);
    for (index, raw) in output.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = || ForceFieldError::MalformedOutput {
            line: index + 1,
            content: raw.to_string(),
        };
        let values = line
            .split_whitespace()
            .map(|token| token.parse::<f64>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() != 3 {
            return Err(malformed());
        }
        forces.push(Vector3::new(values[0], values[1], values[2]));
    }
    if forces.len() != expected {
        return Err(ForceFieldError::WrongAtomCount {
            expected,
            found: forces.len(),
        });
    }
    Ok(forces)
}

impl ForceEvaluator for ExternalEvaluator {
    fn name(&self) -> &str {
        &self.program
    }

    fn compute_forces(&mut self, structure: &Structure) -> Result<Vec<Vector3<f64>>, ForceFieldError> {
        let mut poscar = Vec::new();
        PoscarFile::write_structure_to(structure, &mut poscar)?;

        let args = self.resolved_args(structure);
        debug!(program = %self.program, ?args, "Spawning force evaluator");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ForceFieldError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Stdin is fed from its own thread while stdout is drained.
        let feeder = child
            .stdin
            .take()
            .map(|mut stdin| std::thread::spawn(move || stdin.write_all(&poscar)));

        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(ForceFieldError::ProcessFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        if let Some(handle) = feeder {
            match handle.join() {
                Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => return Err(e.into()),
                Ok(_) => {}
                Err(_) => warn!("Structure feeder thread panicked."),
            }
        }

        if !output.stderr.is_empty() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Force evaluator wrote to stderr"
            );
        }

        parse_forces(&String::from_utf8_lossy(&output.stdout), structure.num_atoms())
    }
}
