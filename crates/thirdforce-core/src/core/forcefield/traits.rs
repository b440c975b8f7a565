use super::params::ParamLoadError;
use crate::core::io::poscar::PoscarError;
use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForceFieldError {
    #[error("Failed to start force evaluator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to force evaluator: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize structure for the evaluator: {0}")]
    Serialize(#[from] PoscarError),

    #[error("Force evaluator '{program}' exited with {status}{}", format_stderr(.stderr))]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Malformed force line {line}: '{content}'")]
    MalformedOutput { line: usize, content: String },

    #[error("Evaluator returned {found} force vector(s) for {expected} atom(s)")]
    WrongAtomCount { expected: usize, found: usize },

    #[error("No force-field parameters for species '{species}'")]
    MissingParameters { species: String },

    #[error("Parameter error: {0}")]
    Params(#[from] ParamLoadError),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{}", trimmed)
    }
}

/// Predicts per-atom forces for a periodic structure.
///
/// Implementations must return exactly one force vector per site, in site order,
/// in eV/Angstrom. An evaluator is created once per run and reused for every
/// displacement, so implementations may keep loaded models or parameters around.
pub trait ForceEvaluator {
    /// Short human-readable identifier used in logs.
    fn name(&self) -> &str;

    fn compute_forces(&mut self, structure: &Structure) -> Result<Vec<Vector3<f64>>, ForceFieldError>;
}

impl<T: ForceEvaluator + ?Sized> ForceEvaluator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compute_forces(&mut self, structure: &Structure) -> Result<Vec<Vector3<f64>>, ForceFieldError> {
        (**self).compute_forces(structure)
    }
}
