use super::discovery::DiscoveryError;
use crate::core::forcefield::traits::ForceFieldError;
use crate::core::io::vasprun::ReportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Displacement discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to set up force evaluator: {0}")]
    EvaluatorSetup(#[source] ForceFieldError),

    #[error("Displacement {ordinal}: failed to {action} '{path}': {source}", path = path.display())]
    Io {
        ordinal: usize,
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Displacement {ordinal}: failed to parse structure '{path}': {source}", path = path.display())]
    Structure {
        ordinal: usize,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Displacement {ordinal}: force evaluation failed: {source}")]
    ForceField {
        ordinal: usize,
        #[source]
        source: ForceFieldError,
    },

    #[error("Displacement {ordinal}: evaluator returned {found} force vector(s) for {expected} atom(s)")]
    ForceCountMismatch {
        ordinal: usize,
        expected: usize,
        found: usize,
    },

    #[error("Displacement {ordinal}: non-finite force on atom {atom}")]
    NonFiniteForce { ordinal: usize, atom: usize },

    #[error("Displacement {ordinal}: failed to write report '{path}': {source}", path = path.display())]
    Report {
        ordinal: usize,
        path: PathBuf,
        #[source]
        source: ReportError,
    },
}
