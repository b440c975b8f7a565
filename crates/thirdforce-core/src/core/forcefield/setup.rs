use super::external::ExternalEvaluator;
use super::lennard_jones::LennardJonesEvaluator;
use super::traits::{ForceEvaluator, ForceFieldError};
use std::path::PathBuf;
use tracing::info;

/// Configuration-side description of which evaluator to build.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatorSpec {
    /// A child process wrapping a machine-learned potential.
    External { program: String, args: Vec<String> },
    /// The built-in periodic Lennard-Jones potential.
    LennardJones { params_path: PathBuf },
}

impl EvaluatorSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluatorSpec::External { .. } => "external",
            EvaluatorSpec::LennardJones { .. } => "lennard-jones",
        }
    }

    /// Builds the evaluator. `model` and `device` are forwarded to external evaluators.
    pub fn build(&self, model: &str, device: &str) -> Result<Box<dyn ForceEvaluator>, ForceFieldError> {
        match self {
            EvaluatorSpec::External { program, args } => {
                info!(program = %program, model, device, "Using external force evaluator");
                Ok(Box::new(ExternalEvaluator::new(
                    program.clone(),
                    args.clone(),
                    model,
                    device,
                )))
            }
            EvaluatorSpec::LennardJones { params_path } => {
                info!(params = ?params_path, "Using Lennard-Jones force evaluator");
                Ok(Box::new(LennardJonesEvaluator::from_path(params_path)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builds_external_evaluator_without_spawning() {
        let spec = EvaluatorSpec::External {
            program: "/does/not/exist".into(),
            args: vec!["{model}".into()],
        };
        let evaluator = spec.build("m.model", "cpu").unwrap();
        assert_eq!(evaluator.name(), "/does/not/exist");
        assert_eq!(spec.kind(), "external");
    }

    #[test]
    fn builds_lennard_jones_from_params_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lj.toml");
        fs::write(
            &path,
            "[globals]\ncutoff = 5.0\n[species.Ar]\nepsilon = 0.01\nsigma = 3.4\n",
        )
        .unwrap();
        let spec = EvaluatorSpec::LennardJones { params_path: path };
        let evaluator = spec.build("ignored", "ignored").unwrap();
        assert_eq!(evaluator.name(), "lennard-jones");
    }

    #[test]
    fn lennard_jones_with_missing_params_fails_to_build() {
        let spec = EvaluatorSpec::LennardJones {
            params_path: PathBuf::from("/nonexistent/lj.toml"),
        };
        assert!(matches!(
            spec.build("m", "cpu"),
            Err(ForceFieldError::Params(_))
        ));
    }
}
