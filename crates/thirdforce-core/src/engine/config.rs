use crate::core::forcefield::setup::EvaluatorSpec;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Everything a displacement run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Directory holding the `<prefix>.POSCAR.*` files; outputs are created here too.
    pub working_dir: PathBuf,
    pub prefix: String,
    /// Model identifier handed to the evaluator.
    pub model: String,
    /// Compute device selector handed to the evaluator (e.g. `cpu`, `cuda`).
    pub device: String,
    pub evaluator: EvaluatorSpec,
}

#[derive(Default)]
pub struct RunConfigBuilder {
    working_dir: Option<PathBuf>,
    prefix: Option<String>,
    model: Option<String>,
    device: Option<String>,
    evaluator: Option<EvaluatorSpec>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }
    pub fn evaluator(mut self, spec: EvaluatorSpec) -> Self {
        self.evaluator = Some(spec);
        self
    }

    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let prefix = self.prefix.ok_or(ConfigError::MissingParameter("prefix"))?;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                name: "prefix",
                reason: format!("'{}' must be a non-empty file name prefix", prefix),
            });
        }
        let evaluator = self
            .evaluator
            .ok_or(ConfigError::MissingParameter("evaluator"))?;
        if let EvaluatorSpec::External { program, .. } = &evaluator {
            if program.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: "evaluator.command",
                    reason: "command must not be empty".to_string(),
                });
            }
        }
        Ok(RunConfig {
            working_dir: self
                .working_dir
                .ok_or(ConfigError::MissingParameter("working_dir"))?,
            prefix,
            model: self.model.ok_or(ConfigError::MissingParameter("model"))?,
            device: self.device.ok_or(ConfigError::MissingParameter("device"))?,
            evaluator,
        })
    }
}
