use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GlobalParams {
    /// Pair interaction cutoff in Angstroms.
    pub cutoff: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpeciesParam {
    /// Well depth in eV.
    pub epsilon: f64,
    /// Zero-crossing distance in Angstroms.
    pub sigma: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LennardJonesParams {
    pub globals: GlobalParams,
    pub species: HashMap<String, SpeciesParam>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid parameter: {0}")]
    Invalid(String),
}

impl LennardJonesParams {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ParamLoadError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ParamLoadError> {
        let params: Self = toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), ParamLoadError> {
        if !(self.globals.cutoff.is_finite() && self.globals.cutoff > 0.0) {
            return Err(ParamLoadError::Invalid(format!(
                "cutoff must be positive, got {}",
                self.globals.cutoff
            )));
        }
        for (symbol, param) in &self.species {
            if !(param.sigma.is_finite() && param.sigma > 0.0) {
                return Err(ParamLoadError::Invalid(format!(
                    "sigma for '{}' must be positive, got {}",
                    symbol, param.sigma
                )));
            }
            if !(param.epsilon.is_finite() && param.epsilon >= 0.0) {
                return Err(ParamLoadError::Invalid(format!(
                    "epsilon for '{}' must be non-negative, got {}",
                    symbol, param.epsilon
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, symbol: &str) -> Option<&SpeciesParam> {
        self.species.get(symbol)
    }
}
