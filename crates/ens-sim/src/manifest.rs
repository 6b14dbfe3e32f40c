use std::fs;
use std::path::{Path, PathBuf};

use ens_core::errors::ErrorInfo;
use ens_core::NestError;
use ens_nest::{NestConfig, RunResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::ToyModel;

/// Record of a CLI run, written next to the result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: NestConfig,
    /// SHA-256 of the canonical JSON encoding of `config`.
    pub config_hash: String,
    /// Toy model that was sampled.
    pub model: ToyModel,
    /// Number of parameters.
    pub npar: usize,
    /// Seed the sampler was started from.
    pub master_seed: u64,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Result file, relative to the manifest directory when possible.
    pub result_file: PathBuf,
    /// Log-evidence of the run.
    pub logz: f64,
    /// Uncertainty on `logz`.
    pub logzerr: f64,
    /// Expected log-evidence of the toy model.
    pub analytic_logz: f64,
    /// Iterations performed.
    pub niter: usize,
    /// Likelihood evaluations.
    pub ncalls: usize,
}

impl RunManifest {
    /// Builds the manifest for a finished run.
    pub fn new(
        config: &NestConfig,
        model: ToyModel,
        npar: usize,
        master_seed: u64,
        result_file: PathBuf,
        result: &RunResult,
    ) -> Result<Self, NestError> {
        Ok(Self {
            config: config.clone(),
            config_hash: config_hash(config)?,
            model,
            npar,
            master_seed,
            seed_label: config.seed_policy.label.clone(),
            result_file,
            logz: result.logz,
            logzerr: result.logzerr,
            analytic_logz: model.analytic_logz(npar),
            niter: result.niter,
            ncalls: result.ncalls,
        })
    }

    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), NestError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                NestError::Serde(
                    ErrorInfo::new("manifest-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("manifest-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, NestError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("manifest-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

/// Hex SHA-256 of the JSON encoding of `config`.
pub fn config_hash(config: &NestConfig) -> Result<String, NestError> {
    let bytes = serde_json::to_vec(config)
        .map_err(|err| NestError::Serde(ErrorInfo::new("config-hash", err.to_string())))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_tracks_config_changes() {
        let base = NestConfig::default();
        let same = config_hash(&base).unwrap();
        assert_eq!(same, config_hash(&base.clone()).unwrap());
        assert_eq!(same.len(), 64);
        let changed = NestConfig {
            nobj: 51,
            ..NestConfig::default()
        };
        assert_ne!(same, config_hash(&changed).unwrap());
    }
}
