use std::fs;
use std::path::Path;

use ens_core::errors::ErrorInfo;
use ens_core::NestError;
use ens_ellipsoid::PartitionOptions;
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing a nested sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestConfig {
    /// Number of live points.
    #[serde(default = "default_nobj")]
    pub nobj: usize,
    /// Maximum number of iterations; the run may stop earlier on the decline rule.
    #[serde(default = "default_maxiter")]
    pub maxiter: usize,
    /// Linear enlargement applied to every bounding ellipsoid axis.
    #[serde(default = "default_enlarge")]
    pub enlarge: f64,
    /// Candidate draws allowed per replacement before the run stalls.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Bounding strategy used to propose replacements.
    #[serde(default)]
    pub bound: BoundConfig,
    /// Master seed used when no explicit seed is supplied.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Prefix attached to progress events.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_nobj() -> usize {
    50
}

fn default_maxiter() -> usize {
    10_000
}

fn default_enlarge() -> f64 {
    1.06
}

fn default_max_attempts() -> usize {
    1_000_000
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            nobj: default_nobj(),
            maxiter: default_maxiter(),
            enlarge: default_enlarge(),
            max_attempts: default_max_attempts(),
            bound: BoundConfig::default(),
            seed_policy: SeedPolicy::default(),
            label: None,
        }
    }
}

impl NestConfig {
    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, NestError> {
        serde_yaml::from_str(contents)
            .map_err(|err| NestError::Config(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Reads and parses a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, NestError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            NestError::Config(info) => {
                NestError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml_string(&self) -> Result<String, NestError> {
        serde_yaml::to_string(self)
            .map_err(|err| NestError::Serde(ErrorInfo::new("config-serialize", err.to_string())))
    }

    /// Checks the configuration against a problem with `npar` parameters.
    pub fn validate(&self, npar: usize) -> Result<(), NestError> {
        if npar == 0 {
            return Err(config_error("zero-parameters", "npar must be positive"));
        }
        if self.nobj < npar + 1 {
            return Err(NestError::Config(
                ErrorInfo::new(
                    "too-few-live-points",
                    "nobj must exceed the number of parameters",
                )
                .with_context("nobj", self.nobj.to_string())
                .with_context("npar", npar.to_string())
                .with_hint("an ellipsoid fit needs at least npar + 1 live points"),
            ));
        }
        if self.maxiter == 0 {
            return Err(config_error("zero-maxiter", "maxiter must be positive"));
        }
        if !(self.enlarge >= 1.0) || !self.enlarge.is_finite() {
            return Err(NestError::Config(
                ErrorInfo::new("invalid-enlarge", "enlarge must be a finite factor >= 1")
                    .with_context("enlarge", self.enlarge.to_string()),
            ));
        }
        if self.max_attempts == 0 {
            return Err(config_error("zero-max-attempts", "max_attempts must be positive"));
        }
        if let BoundConfig::Multi { max_depth, .. } = self.bound {
            if max_depth == 0 {
                return Err(config_error(
                    "zero-max-depth",
                    "multi-ellipsoid bounds need max_depth >= 1",
                ));
            }
        }
        Ok(())
    }
}

fn config_error(code: &str, message: &str) -> NestError {
    NestError::Config(ErrorInfo::new(code, message))
}

/// Bounding strategy for replacement proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BoundConfig {
    /// One ellipsoid around the whole live set.
    Single,
    /// Recursive multi-ellipsoid decomposition of the live set.
    Multi {
        /// Maximum Lloyd passes of each 2-means split.
        #[serde(default = "default_kmeans_iterations")]
        kmeans_iterations: usize,
        /// Maximum volume-weighted reassignment passes per split.
        #[serde(default = "default_reassign_iterations")]
        reassign_iterations: usize,
        /// Maximum recursion depth.
        #[serde(default = "default_max_depth")]
        max_depth: usize,
    },
}

fn default_kmeans_iterations() -> usize {
    PartitionOptions::default().kmeans_iterations
}

fn default_reassign_iterations() -> usize {
    PartitionOptions::default().reassign_iterations
}

fn default_max_depth() -> usize {
    PartitionOptions::default().max_depth
}

impl Default for BoundConfig {
    fn default() -> Self {
        BoundConfig::Single
    }
}

impl BoundConfig {
    /// Multi-ellipsoid bound with the default partition options.
    pub fn multi() -> Self {
        let opts = PartitionOptions::default();
        BoundConfig::Multi {
            kmeans_iterations: opts.kmeans_iterations,
            reassign_iterations: opts.reassign_iterations,
            max_depth: opts.max_depth,
        }
    }

    /// Partition options for the multi-ellipsoid bound, `None` for a single ellipsoid.
    pub fn partition_options(&self) -> Option<PartitionOptions> {
        match *self {
            BoundConfig::Single => None,
            BoundConfig::Multi {
                kmeans_iterations,
                reassign_iterations,
                max_depth,
            } => Some(PartitionOptions {
                kmeans_iterations,
                reassign_iterations,
                max_depth,
            }),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded alongside the seed in run manifests.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = NestConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, NestConfig::default());
        assert_eq!(config.nobj, 50);
        assert_eq!(config.maxiter, 10_000);
        assert_eq!(config.bound, BoundConfig::Single);
    }

    #[test]
    fn multi_bound_fills_partition_defaults() {
        let config = NestConfig::from_yaml_str("bound:\n  type: multi\n  max_depth: 3\n").unwrap();
        let opts = config.bound.partition_options().unwrap();
        assert_eq!(opts.max_depth, 3);
        assert_eq!(opts.kmeans_iterations, 10);
        assert_eq!(opts.reassign_iterations, 20);
    }

    #[test]
    fn validation_rejects_small_live_set() {
        let config = NestConfig {
            nobj: 3,
            ..NestConfig::default()
        };
        let err = config.validate(3).unwrap_err();
        assert_eq!(err.info().code, "too-few-live-points");
        assert!(config.validate(2).is_ok());
    }

    #[test]
    fn validation_rejects_shrinking_enlargement() {
        let config = NestConfig {
            enlarge: 0.9,
            ..NestConfig::default()
        };
        assert!(matches!(config.validate(2), Err(NestError::Config(_))));
        assert!(matches!(
            NestConfig::default().validate(0),
            Err(NestError::Config(_))
        ));
    }
}
