use std::f64::consts::{LN_2, PI};

use clap::ValueEnum;
use ens_core::Model;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of every Gaussian component.
pub const SIGMA: f64 = 0.1;

/// Built-in toy problems with known evidence.
///
/// Every model uses a uniform prior on `[-1, 1)^npar`; the Gaussian
/// likelihoods are normalized over the whole space, so their evidence is the
/// inverse prior volume up to negligible truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToyModel {
    /// Constant likelihood, `logz = 0`.
    Flat,
    /// Single isotropic Gaussian at the origin.
    Gaussian,
    /// Equal mixture of two Gaussians at `x0 = -0.5` and `x0 = +0.5`.
    TwinGaussian,
}

impl ToyModel {
    /// Every model, in display order.
    pub const ALL: [ToyModel; 3] = [ToyModel::Flat, ToyModel::Gaussian, ToyModel::TwinGaussian];

    /// Command line name.
    pub fn name(&self) -> &'static str {
        match self {
            ToyModel::Flat => "flat",
            ToyModel::Gaussian => "gaussian",
            ToyModel::TwinGaussian => "twin-gaussian",
        }
    }

    /// One line description.
    pub fn description(&self) -> &'static str {
        match self {
            ToyModel::Flat => "constant likelihood over the prior box",
            ToyModel::Gaussian => "isotropic Gaussian (sigma 0.1) at the origin",
            ToyModel::TwinGaussian => "two separated Gaussians (sigma 0.1) of equal mass",
        }
    }

    /// Expected log-evidence in `npar` dimensions.
    pub fn analytic_logz(&self, npar: usize) -> f64 {
        match self {
            ToyModel::Flat => 0.0,
            ToyModel::Gaussian | ToyModel::TwinGaussian => -(npar as f64) * LN_2,
        }
    }

    /// Binds the model to a dimension.
    pub fn instantiate(self, npar: usize) -> ToyProblem {
        ToyProblem { model: self, npar }
    }
}

/// Failure raised by the toy likelihoods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToyModelError {
    /// The sampler passed a vector of the wrong length.
    #[error("expected {expected} parameters, got {actual}")]
    Dimension {
        /// Configured dimension.
        expected: usize,
        /// Received length.
        actual: usize,
    },
}

/// A [`ToyModel`] in a fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToyProblem {
    model: ToyModel,
    npar: usize,
}

impl ToyProblem {
    fn check(&self, values: &[f64]) -> Result<(), ToyModelError> {
        if values.len() == self.npar {
            Ok(())
        } else {
            Err(ToyModelError::Dimension {
                expected: self.npar,
                actual: values.len(),
            })
        }
    }
}

fn gaussian_logpdf(params: &[f64], offset: f64) -> f64 {
    let norm = 0.5 * params.len() as f64 * (2.0 * PI * SIGMA * SIGMA).ln();
    let r2: f64 = params
        .iter()
        .enumerate()
        .map(|(idx, x)| if idx == 0 { x - offset } else { *x })
        .map(|d| d * d)
        .sum();
    -r2 / (2.0 * SIGMA * SIGMA) - norm
}

impl Model for ToyProblem {
    type Error = ToyModelError;

    fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>, Self::Error> {
        self.check(u)?;
        Ok(u.iter().map(|ui| 2.0 * ui - 1.0).collect())
    }

    fn log_likelihood(&self, params: &[f64]) -> Result<f64, Self::Error> {
        self.check(params)?;
        Ok(match self.model {
            ToyModel::Flat => 0.0,
            ToyModel::Gaussian => gaussian_logpdf(params, 0.0),
            ToyModel::TwinGaussian => {
                let a = gaussian_logpdf(params, -0.5);
                let b = gaussian_logpdf(params, 0.5);
                ens_nest::log_add_exp(a, b) - LN_2
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prior_maps_to_box() {
        let problem = ToyModel::Flat.instantiate(2);
        assert_eq!(problem.prior_transform(&[0.0, 0.5]).unwrap(), vec![-1.0, 0.0]);
    }

    #[test]
    fn wrong_length_is_an_error() {
        let problem = ToyModel::Gaussian.instantiate(3);
        let err = problem.log_likelihood(&[0.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            ToyModelError::Dimension {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn twin_peaks_are_symmetric() {
        let problem = ToyModel::TwinGaussian.instantiate(2);
        let left = problem.log_likelihood(&[-0.5, 0.0]).unwrap();
        let right = problem.log_likelihood(&[0.5, 0.0]).unwrap();
        assert!((left - right).abs() < 1e-12);
        let single = ToyModel::Gaussian.instantiate(2).log_likelihood(&[0.0, 0.0]).unwrap();
        assert!((left - (single - LN_2)).abs() < 1e-9);
    }
}
