use std::fs;
use std::path::Path;

use ens_core::errors::ErrorInfo;
use ens_core::NestError;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceAccumulator;

/// A discarded or finalized point together with its log-weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Parameter values `prior(u)`.
    pub parvals: Vec<f64>,
    /// Unnormalized log-weight `logwidth + logl`.
    pub logwt: f64,
}

/// Outcome of a nested sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Iterations performed.
    pub niter: usize,
    /// Likelihood evaluations, including the initial population.
    pub ncalls: usize,
    /// Wall-clock seconds spent in the iteration loop.
    pub time: f64,
    /// Log-evidence.
    pub logz: f64,
    /// Statistical uncertainty on `logz`.
    pub logzerr: f64,
    /// Highest log-likelihood among the final live points.
    pub loglmax: f64,
    /// Information.
    pub h: f64,
    /// Parameter values of every sample, shape `(nsamples, npar)`.
    pub samples_parvals: Vec<Vec<f64>>,
    /// Normalized posterior weight of every sample.
    pub samples_wt: Vec<f64>,
    /// Unnormalized log-weight of every sample.
    pub samples_logwt: Vec<f64>,
}

impl RunResult {
    pub(crate) fn from_records(
        niter: usize,
        ncalls: usize,
        time: f64,
        loglmax: f64,
        evidence: &EvidenceAccumulator,
        records: Vec<SampleRecord>,
    ) -> Self {
        let logz = evidence.logz();
        let mut samples_parvals = Vec::with_capacity(records.len());
        let mut samples_logwt = Vec::with_capacity(records.len());
        for record in records {
            samples_parvals.push(record.parvals);
            samples_logwt.push(record.logwt);
        }
        let samples_wt = samples_logwt
            .iter()
            .map(|logwt| (logwt - logz).exp())
            .collect();
        Self {
            niter,
            ncalls,
            time,
            logz,
            logzerr: evidence.logzerr(),
            loglmax,
            h: evidence.h(),
            samples_parvals,
            samples_wt,
            samples_logwt,
        }
    }

    /// Number of weighted samples.
    pub fn nsamples(&self) -> usize {
        self.samples_wt.len()
    }

    /// Number of parameters per sample.
    pub fn npar(&self) -> usize {
        self.samples_parvals.first().map_or(0, Vec::len)
    }

    /// Weighted posterior mean of every parameter.
    pub fn posterior_mean(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.npar()];
        let total: f64 = self.samples_wt.iter().sum();
        if !(total > 0.0) {
            return mean;
        }
        for (parvals, wt) in self.samples_parvals.iter().zip(&self.samples_wt) {
            for (slot, value) in mean.iter_mut().zip(parvals) {
                *slot += wt * value;
            }
        }
        mean.iter_mut().for_each(|slot| *slot /= total);
        mean
    }

    /// Weighted posterior covariance, `npar x npar`.
    pub fn posterior_covariance(&self) -> Vec<Vec<f64>> {
        let npar = self.npar();
        let mean = self.posterior_mean();
        let mut cov = vec![vec![0.0; npar]; npar];
        let total: f64 = self.samples_wt.iter().sum();
        if !(total > 0.0) {
            return cov;
        }
        for (parvals, wt) in self.samples_parvals.iter().zip(&self.samples_wt) {
            for i in 0..npar {
                let di = parvals[i] - mean[i];
                for j in 0..=i {
                    cov[i][j] += wt * di * (parvals[j] - mean[j]);
                }
            }
        }
        for i in 0..npar {
            for j in 0..=i {
                cov[i][j] /= total;
                cov[j][i] = cov[i][j];
            }
        }
        cov
    }

    /// Kish effective sample size `(sum w)^2 / sum w^2`.
    pub fn effective_sample_size(&self) -> f64 {
        let sum: f64 = self.samples_wt.iter().sum();
        let sum_sq: f64 = self.samples_wt.iter().map(|wt| wt * wt).sum();
        if sum_sq > 0.0 {
            sum * sum / sum_sq
        } else {
            0.0
        }
    }

    /// Writes the result to a JSON file, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), NestError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                NestError::Serde(
                    ErrorInfo::new("result-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("result-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("result-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a result written by [`RunResult::write_json`].
    pub fn load_json(path: &Path) -> Result<Self, NestError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("result-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            NestError::Serde(
                ErrorInfo::new("result-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_result() -> RunResult {
        RunResult {
            niter: 1,
            ncalls: 3,
            time: 0.0,
            logz: 0.0,
            logzerr: 0.0,
            loglmax: 0.0,
            h: 0.0,
            samples_parvals: vec![vec![0.0, 1.0], vec![2.0, 3.0]],
            samples_wt: vec![0.25, 0.75],
            samples_logwt: vec![0.25f64.ln(), 0.75f64.ln()],
        }
    }

    #[test]
    fn weighted_moments() {
        let result = two_point_result();
        let mean = result.posterior_mean();
        assert!((mean[0] - 1.5).abs() < 1e-12);
        assert!((mean[1] - 2.5).abs() < 1e-12);
        let cov = result.posterior_covariance();
        // 0.25 * 0.75 * 2^2
        assert!((cov[0][0] - 0.75).abs() < 1e-12);
        assert!((cov[0][1] - 0.75).abs() < 1e-12);
        assert_eq!(cov[0][1], cov[1][0]);
    }

    #[test]
    fn kish_size_of_uneven_weights() {
        let result = two_point_result();
        assert!((result.effective_sample_size() - 1.0 / 0.625).abs() < 1e-12);
    }
}
