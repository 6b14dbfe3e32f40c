//! Callback contract between the sampler and a user model.

use std::convert::Infallible;

/// A model evaluated by the nested sampler.
///
/// `prior_transform` maps a point of the unit cube `[0, 1)^npar` to parameter
/// space under the model prior; `log_likelihood` evaluates the parameters.
/// Errors returned by either callback are propagated to the caller unchanged.
pub trait Model {
    /// Error reported by the callbacks.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Transforms a unit-cube position into a parameter vector.
    fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>, Self::Error>;

    /// Evaluates the log-likelihood of a parameter vector.
    fn log_likelihood(&self, params: &[f64]) -> Result<f64, Self::Error>;
}

/// Adapter turning two infallible closures into a [`Model`].
#[derive(Debug, Clone, Copy)]
pub struct FnModel<L, P> {
    loglikelihood: L,
    prior: P,
}

impl<L, P> FnModel<L, P>
where
    L: Fn(&[f64]) -> f64,
    P: Fn(&[f64]) -> Vec<f64>,
{
    /// Wraps a log-likelihood closure and a prior transform closure.
    pub fn new(loglikelihood: L, prior: P) -> Self {
        Self {
            loglikelihood,
            prior,
        }
    }
}

impl<L, P> Model for FnModel<L, P>
where
    L: Fn(&[f64]) -> f64,
    P: Fn(&[f64]) -> Vec<f64>,
{
    type Error = Infallible;

    fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok((self.prior)(u))
    }

    fn log_likelihood(&self, params: &[f64]) -> Result<f64, Self::Error> {
        Ok((self.loglikelihood)(params))
    }
}

impl<M: Model + ?Sized> Model for &M {
    type Error = M::Error;

    fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>, Self::Error> {
        (**self).prior_transform(u)
    }

    fn log_likelihood(&self, params: &[f64]) -> Result<f64, Self::Error> {
        (**self).log_likelihood(params)
    }
}
