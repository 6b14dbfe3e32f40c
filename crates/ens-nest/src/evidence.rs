/// Starting value of `logz`, standing in for `ln(0)`.
pub const LOGZ_INIT: f64 = -1e300;

/// Running evidence and information estimates.
///
/// Each discarded point contributes `logwt = logwidth + logl`. The prior
/// width starts at `ln(1 - e^(-1/nobj))` and shrinks by `1/nobj` per
/// iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceAccumulator {
    nobj: usize,
    logz: f64,
    h: f64,
    logwidth: f64,
}

impl EvidenceAccumulator {
    /// Fresh accumulator for a live set of `nobj` points.
    pub fn new(nobj: usize) -> Self {
        let step = 1.0 / nobj as f64;
        Self {
            nobj,
            logz: LOGZ_INIT,
            h: 0.0,
            logwidth: (-(-step).exp_m1()).ln(),
        }
    }

    /// Folds a point of log-likelihood `logl` at the current width and
    /// returns its log-weight.
    pub fn fold(&mut self, logl: f64) -> f64 {
        let logwt = self.logwidth + logl;
        let logz_new = log_add_exp(self.logz, logwt);
        self.h = weighted(logwt - logz_new, logl)
            + weighted(self.logz - logz_new, self.h + self.logz)
            - logz_new;
        self.logz = logz_new;
        logwt
    }

    /// Shrinks the prior width by one iteration.
    pub fn shrink(&mut self) {
        self.logwidth -= 1.0 / self.nobj as f64;
    }

    /// Sets the width shared by the remaining live points after `niter`
    /// iterations: `e^(-niter/nobj) / nobj`.
    pub fn finalize_width(&mut self, niter: usize) {
        let nobj = self.nobj as f64;
        self.logwidth = -(niter as f64) / nobj - nobj.ln();
    }

    /// Log-evidence accumulated so far.
    pub fn logz(&self) -> f64 {
        self.logz
    }

    /// Information (negative relative entropy) accumulated so far.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Current log prior width.
    pub fn logwidth(&self) -> f64 {
        self.logwidth
    }

    /// Statistical uncertainty `sqrt(h / nobj)`; rounding can push `h`
    /// slightly negative, which is clamped to zero.
    pub fn logzerr(&self) -> f64 {
        (self.h.max(0.0) / self.nobj as f64).sqrt()
    }
}

/// `exp(log_factor) * value`, treating a vanishing factor as an exact zero so
/// infinite values do not produce NaN.
fn weighted(log_factor: f64, value: f64) -> f64 {
    let factor = log_factor.exp();
    if factor == 0.0 {
        0.0
    } else {
        factor * value
    }
}

/// `ln(e^a + e^b)` without overflow.
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == f64::NEG_INFINITY {
        return hi;
    }
    if hi == f64::INFINITY {
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}
