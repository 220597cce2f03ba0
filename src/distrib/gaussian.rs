//! Defines a univariate `Gaussian` distribution

use crate::util::{NetError, Result};

use std::f64::consts::PI;

/// A univariate normal distribution, parameterised by mean and variance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gaussian {

    /// The mean of the distribution
    mean: f64,

    /// The variance of the distribution. Always strictly positive.
    variance: f64

}

impl Gaussian {

    /// Construct a new `Gaussian`
    ///
    /// # Errors
    /// * `NetError::InvalidInitialization` if the mean is not finite or the variance is not a
    ///   finite, strictly positive number
    pub fn new(mean: f64, variance: f64) -> Result<Self> {
        if ! mean.is_finite() || ! variance.is_finite() || variance <= 0.0 {
            return Err(NetError::InvalidInitialization);
        }

        Ok(Gaussian { mean, variance })
    }

    /// The standard normal distribution
    pub fn standard() -> Self {
        Gaussian { mean: 0.0, variance: 1.0 }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// The most probable value, which for a normal distribution is its mean
    pub fn mode(&self) -> f64 {
        self.mean
    }

    /// The probability density at `x`
    pub fn density(&self, x: f64) -> f64 {
        let d = x - self.mean;
        (-d * d / (2.0 * self.variance)).exp() / (2.0 * PI * self.variance).sqrt()
    }

    /// The natural logarithm of the probability density at `x`
    pub fn log_density(&self, x: f64) -> f64 {
        let d = x - self.mean;
        -d * d / (2.0 * self.variance) - 0.5 * (2.0 * PI * self.variance).ln()
    }

}
