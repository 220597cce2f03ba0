//! Defines `EnumDistrib`, a normalised distribution over the domain of a discrete `Variable`.

use crate::util::{NetError, Result};
use crate::variable::Variable;

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDistrib {

    /// The discrete `Variable` this distribution is defined over
    var: Variable,

    /// One probability per value in the domain, summing to one
    probs: Vec<f64>

}

impl EnumDistrib {

    /// Construct a new `EnumDistrib` from unnormalised, non-negative weights.
    ///
    /// # Errors
    /// * `NetError::WrongKind` if `var` is continuous
    /// * `NetError::InvalidScope` if the number of weights does not match the domain
    /// * `NetError::NonPositiveProbability` if a weight is negative or not finite, or if all
    ///   weights are zero
    pub fn new(var: &Variable, weights: Vec<f64>) -> Result<Self> {
        let card = var.expect_discrete()?;
        if weights.len() != card {
            return Err(NetError::InvalidScope);
        }

        if weights.iter().any(|w| ! w.is_finite() || *w < 0.0) {
            return Err(NetError::NonPositiveProbability);
        }

        let z: f64 = weights.iter().sum();
        if z <= 0.0 {
            return Err(NetError::NonPositiveProbability);
        }

        Ok(EnumDistrib { var: var.clone(), probs: weights.into_iter().map(|w| w / z).collect() })
    }

    /// A distribution with all mass on the value with index `value`
    pub fn point(var: &Variable, value: usize) -> Result<Self> {
        let card = var.expect_discrete()?;
        if value >= card {
            return Err(NetError::InvalidValue(var.name().to_string()));
        }

        let mut probs = vec![0.0; card];
        probs[value] = 1.0;
        Ok(EnumDistrib { var: var.clone(), probs })
    }

    pub fn variable(&self) -> &Variable {
        &self.var
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// The probability of the value with index `value`; zero outside the domain
    pub fn get(&self, value: usize) -> f64 {
        self.probs.get(value).cloned().unwrap_or(0.0)
    }

    /// The probability of the value with the given label
    pub fn get_label(&self, label: &str) -> Option<f64> {
        self.var.index_of(label).map(|i| self.probs[i])
    }

    /// The index of the most probable value. Ties go to the lowest index.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = i;
            }
        }
        best
    }

}
