//! Defines a weighted `Mixture` of `Gaussian` distributions.
//!
//! Mixtures arise whenever the discrete configurations that a continuous variable is conditioned
//! on are summed out: each configuration contributes its own `Gaussian`, weighted by the
//! probability of that configuration.

use super::Gaussian;
use crate::util::{NetError, Result};

/// Iteration cap for the mode search
const MAX_ASCENT_STEPS: usize = 200;

/// Relative tolerance for the mode search
const ASCENT_TOLERANCE: f64 = 1e-10;


/// A finite mixture of `Gaussian`s. Weights are normalised to sum to one and no two components
/// share both mean and variance.
#[derive(Clone, Debug, PartialEq)]
pub struct Mixture {
    components: Vec<(Gaussian, f64)>
}

impl Mixture {

    /// Construct a new `Mixture`. Components with zero weight are dropped and identical
    /// components are merged; the remaining weights are normalised.
    ///
    /// # Errors
    /// * `NetError::NonPositiveProbability` if a weight is negative or not finite, or if all
    ///   weights are zero
    pub fn new(components: Vec<(Gaussian, f64)>) -> Result<Self> {
        let mut merged: Vec<(Gaussian, f64)> = Vec::with_capacity(components.len());

        for (g, w) in components {
            if ! w.is_finite() || w < 0.0 {
                return Err(NetError::NonPositiveProbability);
            }
            if w == 0.0 {
                continue;
            }

            if let Some(c) = merged.iter_mut().find(|c| c.0 == g) {
                c.1 += w;
            } else {
                merged.push((g, w));
            }
        }

        let z: f64 = merged.iter().map(|&(_, w)| w).sum();
        if z <= 0.0 {
            return Err(NetError::NonPositiveProbability);
        }

        for c in merged.iter_mut() {
            c.1 /= z;
        }

        Ok(Mixture { components: merged })
    }

    /// The weighted components of the `Mixture`
    pub fn components(&self) -> &[(Gaussian, f64)] {
        &self.components
    }

    /// The number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The probability density at `x`
    pub fn density(&self, x: f64) -> f64 {
        self.components.iter().map(|&(ref g, w)| w * g.density(x)).sum()
    }

    pub fn mean(&self) -> f64 {
        self.components.iter().map(|&(ref g, w)| w * g.mean()).sum()
    }

    pub fn variance(&self) -> f64 {
        let m = self.mean();
        let second: f64 = self.components
                              .iter()
                              .map(|&(ref g, w)| w * (g.variance() + g.mean() * g.mean()))
                              .sum();
        (second - m * m).max(0.0)
    }

    /// The most probable value of the `Mixture`.
    ///
    /// There is no closed form, so a fixed-point ascent is started from every component mean and
    /// the point with the highest density is returned. Ties go to the earliest component.
    pub fn mode(&self) -> f64 {
        let mut best: Option<(f64, f64)> = None;

        for &(ref g, _) in self.components.iter() {
            let x = self.ascend(g.mean());
            let d = self.density(x);
            match best {
                Some((_, bd)) if d <= bd => (),
                _ => best = Some((x, d))
            }
        }

        best.map_or(0.0, |(x, _)| x)
    }

    /// Climb from `start` to the nearest local maximum of the density
    fn ascend(&self, start: f64) -> f64 {
        let mut x = start;

        for _ in 0..MAX_ASCENT_STEPS {
            let mut num = 0.0;
            let mut den = 0.0;
            for &(ref g, w) in self.components.iter() {
                let r = w * g.density(x) / g.variance();
                num += r * g.mean();
                den += r;
            }

            // every component has underflowed at x; there is nowhere to climb
            if den <= 0.0 || ! den.is_finite() {
                break;
            }

            let next = num / den;
            let done = (next - x).abs() <= ASCENT_TOLERANCE * x.abs().max(1.0);
            x = next;
            if done {
                break;
            }
        }

        x
    }

}
