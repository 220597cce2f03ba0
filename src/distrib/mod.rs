//! Probability distributions returned by, and carried through, inference.
//!
//! Continuous content is represented as a `Density`: a single `Gaussian`, a `Mixture` of them, or
//! a `Degenerate` point mass for an observed value. Discrete marginals are `EnumDistrib`s.

mod enumerated;
mod gaussian;
mod mixture;

pub use self::enumerated::EnumDistrib;
pub use self::gaussian::Gaussian;
pub use self::mixture::Mixture;

use crate::util::{NetError, Result};
use crate::variable::Value;


/// The distribution of a continuous `Variable`
#[derive(Clone, Debug, PartialEq)]
pub enum Density {

    /// A single normal distribution
    Gaussian(Gaussian),

    /// A weighted mixture of normal distributions
    Mixture(Mixture),

    /// All mass on a single, observed, value
    Degenerate(f64)

}

impl Density {

    /// The density at `x`. A `Degenerate` density is treated as a mass function: one at its
    /// value, zero elsewhere.
    pub fn density(&self, x: f64) -> f64 {
        match *self {
            Density::Gaussian(ref g) => g.density(x),
            Density::Mixture(ref m) => m.density(x),
            Density::Degenerate(v) => if x == v { 1.0 } else { 0.0 }
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Density::Gaussian(ref g) => g.mean(),
            Density::Mixture(ref m) => m.mean(),
            Density::Degenerate(v) => v
        }
    }

    pub fn variance(&self) -> f64 {
        match *self {
            Density::Gaussian(ref g) => g.variance(),
            Density::Mixture(ref m) => m.variance(),
            Density::Degenerate(_) => 0.0
        }
    }

    /// The most probable value
    pub fn mode(&self) -> f64 {
        match *self {
            Density::Gaussian(ref g) => g.mode(),
            Density::Mixture(ref m) => m.mode(),
            Density::Degenerate(v) => v
        }
    }

    /// The weighted `Gaussian` components of this density
    ///
    /// # Errors
    /// * `NetError::General` for a `Degenerate` density, which has no continuous components
    pub fn components(&self) -> Result<Vec<(Gaussian, f64)>> {
        match *self {
            Density::Gaussian(ref g) => Ok(vec![(*g, 1.0)]),
            Density::Mixture(ref m) => Ok(m.components().to_vec()),
            Density::Degenerate(_) => {
                Err(NetError::General(String::from("An observed value cannot be mixed")))
            }
        }
    }

    /// Build the probability-weighted mixture of several densities. Nested mixtures are
    /// flattened, weights need not be normalised, and parts with zero weight are ignored.
    ///
    /// # Errors
    /// * `NetError::NonPositiveProbability` if no part carries positive weight or a weight is
    ///   negative
    /// * `NetError::General` if a part is `Degenerate`
    pub fn mix(parts: &[(&Density, f64)]) -> Result<Density> {
        let live: Vec<&(&Density, f64)> = parts.iter().filter(|&&(_, w)| w != 0.0).collect();

        // mixing a single density with itself is the identity
        if live.len() == 1 && live[0].1 > 0.0 {
            return Ok(live[0].0.clone());
        }

        let mut components = Vec::new();
        for &&(d, w) in live.iter() {
            for (g, cw) in d.components()? {
                components.push((g, w * cw));
            }
        }

        let m = Mixture::new(components)?;
        if m.len() == 1 {
            Ok(Density::Gaussian(m.components()[0].0))
        } else {
            Ok(Density::Mixture(m))
        }
    }

}

impl From<Gaussian> for Density {
    fn from(g: Gaussian) -> Self {
        Density::Gaussian(g)
    }
}


/// The answer to a query for a single `Variable`
#[derive(Clone, Debug, PartialEq)]
pub enum Distribution {

    /// A distribution over the domain of a discrete `Variable`
    Discrete(EnumDistrib),

    /// A density over a continuous `Variable`
    Continuous(Density)

}

impl Distribution {

    pub fn as_discrete(&self) -> Option<&EnumDistrib> {
        match *self {
            Distribution::Discrete(ref d) => Some(d),
            _ => None
        }
    }

    pub fn as_continuous(&self) -> Option<&Density> {
        match *self {
            Distribution::Continuous(ref d) => Some(d),
            _ => None
        }
    }

    /// The most probable value
    pub fn mode(&self) -> Value {
        match *self {
            Distribution::Discrete(ref d) => Value::Discrete(d.argmax()),
            Distribution::Continuous(ref d) => Value::Continuous(d.mode())
        }
    }

}
