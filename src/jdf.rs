//! Defines the `Jdf` (joint density function): the continuous content attached to one discrete
//! configuration of a `Factor`.
//!
//! Given the discrete configuration, the continuous variables are independent, so a `Jdf` is
//! simply one `Density` per continuous `Variable`.

use crate::distrib::Density;
use crate::util::Result;
use crate::variable::{Assignment, Variable};

use indexmap::IndexMap;
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Jdf {
    densities: IndexMap<Variable, Density>
}

impl Jdf {

    /// Construct an empty `Jdf`
    pub fn new() -> Self {
        Jdf { densities: IndexMap::new() }
    }

    /// Construct a `Jdf` over a single continuous `Variable`
    pub fn single(var: &Variable, density: Density) -> Result<Self> {
        let mut jdf = Jdf::new();
        jdf.set(var, density)?;
        Ok(jdf)
    }

    /// Set the density of a continuous `Variable`
    ///
    /// # Errors
    /// * `NetError::WrongKind` if `var` is discrete
    pub fn set(&mut self, var: &Variable, density: Density) -> Result<()> {
        var.expect_continuous()?;
        self.densities.insert(var.clone(), density);
        Ok(())
    }

    pub fn get(&self, var: &Variable) -> Option<&Density> {
        self.densities.get(var)
    }

    /// The `Variable`s with a density in this `Jdf`
    pub fn vars(&self) -> impl Iterator<Item = &Variable> {
        self.densities.keys()
    }

    pub fn len(&self) -> usize {
        self.densities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.densities.is_empty()
    }

    /// Union of two `Jdf`s, as needed when multiplying the `Factor`s that own them. A
    /// well-formed network never gives one `Variable` two densities; if it happens anyway the
    /// density of `self` is kept.
    pub fn merge(&self, other: &Jdf) -> Jdf {
        let mut out = self.clone();
        for (v, d) in other.densities.iter() {
            if out.densities.contains_key(v) {
                warn!(variable = v.name(), "continuous variable carried by both factors of a product");
                continue;
            }
            out.densities.insert(v.clone(), d.clone());
        }
        out
    }

    /// Mix several `Jdf`s, each weighted by the (unnormalised) weight of the discrete
    /// configuration it came from. Each `Variable` is mixed independently, over the parts that
    /// carry it, with the weights renormalised over those parts.
    pub fn mix(parts: &[(&Jdf, f64)]) -> Result<Jdf> {
        let mut out = Jdf::new();

        let mut vars: Vec<&Variable> = Vec::new();
        for &(jdf, _) in parts.iter() {
            for v in jdf.vars() {
                if ! vars.contains(&v) {
                    vars.push(v);
                }
            }
        }

        for v in vars {
            let weighted: Vec<(&Density, f64)> = parts.iter()
                                                      .filter_map(|&(jdf, w)| jdf.get(v).map(|d| (d, w)))
                                                      .collect();
            let mixed = Density::mix(&weighted)?;
            out.densities.insert(v.clone(), mixed);
        }

        Ok(out)
    }

    /// The joint density of the continuous values observed in `assignment`. `Variable`s of this
    /// `Jdf` that the assignment does not mention do not contribute.
    ///
    /// # Errors
    /// * `NetError::InvalidValue` if a `Variable` of this `Jdf` is assigned a discrete value
    pub fn density(&self, assignment: &Assignment) -> Result<f64> {
        let mut p = 1.0;
        for (v, d) in self.densities.iter() {
            if let Some(val) = assignment.get(v) {
                v.check(val)?;
                if let Some(x) = assignment.continuous(v) {
                    p *= d.density(x);
                }
            }
        }
        Ok(p)
    }

    /// The most probable value of every `Variable` in this `Jdf`
    pub fn modes(&self) -> Assignment {
        let mut a = Assignment::new();
        for (v, d) in self.densities.iter() {
            a.set_continuous(v, d.mode());
        }
        a
    }

}
