//! Defines the `QueryTable`: the solved answer to one `Query`.

use crate::distrib::{Density, Distribution, EnumDistrib};
use crate::factor::{EntryView, Factor};
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};
use super::Mode;


/// The result of inference: the final `Factor` over the query `Variable`s, renormalised to sum to
/// one. A `QueryTable` is immutable once built and answers marginal, conditional and MPE queries
/// without running elimination again.
#[derive(Clone, Debug)]
pub struct QueryTable {

    mode: Mode,

    /// Q
    query: Vec<Variable>,

    /// The evidence the answer is conditioned on
    evidence: Assignment,

    /// The normalised answer
    factor: Factor,

    /// The total weight of the answer before normalisation
    total: f64

}


impl QueryTable {

    /// Build a table from the answer `Factor` of an elimination
    ///
    /// # Errors
    /// * `NetError::InferenceFailed` if the `Factor` carries no weight, i.e. the evidence is
    ///   impossible
    pub(crate) fn new(mode: Mode, query: Vec<Variable>, evidence: Assignment, factor: Factor) -> Result<Self> {
        let total = factor.total();
        if ! (total > 0.0 && total.is_finite()) {
            return Err(NetError::InferenceFailed(format!("the answer has total weight {}", total)));
        }

        Ok(QueryTable { mode, query, evidence, factor: factor.scale(1.0 / total), total })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn query_variables(&self) -> &[Variable] {
        &self.query
    }

    pub fn evidence(&self) -> &Assignment {
        &self.evidence
    }

    /// The normalised answer `Factor`
    pub fn factor(&self) -> &Factor {
        &self.factor
    }

    /// Check if no discrete query `Variable` remains in the answer
    pub fn is_atomic(&self) -> bool {
        self.factor.is_atomic()
    }

    /// The total weight of the answer before normalisation. In `Mode::Belief` this is the
    /// probability (or density) of the evidence the query was conditioned on, i.e. `evidence()`.
    /// In `Mode::Mpe` it is only the normalising constant of the max-product answer.
    pub fn likelihood(&self) -> f64 {
        self.total
    }

    pub fn log_likelihood(&self) -> f64 {
        self.total.ln()
    }

    /// The distribution of a single query `Variable`
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if `var` is not a query `Variable`
    pub fn query(&self, var: &Variable) -> Result<Distribution> {
        self.query_given(var, &Assignment::new())
    }

    /// The distribution of a discrete query `Variable`
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if `var` is not a query `Variable`
    /// * `NetError::WrongKind` if `var` is continuous
    pub fn query_discrete(&self, var: &Variable) -> Result<EnumDistrib> {
        self.check_known(var)?;
        var.expect_discrete()?;
        match self.query(var)? {
            Distribution::Discrete(d) => Ok(d),
            Distribution::Continuous(_) => Err(NetError::WrongKind { name: var.name().to_string(), expected: "discrete" })
        }
    }

    /// The density of a continuous query `Variable`
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if `var` is not a query `Variable`
    /// * `NetError::WrongKind` if `var` is discrete
    pub fn query_continuous(&self, var: &Variable) -> Result<Density> {
        self.check_known(var)?;
        var.expect_continuous()?;
        match self.query(var)? {
            Distribution::Continuous(d) => Ok(d),
            Distribution::Discrete(_) => Err(NetError::WrongKind { name: var.name().to_string(), expected: "continuous" })
        }
    }

    /// The distribution of a single query `Variable`, conditioned on the values of other query
    /// `Variable`s. Discrete values select the consistent entries; continuous values weigh each
    /// entry by its density at those values.
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if `var` or a `Variable` in `given` is not a query `Variable`
    /// * `NetError::InvalidScope` if `given` assigns `var` itself
    /// * `NetError::NonPositiveProbability` if `given` has zero probability
    pub fn query_given(&self, var: &Variable, given: &Assignment) -> Result<Distribution> {
        self.check_known(var)?;
        for v in given.vars() {
            self.check_known(v)?;
        }
        if given.contains(var) {
            return Err(NetError::InvalidScope);
        }

        // an observed variable answers with its observation
        if let Some(value) = self.evidence.get(var) {
            return match self.evidence.discrete(var) {
                Some(k) => Ok(Distribution::Discrete(EnumDistrib::point(var, k)?)),
                None => {
                    var.check(value)?;
                    let x = self.evidence.continuous(var).ok_or_else(|| NetError::InvalidValue(var.name().to_string()))?;
                    Ok(Distribution::Continuous(Density::Degenerate(x)))
                }
            };
        }

        let entries = self.consistent(given)?;

        if var.is_discrete() {
            let pos = self.factor
                          .discrete()
                          .iter()
                          .position(|v| v == var)
                          .ok_or_else(|| NetError::InferenceFailed(format!("{} is missing from the answer", var)))?;

            let mut weights = vec![0.0; var.cardinality()];
            for (e, w) in entries.iter() {
                weights[e.key[pos]] += w;
            }
            Ok(Distribution::Discrete(EnumDistrib::new(var, weights)?))
        } else {
            let parts: Vec<(&Density, f64)> = entries.iter()
                                                     .filter_map(|(e, w)| e.jdf.and_then(|j| j.get(var)).map(|d| (d, *w)))
                                                     .collect();
            if parts.is_empty() {
                return Err(NetError::InferenceFailed(format!("{} is missing from the answer", var)));
            }
            Ok(Distribution::Continuous(Density::mix(&parts)?))
        }
    }

    /// The total normalised weight of the entries consistent with the discrete values of
    /// `partial`, each scaled by its density at the continuous values of `partial`.
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if a `Variable` in `partial` is not a query `Variable`
    pub fn sum(&self, partial: &Assignment) -> Result<f64> {
        for v in partial.vars() {
            self.check_known(v)?;
        }
        Ok(self.consistent(partial)?.iter().map(|(_, w)| w).sum())
    }

    /// The most probable explanation: the value of every query `Variable` at the largest entry
    /// (ties go to the first in row-major order), together with the values of any `Variable`s
    /// maximized out on the way there. Continuous `Variable`s take the mode of their density.
    ///
    /// # Errors
    /// * `NetError::InferenceFailed` if a query `Variable` cannot be explained
    pub fn mpe(&self) -> Result<Assignment> {
        let (_, mut explanation) = self.factor
                                       .argmax()
                                       .ok_or_else(|| NetError::InferenceFailed(String::from("the answer is empty")))?;

        for q in self.query.iter() {
            if let Some(value) = self.evidence.get(q) {
                explanation.set_value(q, *value);
            }
        }

        if let Some(q) = self.query.iter().find(|q| ! explanation.contains(q)) {
            return Err(NetError::InferenceFailed(format!("no value explains {}", q)));
        }

        Ok(explanation)
    }

    fn check_known(&self, var: &Variable) -> Result<()> {
        if self.query.contains(var) {
            Ok(())
        } else {
            Err(NetError::UnknownVariable(var.name().to_string()))
        }
    }

    /// The entries consistent with `given`, with their weight scaled by the density of the
    /// continuous values in `given`. Observed query `Variable`s must agree with the evidence.
    fn consistent(&self, given: &Assignment) -> Result<Vec<(EntryView, f64)>> {
        for (v, val) in given.iter() {
            v.check(val)?;
            if let Some(obs) = self.evidence.get(v) {
                if obs != val {
                    return Ok(Vec::new());
                }
            }
        }

        let positions: Vec<(usize, usize)> = self.factor
                                                 .discrete()
                                                 .iter()
                                                 .enumerate()
                                                 .filter_map(|(i, v)| given.discrete(v).map(|k| (i, k)))
                                                 .collect();

        let mut out = Vec::new();
        for e in self.factor.entries() {
            if positions.iter().any(|&(i, k)| e.key[i] != k) {
                continue;
            }
            let scale = match e.jdf {
                Some(jdf) => jdf.density(given)?,
                None => 1.0
            };
            let w = e.weight * scale;
            out.push((e, w));
        }

        Ok(out)
    }

}
