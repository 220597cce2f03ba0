//! Defines a `TableCpd`: a discrete `Variable` whose distribution is tabulated for every
//! configuration of its (discrete) parents.

use super::{parent_key, Node};
use crate::factor::{Factor, Table};
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};

use itertools::Itertools;
use ndarray::prelude as nd;

/// Tolerance on each row of a CPD summing to one
const ROW_TOLERANCE: f64 = 1e-3;


#[derive(Clone, Debug)]
pub struct TableCpd {

    var: Variable,

    parents: Vec<Variable>,

    /// Indexed by `[parents..., var]`. Every slice over the last axis sums to one.
    table: Table

}

impl TableCpd {

    /// Create a new `TableCpd`
    ///
    /// # Args
    /// * `var`: the discrete `Variable` the distribution is over
    /// * `parents`: the discrete parents, in the order of the table's leading axes
    /// * `table`: the conditional probabilities, with shape `[parents..., var]`
    ///
    /// # Errors
    /// * `NetError::WrongKind` if `var` or a parent is continuous
    /// * `NetError::DuplicateVariable` if a `Variable` appears twice
    /// * `NetError::InvalidScope` if the shape of the table does not match the `Variable`s
    /// * `NetError::NonPositiveProbability` if an entry is negative or not finite
    /// * `NetError::MalformedNode` if a row does not sum to one
    pub fn new(var: &Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        var.expect_discrete()?;
        for p in parents.iter() {
            p.expect_discrete()?;
        }

        if parents.iter().chain(Some(var)).unique().count() != parents.len() + 1 {
            return Err(NetError::DuplicateVariable);
        }

        let shape: Vec<usize> = parents.iter().chain(Some(var)).map(|v| v.cardinality()).collect();
        if table.shape() != shape.as_slice() {
            return Err(NetError::InvalidScope);
        }

        if table.iter().any(|&p| ! p.is_finite() || p < 0.0) {
            return Err(NetError::NonPositiveProbability);
        }

        let sums = table.sum_axis(nd::Axis(parents.len()));
        if sums.iter().any(|&z| (z - 1.0).abs() > ROW_TOLERANCE) {
            return Err(NetError::MalformedNode(var.name().to_string()));
        }

        Ok(TableCpd { var: var.clone(), parents, table })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The full `Factor` over `[parents..., var]`, with no evidence
    pub fn factor(&self) -> Result<Factor> {
        let scope: Vec<Variable> = self.parents.iter().chain(Some(&self.var)).cloned().collect();
        Ok(Factor::new(scope, self.table.clone())?.with_head(&self.var))
    }

}

impl Node for TableCpd {

    fn variable(&self) -> &Variable {
        &self.var
    }

    fn parents(&self) -> &[Variable] {
        &self.parents
    }

    fn make_factor(&self, evidence: &Assignment) -> Result<Factor> {
        self.factor()?.reduce(evidence)
    }

    fn value(&self, assignment: &Assignment) -> Result<f64> {
        let mut key = parent_key(&self.parents, assignment).ok_or(NetError::IncompleteAssignment)?;
        key.push(assignment.discrete(&self.var).ok_or(NetError::IncompleteAssignment)?);

        self.table
            .get(nd::IxDyn(&key))
            .cloned()
            .ok_or_else(|| NetError::InvalidValue(self.var.name().to_string()))
    }

}


#[cfg(test)]
mod tests {

    use super::*;

    fn sprinkler() -> (Variable, Variable, TableCpd) {
        let rain = Variable::boolean("Rain");
        let wet = Variable::boolean("Wet");
        let cpd = TableCpd::new(&wet, vec![rain.clone()], array![[0.9, 0.1], [0.2, 0.8]].into_dyn()).unwrap();
        (rain, wet, cpd)
    }

    #[test]
    fn construct() {
        let (rain, wet, cpd) = sprinkler();
        assert_eq!(cpd.variable(), &wet);
        assert_eq!(cpd.parents(), &[rain.clone()]);
        assert_eq!(cpd.name(), "Wet");

        let mut a = Assignment::new();
        a.set(&rain, 1);
        a.set(&wet, 0);
        assert_eq!(cpd.value(&a).unwrap(), 0.2);

        a.remove(&rain);
        match cpd.value(&a) {
            Err(NetError::IncompleteAssignment) => (),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn construct_errs() {
        let a = Variable::binary("A");
        let b = Variable::discrete("B", 3);

        // rows do not sum to one
        match TableCpd::new(&a, vec![], array![0.5, 0.6].into_dyn()) {
            Err(NetError::MalformedNode(name)) => assert_eq!(name, "A"),
            _ => panic!("wrong error type")
        };

        // but small slack is allowed
        assert!(TableCpd::new(&a, vec![], array![0.5, 0.5004].into_dyn()).is_ok());

        // wrong shape
        match TableCpd::new(&a, vec![b.clone()], array![[0.5, 0.5], [0.5, 0.5]].into_dyn()) {
            Err(NetError::InvalidScope) => (),
            _ => panic!("wrong error type")
        };

        // self parent
        assert!(TableCpd::new(&a, vec![a.clone()], array![[0.5, 0.5], [0.5, 0.5]].into_dyn()).is_err());

        // continuous child
        assert!(TableCpd::new(&Variable::continuous("X"), vec![], array![1.0].into_dyn()).is_err());
    }

    #[test]
    fn factor_without_evidence() {
        let (rain, wet, cpd) = sprinkler();
        let f = cpd.make_factor(&Assignment::new()).unwrap();
        assert_eq!(f.discrete(), &[rain.clone(), wet.clone()]);
        assert_eq!(f.head(), Some(&wet));
        assert!(! f.is_evidenced());
        assert!(! f.is_function());
    }

    #[test]
    fn factor_child_observed() {
        let (rain, wet, cpd) = sprinkler();
        let mut e = Assignment::new();
        e.set(&wet, 1);

        let f = cpd.make_factor(&e).unwrap();
        assert_eq!(f.discrete(), &[rain.clone()]);
        assert!(f.is_evidenced());
        assert!(f.head().is_none());
        assert_eq!(f.weight_at(&[0]), 0.1);
        assert_eq!(f.weight_at(&[1]), 0.8);
    }

    #[test]
    fn factor_all_observed() {
        let (rain, wet, cpd) = sprinkler();
        let mut e = Assignment::new();
        e.set(&wet, 1);
        e.set(&rain, 0);

        let f = cpd.make_factor(&e).unwrap();
        assert!(f.is_atomic());
        assert!((f.total() - 0.1).abs() < 1e-12);
    }

}
