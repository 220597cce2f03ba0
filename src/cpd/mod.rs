//! Conditional probability distributions: the local model of each node in a network, and their
//! conversion into `Factor`s with evidence folded in.

mod gaussian;
mod table;

pub use self::gaussian::GaussianCpd;
pub use self::table::TableCpd;

use crate::factor::Factor;
use crate::util::Result;
use crate::variable::{Assignment, Variable};


/// A node of a network: a `Variable` together with its distribution conditioned on its parents
pub trait Node {

    /// The `Variable` this node is a distribution over
    fn variable(&self) -> &Variable;

    /// The parents of the node, in the order their values index the distribution
    fn parents(&self) -> &[Variable];

    /// Convert the node to a `Factor`, with any observed values in `evidence` folded in.
    ///
    /// # Args
    /// * `evidence`: observed values. Only the node's own `Variable` and its parents are read.
    ///
    /// # Returns
    /// a `Factor` over the unobserved `Variable`s among the node and its parents. The `Factor` is
    /// marked as evidenced if any of them were observed.
    fn make_factor(&self, evidence: &Assignment) -> Result<Factor>;

    /// The probability (or density, for a continuous node) of the node's value given its
    /// parents' values in `assignment`.
    ///
    /// # Errors
    /// * `NetError::IncompleteAssignment` if the node or one of its parents is not assigned
    fn value(&self, assignment: &Assignment) -> Result<f64>;

    /// The name of the node, used in error reports
    fn name(&self) -> &str {
        self.variable().name()
    }

}


/// The kinds of nodes a `DirectedModel` is built from
#[derive(Clone, Debug)]
pub enum Cpd {

    /// A discrete `Variable` with discrete parents
    Table(TableCpd),

    /// A continuous `Variable`, normally distributed given its discrete parents
    Gaussian(GaussianCpd)

}

impl Node for Cpd {

    fn variable(&self) -> &Variable {
        match *self {
            Cpd::Table(ref c) => c.variable(),
            Cpd::Gaussian(ref c) => c.variable()
        }
    }

    fn parents(&self) -> &[Variable] {
        match *self {
            Cpd::Table(ref c) => c.parents(),
            Cpd::Gaussian(ref c) => c.parents()
        }
    }

    fn make_factor(&self, evidence: &Assignment) -> Result<Factor> {
        match *self {
            Cpd::Table(ref c) => c.make_factor(evidence),
            Cpd::Gaussian(ref c) => c.make_factor(evidence)
        }
    }

    fn value(&self, assignment: &Assignment) -> Result<f64> {
        match *self {
            Cpd::Table(ref c) => c.value(assignment),
            Cpd::Gaussian(ref c) => c.value(assignment)
        }
    }

}

impl From<TableCpd> for Cpd {
    fn from(c: TableCpd) -> Self {
        Cpd::Table(c)
    }
}

impl From<GaussianCpd> for Cpd {
    fn from(c: GaussianCpd) -> Self {
        Cpd::Gaussian(c)
    }
}


/// The key of the parents' values in `assignment`
fn parent_key(parents: &[Variable], assignment: &Assignment) -> Option<Vec<usize>> {
    parents.iter().map(|p| assignment.discrete(p)).collect()
}
