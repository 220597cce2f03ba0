//! Defines the `Network` trait: the view of a Bayesian network that inference needs, and the
//! `DirectedModel` that implements it.

use crate::cpd::Node;
use crate::variable::{Assignment, Variable};

mod relevance;

pub mod directed;

pub use self::relevance::{bayes_ball, evidence_ancestors};


/// The part of a network that can influence a query, given the evidence
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Relevance {

    /// The `Variable`s whose nodes are needed to answer the query, in topological order
    pub nodes: Vec<Variable>,

    /// The observations that can influence the query
    pub evidence: Assignment

}


/// The `Network` trait represents a Bayesian network: a set of nodes, each a distribution over
/// one `Variable` conditioned on its parents.
pub trait Network {

    /// The concrete type of the nodes in the network
    type Node: Node;

    /// All nodes of the network, in a topological order: every node comes after its parents
    fn nodes(&self) -> Vec<&Self::Node>;

    /// Lookup the node of a `Variable`
    fn node(&self, var: &Variable) -> Option<&Self::Node>;

    /// Determine the nodes and evidence relevant to `query`.
    ///
    /// The default is the Bayes-ball algorithm, which returns exactly the requisite nodes.
    fn relevant(&self, query: &[Variable], evidence: &Assignment) -> Relevance {
        bayes_ball(self, query, evidence)
    }

}
