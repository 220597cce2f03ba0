//! Defines `VarElim`, an `InferenceEngine` that answers queries exactly by bucket elimination.
//!
//! Implementation of Dechter's bucket elimination (a variant of Koller & Friedman Algorithm 9.1,
//! Sum-Product-VE, and of its max-product counterpart) over hybrid networks. Continuous
//! `Variable`s are never eliminated: their densities ride along with the discrete entries of the
//! `Factor`s and are mixed as the discrete `Variable`s are summed out.

use crate::cpd::Node;
use crate::factor::{self, Factor};
use crate::model::{evidence_ancestors, Network, Relevance};
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};
use super::bucket::Arena;
use super::{InferenceEngine, Mode, Options, Query, QueryTable};

use itertools::Itertools;
use tracing::{debug, trace};


/// A bucket elimination engine bound to a network
pub struct VarElim<'a, N: Network> {

    /// The network to answer queries against
    network: &'a N,

    options: Options

}


impl<'a, N: Network> VarElim<'a, N> {

    /// Bind a new engine to `network`, with the default `Options`
    pub fn instantiate(network: &'a N) -> Self {
        VarElim { network, options: Options::default() }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Build a query for the posterior distribution of `vars` given `evidence`
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if a `Variable` is not part of the network
    /// * `NetError::InvalidValue` if an observation lies outside of its `Variable`'s domain
    /// * `NetError::InvalidScope` if `vars` is empty
    pub fn make_query(&self, vars: &[Variable], evidence: &Assignment) -> Result<Query> {
        self.make(Mode::Belief, vars, evidence)
    }

    /// Build a query for the most probable explanation of `vars` given `evidence`. If `vars` is
    /// empty, every unobserved `Variable` of the network is explained.
    ///
    /// # Errors
    /// * `NetError::UnknownVariable` if a `Variable` is not part of the network
    /// * `NetError::InvalidValue` if an observation lies outside of its `Variable`'s domain
    /// * `NetError::InvalidScope` if there is nothing to explain
    pub fn make_mpe(&self, vars: &[Variable], evidence: &Assignment) -> Result<Query> {
        self.make(Mode::Mpe, vars, evidence)
    }

    fn make(&self, mode: Mode, vars: &[Variable], evidence: &Assignment) -> Result<Query> {
        for v in vars.iter() {
            if self.network.node(v).is_none() {
                return Err(NetError::UnknownVariable(v.name().to_string()));
            }
        }

        for (v, val) in evidence.iter() {
            if self.network.node(v).is_none() {
                return Err(NetError::UnknownVariable(v.name().to_string()));
            }
            v.check(val)?;
        }

        let query: Vec<Variable> = if vars.is_empty() && mode == Mode::Mpe {
            self.network
                .nodes()
                .into_iter()
                .map(|n| n.variable().clone())
                .filter(|v| ! evidence.contains(v))
                .collect()
        } else {
            vars.iter().unique().cloned().collect()
        };

        if query.is_empty() {
            return Err(NetError::InvalidScope);
        }

        let relevance = if self.options.relevance_pruning {
            let relevance = self.network.relevant(&query, evidence);
            // the ancestors of the evidence carry its probability into the answer's total
            match mode {
                Mode::Belief => evidence_ancestors(self.network, relevance),
                Mode::Mpe => relevance
            }
        } else {
            Relevance {
                nodes: self.network.nodes().into_iter().map(|n| n.variable().clone()).collect(),
                evidence: evidence.clone()
            }
        };

        let eliminate: Vec<Variable> = relevance.nodes
                                                .iter()
                                                .filter(|v| ! query.contains(v) && ! relevance.evidence.contains(v))
                                                .cloned()
                                                .collect();

        debug!(
            mode = ?mode,
            query = query.len(),
            nodes = relevance.nodes.len(),
            eliminate = eliminate.len(),
            dropped_evidence = evidence.len() - relevance.evidence.len(),
            "built query"
        );

        Ok(Query::new(mode, query, relevance.evidence, eliminate, relevance.nodes))
    }

    /// Convert the node of `var` to a `Factor`, checking that the node stays within its own scope
    fn factor_of(&self, var: &Variable, evidence: &Assignment) -> Result<Factor> {
        let node = self.network.node(var).ok_or_else(|| NetError::UnknownVariable(var.name().to_string()))?;
        let f = node.make_factor(evidence)?;

        let own = |v: &Variable| v == node.variable() || node.parents().contains(v);
        if ! f.discrete().iter().chain(f.continuous().iter()).all(own) {
            return Err(NetError::MalformedNode(node.name().to_string()));
        }

        Ok(f)
    }

    /// Multiply the `Factor`s of a bucket together
    fn multiply(&self, mut factors: Vec<Factor>) -> Result<Option<Factor>> {
        if self.options.sort_factors {
            factors.sort_by_key(|f| (f.discrete().len(), f.len()));
        }

        let mut iter = factors.into_iter();
        match iter.next() {
            Some(first) => Ok(Some(iter.try_fold(first, |acc, f| factor::product(&acc, &f))?)),
            None => Ok(None)
        }
    }

    /// Sum or maximize `vars` out of `f`, according to `mode`
    fn eliminate(mode: Mode, f: &Factor, vars: &[Variable]) -> Result<Factor> {
        match mode {
            Mode::Belief => factor::marginalize(f, vars),
            Mode::Mpe => factor::maximize(f, vars)
        }
    }

}


impl<'a, N: Network> InferenceEngine for VarElim<'a, N> {

    fn infer(&self, query: &Query) -> Result<QueryTable> {
        let mode = query.mode();
        let evidence = query.evidence();

        ///////////////////////////////////////////////////////////////////////
        // 1) Build buckets: the answer bucket, then one per discrete variable to eliminate
        let order = query.elimination_order();
        let mut arena = Arena::new(&order);

        ///////////////////////////////////////////////////////////////////////
        // 2) Convert the relevant nodes and place their factors
        for var in query.nodes() {
            let f = self.factor_of(var, evidence)?;
            let limit = arena.len();
            let placed = arena.place(f, limit);
            trace!(node = var.name(), bucket = placed, "placed factor");
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Drop the buckets that have nothing to eliminate
        let purged = arena.purge();
        debug!(buckets = arena.len(), purged = purged, "eliminating");

        ///////////////////////////////////////////////////////////////////////
        // 4) Process the buckets from the last to the first
        for i in (1..arena.len()).rev() {
            let bucket = arena.take(i);

            if mode == Mode::Belief && self.options.skip_constant_buckets && bucket.is_constant() {
                trace!(bucket = i, factors = bucket.factors.len(), "ignoring constant bucket");
                continue;
            }

            let psi = match self.multiply(bucket.factors)? {
                Some(psi) => psi,
                None => continue
            };

            let tau = Self::eliminate(mode, &psi, &bucket.vars)?.mark_function();
            let routed = arena.place(tau, i);
            trace!(bucket = i, vars = bucket.vars.len(), scope = psi.discrete().len(), routed = routed, "eliminated");
        }

        ///////////////////////////////////////////////////////////////////////
        // 5) Answer from bucket 0, without eliminating any query variable
        let answer = arena.take(0);
        let psi = match self.multiply(answer.factors)? {
            Some(psi) => psi,
            None => {
                // nothing relevant is unobserved: the answer lies entirely in the evidence
                let free = query.query_variables().iter().filter(|v| ! evidence.contains(v)).count();
                if free > 0 {
                    return Err(NetError::InferenceFailed(String::from("no factor reached the answer bucket")));
                }
                Factor::scalar(1.0)
            }
        };

        // discrete variables that are neither queried nor eliminated yet
        let stray: Vec<Variable> = psi.discrete()
                                      .iter()
                                      .filter(|v| ! query.query_variables().contains(v))
                                      .cloned()
                                      .collect();
        let psi = if stray.is_empty() {
            psi
        } else {
            trace!(stray = stray.len(), "eliminating stray variables in the answer bucket");
            Self::eliminate(mode, &psi, &stray)?
        };

        QueryTable::new(mode, query.query_variables().to_vec(), evidence.clone(), psi)
    }

}
