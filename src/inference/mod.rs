//! Defines the interface to the inference engine: queries, their modes and the options that tune
//! elimination.

use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};

use std::collections::HashSet;

mod bucket;
mod query_table;
mod variable_elimination;

pub use self::query_table::QueryTable;
pub use self::variable_elimination::VarElim;


/// An `InferenceEngine` answers `Query`s it has built against the network it is bound to
pub trait InferenceEngine {

    /// Answer a `Query`
    fn infer(&self, query: &Query) -> Result<QueryTable>;

}


/// What a `Query` computes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {

    /// The posterior distribution of the query variables: eliminated variables are summed out
    Belief,

    /// The most probable explanation: eliminated variables are maximized out
    Mpe

}


/// Tuning knobs for the elimination. None of them change the answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {

    /// Restrict elimination to the nodes and evidence that can influence the query. When
    /// disabled, every node and all evidence are used.
    pub relevance_pruning: bool,

    /// Skip buckets whose output is identically one (belief queries only)
    pub skip_constant_buckets: bool,

    /// Multiply the factors of a bucket smallest first
    pub sort_factors: bool

}

impl Default for Options {
    fn default() -> Self {
        Options { relevance_pruning: true, skip_constant_buckets: true, sort_factors: true }
    }
}

impl Options {

    pub fn with_relevance_pruning(mut self, on: bool) -> Self {
        self.relevance_pruning = on;
        self
    }

    pub fn with_skip_constant_buckets(mut self, on: bool) -> Self {
        self.skip_constant_buckets = on;
        self
    }

    pub fn with_sort_factors(mut self, on: bool) -> Self {
        self.sort_factors = on;
        self
    }

}


/// A query against a network: which `Variable`s are sought (Q), which are observed (E), and which
/// must be eliminated (X).
#[derive(Clone, Debug)]
pub struct Query {

    mode: Mode,

    /// Q, in the order requested
    query: Vec<Variable>,

    /// E, restricted to the observations relevant to Q
    evidence: Assignment,

    /// X: the relevant `Variable`s outside of Q and E. Discrete ones come first, in elimination
    /// order.
    eliminate: Vec<Variable>,

    /// The `Variable`s whose nodes take part, in topological order
    nodes: Vec<Variable>

}

impl Query {

    pub(crate) fn new(
        mode: Mode,
        query: Vec<Variable>,
        evidence: Assignment,
        eliminate: Vec<Variable>,
        nodes: Vec<Variable>
    ) -> Self {
        let (mut discrete, continuous): (Vec<Variable>, Vec<Variable>) = eliminate.into_iter()
                                                                                  .partition(|v| v.is_discrete());
        discrete.extend(continuous);
        Query { mode, query, evidence, eliminate: discrete, nodes }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The query `Variable`s
    pub fn query_variables(&self) -> &[Variable] {
        &self.query
    }

    /// The relevant evidence
    pub fn evidence(&self) -> &Assignment {
        &self.evidence
    }

    /// The `Variable`s to eliminate
    pub fn eliminate(&self) -> &[Variable] {
        &self.eliminate
    }

    /// The discrete `Variable`s to eliminate, in elimination order
    pub fn elimination_order(&self) -> Vec<Variable> {
        self.eliminate.iter().filter(|v| v.is_discrete()).cloned().collect()
    }

    /// The `Variable`s whose nodes take part in the elimination
    pub fn nodes(&self) -> &[Variable] {
        &self.nodes
    }

    /// Override the order in which the discrete `Variable`s of X are eliminated. Buckets are
    /// processed from the last `Variable` in `order` to the first.
    ///
    /// # Errors
    /// * `NetError::InvalidScope` if `order` is not a permutation of the discrete `Variable`s to
    ///   eliminate
    pub fn set_elimination_order(&mut self, order: Vec<Variable>) -> Result<()> {
        let current: HashSet<Variable> = self.elimination_order().into_iter().collect();
        let requested: HashSet<Variable> = order.iter().cloned().collect();
        if requested.len() != order.len() || current != requested {
            return Err(NetError::InvalidScope);
        }

        let continuous: Vec<Variable> = self.eliminate.iter().filter(|v| v.is_continuous()).cloned().collect();
        self.eliminate = order;
        self.eliminate.extend(continuous);
        Ok(())
    }

}


#[cfg(test)]
/// Tests for the inference engine as a whole: the scenarios of exact inference that every part of
/// the elimination has to get right together.
///
/// The student network is derived from Koller & Friedman's student example. Example 6d of [1]
/// provides the result of exact inference of P(I | D=0, L=1, S=0) on a modified version of it.
///
/// [1] https://www.uni-oldenburg.de/en/lcs/probabilistic-programming/webchurch-and-openbugs/
mod tests {
    use super::*;
    use crate::cpd::{Cpd, TableCpd};
    use crate::distrib::{Density, Gaussian};
    use crate::init::Initialization;
    use crate::model::directed::{DirectedModel, DirectedModelBuilder};

    /// Utility function to build the student inference example
    fn build_student_example() -> (Variable, DirectedModel, Assignment) {
        let d = Variable::binary("D");
        let i = Variable::binary("I");
        let g = Variable::binary("G");
        let s = Variable::binary("S");
        let l = Variable::binary("L");

        let cpd_g = TableCpd::new(
            &g,
            vec![i.clone(), d.clone()],
            array![[[0.3, 0.7], [0.05, 0.95]],
                   [[0.9, 0.1], [0.5, 0.5]]].into_dyn()
        ).unwrap();

        let builder = DirectedModelBuilder::new();
        let model = builder.with_variable(&d, vec![], Initialization::Binomial(0.6))
                           .with_variable(&i, vec![], Initialization::Binomial(0.7))
                           .with_cpd(Cpd::from(cpd_g))
                           .with_variable(&s, vec![i.clone()], Initialization::Table(array![[0.95, 0.05], [0.2, 0.8]].into_dyn()))
                           .with_variable(&l, vec![g.clone()], Initialization::Table(array![[0.9, 0.1], [0.4, 0.6]].into_dyn()))
                           .build()
                           .unwrap();

        let mut evidence = Assignment::new();
        evidence.set(&d, 0);
        evidence.set(&l, 1);
        evidence.set(&s, 0);

        (i, model, evidence)
    }

    /// A -> B -> C: a uniform prior on A, B independent of A, C a copy of B
    fn build_chain() -> (Vec<Variable>, DirectedModel) {
        let a = Variable::binary("A");
        let b = Variable::binary("B");
        let c = Variable::binary("C");

        let model = DirectedModelBuilder::new()
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .with_variable(&b, vec![a.clone()], Initialization::Uniform)
                        .with_variable(&c, vec![b.clone()], Initialization::Table(array![[1.0, 0.0], [0.0, 1.0]].into_dyn()))
                        .build()
                        .unwrap();

        (vec![a, b, c], model)
    }

    /// R -> P -> X, with X normally distributed given P
    fn build_hybrid() -> (Vec<Variable>, DirectedModel) {
        let r = Variable::binary("R");
        let p = Variable::binary("P");
        let x = Variable::continuous("X");

        let model = DirectedModelBuilder::new()
                        .with_variable(&r, vec![], Initialization::Binomial(0.7))
                        .with_variable(&p, vec![r.clone()], Initialization::Table(array![[0.9, 0.1], [0.2, 0.8]].into_dyn()))
                        .with_variable(&x, vec![p.clone()], Initialization::Gaussians(&[(0.0, 1.0), (5.0, 1.0)]))
                        .build()
                        .unwrap();

        (vec![r, p, x], model)
    }

    #[test]
    fn student() {
        let (i, model, evidence) = build_student_example();

        for options in vec![Options::default(), Options::default().with_relevance_pruning(false)] {
            let engine = VarElim::instantiate(&model).with_options(options);
            let query = engine.make_query(&[i.clone()], &evidence).unwrap();

            // the result should be the same on subsequent iterations
            for _ in 0..10 {
                let table = engine.infer(&query).unwrap();
                let dist = table.query(&i).unwrap();
                let p = dist.as_discrete().unwrap().get(1);
                assert!((p - 0.02919708).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn chain_belief() {
        let (v, model) = build_chain();
        let engine = VarElim::instantiate(&model);

        let mut e = Assignment::new();
        e.set(&v[2], 1);

        let table = engine.infer(&engine.make_query(&[v[0].clone()], &e).unwrap()).unwrap();
        let dist = table.query(&v[0]).unwrap();
        let dist = dist.as_discrete().unwrap();
        assert!((dist.get(0) - 0.5).abs() < 1e-12);
        assert!((dist.get(1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn chain_mpe() {
        let (v, model) = build_chain();
        let engine = VarElim::instantiate(&model);

        let mut e = Assignment::new();
        e.set(&v[2], 1);

        let query = engine.make_mpe(&[], &e).unwrap();
        assert_eq!(query.query_variables(), &[v[0].clone(), v[1].clone()]);

        let mpe = engine.infer(&query).unwrap().mpe().unwrap();
        // A is a tie, broken towards the first value; B must agree with C
        assert_eq!(mpe.discrete(&v[0]), Some(0));
        assert_eq!(mpe.discrete(&v[1]), Some(1));
    }

    #[test]
    fn observed_query_variable() {
        let (v, model) = build_chain();
        let engine = VarElim::instantiate(&model);

        let mut e = Assignment::new();
        e.set(&v[2], 1);

        let table = engine.infer(&engine.make_query(&[v[1].clone(), v[2].clone()], &e).unwrap()).unwrap();
        let dist = table.query(&v[2]).unwrap();
        assert_eq!(dist.as_discrete().unwrap().probs(), &[0.0, 1.0]);
        let dist = table.query(&v[1]).unwrap();
        assert!((dist.as_discrete().unwrap().get(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn continuous_leaf_is_a_mixture() {
        let (v, model) = build_hybrid();
        let engine = VarElim::instantiate(&model);

        // P(P = 1) = 0.7 * 0.1 + 0.3 * 0.8
        let p1 = 0.31;

        let table = engine.infer(&engine.make_query(&[v[2].clone()], &Assignment::new()).unwrap()).unwrap();
        assert!(table.is_atomic());

        let density = table.query(&v[2]).unwrap();
        let comps = density.as_continuous().unwrap().components().unwrap();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].0, Gaussian::new(0.0, 1.0).unwrap());
        assert!((comps[0].1 - (1.0 - p1)).abs() < 1e-12);
        assert!((comps[1].1 - p1).abs() < 1e-12);

        // the explanation of an atomic result is the mode of the mixture
        let mpe = table.mpe().unwrap();
        let mode = density.as_continuous().unwrap().mode();
        assert_eq!(mpe.continuous(&v[2]), Some(mode));
    }

    #[test]
    fn continuous_evidence() {
        let (v, model) = build_hybrid();
        let engine = VarElim::instantiate(&model);

        let mut e = Assignment::new();
        e.set_continuous(&v[2], 4.0);

        let table = engine.infer(&engine.make_query(&[v[1].clone()], &e).unwrap()).unwrap();

        let g0 = Gaussian::new(0.0, 1.0).unwrap().density(4.0);
        let g1 = Gaussian::new(5.0, 1.0).unwrap().density(4.0);
        let expected = 0.31 * g1 / (0.69 * g0 + 0.31 * g1);

        let dist = table.query(&v[1]).unwrap();
        assert!((dist.as_discrete().unwrap().get(1) - expected).abs() < 1e-12);
        assert!((table.likelihood() - (0.69 * g0 + 0.31 * g1)).abs() < 1e-12);

        // an observed continuous query variable answers with its observation
        let table = engine.infer(&engine.make_query(&[v[2].clone()], &e).unwrap()).unwrap();
        assert_eq!(table.query(&v[2]).unwrap().as_continuous(), Some(&Density::Degenerate(4.0)));
    }

    #[test]
    fn likelihood_of_pruned_evidence() {
        let (v, model) = build_hybrid();

        // X depends on R only through the observed P, yet P(P = 1) still needs R
        let mut e = Assignment::new();
        e.set(&v[1], 1);

        for options in vec![Options::default(), Options::default().with_relevance_pruning(false)] {
            let engine = VarElim::instantiate(&model).with_options(options);
            let table = engine.infer(&engine.make_query(&[v[2].clone()], &e).unwrap()).unwrap();

            assert!((table.likelihood() - 0.31).abs() < 1e-12);
            assert_eq!(table.query_continuous(&v[2]).unwrap(), Density::from(Gaussian::new(5.0, 1.0).unwrap()));
        }
    }

    #[test]
    fn continuous_query_given_parent() {
        let (v, model) = build_hybrid();
        let engine = VarElim::instantiate(&model);

        let table = engine.infer(&engine.make_query(&[v[1].clone(), v[2].clone()], &Assignment::new()).unwrap()).unwrap();

        let mut given = Assignment::new();
        given.set(&v[1], 1);
        let d = table.query_given(&v[2], &given).unwrap();
        assert_eq!(d.as_continuous(), Some(&Density::from(Gaussian::new(5.0, 1.0).unwrap())));
    }

    #[test]
    fn order_invariance() {
        let (i, model, evidence) = build_student_example();
        let engine = VarElim::instantiate(&model).with_options(Options::default().with_relevance_pruning(false));

        let g = model.lookup_variable("G").unwrap().clone();
        let query = engine.make_query(&[g.clone()], &evidence).unwrap();
        let order = query.elimination_order();
        assert_eq!(order, vec![i.clone()]);

        let mut query = engine.make_query(&[model.lookup_variable("D").unwrap().clone()], &Assignment::new()).unwrap();
        let forward = engine.infer(&query).unwrap();

        let mut order = query.elimination_order();
        order.reverse();
        query.set_elimination_order(order).unwrap();
        let backward = engine.infer(&query).unwrap();

        let d = model.lookup_variable("D").unwrap();
        let f = forward.query(d).unwrap();
        let b = backward.query(d).unwrap();
        for k in 0..2 {
            assert!((f.as_discrete().unwrap().get(k) - b.as_discrete().unwrap().get(k)).abs() < 1e-12);
        }
        assert!((f.as_discrete().unwrap().get(0) - 0.6).abs() < 1e-12);

        // not a permutation
        assert!(query.set_elimination_order(vec![g]).is_err());
    }

    #[test]
    fn query_errors() {
        let (v, model) = build_chain();
        let engine = VarElim::instantiate(&model);

        // a variable from another network
        let stranger = Variable::binary("Z");
        match engine.make_query(&[stranger.clone()], &Assignment::new()) {
            Err(NetError::UnknownVariable(name)) => assert_eq!(name, "Z"),
            _ => panic!("wrong error type")
        };

        // an out of range observation
        let mut e = Assignment::new();
        e.set(&v[2], 2);
        assert!(engine.make_query(&[v[0].clone()], &e).is_err());

        // querying the result for a variable outside of Q
        let table = engine.infer(&engine.make_query(&[v[0].clone()], &Assignment::new()).unwrap()).unwrap();
        match table.query(&v[1]) {
            Err(NetError::UnknownVariable(name)) => assert_eq!(name, "B"),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn impossible_evidence() {
        let (v, model) = build_chain();
        let engine = VarElim::instantiate(&model).with_options(Options::default().with_relevance_pruning(false));

        // C copies B, so B = 0 and C = 1 cannot both hold
        let mut e = Assignment::new();
        e.set(&v[1], 0);
        e.set(&v[2], 1);

        match engine.infer(&engine.make_query(&[v[0].clone()], &e).unwrap()) {
            Err(NetError::InferenceFailed(_)) => (),
            _ => panic!("wrong error type")
        };
    }
}
