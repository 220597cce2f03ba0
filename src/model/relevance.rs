//! Relevance pruning by the Bayes-ball algorithm.
//!
//! See R. Shachter, "Bayes-Ball: The Rational Pastime", UAI 1998. A ball is passed from the query
//! nodes through the graph; it travels through unobserved nodes freely but bounces back from
//! observed ones. The nodes marked on top are the ones whose distributions are needed, and the
//! observed nodes the ball reaches are the evidence that can influence the query.

use super::{Network, Relevance};
use crate::cpd::Node;
use crate::variable::{Assignment, Variable};

use std::collections::{HashMap, HashSet, VecDeque};


/// Find the requisite nodes and evidence for `query`
///
/// # Args
/// * `net`: the network
/// * `query`: the query `Variable`s
/// * `evidence`: the observed values
///
/// # Returns
/// the requisite nodes, in the network's topological order, and the requisite evidence
pub fn bayes_ball<N: Network + ?Sized>(net: &N, query: &[Variable], evidence: &Assignment) -> Relevance {
    let nodes = net.nodes();

    let mut children: HashMap<&Variable, Vec<&Variable>> = HashMap::new();
    for n in nodes.iter() {
        for p in n.parents() {
            children.entry(p).or_insert_with(Vec::new).push(n.variable());
        }
    }

    let mut top: HashSet<&Variable> = HashSet::new();
    let mut bottom: HashSet<&Variable> = HashSet::new();
    let mut visited: HashSet<&Variable> = HashSet::new();

    // (node, true if the ball arrives from a child)
    let mut schedule: VecDeque<(&Variable, bool)> = VecDeque::new();
    for q in query {
        if let Some(n) = net.node(q) {
            schedule.push_back((n.variable(), true));
        }
    }

    while let Some((j, from_child)) = schedule.pop_front() {
        visited.insert(j);
        let observed = evidence.contains(j);

        if from_child && ! observed {
            if top.insert(j) {
                if let Some(n) = net.node(j) {
                    schedule.extend(n.parents().iter().map(|p| (p, true)));
                }
            }
            if bottom.insert(j) {
                if let Some(cs) = children.get(j) {
                    schedule.extend(cs.iter().map(|&c| (c, false)));
                }
            }
        } else if ! from_child {
            if observed {
                if top.insert(j) {
                    if let Some(n) = net.node(j) {
                        schedule.extend(n.parents().iter().map(|p| (p, true)));
                    }
                }
            } else if bottom.insert(j) {
                if let Some(cs) = children.get(j) {
                    schedule.extend(cs.iter().map(|&c| (c, false)));
                }
            }
        }
    }

    let mut requisite = Assignment::new();
    for (v, val) in evidence.iter() {
        if visited.contains(v) {
            requisite.set_value(v, val.clone());
        }
    }

    Relevance {
        nodes: nodes.iter().map(|n| n.variable()).filter(|v| top.contains(v)).cloned().collect(),
        evidence: requisite
    }
}


/// Extend `relevance` with the ancestors of its evidence, and the evidence nodes themselves, so
/// that the nodes form an ancestral set. Summing out everything but Q then leaves P(Q, e), whose
/// total is the probability of the requisite evidence. The posterior of Q is unchanged.
pub fn evidence_ancestors<N: Network + ?Sized>(net: &N, relevance: Relevance) -> Relevance {
    let mut keep: HashSet<Variable> = relevance.nodes.iter().cloned().collect();

    let mut schedule: VecDeque<Variable> = relevance.evidence.vars().cloned().collect();
    while let Some(v) = schedule.pop_front() {
        if keep.insert(v.clone()) {
            if let Some(n) = net.node(&v) {
                schedule.extend(n.parents().iter().cloned());
            }
        }
    }

    Relevance {
        nodes: net.nodes().iter().map(|n| n.variable()).filter(|v| keep.contains(v)).cloned().collect(),
        evidence: relevance.evidence
    }
}
