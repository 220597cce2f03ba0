//! Algebra over `Factor`s: product, summing out and maximizing out discrete `Variable`s.
//!
//! Continuous content rides along with the discrete entries. A product merges the `Jdf`s of the
//! two entries it combines; summing out mixes the `Jdf`s of the entries that collapse together,
//! weighted by their share of the summed weight; maximizing out keeps the `Jdf` of the winner.

use super::{linear, strides, unravel, Content, EntryView, Factor};
use crate::jdf::Jdf;
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};

use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::prelude as nd;
use tracing::trace;


/// Maps keys over a scope onto keys (and linear indices) over a subset of it
struct Projection {
    positions: Vec<usize>,
    strides: Vec<usize>
}

impl Projection {

    fn new(scope: &[Variable], sub: &[Variable]) -> Self {
        let positions = sub.iter().filter_map(|v| scope.iter().position(|s| s == v)).collect();
        let shape: Vec<usize> = sub.iter().map(|v| v.cardinality()).collect();
        Projection { positions, strides: strides(&shape) }
    }

    fn project(&self, key: &[usize]) -> (Vec<usize>, usize) {
        let sub: Vec<usize> = self.positions.iter().map(|&p| key[p]).collect();
        let index = linear(&sub, &self.strides);
        (sub, index)
    }

}


/// Product of two `Factor`s.
///
/// Defined in Koller & Friedman Section 4.2.1. Unlike a purely discrete product, the scopes need
/// not intersect: an atomic `Factor` scales every entry of the other.
///
/// # Args
/// a, b: the `Factor`s to multiply
///
/// # Returns
/// A new `Factor` over union(a.scope(), b.scope()), with the `Jdf`s and traced assignments of
/// every pair of combined entries merged
pub fn product(a: &Factor, b: &Factor) -> Result<Factor> {
    let scope: Vec<Variable> = a.discrete.iter().chain(b.discrete.iter()).unique().cloned().collect();
    let continuous: Vec<Variable> = a.continuous.iter().chain(b.continuous.iter()).unique().cloned().collect();

    let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
    let out_strides = strides(&shape);
    let len: usize = shape.iter().product();

    let a_proj = Projection::new(&scope, &a.discrete);
    let b_proj = Projection::new(&scope, &b.discrete);

    let mut weights = vec![0.0; len];
    let mut jdfs = IndexMap::new();
    let mut traces = IndexMap::new();

    for index in 0..len {
        let key = unravel(index, &shape, &out_strides);

        let (ka, ia) = a_proj.project(&key);
        let wa = a.weight_at(&ka);
        if ! (wa > 0.0) {
            continue;
        }

        let (kb, ib) = b_proj.project(&key);
        let w = wa * b.weight_at(&kb);
        if ! (w > 0.0) {
            continue;
        }

        weights[index] = w;

        match (a.jdf_at(ia), b.jdf_at(ib)) {
            (Some(x), Some(y)) => { jdfs.insert(index, x.merge(y)); },
            (Some(x), None) | (None, Some(x)) => { jdfs.insert(index, x.clone()); },
            (None, None) => ()
        }

        match (a.trace_at(ia), b.trace_at(ib)) {
            (Some(x), Some(y)) => {
                let mut t = x.clone();
                t.extend(y);
                traces.insert(index, t);
            },
            (Some(x), None) | (None, Some(x)) => { traces.insert(index, x.clone()); },
            (None, None) => ()
        }
    }

    let mut out = Factor::assemble(scope, continuous, weights, jdfs, traces)?;
    out.evidenced = a.evidenced || b.evidenced;
    out.function = a.function || b.function;
    out.traced = a.traced || b.traced;
    Ok(out)
}


/// Sum the given discrete `Variable`s out of a `Factor`.
///
/// Defined in Koller & Friedman 9.3.1. The `Jdf`s of the entries that are summed together are
/// mixed, each weighted by its share of the summed weight. Traced assignments do not survive a
/// sum.
///
/// # Args
/// f: the `Factor` to marginalize
/// vars: the `Variable`s to sum out. `Variable`s outside of the scope of `f` are ignored.
///
/// # Errors
/// * `NetError::ContinuousElimination` if one of `vars` is continuous
pub fn marginalize(f: &Factor, vars: &[Variable]) -> Result<Factor> {
    let (elim, remaining) = split_scope(f, vars)?;
    if elim.is_empty() {
        return Ok(f.clone());
    }

    trace!(scope = f.discrete.len(), eliminated = elim.len(), "summing out");

    let mut out = match f.content {
        Content::Tabular { ref weights, .. } if f.continuous.is_empty() => {
            // purely discrete: sum along each axis, highest first so lower axes keep their place
            let mut axes: Vec<usize> = elim.iter().map(|&(p, _)| p).collect();
            axes.sort_unstable_by(|x, y| y.cmp(x));

            let mut table = weights.clone();
            for ax in axes {
                table = table.sum_axis(nd::Axis(ax));
            }

            Factor::new(remaining, table)?
        },
        _ => {
            let proj = Projection::new(&f.discrete, &remaining);
            let len: usize = remaining.iter().map(|v| v.cardinality()).product();

            let mut weights = vec![0.0; len];
            let mut parts: Vec<Vec<(&Jdf, f64)>> = vec![Vec::new(); len];

            for e in f.entries() {
                let (_, r) = proj.project(&e.key);
                weights[r] += e.weight;
                if let Some(j) = e.jdf {
                    parts[r].push((j, e.weight));
                }
            }

            let mut jdfs = IndexMap::new();
            for (r, p) in parts.iter().enumerate() {
                if ! p.is_empty() {
                    jdfs.insert(r, Jdf::mix(p)?);
                }
            }

            Factor::assemble(remaining, f.continuous.clone(), weights, jdfs, IndexMap::new())?
        }
    };

    out.evidenced = f.evidenced;
    out.function = f.function;
    out.traced = false;
    Ok(out)
}


/// Maximize the given discrete `Variable`s out of a `Factor`.
///
/// Every entry of the result keeps the weight and `Jdf` of the largest entry that maps onto it,
/// and records the values of `vars` at that entry in its traced assignment. Ties go to the
/// first maximum in row-major order.
///
/// # Args
/// f: the `Factor` to maximize
/// vars: the `Variable`s to maximize out. `Variable`s outside of the scope of `f` are ignored.
///
/// # Errors
/// * `NetError::ContinuousElimination` if one of `vars` is continuous
pub fn maximize(f: &Factor, vars: &[Variable]) -> Result<Factor> {
    let (elim, remaining) = split_scope(f, vars)?;
    if elim.is_empty() {
        return Ok(f.clone());
    }

    trace!(scope = f.discrete.len(), eliminated = elim.len(), "maximizing out");

    let proj = Projection::new(&f.discrete, &remaining);
    let len: usize = remaining.iter().map(|v| v.cardinality()).product();

    let mut best: Vec<Option<EntryView>> = vec![None; len];
    for e in f.entries() {
        let (_, r) = proj.project(&e.key);
        let better = match best[r] {
            Some(ref b) => e.weight > b.weight,
            None => true
        };
        if better {
            best[r] = Some(e);
        }
    }

    let mut weights = vec![0.0; len];
    let mut jdfs = IndexMap::new();
    let mut traces = IndexMap::new();

    for (r, b) in best.into_iter().enumerate() {
        if let Some(b) = b {
            weights[r] = b.weight;
            if let Some(j) = b.jdf {
                jdfs.insert(r, j.clone());
            }

            let mut t = b.trace.cloned().unwrap_or_default();
            for &(p, v) in elim.iter() {
                t.set(v, b.key[p]);
            }
            traces.insert(r, t);
        }
    }

    let mut out = Factor::assemble(remaining, f.continuous.clone(), weights, jdfs, traces)?;
    out.evidenced = f.evidenced;
    out.function = f.function;
    out.traced = true;
    Ok(out)
}


/// Split the discrete scope of `f` into the `Variable`s to eliminate (with their axes) and the
/// ones that remain
fn split_scope<'a>(f: &'a Factor, vars: &[Variable]) -> Result<(Vec<(usize, &'a Variable)>, Vec<Variable>)> {
    if let Some(v) = vars.iter().find(|v| v.is_continuous()) {
        return Err(NetError::ContinuousElimination(v.name().to_string()));
    }

    let mut elim = Vec::new();
    let mut remaining = Vec::new();
    for (p, v) in f.discrete.iter().enumerate() {
        if vars.contains(v) {
            elim.push((p, v));
        } else {
            remaining.push(v.clone());
        }
    }

    Ok((elim, remaining))
}


impl Factor {

    /// Product of this `Factor` and another. See `factor::product`.
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        product(self, other)
    }

    /// Sum a `Variable` out of this `Factor`. See `factor::marginalize`.
    pub fn marginalize(&self, var: &Variable) -> Result<Factor> {
        marginalize(self, std::slice::from_ref(var))
    }

    /// Maximize a `Variable` out of this `Factor`. See `factor::maximize`.
    pub fn maximize(&self, var: &Variable) -> Result<Factor> {
        maximize(self, std::slice::from_ref(var))
    }

    /// The traced assignment of the largest entry, extended with that entry's key and the modes
    /// of its densities. Ties go to the first maximum in row-major order. Returns `None` if every
    /// weight is zero.
    pub fn argmax(&self) -> Option<(f64, Assignment)> {
        let mut best: Option<EntryView> = None;
        for e in self.entries() {
            let better = match best {
                Some(ref b) => e.weight > b.weight,
                None => true
            };
            if better {
                best = Some(e);
            }
        }

        best.map(|b| {
            let mut t = b.trace.cloned().unwrap_or_default();
            for (v, &k) in self.discrete.iter().zip(b.key.iter()) {
                t.set(v, k);
            }
            if let Some(jdf) = b.jdf {
                t.extend(&jdf.modes());
            }
            (b.weight, t)
        })
    }

}
