//! Definition of the factor module
//!
//! A `Factor` represents a non-negative potential over a scope of `Variable`s. The discrete part
//! of the scope is enumerated in a dense table; the continuous part is carried as a `Jdf` attached
//! to each table entry. A `Factor` with no discrete scope is *atomic* and holds a single entry.
//!
//! Table entries are addressed by a key (one value index per discrete `Variable`, in scope order)
//! or by the equivalent row-major linear index. Entries with zero weight are absent: they carry
//! neither densities nor traced assignments.

mod ops;

pub use self::ops::{marginalize, maximize, product};

use crate::jdf::Jdf;
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Value, Variable};

use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::prelude as nd;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


/// The single entry of an atomic `Factor`
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {

    /// The weight of the entry
    pub weight: f64,

    /// The densities of the continuous scope, if any
    pub jdf: Option<Jdf>,

    /// The assignments that were maximized away to reach this entry, if traced
    pub trace: Option<Assignment>

}


/// The content of a `Factor`
#[derive(Clone, Debug, PartialEq)]
pub enum Content {

    /// No discrete scope: a single entry
    Atomic(Entry),

    /// A dense table over the discrete scope, with sparse side tables keyed by linear index
    Tabular {

        /// The weights, one per discrete configuration
        weights: Table,

        /// The densities of the continuous scope for each non-zero entry
        jdfs: IndexMap<usize, Jdf>,

        /// The traced assignments for each non-zero entry
        traces: IndexMap<usize, Assignment>
    }

}


/// A borrowed view of one non-zero entry of a `Factor`
#[derive(Clone, Debug)]
pub struct EntryView<'a> {

    /// The row-major linear index of the entry
    pub index: usize,

    /// The value index of each discrete `Variable` in the scope, in scope order
    pub key: Vec<usize>,

    pub weight: f64,

    pub jdf: Option<&'a Jdf>,

    pub trace: Option<&'a Assignment>

}


#[derive(Clone, Debug)]
pub struct Factor {

    /// The discrete scope. The order defines the key encoding.
    discrete: Vec<Variable>,

    /// The continuous scope
    continuous: Vec<Variable>,

    /// The weights and attached densities/traces
    content: Content,

    /// `true` if evidence was folded into this `Factor`, or into any it was computed from
    evidenced: bool,

    /// `true` if this `Factor` was computed by elimination rather than taken from a node
    function: bool,

    /// For a raw conditional distribution, the `Variable` it is a distribution over
    head: Option<Variable>,

    /// `true` if entries carry traced assignments
    traced: bool

}


impl Factor {

    /// Create a new `Factor` over a discrete scope.
    ///
    /// NaN weights are treated as zero. An empty scope requires a zero-dimensional table and
    /// yields an atomic `Factor`.
    ///
    /// # Errors
    /// * `NetError::WrongKind` if a `Variable` in `scope` is continuous
    /// * `NetError::DuplicateVariable` if a `Variable` appears twice in `scope`
    /// * `NetError::General` if the table does not have one axis per `Variable`, with lengths
    ///   equal to their cardinalities
    /// * `NetError::NonPositiveProbability` if a weight is negative or infinite
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        for v in scope.iter() {
            v.expect_discrete()?;
        }

        if scope.iter().unique().count() != scope.len() {
            return Err(NetError::DuplicateVariable);
        }

        if scope.len() != table.ndim() {
            return Err(
                NetError::General(
                    String::from("Invalid arguments. Cardinality of scope must match number of table dimensions")
                )
            );
        }

        for (v, t) in scope.iter().map(|v| v.cardinality()).zip(table.shape().iter()) {
            if v != *t {
                return Err(
                    NetError::General(
                        String::from("Invalid arguments. Dimensions do not match")
                    )
                );
            }
        }

        if table.iter().any(|&w| w < 0.0 || w.is_infinite()) {
            return Err(NetError::NonPositiveProbability);
        }

        let table = table.mapv(|w| if w.is_nan() { 0.0 } else { w });

        let content = if scope.is_empty() {
            // a zero-dimensional table holds exactly one value
            let weight = table.iter().next().cloned().unwrap_or(0.0);
            Content::Atomic(Entry { weight, jdf: None, trace: None })
        } else {
            Content::Tabular { weights: table, jdfs: IndexMap::new(), traces: IndexMap::new() }
        };

        Ok(Factor {
            discrete: scope,
            continuous: Vec::new(),
            content,
            evidenced: false,
            function: false,
            head: None,
            traced: false
        })
    }


    /// Create an atomic `Factor` holding a single weight
    pub fn scalar(weight: f64) -> Self {
        let weight = if weight.is_nan() { 0.0 } else { weight };
        Factor {
            discrete: Vec::new(),
            continuous: Vec::new(),
            content: Content::Atomic(Entry { weight, jdf: None, trace: None }),
            evidenced: false,
            function: false,
            head: None,
            traced: false
        }
    }


    /// Attach continuous content: one `Jdf` per entry, in row-major order. The densities of
    /// zero-weight entries are discarded.
    ///
    /// # Errors
    /// * `NetError::WrongKind` if a `Variable` in `continuous` is discrete
    /// * `NetError::InvalidScope` if the number of `Jdf`s does not match the number of entries,
    ///   or a `Jdf` does not cover exactly the continuous scope
    pub fn with_jdfs(mut self, continuous: Vec<Variable>, jdfs: Vec<Jdf>) -> Result<Self> {
        for v in continuous.iter() {
            v.expect_continuous()?;
        }

        if jdfs.len() != self.len() {
            return Err(NetError::InvalidScope);
        }

        for jdf in jdfs.iter() {
            if jdf.len() != continuous.len() || ! continuous.iter().all(|v| jdf.get(v).is_some()) {
                return Err(NetError::InvalidScope);
            }
        }

        match self.content {
            Content::Atomic(ref mut e) => {
                if e.weight > 0.0 {
                    e.jdf = jdfs.into_iter().next();
                }
            },
            Content::Tabular { ref weights, jdfs: ref mut attached, .. } => {
                let strides = strides(weights.shape());
                for (index, jdf) in jdfs.into_iter().enumerate() {
                    let key = unravel(index, weights.shape(), &strides);
                    if weights[nd::IxDyn(&key)] > 0.0 {
                        attached.insert(index, jdf);
                    }
                }
            }
        }

        self.continuous = continuous;
        Ok(self)
    }


    /// Mark this `Factor` as having evidence folded into it
    pub fn mark_evidenced(mut self) -> Self {
        self.evidenced = true;
        self
    }


    /// Declare this `Factor` to be a raw conditional distribution over `var`
    pub fn with_head(mut self, var: &Variable) -> Self {
        self.head = Some(var.clone());
        self
    }


    /// Mark this `Factor` as the product of a computation
    pub(crate) fn mark_function(mut self) -> Self {
        self.function = true;
        self.head = None;
        self
    }


    /// The discrete scope, in key order
    pub fn discrete(&self) -> &[Variable] {
        &self.discrete
    }


    /// The continuous scope
    pub fn continuous(&self) -> &[Variable] {
        &self.continuous
    }


    /// The full scope: the discrete `Variable`s followed by the continuous ones
    pub fn scope(&self) -> Vec<Variable> {
        self.discrete.iter().chain(self.continuous.iter()).cloned().collect()
    }


    pub fn content(&self) -> &Content {
        &self.content
    }


    /// Check if the `Factor` has no discrete scope
    pub fn is_atomic(&self) -> bool {
        match self.content {
            Content::Atomic(_) => true,
            Content::Tabular { .. } => false
        }
    }


    pub fn is_evidenced(&self) -> bool {
        self.evidenced
    }


    pub fn is_function(&self) -> bool {
        self.function
    }


    pub fn is_traced(&self) -> bool {
        self.traced
    }


    /// The `Variable` a raw conditional distribution is over, if this is one
    pub fn head(&self) -> Option<&Variable> {
        self.head.as_ref()
    }


    /// The number of entries (non-zero or not) in the `Factor`
    pub fn len(&self) -> usize {
        match self.content {
            Content::Atomic(_) => 1,
            Content::Tabular { ref weights, .. } => weights.len()
        }
    }


    /// The sum of all weights
    pub fn total(&self) -> f64 {
        match self.content {
            Content::Atomic(ref e) => e.weight,
            Content::Tabular { ref weights, .. } => weights.sum()
        }
    }


    /// Check if every weight is zero
    pub fn is_zero(&self) -> bool {
        match self.content {
            Content::Atomic(ref e) => ! (e.weight > 0.0),
            Content::Tabular { ref weights, .. } => weights.iter().all(|&w| ! (w > 0.0))
        }
    }


    /// The weight of the entry with the given key
    pub fn weight_at(&self, key: &[usize]) -> f64 {
        match self.content {
            Content::Atomic(ref e) => e.weight,
            Content::Tabular { ref weights, .. } => weights[nd::IxDyn(key)]
        }
    }


    /// Retrieve the weight for a complete assignment over the discrete scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the discrete scope of a `Factor`. The assignment's scope
    ///             may be a superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `NetError::IncompleteAssignment`, if assignment is not a complete assignment to the
    ///   discrete scope of the `Factor`
    /// * `NetError::InvalidValue`, if a value lies outside of its `Variable`'s domain
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let key = self.key_of(assignment)?.ok_or(NetError::IncompleteAssignment)?;
        Ok(self.weight_at(&key))
    }


    /// Extract the key of `assignment` over the discrete scope. Returns `None` if the assignment
    /// does not cover the whole discrete scope.
    fn key_of(&self, assignment: &Assignment) -> Result<Option<Vec<usize>>> {
        let mut key = Vec::with_capacity(self.discrete.len());
        for v in self.discrete.iter() {
            match assignment.get(v) {
                Some(val) => {
                    v.check(val)?;
                    if let Value::Discrete(i) = *val {
                        key.push(i);
                    }
                },
                None => return Ok(None)
            }
        }
        Ok(Some(key))
    }


    /// The `Jdf` of the entry with the given linear index
    pub fn jdf_at(&self, index: usize) -> Option<&Jdf> {
        match self.content {
            Content::Atomic(ref e) => e.jdf.as_ref(),
            Content::Tabular { ref jdfs, .. } => jdfs.get(&index)
        }
    }


    /// The traced assignment of the entry with the given linear index
    pub fn trace_at(&self, index: usize) -> Option<&Assignment> {
        match self.content {
            Content::Atomic(ref e) => e.trace.as_ref(),
            Content::Tabular { ref traces, .. } => traces.get(&index)
        }
    }


    /// The non-zero entries of the `Factor`, in row-major order
    pub fn entries(&self) -> Vec<EntryView> {
        match self.content {
            Content::Atomic(ref e) => {
                if e.weight > 0.0 {
                    vec![EntryView {
                        index: 0,
                        key: Vec::new(),
                        weight: e.weight,
                        jdf: e.jdf.as_ref(),
                        trace: e.trace.as_ref()
                    }]
                } else {
                    Vec::new()
                }
            },
            Content::Tabular { ref weights, ref jdfs, ref traces } => {
                let shape = weights.shape();
                let strides = strides(shape);
                (0..weights.len()).filter_map(|index| {
                    let key = unravel(index, shape, &strides);
                    let weight = weights[nd::IxDyn(&key)];
                    if weight > 0.0 {
                        Some(EntryView { index, key, weight, jdf: jdfs.get(&index), trace: traces.get(&index) })
                    } else {
                        None
                    }
                }).collect()
            }
        }
    }


    /// Reduce the `Factor` to the given partial assignment. Discrete `Variable`s that are
    /// assigned are removed from the scope; entries that disagree with the assignment are
    /// dropped. The result is marked as evidenced if anything was removed.
    ///
    /// # Errors
    /// * `NetError::InvalidValue`, if a value lies outside of its `Variable`'s domain
    pub fn reduce(&self, assignment: &Assignment) -> Result<Self> {
        let observed: Vec<usize> = self.discrete
                                       .iter()
                                       .enumerate()
                                       .filter(|&(_, v)| assignment.contains(v))
                                       .map(|(i, _)| i)
                                       .collect();

        if observed.is_empty() {
            return Ok(self.clone());
        }

        for &i in observed.iter() {
            let v = &self.discrete[i];
            if let Some(val) = assignment.get(v) {
                v.check(val)?;
            }
        }

        let kept: Vec<usize> = (0..self.discrete.len()).filter(|i| ! observed.contains(i)).collect();
        let scope: Vec<Variable> = kept.iter().map(|&i| self.discrete[i].clone()).collect();
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        let out_strides = strides(&shape);

        let mut weights = vec![0.0; shape.iter().product()];
        let mut jdfs = IndexMap::new();
        let mut traces = IndexMap::new();

        for e in self.entries() {
            let agrees = observed.iter().all(|&i| assignment.discrete(&self.discrete[i]) == Some(e.key[i]));
            if ! agrees {
                continue;
            }

            let key: Vec<usize> = kept.iter().map(|&i| e.key[i]).collect();
            let index = linear(&key, &out_strides);
            weights[index] = e.weight;
            if let Some(j) = e.jdf {
                jdfs.insert(index, j.clone());
            }
            if let Some(t) = e.trace {
                traces.insert(index, t.clone());
            }
        }

        let mut reduced = Factor::assemble(scope, self.continuous.clone(), weights, jdfs, traces)?;
        reduced.evidenced = true;
        reduced.function = self.function;
        reduced.traced = self.traced;
        reduced.head = self.head.clone().filter(|h| ! assignment.contains(h));
        Ok(reduced)
    }


    /// Multiply every weight by `c`
    pub fn scale(&self, c: f64) -> Self {
        let mut out = self.clone();
        match out.content {
            Content::Atomic(ref mut e) => e.weight *= c,
            Content::Tabular { ref mut weights, .. } => weights.mapv_inplace(|w| w * c)
        }
        out
    }


    /// Build a `Factor` from row-major weights and side tables. Flags are left cleared.
    fn assemble(
        discrete: Vec<Variable>,
        continuous: Vec<Variable>,
        weights: Vec<f64>,
        mut jdfs: IndexMap<usize, Jdf>,
        mut traces: IndexMap<usize, Assignment>
    ) -> Result<Self> {
        let content = if discrete.is_empty() {
            let weight = weights.first().cloned().unwrap_or(0.0);
            Content::Atomic(Entry { weight, jdf: jdfs.swap_remove(&0), trace: traces.swap_remove(&0) })
        } else {
            let shape: Vec<usize> = discrete.iter().map(|v| v.cardinality()).collect();
            let weights = Table::from_shape_vec(nd::IxDyn(&shape), weights).map_err(|e| {
                NetError::General(format!("Factor table does not match its scope: {}", e))
            })?;
            Content::Tabular { weights, jdfs, traces }
        };

        Ok(Factor {
            discrete,
            continuous,
            content,
            evidenced: false,
            function: false,
            head: None,
            traced: false
        })
    }

}


/// Row-major strides for a shape (the last axis has stride one)
fn strides(shape: &[usize]) -> Vec<usize> {
    let mut out = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] * shape[i + 1];
    }
    out
}


/// The linear index of a key
fn linear(key: &[usize], strides: &[usize]) -> usize {
    key.iter().zip(strides.iter()).map(|(k, s)| k * s).sum()
}


/// The key of a linear index
fn unravel(index: usize, shape: &[usize], strides: &[usize]) -> Vec<usize> {
    strides.iter().zip(shape.iter()).map(|(&s, &n)| (index / s) % n).collect()
}


// Unit tests
#[cfg(test)]
mod tests {

    use super::*;
    use crate::distrib::{Density, Gaussian};

    #[test]
    fn table_factor() {
        let vars = vec![ Variable::binary("A"), Variable::discrete("B", 5), Variable::discrete("C", 3) ];
        let mut table = Table::ones(vec![2, 5, 3]);
        table[[1, 1, 1].as_ref()] = 5.;

        let f = Factor::new(vars.clone(), table).unwrap();

        assert!(! f.is_atomic());
        assert_eq!(f.len(), 30);
        for (x, y, z) in iproduct!(0..2, 0..5, 0..3) {
            let mut assn = Assignment::new();
            assn.set(&vars[0], x);
            assn.set(&vars[1], y);
            assn.set(&vars[2], z);

            let val = f.value(&assn).unwrap();
            if x == 1 && y == 1 && z == 1 {
                assert_eq!(5., val);
            } else {
                assert_eq!(1., val);
            }
        }
    }

    #[test]
    fn table_factor_errs() {
        // mismatched number of dimensions
        let vars = vec![ Variable::binary("A"), Variable::binary("B") ];
        let table = Table::ones(vec![2, 2, 2]);
        match Factor::new(vars.clone(), table) {
            Err(NetError::General(_)) => (),
            _ => panic!("wrong error type")
        };

        // wrong cardinality
        let table = Table::ones(vec![2, 3]);
        match Factor::new(vars.clone(), table) {
            Err(NetError::General(_)) => (),
            _ => panic!("wrong error type")
        };

        // negative weight
        let table = array![[1.0, -1.0], [1.0, 1.0]].into_dyn();
        match Factor::new(vars.clone(), table) {
            Err(NetError::NonPositiveProbability) => (),
            _ => panic!("wrong error type")
        };

        // duplicate variable
        let table = Table::ones(vec![2, 2]);
        match Factor::new(vec![vars[0].clone(), vars[0].clone()], table) {
            Err(NetError::DuplicateVariable) => (),
            _ => panic!("wrong error type")
        };

        // continuous variable in the discrete scope
        let table = Table::ones(vec![0]);
        assert!(Factor::new(vec![Variable::continuous("X")], table).is_err());
    }

    #[test]
    fn nan_is_absent() {
        let a = Variable::binary("A");
        let f = Factor::new(vec![a.clone()], array![std::f64::NAN, 2.0].into_dyn()).unwrap();
        let entries = f.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, vec![1]);
        assert_eq!(f.total(), 2.0);
    }

    #[test]
    fn atomic() {
        let f = Factor::new(vec![], Table::from_elem(vec![], 0.25)).unwrap();
        assert!(f.is_atomic());
        assert_eq!(f.total(), 0.25);
        assert_eq!(f.value(&Assignment::new()).unwrap(), 0.25);

        let z = Factor::scalar(0.0);
        assert!(z.is_zero());
        assert!(z.entries().is_empty());
    }

    #[test]
    fn value_incomplete() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");
        let f = Factor::new(vec![a.clone(), b.clone()], Table::ones(vec![2, 2])).unwrap();

        let mut assn = Assignment::new();
        assn.set(&a, 0);
        match f.value(&assn) {
            Err(NetError::IncompleteAssignment) => (),
            _ => panic!("incorrect error")
        };

        assn.set(&b, 7);
        assert!(f.value(&assn).is_err());
    }

    #[test]
    fn linear_indexing() {
        let shape = [3, 2, 4];
        let s = strides(&shape);
        assert_eq!(s, vec![8, 4, 1]);
        assert_eq!(linear(&[2, 1, 3], &s), 23);
        assert_eq!(unravel(23, &shape, &s), vec![2, 1, 3]);
        assert_eq!(strides(&[]), Vec::<usize>::new());
    }

    #[test]
    fn jdfs_follow_weights() {
        let p = Variable::binary("P");
        let x = Variable::continuous("X");
        let jdfs = vec![
            Jdf::single(&x, Density::from(Gaussian::new(0.0, 1.0).unwrap())).unwrap(),
            Jdf::single(&x, Density::from(Gaussian::new(5.0, 1.0).unwrap())).unwrap(),
        ];

        let f = Factor::new(vec![p.clone()], array![0.0, 1.0].into_dyn())
                    .unwrap()
                    .with_jdfs(vec![x.clone()], jdfs)
                    .unwrap();

        assert_eq!(f.continuous(), &[x.clone()]);
        assert!(f.jdf_at(0).is_none());
        assert_eq!(f.jdf_at(1).unwrap().get(&x).unwrap().mean(), 5.0);

        // wrong number of densities
        let f = Factor::new(vec![p.clone()], array![1.0, 1.0].into_dyn()).unwrap();
        assert!(f.with_jdfs(vec![x.clone()], vec![]).is_err());
    }

    #[test]
    /// Example take from Koller & Friedman Figure 4.5
    fn reduce_simple() {
        let a = Variable::discrete("A", 3);
        let b = Variable::binary("B");
        let c = Variable::binary("C");

        let table = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).unwrap().into_dyn();

        let phi = Factor::new(vec![a.clone(), b.clone(), c.clone()], table).unwrap().with_head(&c);

        let mut assn = Assignment::new();
        assn.set(&c, 0);

        let expected = nd::Array::from_shape_vec(
            (3, 2),
            vec![ 0.25, 0.08, 0.05, 0., 0.15, 0.09 ]
        ).unwrap().into_dyn();

        let reduced = phi.reduce(&assn).unwrap();
        assert_eq!(vec![a.clone(), b.clone()], reduced.scope());
        assert!(reduced.is_evidenced());
        assert!(reduced.head().is_none());
        for (x, y) in iproduct!(0..3, 0..2) {
            let mut assn = Assignment::new();
            assn.set(&a, x);
            assn.set(&b, y);

            let idx = [x, y];
            assert_eq!(expected[nd::IxDyn(&idx)], reduced.value(&assn).unwrap());
        }
    }

    #[test]
    fn reduce_unrelated() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");
        let c = Variable::binary("C");

        let table = array![[ 1., 0. ], [ 0., 1. ]].into_dyn();
        let phi = Factor::new(vec![a.clone(), b.clone()], table).unwrap();

        let mut assn = Assignment::new();
        assn.set(&c, 1);

        let reduced = phi.reduce(&assn).unwrap();
        assert_eq!(vec![a, b], reduced.scope());
        assert!(! reduced.is_evidenced());
    }

    #[test]
    fn reduce_full() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");

        let table = array![[ 0.1, 0.2 ], [ 0.3, 0.4 ]].into_dyn();
        let phi = Factor::new(vec![a.clone(), b.clone()], table).unwrap();

        let mut assn = Assignment::new();
        assn.set(&a, 1);
        assn.set(&b, 0);

        let reduced = phi.reduce(&assn).unwrap();
        assert!(reduced.is_atomic());
        assert!((reduced.total() - 0.3).abs() < 1e-12);
    }

}
