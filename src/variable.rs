//! Definition of the variable module
//!
//! A `Variable` represents a random variable in a hybrid Bayesian network. It is either discrete,
//! with a finite ordered domain, or continuous. `Variable`s are light-weight handles; cloning one
//! is cheap and all clones compare equal.

use crate::util::{NetError, Result};

use indexmap::IndexMap;
use itertools::Itertools;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source of unique `Variable` ids
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);


/// The kind of a `Variable`
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {

    /// A discrete variable. The labels define the ordered domain; values are indices into it.
    Discrete(Vec<String>),

    /// A continuous variable. The allowed values are all real numbers.
    Continuous

}


#[derive(Debug)]
struct Inner {
    id: usize,
    name: String,
    kind: Kind
}


/// A random variable. Identity is fixed at construction; two `Variable`s constructed separately
/// are never equal, even if they share a name and domain.
#[derive(Clone)]
pub struct Variable(Arc<Inner>);


impl Variable {

    fn new(name: &str, kind: Kind) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Variable(Arc::new(Inner { id, name: String::from(name), kind }))
    }

    /// Construct a new binary `Variable` with the values `0` and `1`
    pub fn binary(name: &str) -> Self {
        Variable::discrete(name, 2)
    }

    /// Construct a new boolean `Variable` with the labels `false` and `true`
    pub fn boolean(name: &str) -> Self {
        Variable::enumerated(name, &["false", "true"])
    }

    /// Construct a new discrete `Variable` with `count` values labelled `0..count`.
    ///
    /// # Panics
    /// if `count` is zero
    pub fn discrete(name: &str, count: usize) -> Self {
        assert!(count > 0, "a discrete variable needs at least one value");
        Variable::new(name, Kind::Discrete((0..count).map(|i| i.to_string()).collect()))
    }

    /// Construct a new discrete `Variable` over an enumerated set of named values
    ///
    /// # Panics
    /// if `labels` is empty
    pub fn enumerated(name: &str, labels: &[&str]) -> Self {
        assert!(! labels.is_empty(), "a discrete variable needs at least one value");
        Variable::new(name, Kind::Discrete(labels.iter().map(|s| String::from(*s)).collect()))
    }

    /// Construct a new continuous `Variable`
    pub fn continuous(name: &str) -> Self {
        Variable::new(name, Kind::Continuous)
    }

    /// Get the name of the `Variable`
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Get the kind of the `Variable`
    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    /// Check if this `Variable` is discrete
    pub fn is_discrete(&self) -> bool {
        match self.0.kind {
            Kind::Discrete(_) => true,
            Kind::Continuous => false
        }
    }

    /// Check if this `Variable` is continuous
    pub fn is_continuous(&self) -> bool {
        ! self.is_discrete()
    }

    /// The number of values in the domain of a discrete `Variable`. Continuous `Variable`s have
    /// no enumerable domain and report zero.
    pub fn cardinality(&self) -> usize {
        match self.0.kind {
            Kind::Discrete(ref labels) => labels.len(),
            Kind::Continuous => 0
        }
    }

    /// The labels of a discrete `Variable`'s domain
    pub fn labels(&self) -> Option<&[String]> {
        match self.0.kind {
            Kind::Discrete(ref labels) => Some(labels),
            Kind::Continuous => None
        }
    }

    /// Find the index of a label in the domain
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels().and_then(|ls| ls.iter().position(|l| l == label))
    }

    /// Verify that `value` is a valid value for this `Variable`.
    ///
    /// # Errors
    /// * `NetError::InvalidValue` if the value is of the wrong kind, out of range, or not finite
    pub fn check(&self, value: &Value) -> Result<()> {
        let ok = match (&self.0.kind, value) {
            (&Kind::Discrete(ref labels), &Value::Discrete(i)) => i < labels.len(),
            (&Kind::Continuous, &Value::Continuous(x)) => x.is_finite(),
            _ => false
        };

        if ok {
            Ok(())
        } else {
            Err(NetError::InvalidValue(self.name().to_string()))
        }
    }

    /// Ensure this `Variable` is discrete
    pub fn expect_discrete(&self) -> Result<usize> {
        match self.0.kind {
            Kind::Discrete(ref labels) => Ok(labels.len()),
            Kind::Continuous => Err(NetError::WrongKind {
                name: self.name().to_string(),
                expected: "discrete"
            })
        }
    }

    /// Ensure this `Variable` is continuous
    pub fn expect_continuous(&self) -> Result<()> {
        match self.0.kind {
            Kind::Continuous => Ok(()),
            Kind::Discrete(_) => Err(NetError::WrongKind {
                name: self.name().to_string(),
                expected: "continuous"
            })
        }
    }

}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.name(), self.0.id)
    }
}


/// The value of a `Variable`
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {

    /// The index of a value in the domain of a discrete `Variable`
    Discrete(usize),

    /// The value of a continuous `Variable`
    Continuous(f64)

}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Discrete(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Continuous(x)
    }
}


/// A (possibly partial) assignment of values to `Variable`s.
///
/// The same structure records observed evidence, partial keys into a result table, traced choices
/// made while maximizing, and the explanation returned by an MPE query. Iteration follows
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    values: IndexMap<Variable, Value>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: IndexMap::new() }
    }

    /// Assign the value with index `value` to the discrete `var`, replacing any previous value
    pub fn set(&mut self, var: &Variable, value: usize) {
        self.values.insert(var.clone(), Value::Discrete(value));
    }

    /// Assign `value` to the continuous `var`, replacing any previous value
    pub fn set_continuous(&mut self, var: &Variable, value: f64) {
        self.values.insert(var.clone(), Value::Continuous(value));
    }

    /// Assign `value` to `var`, replacing any previous value
    pub fn set_value(&mut self, var: &Variable, value: Value) {
        self.values.insert(var.clone(), value);
    }

    /// Get the value assigned to `var`, if any
    pub fn get(&self, var: &Variable) -> Option<&Value> {
        self.values.get(var)
    }

    /// Get the value assigned to a discrete `var`, if any
    pub fn discrete(&self, var: &Variable) -> Option<usize> {
        match self.values.get(var) {
            Some(&Value::Discrete(i)) => Some(i),
            _ => None
        }
    }

    /// Get the value assigned to a continuous `var`, if any
    pub fn continuous(&self, var: &Variable) -> Option<f64> {
        match self.values.get(var) {
            Some(&Value::Continuous(x)) => Some(x),
            _ => None
        }
    }

    /// Check if `var` is assigned
    pub fn contains(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    /// Remove the value of `var`
    pub fn remove(&mut self, var: &Variable) -> Option<Value> {
        self.values.shift_remove(var)
    }

    /// The number of assigned `Variable`s
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing is assigned
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The assigned `Variable`s, in insertion order
    pub fn vars(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    /// Iterate over the `(Variable, Value)` pairs, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Value)> {
        self.values.iter()
    }

    /// Add every pair of `other` to this `Assignment`; values in `other` take precedence
    pub fn extend(&mut self, other: &Assignment) {
        for (v, val) in other.iter() {
            self.values.insert(v.clone(), *val);
        }
    }

    /// Check that this `Assignment` agrees with `other` on every `Variable` they share
    pub fn consistent_with(&self, other: &Assignment) -> bool {
        self.iter().all(|(v, val)| other.get(v).map_or(true, |o| o == val))
    }

    /// Verify every value against its `Variable`'s domain
    pub fn check(&self) -> Result<()> {
        for (v, val) in self.iter() {
            v.check(val)?;
        }
        Ok(())
    }

}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(v, val)| match *val {
            Value::Discrete(i) => {
                let label = v.labels().and_then(|ls| ls.get(i)).cloned().unwrap_or_else(|| i.to_string());
                format!("{}={}", v.name(), label)
            },
            Value::Continuous(x) => format!("{}={:.4}", v.name(), x)
        }).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}


/// Enumerate every complete assignment to the given discrete `Variable`s, in row-major order
/// (the last `Variable` changes fastest). Continuous `Variable`s are ignored.
pub fn all_assignments(vars: &[Variable]) -> impl Iterator<Item = Assignment> {
    let vars: Vec<Variable> = vars.iter().filter(|v| v.is_discrete()).cloned().collect();
    let ranges: Vec<Vec<usize>> = vars.iter().map(|v| (0..v.cardinality()).collect()).collect();

    // multi_cartesian_product of nothing yields nothing, but the empty scope has exactly one
    // (empty) assignment
    let combos: Box<dyn Iterator<Item = Vec<usize>>> = if ranges.is_empty() {
        Box::new(std::iter::once(Vec::new()))
    } else {
        Box::new(ranges.into_iter().multi_cartesian_product())
    };

    combos.map(move |vals| {
        let mut a = Assignment::new();
        for (v, i) in vars.iter().zip(vals) {
            a.set(v, i);
        }
        a
    })
}
