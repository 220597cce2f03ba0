//! Buckets and the arena that holds them for the duration of one elimination.

use crate::factor::Factor;
use crate::variable::Variable;

use std::collections::BTreeSet;


/// The `Variable`s a bucket eliminates and the `Factor`s currently assigned to it
#[derive(Clone, Debug, Default)]
pub struct Bucket {

    pub vars: Vec<Variable>,

    pub factors: Vec<Factor>

}

impl Bucket {

    pub fn new(vars: Vec<Variable>) -> Self {
        Bucket { vars, factors: Vec::new() }
    }

    /// Check if any `Factor` in the bucket has one of `vars` in its discrete scope
    fn mentions(&self, vars: &[Variable]) -> bool {
        self.factors.iter().any(|f| f.discrete().iter().any(|v| vars.contains(v)))
    }

    /// Check if the product of the bucket, summed over its `Variable`s, is identically one.
    ///
    /// This holds when the bucket holds exactly one unmodified conditional distribution for each of
    /// its `Variable`s and nothing else.
    pub fn is_constant(&self) -> bool {
        if self.factors.len() != self.vars.len() {
            return false;
        }

        let mut heads: Vec<&Variable> = Vec::with_capacity(self.factors.len());
        for f in self.factors.iter() {
            if f.is_evidenced() || f.is_function() {
                return false;
            }
            match f.head() {
                Some(h) if self.vars.contains(h) && ! heads.contains(&h) => heads.push(h),
                _ => return false
            }
        }

        true
    }

}


/// All buckets of one elimination. Bucket 0 is the answer bucket; the others are processed from
/// the last to the first.
#[derive(Debug)]
pub struct Arena {

    buckets: Vec<Bucket>,

    /// Buckets removed by the purge, not yet compacted
    removed: BTreeSet<usize>

}

impl Arena {

    /// Allocate the answer bucket and one bucket per `Variable` in `order`
    pub fn new(order: &[Variable]) -> Self {
        let mut buckets = Vec::with_capacity(order.len() + 1);
        buckets.push(Bucket::default());
        buckets.extend(order.iter().map(|v| Bucket::new(vec![v.clone()])));
        Arena { buckets, removed: BTreeSet::new() }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Place `factor` in the bucket that must process it, considering only buckets below
    /// `limit`: the last bucket whose `Variable`s intersect the discrete scope of the `Factor`, or
    /// the answer bucket if there is none.
    ///
    /// # Returns
    /// the index of the bucket the `Factor` was placed in
    pub fn place(&mut self, factor: Factor, limit: usize) -> usize {
        let target = if factor.is_atomic() {
            0
        } else {
            (1..limit.min(self.buckets.len()))
                .rev()
                .filter(|i| ! self.removed.contains(i))
                .find(|&i| factor.discrete().iter().any(|v| self.buckets[i].vars.contains(v)))
                .unwrap_or(0)
        };

        self.buckets[target].factors.push(factor);
        target
    }

    /// Remove every bucket that holds no `Factor`. Its `Variable`s move to the nearest later
    /// bucket holding a `Factor` that mentions them, or to the answer bucket.
    ///
    /// # Returns
    /// the number of buckets removed
    pub fn purge(&mut self) -> usize {
        for i in 1..self.buckets.len() {
            if ! self.buckets[i].factors.is_empty() {
                continue;
            }

            self.removed.insert(i);
            let vars = std::mem::take(&mut self.buckets[i].vars);

            let target = (i + 1..self.buckets.len())
                             .filter(|j| ! self.removed.contains(j))
                             .find(|&j| self.buckets[j].mentions(&vars))
                             .unwrap_or(0);

            self.buckets[target].vars.extend(vars);
        }

        let removed = self.removed.len();
        self.compact();
        removed
    }

    /// Drop the tombstoned buckets
    fn compact(&mut self) {
        if self.removed.is_empty() {
            return;
        }

        let removed = std::mem::take(&mut self.removed);
        let buckets = std::mem::take(&mut self.buckets);
        self.buckets = buckets.into_iter()
                              .enumerate()
                              .filter(|(i, _)| ! removed.contains(i))
                              .map(|(_, b)| b)
                              .collect();
    }

    /// Take the contents of a bucket out of the arena for processing
    pub fn take(&mut self, i: usize) -> Bucket {
        std::mem::take(&mut self.buckets[i])
    }

}
