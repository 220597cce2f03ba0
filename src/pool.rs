//! A fixed-size worker pool for batches of independent queries.
//!
//! Each unit of a batch is expected to own everything it touches (typically its own network and
//! `Query`), so units never coordinate. `Pool::run` blocks until every unit has finished and
//! collects the outcome of each under its submission index. A unit that fails or panics is
//! recorded and never disturbs its siblings.

use crate::util::{NetError, Result};

use rayon::prelude::*;
use tracing::{debug, warn};

use std::any::Any;
use std::collections::BTreeMap;
use std::env;
use std::panic::{self, AssertUnwindSafe};


/// The environment variable read by `PoolConfig::from_env`
pub const THREADS_VAR: &str = "HYBRIDNET_THREADS";


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolConfig {

    /// Number of worker threads. Zero selects the available parallelism.
    pub threads: usize

}

impl PoolConfig {

    pub fn new(threads: usize) -> Self {
        PoolConfig { threads }
    }

    /// Read the worker count from `HYBRIDNET_THREADS`, if set
    ///
    /// # Errors
    /// * `NetError::General` if the variable is set but is not a non-negative integer
    pub fn from_env() -> Result<Self> {
        match env::var(THREADS_VAR) {
            Ok(s) => {
                let threads = s.trim().parse::<usize>().map_err(|e| {
                    NetError::General(format!("{}={:?}: {}", THREADS_VAR, s, e))
                })?;
                Ok(PoolConfig { threads })
            },
            Err(_) => Ok(PoolConfig::default())
        }
    }

}


/// The outcome of a batch, keyed by submission index
#[derive(Debug)]
pub struct BatchReport<T> {

    pub results: BTreeMap<usize, T>,

    pub errors: BTreeMap<usize, NetError>

}

impl<T> BatchReport<T> {

    /// Check if every unit succeeded
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The number of units in the batch
    pub fn len(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

}


pub struct Pool {
    pool: rayon::ThreadPool
}

impl Pool {

    /// Build a pool of worker threads
    ///
    /// # Errors
    /// * `NetError::General` if the threads cannot be spawned
    pub fn new(config: PoolConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
                       .num_threads(config.threads)
                       .thread_name(|i| format!("hybridnet-{}", i))
                       .build()
                       .map_err(|e| NetError::General(e.to_string()))?;

        debug!(threads = pool.current_num_threads(), "started worker pool");
        Ok(Pool { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f(index, unit)` for every unit and wait for all of them to finish.
    ///
    /// # Args
    /// * `units`: the independent units of work
    /// * `f`: the work to do for one unit, given its submission index
    ///
    /// # Returns
    /// the value or the error of every unit. A panic is reported as
    /// `NetError::UnitPanicked`.
    pub fn run<U, T, F>(&self, units: Vec<U>, f: F) -> BatchReport<T>
    where
        U: Send,
        T: Send,
        F: Fn(usize, U) -> Result<T> + Sync
    {
        let n = units.len();

        let outcomes: Vec<(usize, Result<T>)> = self.pool.install(|| {
            units.into_par_iter()
                 .enumerate()
                 .map(|(i, unit)| {
                     let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(i, unit)))
                                       .unwrap_or_else(|payload| Err(NetError::UnitPanicked(panic_message(payload))));
                     (i, outcome)
                 })
                 .collect()
        });

        let mut report = BatchReport { results: BTreeMap::new(), errors: BTreeMap::new() };
        for (i, outcome) in outcomes {
            match outcome {
                Ok(t) => {
                    report.results.insert(i, t);
                },
                Err(e) => {
                    warn!(unit = i, error = %e, "unit failed");
                    report.errors.insert(i, e);
                }
            }
        }

        debug!(units = n, failed = report.errors.len(), "batch complete");
        report
    }

}


fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceEngine, VarElim};
    use crate::init::Initialization;
    use crate::model::directed::DirectedModelBuilder;
    use crate::variable::{Assignment, Variable};

    #[test]
    fn all_results() {
        let pool = Pool::new(PoolConfig::new(3)).unwrap();
        assert_eq!(pool.threads(), 3);

        let report = pool.run((0..20).collect::<Vec<usize>>(), |i, u| Ok(i * u));
        assert!(report.is_complete());
        assert_eq!(report.len(), 20);
        for (i, r) in report.results.iter() {
            assert_eq!(*r, i * i);
        }
    }

    #[test]
    fn failures_are_isolated() {
        let pool = Pool::new(PoolConfig::new(2)).unwrap();

        let report = pool.run((0..10).collect::<Vec<usize>>(), |i, _| {
            if i == 3 {
                Err(NetError::InferenceFailed(String::from("unit 3")))
            } else if i == 7 {
                panic!("unit 7");
            } else {
                Ok(i)
            }
        });

        assert_eq!(report.len(), 10);
        assert_eq!(report.results.len(), 8);
        assert!(! report.is_complete());
        match report.errors.get(&3) {
            Some(NetError::InferenceFailed(_)) => (),
            _ => panic!("wrong error type")
        };
        match report.errors.get(&7) {
            Some(NetError::UnitPanicked(msg)) => assert_eq!(msg, "unit 7"),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn empty_batch() {
        let pool = Pool::new(PoolConfig::default()).unwrap();
        let report = pool.run(Vec::<usize>::new(), |_, u| Ok(u));
        assert!(report.is_empty());
    }

    #[test]
    fn config_from_env() {
        env::set_var(THREADS_VAR, "4");
        assert_eq!(PoolConfig::from_env().unwrap(), PoolConfig::new(4));

        env::set_var(THREADS_VAR, "four");
        assert!(PoolConfig::from_env().is_err());

        env::remove_var(THREADS_VAR);
        assert_eq!(PoolConfig::from_env().unwrap(), PoolConfig::default());
    }

    #[test]
    fn batch_of_queries() {
        // one small network per unit, each with a different prior
        let priors: Vec<f64> = vec![0.1, 0.3, 0.5, 0.7, 0.9];
        let pool = Pool::new(PoolConfig::new(2)).unwrap();

        let report = pool.run(priors.clone(), |_, p| {
            let a = Variable::binary("A");
            let b = Variable::binary("B");
            let model = DirectedModelBuilder::new()
                            .with_variable(&a, vec![], Initialization::Binomial(p))
                            .with_variable(&b, vec![a.clone()], Initialization::Table(array![[0.8, 0.2], [0.2, 0.8]].into_dyn()))
                            .build()?;

            let mut e = Assignment::new();
            e.set(&b, 0);

            let engine = VarElim::instantiate(&model);
            let table = engine.infer(&engine.make_query(&[a.clone()], &e)?)?;
            Ok(table.query(&a)?.as_discrete().map(|d| d.get(0)).unwrap_or(0.0))
        });

        assert!(report.is_complete());
        for (i, p) in priors.iter().enumerate() {
            let expected = 0.8 * p / (0.8 * p + 0.2 * (1.0 - p));
            assert!((report.results[&i] - expected).abs() < 1e-12);
        }
    }
}
