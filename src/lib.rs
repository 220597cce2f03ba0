extern crate bidir_map;
extern crate indexmap;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate ndarray;
extern crate ndarray_rand;
extern crate rand;
extern crate rayon;
extern crate thiserror;
extern crate tracing;

pub mod variable;
pub mod distrib;
pub mod jdf;
pub mod factor;
pub mod cpd;
pub mod init;
pub mod model;
pub mod inference;
pub mod pool;
pub mod util;

pub use util::{Result, NetError};
pub use variable::{Assignment, Value, Variable};
pub use distrib::{Density, Distribution, EnumDistrib, Gaussian};
pub use inference::{InferenceEngine, Mode, Options, Query, QueryTable, VarElim};
pub use model::directed::{DirectedModel, DirectedModelBuilder};
pub use model::Network;
pub use pool::{BatchReport, Pool, PoolConfig};
