//! Module containing initialization routines for the parameters of a model.

use crate::cpd::{Cpd, GaussianCpd, TableCpd};
use crate::distrib::Gaussian;
use crate::factor::Table;
use crate::util::{NetError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::Rng;

/// Defines possible ways to initialize a `Variable`s CPD.
pub enum Initialization<'a> {

    /// A uniform distribution over all possibilities. Valid only for a discrete `Variable`.
    Uniform,

    /// Randomly initialize the weights of the CPD. For a continuous `Variable`, every parent
    /// configuration gets a random mean and variance.
    Random,

    /// Initialize the CPD as a Binomial distribution with parameter ```p```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),

    /// User defined CPD, with shape `[parents..., var]`
    Table(Table),

    /// The same normal distribution ```(mean, variance)``` for every parent configuration
    Gaussian(f64, f64),

    /// One normal distribution ```(mean, variance)``` per parent configuration, row-major
    Gaussians(&'a [(f64, f64)])

}


impl<'a> Initialization<'a> {

    /// Construct a CPD, initialized based on ```self```
    ///
    /// # Args
    /// * `var`: the `Variable` the CPD is a distribution over
    /// * `parents`: the parents of `var`, in the order that indexes the CPD
    ///
    /// # Returns
    /// a `Cpd`: a `TableCpd` for a discrete `Variable`, a `GaussianCpd` for a continuous one
    ///
    /// # Errors
    /// * `NetError::InvalidInitialization` if the initialization does not apply to `var`
    /// * any error raised by the constructor of the CPD
    pub fn build_cpd(self, var: &Variable, parents: Vec<Variable>) -> Result<Cpd> {
        ///////////////////////////////////////////////////////////////////////////////
        // Continuous variables
        if var.is_continuous() {
            let configs: usize = parents.iter().map(|p| p.cardinality()).product();

            let gaussians = match self {
                Initialization::Gaussian(m, v) => vec![Gaussian::new(m, v)?; configs],
                Initialization::Gaussians(ps) => {
                    ps.iter().map(|&(m, v)| Gaussian::new(m, v)).collect::<Result<Vec<_>>>()?
                },
                Initialization::Random => {
                    let mut rng = rand::thread_rng();
                    let means = Uniform::new(-10.0, 10.0);
                    let variances = Uniform::new(0.5, 4.0);
                    (0..configs).map(|_| Gaussian::new(rng.sample(means), rng.sample(variances)))
                                .collect::<Result<Vec<_>>>()?
                },
                _ => return Err(NetError::InvalidInitialization)
            };

            return Ok(Cpd::from(GaussianCpd::new(var, parents, gaussians)?));
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Check for errors
        if parents.is_empty() {

            match self {

                // A binomial distribution on a non-binary variable
                Initialization::Binomial(p) if var.cardinality() != 2 || p < 0.0 || p > 1.0 => {
                    return Err(NetError::InvalidInitialization);
                },

                // A multinomial distribution with an incorrect number of parameters
                Initialization::Multinomial(ps) if ps.len() != var.cardinality() => {
                    return Err(NetError::InvalidInitialization);
                },

                _ => ()
            }
        } else {
            match self {

                // A binomial/multinomial on a non-unit scope
                Initialization::Binomial(_) | Initialization::Multinomial(_) => {
                    return Err(NetError::InvalidInitialization);
                },

                _ => ()
            }
        }

        ///////////////////////////////////////////////////////////////////////////////
        // now, build CPD
        let mut shape: Vec<usize> = parents.iter().map(|v| v.cardinality()).collect();
        shape.push(var.cardinality());

        let tbl = match self {
            Initialization::Uniform => {
                // normalizing constant is just the number of elements
                let val = 1. / (var.cardinality() as f64);
                nd::Array::from_elem(shape, val).into_dyn()
            },
            Initialization::Random => {
                let ax = nd::Axis(shape.len() - 1);
                let tbl: Table = nd::Array::random(shape, Uniform::new(1.0, 100.0));
                let z = tbl.sum_axis(ax).insert_axis(ax);
                &tbl / &z
            },
            Initialization::Binomial(p) => {
                array![p, (1.0 - p)].into_dyn()
            },
            Initialization::Multinomial(p) => {
                nd::Array::from_iter(p.iter().cloned()).into_dyn()
            },
            Initialization::Table(t) => t,
            Initialization::Gaussian(..) | Initialization::Gaussians(_) => {
                return Err(NetError::InvalidInitialization);
            }
        };

        Ok(Cpd::from(TableCpd::new(var, parents, tbl)?))
    }

}
