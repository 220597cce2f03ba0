//! Defines a `GaussianCpd`: a continuous `Variable` that is normally distributed, with a mean and
//! variance chosen by the configuration of its discrete parents.

use super::{parent_key, Node};
use crate::distrib::{Density, Gaussian};
use crate::factor::{Factor, Table};
use crate::jdf::Jdf;
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};

use itertools::Itertools;
use ndarray::prelude as nd;


#[derive(Clone, Debug)]
pub struct GaussianCpd {

    var: Variable,

    parents: Vec<Variable>,

    /// One `Gaussian` per parent configuration, in row-major order over the parents
    gaussians: Vec<Gaussian>

}

impl GaussianCpd {

    /// Create a new `GaussianCpd`
    ///
    /// # Errors
    /// * `NetError::WrongKind` if `var` is discrete or a parent is continuous
    /// * `NetError::DuplicateVariable` if a parent appears twice
    /// * `NetError::InvalidScope` if there is not exactly one `Gaussian` per parent configuration
    pub fn new(var: &Variable, parents: Vec<Variable>, gaussians: Vec<Gaussian>) -> Result<Self> {
        var.expect_continuous()?;
        for p in parents.iter() {
            p.expect_discrete()?;
        }

        if parents.iter().unique().count() != parents.len() {
            return Err(NetError::DuplicateVariable);
        }

        let configs: usize = parents.iter().map(|p| p.cardinality()).product();
        if gaussians.len() != configs {
            return Err(NetError::InvalidScope);
        }

        Ok(GaussianCpd { var: var.clone(), parents, gaussians })
    }

    pub fn gaussians(&self) -> &[Gaussian] {
        &self.gaussians
    }

    /// The `Gaussian` for the parent configuration in `assignment`
    pub fn gaussian(&self, assignment: &Assignment) -> Option<&Gaussian> {
        let key = parent_key(&self.parents, assignment)?;
        let index = key.iter()
                       .zip(self.parents.iter())
                       .fold(0, |acc, (&k, p)| acc * p.cardinality() + k);
        self.gaussians.get(index)
    }

    fn shape(&self) -> Vec<usize> {
        self.parents.iter().map(|p| p.cardinality()).collect()
    }

}

impl Node for GaussianCpd {

    fn variable(&self) -> &Variable {
        &self.var
    }

    fn parents(&self) -> &[Variable] {
        &self.parents
    }

    fn make_factor(&self, evidence: &Assignment) -> Result<Factor> {
        let shape = self.shape();

        let factor = match evidence.get(&self.var) {
            Some(val) => {
                // observed: the factor is the likelihood of the observation for each configuration
                self.var.check(val)?;
                let x = evidence.continuous(&self.var).ok_or_else(|| {
                    NetError::InvalidValue(self.var.name().to_string())
                })?;
                if ! x.is_finite() {
                    return Err(NetError::MalformedNode(self.var.name().to_string()));
                }

                let weights: Vec<f64> = self.gaussians.iter().map(|g| g.density(x)).collect();
                let table = Table::from_shape_vec(nd::IxDyn(&shape), weights).map_err(|e| {
                    NetError::General(format!("{}", e))
                })?;
                Factor::new(self.parents.clone(), table)?.mark_evidenced()
            },
            None => {
                // unobserved: every configuration carries the density of the child
                let jdfs = self.gaussians
                               .iter()
                               .map(|g| Jdf::single(&self.var, Density::from(*g)))
                               .collect::<Result<Vec<Jdf>>>()?;
                Factor::new(self.parents.clone(), Table::ones(nd::IxDyn(&shape)))?
                    .with_jdfs(vec![self.var.clone()], jdfs)?
                    .with_head(&self.var)
            }
        };

        factor.reduce(evidence)
    }

    fn value(&self, assignment: &Assignment) -> Result<f64> {
        let x = assignment.continuous(&self.var).ok_or(NetError::IncompleteAssignment)?;
        let g = self.gaussian(assignment).ok_or(NetError::IncompleteAssignment)?;
        Ok(g.density(x))
    }

}


#[cfg(test)]
mod tests {

    use super::*;

    fn trait_cpd() -> (Variable, Variable, GaussianCpd) {
        let p = Variable::binary("P");
        let x = Variable::continuous("X");
        let cpd = GaussianCpd::new(
            &x,
            vec![p.clone()],
            vec![Gaussian::new(0.0, 1.0).unwrap(), Gaussian::new(5.0, 2.0).unwrap()]
        ).unwrap();
        (p, x, cpd)
    }

    #[test]
    fn construct_errs() {
        let p = Variable::binary("P");
        let x = Variable::continuous("X");
        let g = Gaussian::standard();

        assert!(GaussianCpd::new(&p, vec![], vec![g]).is_err());
        assert!(GaussianCpd::new(&x, vec![x.clone()], vec![g, g]).is_err());
        match GaussianCpd::new(&x, vec![p.clone()], vec![g]) {
            Err(NetError::InvalidScope) => (),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn unobserved_child() {
        let (p, x, cpd) = trait_cpd();
        let f = cpd.make_factor(&Assignment::new()).unwrap();

        assert_eq!(f.discrete(), &[p.clone()]);
        assert_eq!(f.continuous(), &[x.clone()]);
        assert!(! f.is_evidenced());
        assert_eq!(f.head(), Some(&x));
        assert_eq!(f.total(), 2.0);
        assert_eq!(f.jdf_at(1).unwrap().get(&x).unwrap().mean(), 5.0);
    }

    #[test]
    fn observed_child() {
        let (p, x, cpd) = trait_cpd();
        let mut e = Assignment::new();
        e.set_continuous(&x, 1.0);

        let f = cpd.make_factor(&e).unwrap();
        assert_eq!(f.discrete(), &[p.clone()]);
        assert!(f.continuous().is_empty());
        assert!(f.is_evidenced());
        assert!((f.weight_at(&[0]) - Gaussian::standard().density(1.0)).abs() < 1e-12);

        let mut a = e.clone();
        a.set(&p, 1);
        assert!((cpd.value(&a).unwrap() - f.weight_at(&[1])).abs() < 1e-12);

        // a discrete value for a continuous variable
        let mut bad = Assignment::new();
        bad.set(&x, 0);
        assert!(cpd.make_factor(&bad).is_err());
    }

    #[test]
    fn observed_parent() {
        let (p, x, cpd) = trait_cpd();
        let mut e = Assignment::new();
        e.set(&p, 1);

        let f = cpd.make_factor(&e).unwrap();
        assert!(f.is_atomic());
        assert!(f.is_evidenced());
        assert_eq!(f.jdf_at(0).unwrap().get(&x).unwrap().mean(), 5.0);
    }

    #[test]
    fn root() {
        let x = Variable::continuous("X");
        let cpd = GaussianCpd::new(&x, vec![], vec![Gaussian::new(2.0, 1.0).unwrap()]).unwrap();
        let f = cpd.make_factor(&Assignment::new()).unwrap();
        assert!(f.is_atomic());
        assert_eq!(f.total(), 1.0);
        assert_eq!(f.jdf_at(0).unwrap().get(&x).unwrap().mode(), 2.0);
    }

}
