//! Defines a `DirectedModel`, which is a Bayesian model that represents the factorization of
//! a probability distribution P

use crate::cpd::{Cpd, Node};
use crate::init::Initialization;
use crate::util::{NetError, Result};
use crate::variable::{Assignment, Variable};
use super::Network;

use bidir_map::BidirMap;
use indexmap::IndexMap;

use std::collections::HashSet;


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used for the simple representation of a `DirectedModel`; instead, the
/// Conditional Probability Distribution (CPD) of each `Variable` implicitly defines the edges of
/// the graph. The `Variable`s are held in their topological order to faciliate efficient
/// computations over the graph.
pub struct DirectedModel {

    /// The `Variable`s comprising the scope of the `DirectedModel` and their associated CPDs. The
    /// CPD of a `Variable` ```X``` names its parents ```Pa(X)```, so in the DAG represented by
    /// this map there are edges ```P -> X forall P in Pa(X)```
    graph: IndexMap<Variable, Cpd>,

    /// The user-defined names of each `Variable`. This is a two way lookup ```(`Variable`->Name)```
    /// and ```(Name->`Variable`)```
    names: BidirMap<Variable, String>

}

impl DirectedModel {

    /// Get the CPD for the given variable in this model.
    pub fn cpd(&self, v: &Variable) -> Option<&Cpd> {
        self.graph.get(v)
    }

    /// Get a topological order of the `DirectedModel`
    pub fn topological_order(&self) -> Vec<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Lookup a `Variable` in the `DirectedModel` based on the name
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name))
    }

    /// Lookup a `Variable`'s name in the `DirectedModel`.
    pub fn lookup_name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(var)
    }

    /// Get all `Variable`s in the model.
    pub fn variables(&self) -> HashSet<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Get the number of `Variable`s in the the `DirectedModel`
    pub fn num_variables(&self) -> usize {
        self.graph.len()
    }

    /// The children of a `Variable`, in topological order
    pub fn children(&self, var: &Variable) -> Vec<Variable> {
        self.graph
            .iter()
            .filter(|&(_, cpd)| cpd.parents().contains(var))
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Determine the probability of a full `Assignment` to the `Variable`s in the `DirectedModel`.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment. Continuous
    /// `Variable`s contribute their density.
    ///
    /// # Args
    /// * `assignment`: a full `Assignment` to the model
    ///
    /// # Returns
    /// the probability of the `Assignment` given the model
    ///
    /// # Errors
    /// * `NetError::IncompleteAssignment` if a `Variable` of the model is not assigned
    pub fn probability(&self, assignment: &Assignment) -> Result<f64> {
        // for every variable in the graph
        self.graph.values()
                  // get the probability of the assignment
                  .map(|cpd| cpd.value(assignment))
                  // and multiply those probability by the chain rule
                  // but if there are any errors, just return the error
                  .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }
}

impl Network for DirectedModel {

    type Node = Cpd;

    fn nodes(&self) -> Vec<&Cpd> {
        self.graph.values().collect()
    }

    fn node(&self, var: &Variable) -> Option<&Cpd> {
        self.graph.get(var)
    }

}


/// An implementation of the [builder pattern] for creating a `DirectedModel`.
///
/// Models must be assembled in topological order: the parents of a `Variable` are added before
/// it.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct DirectedModelBuilder {

    /// The `Variable`s and their associated CPDs
    factors: IndexMap<Variable, Cpd>,

    /// The names of each `Variable`
    names: BidirMap<Variable, String>,

    /// The error state of the builder
    err: Option<NetError>

}


impl Default for DirectedModelBuilder {
    fn default() -> Self {
        DirectedModelBuilder::new()
    }
}


impl DirectedModelBuilder {

    /// Construct a new `DirectedModelBuilder` representing an empty `DirectedModel`
    pub fn new() -> Self {
        DirectedModelBuilder {
            factors: IndexMap::new(),
            names: BidirMap::new(),
            err: None
        }
    }


    /// Add a `Variable` to the `DirectedModel`, named by the `Variable`'s own name.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_variable(
        self,
        var: &Variable,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        self.add_variable(var, var.name().to_string(), parents, init)
    }


    /// Add a named `Variable` to the `DirectedModel`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `name`: the name for the variable.
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_named_variable(
        self,
        var: &Variable,
        name: &str,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        self.add_variable(var, String::from(name), parents, init)
    }


    /// Add a prebuilt CPD to the `DirectedModel`. Its `Variable` and parents are taken from the
    /// CPD itself.
    pub fn with_cpd(mut self, cpd: Cpd) -> Self {
        if self.err.is_some() {
            return self;
        }

        let var = cpd.variable().clone();
        if let Some(e) = self.check(&var, var.name(), cpd.parents()) {
            self.err = Some(e);
            return self;
        }

        self.names.insert(var.clone(), var.name().to_string());
        self.factors.insert(var, cpd);
        self
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `DirectedModel`, or an error if one was generated during the building process
    ///
    /// # Postcondition
    /// This call consumes the `DirectedModelBuilder`
    pub fn build(self) -> Result<DirectedModel> {
        if let Some(e) = self.err {
            Err(e)
        } else {
            Ok(self.into_model())
        }
    }

    /// Internal function that constructs the model
    fn into_model(self) -> DirectedModel {
        DirectedModel { graph: self.factors, names: self.names }
    }

    /// Internal function that checks a `Variable` can be added to the current model
    fn check(&self, var: &Variable, name: &str, parents: &[Variable]) -> Option<NetError> {
        if parents.iter().any(|v| ! self.factors.contains_key(v)) {
            return Some(NetError::MissingParent);
        }

        if self.factors.contains_key(var) || self.names.contains_second_key(&String::from(name)) {
            return Some(NetError::DuplicateVariable);
        }

        None
    }

    /// Internal function that acutally does the variable addition to the model
    fn add_variable(
        mut self,
        var: &Variable,
        name: String,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        ///////////////////////////////////////////////////////////////////////
        // 1) if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Check for error conditions
        if let Some(e) = self.check(var, &name, &parents) {
            self.err = Some(e);
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Build the CPD based on the initialization
        let cpd = match init.build_cpd(var, parents) {
            Ok(cpd) => cpd,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        ///////////////////////////////////////////////////////////////////////
        // 4) Add to current model
        self.factors.insert(var.clone(), cpd);
        self.names.insert(var.clone(), name);

        self
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cpd::TableCpd;

    #[test]
    fn build_empty() {
        let b = DirectedModelBuilder::new();
        let model = b.build();

        assert!(! model.is_err());

        let model = model.unwrap();
        assert_eq!(model.num_variables(), 0);
        assert!(model.variables().is_empty());
        assert!(model.nodes().is_empty());
    }


    #[test]
    /// Tests building a model with a single binary variable
    fn build_simple() {
        let v = Variable::binary("V");
        let b = DirectedModelBuilder::new();
        let model = b.with_variable(&v, vec![], Initialization::Uniform).build().unwrap();

        let vars = model.variables();
        assert_eq!(1, vars.len());
        assert!(vars.contains(&v));
        let name = model.lookup_name(&v).unwrap();
        assert_eq!(name, "V");
        let v2 = model.lookup_variable(name.as_str()).unwrap();
        assert_eq!(&v, v2);

        let cpd = model.cpd(&v).unwrap();
        assert!(cpd.parents().is_empty());
        let mut a = Assignment::new();
        a.set(&v, 0);
        assert_eq!(0.5, cpd.value(&a).unwrap());
        let mut a = Assignment::new();
        a.set(&v, 1);
        assert_eq!(0.5, cpd.value(&a).unwrap());
    }


    #[test]
    /// Tests building a model with a single, named binary variable
    fn build_named_simple() {
        let v = Variable::binary("V");
        let b = DirectedModelBuilder::new();
        let model = b.with_named_variable(&v, "foo", vec![], Initialization::Uniform)
                     .build()
                     .unwrap();

        let name = model.lookup_name(&v).unwrap();
        assert_eq!(name, "foo");
        let v2 = model.lookup_variable("foo").unwrap();
        assert_eq!(&v, v2);
        assert!(model.lookup_variable("V").is_none());
    }


    #[test]
    fn build_errors() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");

        // parent not yet in the model
        let res = DirectedModelBuilder::new()
                      .with_variable(&b, vec![a.clone()], Initialization::Uniform)
                      .build();
        match res {
            Err(NetError::MissingParent) => (),
            _ => panic!("wrong error type")
        };

        // variable added twice
        let res = DirectedModelBuilder::new()
                      .with_variable(&a, vec![], Initialization::Uniform)
                      .with_variable(&a, vec![], Initialization::Uniform)
                      .build();
        match res {
            Err(NetError::DuplicateVariable) => (),
            _ => panic!("wrong error type")
        };

        // the first error sticks
        let res = DirectedModelBuilder::new()
                      .with_variable(&a, vec![], Initialization::Binomial(2.0))
                      .with_variable(&b, vec![a.clone()], Initialization::Uniform)
                      .build();
        match res {
            Err(NetError::InvalidInitialization) => (),
            _ => panic!("wrong error type")
        };
    }


    #[test]
    /// Tests building a model with a single binary variable
    /// Example taken from Koller & Friedman Section 3.1.2
    fn intelligence() {
        let intelligence = Variable::binary("I");
        let sat = Variable::binary("S");

        let scpd = TableCpd::new(&sat, vec![intelligence.clone()], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();

        ///////////////////////////////////////////////////////////////////////////////////////////
        // TEST BUILDING
        let b = DirectedModelBuilder::new();
        let model = b.with_variable(
                        &intelligence,
                        vec![],
                        Initialization::Multinomial(&[0.7, 0.3])
                     ).with_cpd(
                         Cpd::from(scpd)
                     ).build().unwrap();


        assert_eq!("I", model.lookup_name(&intelligence).unwrap());
        assert_eq!(&intelligence, model.lookup_variable("I").unwrap());
        assert_eq!("S", model.lookup_name(&sat).unwrap());
        assert_eq!(&sat, model.lookup_variable("S").unwrap());
        assert_eq!(2, model.num_variables());
        assert_eq!(vec![intelligence.clone(), sat.clone()], model.topological_order());
        assert_eq!(vec![sat.clone()], model.children(&intelligence));

        ///////////////////////////////////////////////////////////////////////////////////////////
        // TEST GETTING PROBABILITY OF ASSIGNMENT
        let mut a = Assignment::new();
        a.set(&intelligence, 0);
        a.set(&sat, 0);
        assert_eq!(model.probability(&a).unwrap(), 0.7 * 0.95);

        let mut a = Assignment::new();
        a.set(&intelligence, 0);
        a.set(&sat, 1);
        assert_eq!(model.probability(&a).unwrap(), 0.7 * 0.05);

        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        a.set(&sat, 0);
        assert_eq!(model.probability(&a).unwrap(), 0.3 * 0.2);

        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        a.set(&sat, 1);
        assert_eq!(model.probability(&a).unwrap(), 0.3 * 0.8);

        // test partial assignment
        let mut a = Assignment::new();
        a.set(&intelligence, 1);
        assert!(model.probability(&a).is_err());
    }


    #[test]
    fn hybrid_probability() {
        let p = Variable::binary("P");
        let x = Variable::continuous("X");

        let model = DirectedModelBuilder::new()
                        .with_variable(&p, vec![], Initialization::Binomial(0.25))
                        .with_variable(&x, vec![p.clone()], Initialization::Gaussians(&[(0.0, 1.0), (3.0, 1.0)]))
                        .build()
                        .unwrap();

        let mut a = Assignment::new();
        a.set(&p, 1);
        a.set_continuous(&x, 3.0);

        let expected = 0.75 * crate::distrib::Gaussian::new(3.0, 1.0).unwrap().density(3.0);
        assert!((model.probability(&a).unwrap() - expected).abs() < 1e-12);
    }
}
