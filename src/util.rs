//! Defines the `Error` type for the hybridnet library

use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, NetError>;

#[derive(Clone, Debug, Error)]
pub enum NetError {

    /// Represents an incomplete assignment where a complete assignment was required.
    #[error("Missing assignments to the required Variables")]
    IncompleteAssignment,

    /// Represents an error where a certain constraint on a scope was not satisfied
    #[error("Provided scope did not satisfy constraints")]
    InvalidScope,

    /// Represents an error where there was a parent variable expected, but not found
    #[error("Missing a parent from the model")]
    MissingParent,

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("A variable was encountered twice")]
    DuplicateVariable,

    /// Represents an attempt to initialize a variable with an incompatible Initialization
    #[error("An invalid initialization was provided")]
    InvalidInitialization,

    /// Represents a situation in which there was a negative (or otherwise invalid) probability
    /// provided
    #[error("Encountered a negative or non-finite probability")]
    NonPositiveProbability,

    /// A value that lies outside of the domain of its `Variable`
    #[error("Invalid value for variable '{0}'")]
    InvalidValue(String),

    /// A node could not be turned into a usable `Factor`. Holds the name of the node.
    #[error("Malformed node '{0}'")]
    MalformedNode(String),

    /// An attempt to sum or maximize a continuous `Variable` out of a `Factor`
    #[error("Cannot eliminate continuous variable '{0}'")]
    ContinuousElimination(String),

    /// Bucket elimination did not produce an answer
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// A `Variable` that is not part of the query was requested from a result
    #[error("Unknown query variable '{0}'")]
    UnknownVariable(String),

    /// A `Variable` was used through an accessor for the other kind
    #[error("Variable '{name}' is not {expected}")]
    WrongKind { name: String, expected: &'static str },

    /// A unit of a parallel batch panicked
    #[error("Batch unit panicked: {0}")]
    UnitPanicked(String),

    /// A general error with the given description
    #[error("{0}")]
    General(String),

}
