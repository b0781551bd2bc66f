use crate::assignment::Assignment;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignomialError<F: Debug> {
    #[error("The program is invalid: {0}")]
    InvalidProblem(String),
    #[error("The variable assignment is invalid: {0}")]
    InvalidAssignment(String),
    #[error("A parameter was set to an invalid value: {0}")]
    InvalidParameter(&'static str),
    #[error("No monomial approximation exists: {0}")]
    NumericalDegeneracy(String),
    #[error("The solver encountered numerical problems it could not recover from. Likely causes are linearly dependent equality constraints or variables whose scale differs by many orders of magnitude.")]
    NumericalProblem,
    #[error("The conservative relaxation has no feasible point.")]
    Infeasible,
    #[error("The relaxation appears to be unbounded.")]
    Unbounded,
    #[error("The local solve did not converge within the maximum number of iterations. Best point found:\n{0:#?}")]
    DidNotConverge(Assignment<F>),
}
