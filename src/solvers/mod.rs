//! Solvers for the geometric programs produced by [`Relaxation`].
//!
//! The local solve only talks to a [`GpSolver`]. [`Barrier`] is a small dense reference
//! implementation; any closure with the right signature is a solver as well, which is how
//! external backends and test doubles are plugged in.
pub mod barrier;

pub use barrier::Barrier;

use std::fmt::{self, Display};

use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;
use crate::relaxation::Relaxation;

/// Solver trait that any geometric-program backend implements.
pub trait GpSolver<F: Float> {
    /// Solve a relaxation. Infeasibility and unboundedness are outcomes, not errors; errors are
    /// reserved for failures of the solver itself.
    fn solve(&self, relaxation: &Relaxation<F>) -> Result<GpOutcome<F>, SignomialError<F>>;
}

impl<F, S> GpSolver<F> for S
where
    F: Float,
    S: Fn(&Relaxation<F>) -> Result<GpOutcome<F>, SignomialError<F>>,
{
    fn solve(&self, relaxation: &Relaxation<F>) -> Result<GpOutcome<F>, SignomialError<F>> {
        self(relaxation)
    }
}

/// What a solver found for one relaxation.
#[derive(Clone, Debug, PartialEq)]
pub enum GpOutcome<F> {
    Solved(GpSolution<F>),
    Infeasible,
    Unbounded,
}

impl<F> GpOutcome<F> {
    pub fn status(&self) -> GpStatus {
        match self {
            GpOutcome::Solved(_) => GpStatus::Solved,
            GpOutcome::Infeasible => GpStatus::Infeasible,
            GpOutcome::Unbounded => GpStatus::Unbounded,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpStatus {
    Solved,
    Infeasible,
    Unbounded,
}

impl Display for GpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GpStatus::Solved => "solved",
            GpStatus::Infeasible => "infeasible",
            GpStatus::Unbounded => "unbounded",
        };
        f.write_str(s)
    }
}

/// Optimum of a relaxation.
#[derive(Clone, Debug, PartialEq)]
pub struct GpSolution<F> {
    /// The optimal point
    x: Assignment<F>,

    /// The objective value at `x`
    cost: F,

    /// The number of iterations the solver needed
    iteration: usize,
}

impl<F: Float> GpSolution<F> {
    pub fn new(x: Assignment<F>, cost: F, iteration: usize) -> Self {
        Self { x, cost, iteration }
    }

    pub fn x(&self) -> &Assignment<F> {
        &self.x
    }

    pub fn cost(&self) -> F {
        self.cost
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub(crate) fn into_x(self) -> Assignment<F> {
        self.x
    }
}
