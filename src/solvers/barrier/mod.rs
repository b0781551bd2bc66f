#![allow(non_snake_case)]
//! A dense barrier method for geometric programs.
//!
//! After the change of variables `y = ln(x)` every posynomial becomes a convex log-sum-exp function
//! and every monomial equality a linear equality, so a relaxation becomes
//!
//! ```text
//! min_y  f_0(y)
//! st     f_i(y) <= 0
//!        A y == b
//! ```
//!
//! which is solved by the standard barrier method \[1\]: minimize `t f_0(y) - sum_i ln(-f_i(y))`
//! with equality-constrained Newton steps for increasing `t`. A strictly feasible starting point
//! is found by a phase I that minimizes a shared slack over `f_i(y) <= s`.
//!
//! Every variable is kept inside `[1 / bound, bound]`; an optimum pressed against that box is
//! reported as unbounded.
//!
//! .. \[1\] Boyd, Stephen, and Lieven Vandenberghe. Convex optimization.
//!        Cambridge University Press, 2004. Chapter 11.
//!
mod feasible_point;
mod indicators;
mod log_sum_exp;
mod newton_equations;

use log::{debug, info};
use ndarray::prelude::*;

use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;
use crate::relaxation::Relaxation;
use crate::solvers::{GpOutcome, GpSolution, GpSolver};

use indicators::{Indicators, Phase};
use log_sum_exp::LogSpaceProgram;
use newton_equations::EquationSolverType;

/// Sufficient decrease parameter of the backtracking line search.
const ARMIJO: f64 = 0.01;
/// Step shrink factor of the backtracking line search.
const BACKTRACK: f64 = 0.5;

/// Builder struct to customize the [`Barrier`] solver.
///
/// Start from [`Barrier::custom`], update specific settings, and finally call
/// [`build`](BarrierBuilder::build) to validate the customized settings and create the solver.
pub struct BarrierBuilder<F> {
    tol: F,
    mu: F,
    bound: F,
    max_iter: usize,
    disp: bool,
}

impl<F: Float> BarrierBuilder<F> {
    pub(crate) fn new() -> BarrierBuilder<F> {
        BarrierBuilder {
            tol: F::cast(1e-9),
            mu: F::cast(20),
            bound: F::cast(1e30),
            max_iter: 1000,
            disp: false,
        }
    }

    /// Duality gap at which the solve is finished. The objective value in log space is within
    /// `tol` of the optimum. Should be a small positive value.
    pub fn tol(mut self, tol: F) -> Self {
        self.tol = tol;
        self
    }

    /// Factor by which the barrier weight grows after every centering. Larger values need fewer
    /// centerings of more Newton steps each.
    pub fn mu(mut self, mu: F) -> Self {
        self.mu = mu;
        self
    }

    /// Every variable is confined to `[1 / bound, bound]`. A solution within a factor `e` of the
    /// box is reported as unbounded.
    pub fn bound(mut self, bound: F) -> Self {
        self.bound = bound;
        self
    }

    /// Maximum number of Newton steps, phase I included, before giving up.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set to true to print the progress of every centering to stdout.
    pub fn disp(mut self, disp: bool) -> Self {
        self.disp = disp;
        self
    }

    /// Validate the settings and construct the solver.
    /// Returns an `InvalidParameter` error if one of the settings is out of range.
    pub fn build(self) -> Result<Barrier<F>, SignomialError<F>> {
        if !(self.tol > F::zero()) {
            return Err(SignomialError::InvalidParameter(
                "The tolerance must be positive.",
            ));
        }
        if !(self.mu > F::one()) {
            return Err(SignomialError::InvalidParameter(
                "The barrier growth factor mu must be larger than 1.",
            ));
        }
        if !(self.bound.is_finite() && self.bound.ln() > F::one()) {
            return Err(SignomialError::InvalidParameter(
                "The variable bound must be finite and larger than e.",
            ));
        }
        if self.max_iter == 0 {
            return Err(SignomialError::InvalidParameter(
                "The maximum number of Newton steps must be positive.",
            ));
        }
        Ok(Barrier {
            tol: self.tol,
            mu: self.mu,
            bound: self.bound,
            max_iter: self.max_iter,
            disp: self.disp,
        })
    }
}

/// Barrier method solver for geometric programs.
///
/// To get started quickly, use the [`default`](Barrier::default()) method to initialize the solver
/// with default parameters. See [`custom`](Barrier::custom()) for customization options through
/// the builder pattern.
#[derive(Clone, PartialEq, Debug)]
pub struct Barrier<F> {
    tol: F,
    mu: F,
    bound: F,
    max_iter: usize,
    disp: bool,
}

impl<F: Float> Default for Barrier<F> {
    fn default() -> Self {
        Barrier {
            tol: F::cast(1e-9),
            mu: F::cast(20),
            bound: F::cast(1e30),
            max_iter: 1000,
            disp: false,
        }
    }
}

impl<F: Float> GpSolver<F> for Barrier<F> {
    fn solve(&self, relaxation: &Relaxation<F>) -> Result<GpOutcome<F>, SignomialError<F>> {
        let program = LogSpaceProgram::from_relaxation(relaxation, self.bound);
        let n = program.n();
        if n == 0 {
            // Nothing to optimize: every function is a constant.
            let y = Array1::zeros(0);
            if program.max_constraint(&y) > F::zero() {
                return Ok(GpOutcome::Infeasible);
            }
            let cost = program.objective.value(&y).exp();
            return Ok(GpOutcome::Solved(GpSolution::new(Assignment::new(), cost, 0)));
        }

        if self.disp {
            println!("{}", indicators::HEADER);
        }
        let mut iterations = 0;
        let y0 = match self.feasible_point(&program, &mut iterations)? {
            Some(y0) => y0,
            None => {
                info!("phase I found no strictly feasible point after {iterations} Newton steps");
                return Ok(GpOutcome::Infeasible);
            }
        };
        let (y, _) = self.barrier_method(&program, y0, Phase::Two, &mut iterations)?;

        let ln_bound = self.bound.ln();
        if y.iter().any(|v| v.abs() > ln_bound - F::one()) {
            info!("the optimum lies on the variable bounds, treating the relaxation as unbounded");
            return Ok(GpOutcome::Unbounded);
        }
        let cost = program.objective.value(&y).exp();
        let x = relaxation
            .variables()
            .iter()
            .zip(y.iter())
            .map(|(key, &v)| (key.clone(), v.exp()))
            .collect();
        Ok(GpOutcome::Solved(GpSolution::new(x, cost, iterations)))
    }
}

impl<F: Float> Barrier<F> {
    /// Construct a new solver, to be customized through the builder pattern.
    ///
    /// ```rust
    /// use approx::assert_abs_diff_eq;
    /// use sp::prelude::*;
    ///
    /// // min x + y  st  1 / (x y) <= 1
    /// let program = SignomialProgram::minimize(Monomial::var("x") + Monomial::var("y"))
    ///     .leq(Monomial::new(1.0, [("x", -1.0), ("y", -1.0)]))
    ///     .build()
    ///     .unwrap();
    /// let relaxation = Relaxation::geometric(&program).unwrap();
    ///
    /// let solver = Barrier::custom().tol(1e-10).build().unwrap();
    /// match solver.solve(&relaxation).unwrap() {
    ///     GpOutcome::Solved(solution) => {
    ///         assert_abs_diff_eq!(solution.cost(), 2.0, epsilon = 1e-8)
    ///     }
    ///     outcome => panic!("unexpected outcome {:?}", outcome.status()),
    /// }
    /// ```
    pub fn custom() -> BarrierBuilder<F> {
        BarrierBuilder::new()
    }

    /// Minimize `program` from the strictly feasible `y` for growing barrier weights.
    ///
    /// Returns the final point and whether phase I stopped early because it found a strictly
    /// feasible point.
    fn barrier_method(
        &self,
        program: &LogSpaceProgram<F>,
        mut y: Array1<F>,
        phase: Phase,
        iterations: &mut usize,
    ) -> Result<(Array1<F>, bool), SignomialError<F>> {
        let m = F::cast(program.constraints.len());
        let mut t = F::one();
        loop {
            let (centered, found) = self.centering(program, t, y, phase, iterations)?;
            y = centered;

            let indicators = Indicators {
                phase,
                t,
                gap: m / t,
                obj: match phase {
                    Phase::One => y[y.len() - 1],
                    Phase::Two => program.objective.value(&y).exp(),
                },
                newton: *iterations,
            };
            debug!("barrier {indicators}");
            if self.disp {
                println!("{indicators}");
            }

            if found {
                return Ok((y, true));
            }
            if m / t < self.tol {
                return Ok((y, false));
            }
            t *= self.mu;
        }
    }

    /// Minimize `t f_0(y) - sum_i ln(-f_i(y))` subject to `A y == b` by Newton's method.
    fn centering(
        &self,
        program: &LogSpaceProgram<F>,
        t: F,
        mut y: Array1<F>,
        phase: Phase,
        iterations: &mut usize,
    ) -> Result<(Array1<F>, bool), SignomialError<F>> {
        let solver_type = EquationSolverType::for_equalities(program.A.nrows());
        let newton_tol = F::epsilon().sqrt();
        loop {
            if *iterations >= self.max_iter {
                return Err(SignomialError::NumericalProblem);
            }
            *iterations += 1;

            let (g, H) = barrier_derivatives(program, t, &y);
            let step = solver_type.solve_newton_equations(&H, &g, &program.A)?;
            let start = potential(program, t, &y);
            // Decreases below the resolution of the potential cannot be realized.
            let floor = newton_tol.max(F::epsilon() * start.abs());
            if step.decrement / F::cast(2) <= floor {
                return Ok((y, false));
            }
            y = match line_search(program, t, &y, start, &step.dy, step.decrement) {
                Some(next) => next,
                // No step makes progress: as centered as it gets.
                None => return Ok((y, false)),
            };
            if phase == Phase::One && y[y.len() - 1] < F::zero() {
                return Ok((y, true));
            }
        }
    }
}

/// Gradient and Hessian of the barrier function `t f_0(y) - sum_i ln(-f_i(y))`.
fn barrier_derivatives<F: Float>(
    program: &LogSpaceProgram<F>,
    t: F,
    y: &Array1<F>,
) -> (Array1<F>, Array2<F>) {
    let objective = program.objective.derivatives(y);
    let mut g = objective.gradient * t;
    let mut H = objective.hessian * t;
    for c in &program.constraints {
        let d = c.derivatives(y);
        let slack = -d.value;
        g.scaled_add(slack.recip(), &d.gradient);
        H.scaled_add(slack.recip(), &d.hessian);
        let gc = d.gradient.view().insert_axis(Axis(1));
        H.scaled_add((slack * slack).recip(), &gc.dot(&gc.t()));
    }
    (g, H)
}

/// The barrier function, infinite outside the strictly feasible region.
fn potential<F: Float>(program: &LogSpaceProgram<F>, t: F, y: &Array1<F>) -> F {
    let mut value = t * program.objective.value(y);
    for c in &program.constraints {
        let f = c.value(y);
        if !(f < F::zero()) {
            return F::infinity();
        }
        value -= (-f).ln();
    }
    value
}

/// Backtracking line search along `dy` from `y`, where the barrier function equals `start`.
///
/// A step is accepted when it stays strictly feasible and decreases the barrier function
/// sufficiently and strictly. `None` if the step shrinks below machine precision first.
fn line_search<F: Float>(
    program: &LogSpaceProgram<F>,
    t: F,
    y: &Array1<F>,
    start: F,
    dy: &Array1<F>,
    decrement: F,
) -> Option<Array1<F>> {
    let armijo = F::cast(ARMIJO);
    let beta = F::cast(BACKTRACK);
    let mut alpha = F::one();
    while alpha > F::epsilon() {
        let candidate = y + &(dy * alpha);
        let value = potential(program, t, &candidate);
        // Far along the path `start` is so large that the Armijo term is lost in rounding.
        if value <= start - armijo * alpha * decrement && value < start {
            return Some(candidate);
        }
        alpha *= beta;
    }
    None
}
