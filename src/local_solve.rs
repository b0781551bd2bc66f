//! Local solves of signomial programs by successive geometric-program relaxations.
//!
//! Starting from an anchor, every pass relaxes the program around the anchor into a geometric
//! program, solves it, and moves the anchor to its optimum. Each relaxation contains the previous
//! optimum, so the costs are non-increasing up to solver accuracy, and the loop stops once the
//! relative improvement drops below `reltol`.
use std::fmt::{self, Display};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;
use crate::relaxation::Relaxation;
use crate::signomial_program::SignomialProgram;
use crate::solvers::{GpOutcome, GpSolver, GpStatus};
use crate::trace::{self, IterationRecord, Trace};

/// Builder struct to customize the [`LocalSolver`].
///
/// After constructing the default configuration with [`LocalSolver::custom`], use the other
/// methods to update specific settings, and finally call [`build`](LocalSolverBuilder::build) to
/// validate the settings and create the solver.
pub struct LocalSolverBuilder<F> {
    reltol: F,
    x0: Option<Assignment<F>>,
    max_iter: usize,
    reversal_tol: F,
    disp: bool,
}

impl<F: Float> LocalSolverBuilder<F> {
    pub(crate) fn new() -> LocalSolverBuilder<F> {
        LocalSolverBuilder {
            reltol: F::cast(1e-4),
            x0: None,
            max_iter: 50,
            reversal_tol: F::cast(1e-6),
            disp: false,
        }
    }

    /// Set the convergence tolerance. The solve has converged once a pass improves the cost by
    /// less than this fraction of the previous cost.
    pub fn reltol(mut self, reltol: F) -> Self {
        self.reltol = reltol;
        self
    }

    /// Initial anchor. Must assign a positive value to every variable of the program. Without
    /// one, [`SignomialProgram::default_anchor`] is used.
    pub fn x0(mut self, x0: Assignment<F>) -> Self {
        self.x0 = Some(x0);
        self
    }

    /// Maximum number of relaxations to solve before giving up.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Relative cost increase between passes that is still attributed to solver inaccuracy.
    /// Any larger increase ends the solve as [`Status::DidNotConverge`].
    pub fn reversal_tol(mut self, reversal_tol: F) -> Self {
        self.reversal_tol = reversal_tol;
        self
    }

    /// Set to true to print one line per pass to stdout.
    pub fn disp(mut self, disp: bool) -> Self {
        self.disp = disp;
        self
    }

    /// Validate the settings and construct the solver.
    /// Returns an `InvalidParameter` error if one of the settings is out of range.
    pub fn build(self) -> Result<LocalSolver<F>, SignomialError<F>> {
        if !(self.reltol >= F::zero()) {
            return Err(SignomialError::InvalidParameter(
                "The relative tolerance must be nonnegative.",
            ));
        }
        if self.max_iter == 0 {
            return Err(SignomialError::InvalidParameter(
                "The maximum number of iterations must be positive.",
            ));
        }
        if !(self.reversal_tol >= F::zero()) {
            return Err(SignomialError::InvalidParameter(
                "The reversal tolerance must be nonnegative.",
            ));
        }
        Ok(LocalSolver {
            reltol: self.reltol,
            x0: self.x0,
            max_iter: self.max_iter,
            reversal_tol: self.reversal_tol,
            disp: self.disp,
        })
    }
}

/// Local solver for signomial programs.
///
/// To get started quickly, use the [`default`](LocalSolver::default()) method to initialize the
/// solver with default parameters. See [`custom`](LocalSolver::custom()) for customization options
/// through the builder pattern.
#[derive(Clone, PartialEq, Debug)]
pub struct LocalSolver<F> {
    reltol: F,
    x0: Option<Assignment<F>>,
    max_iter: usize,
    reversal_tol: F,
    disp: bool,
}

impl<F: Float> Default for LocalSolver<F> {
    fn default() -> Self {
        LocalSolver {
            reltol: F::cast(1e-4),
            x0: None,
            max_iter: 50,
            reversal_tol: F::cast(1e-6),
            disp: false,
        }
    }
}

impl<F: Float> LocalSolver<F> {
    /// Construct a new solver, to be customized through the builder pattern.
    ///
    /// ```rust
    /// use approx::assert_abs_diff_eq;
    /// use sp::prelude::*;
    ///
    /// let x = Monomial::var("x");
    /// let y = Monomial::var("y");
    ///
    /// // min x  st  x + y >= 4 (as 4/x - y/x <= 1), y <= x
    /// let program = SignomialProgram::minimize(x.clone())
    ///     .signomial(Monomial::new(4.0, [("x", -1.0)]), &y / &x)
    ///     .leq(&y / &x)
    ///     .build()
    ///     .unwrap();
    ///
    /// let x0 = [("x", 1.0), ("y", 2.0)].into_iter().collect();
    /// let solver = LocalSolver::custom().x0(x0).reltol(1e-6).build().unwrap();
    /// let solution = solver.solve(&program, &Barrier::default()).unwrap();
    ///
    /// assert!(solution.is_converged());
    /// assert_abs_diff_eq!(solution.cost().unwrap(), 2.0, epsilon = 1e-5);
    /// ```
    pub fn custom() -> LocalSolverBuilder<F> {
        LocalSolverBuilder::new()
    }

    pub fn reltol(&self) -> F {
        self.reltol
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Find a local optimum of `program`, solving its relaxations with `solver`.
    ///
    /// Infeasible or unbounded relaxations and failure to converge are reported through
    /// [`Solution::status`]. Errors are reserved for invalid inputs and failures of the solver.
    pub fn solve<S>(
        &self,
        program: &SignomialProgram<F>,
        solver: &S,
    ) -> Result<Solution<F>, SignomialError<F>>
    where
        S: GpSolver<F> + ?Sized,
    {
        let anchor = match &self.x0 {
            Some(x0) => {
                x0.covers(program.variables())?;
                x0.restrict(program.variables())
            }
            None => program.default_anchor(),
        };
        self.solve_from(program, solver, anchor)
    }

    /// Solve `program` once from every starting point, in parallel.
    ///
    /// The results are in the order of `starts`, which override any configured `x0`.
    pub fn solve_multistart<S>(
        &self,
        program: &SignomialProgram<F>,
        solver: &S,
        starts: &[Assignment<F>],
    ) -> Vec<Result<Solution<F>, SignomialError<F>>>
    where
        S: GpSolver<F> + Sync + ?Sized,
    {
        starts
            .par_iter()
            .map(|x0| {
                x0.covers(program.variables())?;
                self.solve_from(program, solver, x0.restrict(program.variables()))
            })
            .collect()
    }

    fn solve_from<S>(
        &self,
        program: &SignomialProgram<F>,
        solver: &S,
        anchor: Assignment<F>,
    ) -> Result<Solution<F>, SignomialError<F>>
    where
        S: GpSolver<F> + ?Sized,
    {
        if self.disp {
            println!("{}", trace::HEADER);
        }
        let mut state = IterationState::new(anchor);
        let status = loop {
            if let Some(status) = state.advance(self, program, solver)? {
                break status;
            }
        };
        let solution = state.finish(status);
        info!(
            "local solve finished: {} after {} iterations",
            solution.status,
            solution.iterations()
        );
        if self.disp {
            println!("{}", solution.status);
        }
        Ok(solution)
    }
}

/// Mutable state of a single local solve.
struct IterationState<F> {
    anchor: Assignment<F>,
    prev_cost: F,
    iteration: usize,
    trace: Trace<F>,
    /// Lowest-cost point so far
    best: Option<(Assignment<F>, F)>,
    /// Point and cost of the pass that ended the solve
    last: Option<(Assignment<F>, F)>,
}

impl<F: Float> IterationState<F> {
    fn new(anchor: Assignment<F>) -> Self {
        IterationState {
            anchor,
            prev_cost: F::infinity(),
            iteration: 0,
            trace: Trace::new(),
            best: None,
            last: None,
        }
    }

    /// Run one pass. Returns the terminal status once the solve is over.
    fn advance<S>(
        &mut self,
        config: &LocalSolver<F>,
        program: &SignomialProgram<F>,
        solver: &S,
    ) -> Result<Option<Status>, SignomialError<F>>
    where
        S: GpSolver<F> + ?Sized,
    {
        let relaxation = Relaxation::at(program, &self.anchor)?;
        let solution = match solver.solve(&relaxation)? {
            GpOutcome::Solved(solution) => solution,
            GpOutcome::Infeasible => {
                return Ok(Some(self.fail(config, GpStatus::Infeasible, Status::Infeasible)))
            }
            GpOutcome::Unbounded => {
                return Ok(Some(self.fail(config, GpStatus::Unbounded, Status::Unbounded)))
            }
        };

        let cost = solution.cost();
        if !cost.is_positive_finite() {
            warn!("the solver returned cost {cost} in pass {}", self.iteration);
            return Err(SignomialError::NumericalProblem);
        }
        let x = solution.into_x();
        x.covers(program.variables())?;

        let improvement = if self.prev_cost.is_finite() {
            (self.prev_cost - cost) / self.prev_cost
        } else {
            F::infinity()
        };
        self.record(
            config,
            IterationRecord::solved(
                self.iteration,
                self.anchor.clone(),
                x.clone(),
                cost,
                improvement,
            ),
        );
        debug!(
            "pass {}: cost {cost}, relative improvement {improvement}",
            self.iteration
        );
        if self.best.as_ref().map_or(true, |(_, best)| cost < *best) {
            self.best = Some((x.clone(), cost));
        }

        if improvement < -config.reversal_tol {
            warn!(
                "cost increased by {} in pass {}, stopping at the best point found",
                -improvement, self.iteration
            );
            return Ok(Some(Status::DidNotConverge));
        }
        if !program.is_signomial() || (improvement < config.reltol && self.iteration > 0) {
            self.last = Some((x, cost));
            return Ok(Some(Status::Converged));
        }

        self.anchor = x;
        self.prev_cost = cost;
        self.iteration += 1;
        if self.iteration >= config.max_iter {
            warn!(
                "no convergence after {} iterations, stopping at the best point found",
                self.iteration
            );
            return Ok(Some(Status::DidNotConverge));
        }
        Ok(None)
    }

    /// Record a pass whose relaxation could not be solved.
    fn fail(&mut self, config: &LocalSolver<F>, gp_status: GpStatus, status: Status) -> Status {
        let record = IterationRecord::failed(self.iteration, self.anchor.clone(), gp_status);
        self.record(config, record);
        status
    }

    fn record(&mut self, config: &LocalSolver<F>, record: IterationRecord<F>) {
        if config.disp {
            println!("{record}");
        }
        self.trace.push(record);
    }

    fn finish(self, status: Status) -> Solution<F> {
        let point = match status {
            Status::Converged => self.last,
            Status::DidNotConverge => self.best,
            Status::Infeasible | Status::Unbounded => None,
        };
        let (x, cost) = match point {
            Some((x, cost)) => (Some(x), Some(cost)),
            None => (None, None),
        };
        Solution {
            status,
            x,
            cost,
            trace: self.trace,
        }
    }
}

/// How a local solve ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The relative improvement dropped below `reltol`
    Converged,
    /// A relaxation had no feasible point
    Infeasible,
    /// A relaxation had no finite optimum
    Unbounded,
    /// `max_iter` was reached, or the cost increased
    DidNotConverge,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Converged => "converged",
            Status::Infeasible => "infeasible",
            Status::Unbounded => "unbounded",
            Status::DidNotConverge => "did not converge",
        };
        f.write_str(s)
    }
}

/// Outcome of a local solve.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution<F> {
    status: Status,
    x: Option<Assignment<F>>,
    cost: Option<F>,
    trace: Trace<F>,
}

impl<F: Float> Solution<F> {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// The final point for converged solves, the best point found otherwise. `None` when a
    /// relaxation was infeasible or unbounded.
    pub fn x(&self) -> Option<&Assignment<F>> {
        self.x.as_ref()
    }

    pub fn cost(&self) -> Option<F> {
        self.cost
    }

    /// The number of relaxations solved
    pub fn iterations(&self) -> usize {
        self.trace.len()
    }

    pub fn trace(&self) -> &Trace<F> {
        &self.trace
    }

    /// The point and cost of a converged solve, or the terminal status as an error.
    pub fn into_result(self) -> Result<(Assignment<F>, F), SignomialError<F>> {
        match (self.status, self.x, self.cost) {
            (Status::Converged, Some(x), Some(cost)) => Ok((x, cost)),
            (Status::DidNotConverge, Some(x), _) => Err(SignomialError::DidNotConverge(x)),
            (Status::Unbounded, _, _) => Err(SignomialError::Unbounded),
            _ => Err(SignomialError::Infeasible),
        }
    }
}

/// The converged solution with the lowest cost.
pub fn best<F: Float>(
    solutions: &[Result<Solution<F>, SignomialError<F>>],
) -> Option<&Solution<F>> {
    solutions
        .iter()
        .filter_map(|s| s.as_ref().ok())
        .filter(|s| s.is_converged())
        .fold(None, |best: Option<&Solution<F>>, s| match best {
            Some(b) if b.cost <= s.cost => Some(b),
            _ => Some(s),
        })
}
