//! A pure-Rust local solver for signomial programs.
//!
//! # Signomial programs
//!
//! A signomial program minimizes a posynomial over positive variables subject to monomial
//! equalities and signomial inequalities:
//!
//! ```text
//!    min_x f(x)
//!    st    m_j(x) == 1
//!          g_i(x) - h_i(x) <= 1
//!                        x > 0
//! ```
//!
//! with `f`, `g_i` and `h_i` posynomials and `m_j` monomials. Without the subtracted `h_i` this is
//! a geometric program, which is convex in `ln(x)`. With them it is not, and
//! [`LocalSolver`] finds a local optimum instead: it replaces every `h_i` by a monomial lower
//! bound at the current point, solves the resulting geometric program, and repeats from its
//! optimum until the cost stops improving. Every point the solver visits is feasible for the
//! original program.
//!
//! The geometric programs are solved by any [`GpSolver`](solvers::GpSolver). The crate ships a
//! small dense [`Barrier`](solvers::Barrier) method that is adequate for problems with tens of
//! variables.
//!
//! # Example
//! ```
//! use approx::assert_abs_diff_eq;
//!
//! use sp::prelude::*;
//!
//! let x = Monomial::var("x");
//! let y = Monomial::var("y");
//!
//! // min x + y^2  st  x >= 0.1, x + y >= 1
//! let program = SignomialProgram::minimize(x.clone() + y.powf(2.0))
//!     .leq(Monomial::new(0.1, [("x", -1.0)]))
//!     // 2 - (x + y) <= 1
//!     .signomial(Monomial::constant(2.0), x + y)
//!     .build()
//!     .unwrap();
//!
//! // All options have defaults, set only the ones that need changing.
//! let solver = LocalSolver::custom()
//!     .reltol(1e-6)
//!     .max_iter(50)
//!     .reversal_tol(1e-6)
//!     .disp(false)
//!     .build()
//!     .unwrap();
//!
//! let solution = solver.solve(&program, &Barrier::default()).unwrap();
//!
//! assert_eq!(solution.status(), Status::Converged);
//! assert_abs_diff_eq!(solution.cost().unwrap(), 0.75, epsilon = 1e-4);
//! assert_abs_diff_eq!(solution.x().unwrap().get("y").unwrap(), 0.5, epsilon = 1e-2);
//! ```
//!
//! # Logging
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade: one `debug` line per
//! pass and per barrier centering, `info` on termination and `warn` when a solve stops without
//! converging. The `disp` options of [`LocalSolver`] and [`Barrier`](solvers::Barrier)
//! additionally print progress tables to stdout.

pub mod assignment;
mod condensation;
pub mod error;
pub mod float;
pub mod local_solve;
pub mod nomials;
pub mod prelude;
pub mod relaxation;
pub mod signomial_program;
pub mod solvers;
pub mod trace;

pub use assignment::Assignment;
pub use local_solve::{LocalSolver, Solution, Status};
pub use nomials::{Monomial, Posynomial, VarKey};
pub use signomial_program::{
    GpConstraint, SignomialConstraint, SignomialProgram, SignomialProgramBuilder,
};

#[cfg(test)]
mod tests {
    use crate::local_solve::best;
    use crate::prelude::*;
    use approx::assert_abs_diff_eq;

    fn x() -> Monomial<f64> {
        Monomial::var("x")
    }

    fn y() -> Monomial<f64> {
        Monomial::var("y")
    }

    /// min x + y^2  st  x >= 0.1, x + y >= 1, with `x + y >= 1` written as `2 - (x + y) <= 1`.
    fn sum_formulation() -> SignomialProgram<f64> {
        SignomialProgram::minimize(x() + y().powf(2.0))
            .leq(Monomial::new(0.1, [("x", -1.0)]))
            .signomial(Monomial::constant(2.0), x() + y())
            .build()
            .unwrap()
    }

    /// The same program with `x + y >= 1` written as `1/x - y/x <= 1`.
    fn ratio_formulation() -> SignomialProgram<f64> {
        SignomialProgram::minimize(x() + y().powf(2.0))
            .leq(Monomial::new(0.1, [("x", -1.0)]))
            .signomial(x().powf(-1.0), &y() / &x())
            .build()
            .unwrap()
    }

    fn point(x: f64, y: f64) -> Assignment<f64> {
        [("x", x), ("y", y)].into_iter().collect()
    }

    fn solve_from(
        program: &SignomialProgram<f64>,
        x0: Assignment<f64>,
        reltol: f64,
    ) -> Solution<f64> {
        LocalSolver::custom()
            .x0(x0)
            .reltol(reltol)
            .build()
            .unwrap()
            .solve(program, &Barrier::default())
            .unwrap()
    }

    /// min x  st  x >= 0.1, y <= 0.1 and `x + y >= 1`, the latter as `2 - (x + y) <= 1` when
    /// `split`, otherwise as `1/x - y/x <= 1`.
    fn bounded_y(split: bool) -> SignomialProgram<f64> {
        let builder = SignomialProgram::minimize(x())
            .leq(Monomial::new(0.1, [("x", -1.0)]))
            .leq(y() * 10.0);
        let builder = if split {
            builder.signomial(Monomial::constant(2.0), x() + y())
        } else {
            builder.signomial(x().powf(-1.0), &y() / &x())
        };
        builder.build().unwrap()
    }

    #[test]
    fn formulation_changes_the_iteration_count() {
        for reltol in [1e-4, 1e-6] {
            let split = solve_from(&bounded_y(true), point(0.1, 0.01), reltol);
            let direct = solve_from(&bounded_y(false), point(0.1, 0.01), reltol);
            assert!(split.is_converged());
            assert!(direct.is_converged());
            assert_abs_diff_eq!(split.cost().unwrap(), 0.9, epsilon = 1e-6);
            assert_abs_diff_eq!(direct.cost().unwrap(), 0.9, epsilon = 1e-6);
            assert!(
                split.iterations() >= 2 * direct.iterations(),
                "{} vs {} at reltol {reltol}",
                split.iterations(),
                direct.iterations()
            );
        }
    }

    #[test]
    fn exact_condensation_needs_a_single_improving_pass() {
        let sum = solve_from(&sum_formulation(), point(1.0, 1.0), 1e-6);
        let ratio = solve_from(&ratio_formulation(), point(1.0, 1.0), 1e-6);
        assert!(sum.is_converged());
        assert!(ratio.is_converged());
        assert_abs_diff_eq!(sum.cost().unwrap(), 0.75, epsilon = 1e-5);
        assert_abs_diff_eq!(ratio.cost().unwrap(), 0.75, epsilon = 1e-6);
        // Condensing 1 + y/x at x = y keeps the exact optimum ratio, so the second formulation
        // hits the optimum in its first pass.
        assert_eq!(ratio.iterations(), 2);
        assert!(sum.iterations() > ratio.iterations());
    }

    #[test]
    fn bounded_y_from_the_unit_point() {
        for split in [true, false] {
            let solution = solve_from(&bounded_y(split), point(1.0, 1.0), 1e-6);
            assert!(solution.is_converged());
            assert_abs_diff_eq!(solution.cost().unwrap(), 0.9, epsilon = 1e-6);
            assert_abs_diff_eq!(solution.x().unwrap().get("y").unwrap(), 0.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn tighter_tolerances_never_take_fewer_iterations() {
        let iterations: Vec<_> = [1e-2, 1e-4, 1e-6]
            .iter()
            .map(|&reltol| solve_from(&sum_formulation(), point(1.0, 1.0), reltol).iterations())
            .collect();
        assert!(iterations.windows(2).all(|w| w[0] <= w[1]), "{iterations:?}");
    }

    #[test]
    fn costs_decrease_and_every_point_is_feasible() {
        let program = sum_formulation();
        let solution = solve_from(&program, point(0.3, 3.0), 1e-6);
        assert!(solution.is_converged());

        let costs = solution.trace().costs();
        assert!(costs.windows(2).all(|w| w[1] <= w[0] * (1.0 + 1e-8)), "{costs:?}");
        for record in solution.trace() {
            let x = record.x().unwrap();
            assert!(program.is_feasible(x, 1e-8).unwrap());
        }
        assert!(program.is_feasible(solution.x().unwrap(), 1e-8).unwrap());
    }

    #[test]
    fn geometric_program_is_solved_in_one_pass() {
        let program = SignomialProgram::minimize(x() + y())
            .leq(Monomial::new(1.0, [("x", -1.0), ("y", -1.0)]))
            .build()
            .unwrap();
        let solution = LocalSolver::default()
            .solve(&program, &Barrier::default())
            .unwrap();
        assert_eq!(solution.iterations(), 1);

        let relaxation = Relaxation::geometric(&program).unwrap();
        match Barrier::default().solve(&relaxation).unwrap() {
            GpOutcome::Solved(direct) => {
                assert_abs_diff_eq!(solution.cost().unwrap(), direct.cost(), epsilon = 1e-12)
            }
            other => panic!("unexpected {:?}", other.status()),
        }
    }

    #[test]
    fn resolving_from_a_converged_point_stays_there() {
        let program = sum_formulation();
        let first = solve_from(&program, point(1.0, 1.0), 1e-6);
        let (x, cost) = first.into_result().unwrap();
        let again = solve_from(&program, x, 1e-4);
        assert_eq!(again.iterations(), 2);
        assert_abs_diff_eq!(again.cost().unwrap(), cost, epsilon = 1e-6);
    }

    #[test]
    fn default_anchor_is_used_without_x0() {
        let solution = LocalSolver::default()
            .solve(&sum_formulation(), &Barrier::default())
            .unwrap();
        assert!(solution.is_converged());
        let first = solution.trace().records()[0].anchor();
        assert_eq!(first, &point(1.0, 1.0));
    }

    #[test]
    fn infeasible_program() {
        // x <= 0.5 and x >= 1
        let program = SignomialProgram::minimize(x())
            .leq(x() * 2.0)
            .signomial(Monomial::constant(2.0), x())
            .build()
            .unwrap();
        let solution = LocalSolver::default()
            .solve(&program, &Barrier::default())
            .unwrap();
        assert_eq!(solution.status(), Status::Infeasible);
        assert!(solution.cost().is_none());
    }

    #[test]
    fn multistart() {
        let starts = [point(1.0, 1.0), point(2.0, 0.5), point(0.3, 3.0)];
        let solver = LocalSolver::custom().reltol(1e-6).build().unwrap();
        let solutions = solver.solve_multistart(&sum_formulation(), &Barrier::default(), &starts);
        assert_eq!(solutions.len(), 3);
        for (solution, start) in solutions.iter().zip(&starts) {
            let solution = solution.as_ref().unwrap();
            assert!(solution.is_converged());
            assert_abs_diff_eq!(solution.cost().unwrap(), 0.75, epsilon = 1e-4);
            assert_eq!(solution.trace().records()[0].anchor(), start);
        }
        assert_abs_diff_eq!(best(&solutions).unwrap().cost().unwrap(), 0.75, epsilon = 1e-4);
    }

    /// `y >= sin(x)` on `(0, pi)`, approximated by its tangent monomial in log space.
    #[derive(Debug)]
    struct AboveSine;

    impl GpConstraint<f64> for AboveSine {
        fn variables(&self) -> Vec<VarKey> {
            vec!["x".into(), "y".into()]
        }

        fn as_gp_constraint(
            &self,
            anchor: &Assignment<f64>,
        ) -> Result<Posynomial<f64>, SignomialError<f64>> {
            let x0 = anchor.get("x").unwrap();
            let a = x0 / x0.tan();
            Ok(Monomial::new(x0.sin() * x0.powf(-a), [("x", a), ("y", -1.0)]).into())
        }

        fn violation(&self, x: &Assignment<f64>) -> Result<f64, SignomialError<f64>> {
            Ok(x.get("x").unwrap().sin() / x.get("y").unwrap() - 1.0)
        }
    }

    #[test]
    fn external_constraint() {
        let quarter = std::f64::consts::FRAC_PI_4;
        let program = SignomialProgram::minimize(y())
            .leq(Monomial::new(quarter, [("x", -1.0)]))
            .leq(Monomial::new(0.5 / quarter, [("x", 1.0)]))
            .external(AboveSine)
            .build()
            .unwrap();
        let solution = LocalSolver::default()
            .solve(&program, &Barrier::default())
            .unwrap();
        assert!(solution.is_converged());
        assert_eq!(solution.iterations(), 3);
        assert_abs_diff_eq!(solution.cost().unwrap(), quarter.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(solution.x().unwrap().get("x").unwrap(), quarter, epsilon = 1e-6);
        assert!(program.is_feasible(solution.x().unwrap(), 1e-6).unwrap());
        let costs = solution.trace().costs();
        assert!(costs[1] < costs[0]);
    }
}
