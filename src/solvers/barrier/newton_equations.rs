#![allow(non_snake_case)]
use linfa_linalg::{cholesky::SolveC, qr::QR, LinalgError};
use log::warn;
use ndarray::prelude::*;

use crate::error::SignomialError;
use crate::float::Float;

/// Which decomposition to try first for the Newton system.
///
/// Without equality constraints the system is the Hessian of the barrier function, which is
/// positive definite, and a Cholesky decomposition is the cheapest option. Close to the boundary
/// it can still fail numerically, in which case the solver falls back to QR. With equality
/// constraints the full KKT matrix is indefinite and QR is used directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum EquationSolverType {
    Cholesky,
    Qr,
}

/// Newton step and the square of the Newton decrement.
pub(crate) struct NewtonStep<F> {
    pub(crate) dy: Array1<F>,
    pub(crate) decrement: F,
}

impl EquationSolverType {
    pub(crate) fn for_equalities(p: usize) -> EquationSolverType {
        if p == 0 {
            EquationSolverType::Cholesky
        } else {
            EquationSolverType::Qr
        }
    }

    /// Solve
    /// ```text
    /// [ H  A' ] [ dy ]   [ -g ]
    /// [ A  0  ] [ w  ] = [  0 ]
    /// ```
    /// for the equality-constrained Newton step `dy`. If the selected decomposition fails, retry
    /// with the next one. If all fail or the result is not finite, fail with a NumericalProblem.
    pub(crate) fn solve_newton_equations<F: Float>(
        self,
        H: &Array2<F>,
        g: &Array1<F>,
        A: &Array2<F>,
    ) -> Result<NewtonStep<F>, SignomialError<F>> {
        let solved = match self {
            EquationSolverType::Cholesky => cholesky(H, g),
            EquationSolverType::Qr => kkt_qr(H, g, A),
        };
        let dy = match (solved, self) {
            (Ok(dy), _) if dy.iter().all(|e| e.is_finite()) => dy,
            (_, EquationSolverType::Cholesky) => {
                warn!("Cholesky decomposition of the Newton system failed, falling back to QR");
                return EquationSolverType::Qr.solve_newton_equations(H, g, A);
            }
            (_, EquationSolverType::Qr) => return Err(SignomialError::NumericalProblem),
        };
        let decrement = -g.dot(&dy);
        Ok(NewtonStep { dy, decrement })
    }
}

fn cholesky<F: Float>(H: &Array2<F>, g: &Array1<F>) -> Result<Array1<F>, LinalgError> {
    let rhs = g.mapv(|e| -e).insert_axis(Axis(1));
    let solved = H.to_owned().solvec(&rhs)?;
    Ok(solved.remove_axis(Axis(1)))
}

fn kkt_qr<F: Float>(
    H: &Array2<F>,
    g: &Array1<F>,
    A: &Array2<F>,
) -> Result<Array1<F>, LinalgError> {
    let (p, n) = A.dim();
    let mut K = Array2::zeros((n + p, n + p));
    K.slice_mut(s![..n, ..n]).assign(H);
    K.slice_mut(s![n.., ..n]).assign(A);
    K.slice_mut(s![..n, n..]).assign(&A.t());
    let mut rhs = Array2::zeros((n + p, 1));
    rhs.slice_mut(s![..n, 0]).assign(&g.mapv(|e| -e));
    let solved = K.qr()?.solve_into(rhs)?;
    Ok(solved.slice(s![..n, 0]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn unconstrained_step() {
        let H = array![[2.0, 0.0], [0.0, 4.0]];
        let g = array![2.0, -4.0];
        let A = Array2::zeros((0, 2));
        for solver in [EquationSolverType::Cholesky, EquationSolverType::Qr] {
            let step = solver.solve_newton_equations(&H, &g, &A).unwrap();
            assert_abs_diff_eq!(step.dy[0], -1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(step.dy[1], 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(step.decrement, 6.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn step_stays_in_the_null_space_of_the_equalities() {
        let H = array![[2.0, 0.0], [0.0, 2.0]];
        let g = array![2.0, 0.0];
        let A = array![[1.0, 1.0]];
        let step = EquationSolverType::for_equalities(1)
            .solve_newton_equations(&H, &g, &A)
            .unwrap();
        assert_abs_diff_eq!(step.dy[0] + step.dy[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(step.dy[0], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn indefinite_hessian_falls_back_to_qr() {
        let H = array![[1.0, 0.0], [0.0, -1.0]];
        let g = array![1.0, 1.0];
        let A = Array2::zeros((0, 2));
        let step = EquationSolverType::Cholesky
            .solve_newton_equations(&H, &g, &A)
            .unwrap();
        assert_abs_diff_eq!(step.dy[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(step.dy[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_system_is_a_numerical_problem() {
        let H = Array2::<f64>::zeros((2, 2));
        let g = array![1.0, 1.0];
        let A = Array2::zeros((0, 2));
        assert!(matches!(
            EquationSolverType::Cholesky.solve_newton_equations(&H, &g, &A),
            Err(SignomialError::NumericalProblem)
        ));
    }
}
