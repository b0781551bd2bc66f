#![allow(non_snake_case)]
use linfa_linalg::qr::QR;
use log::debug;
use ndarray::prelude::*;

use crate::error::SignomialError;
use crate::float::Float;

use super::indicators::Phase;
use super::log_sum_exp::LogSpaceProgram;
use super::Barrier;

impl<F: Float> Barrier<F> {
    /// A point that satisfies the equalities and every inequality strictly, or `None` if phase I
    /// proves that no such point exists.
    pub(super) fn feasible_point(
        &self,
        program: &LogSpaceProgram<F>,
        iterations: &mut usize,
    ) -> Result<Option<Array1<F>>, SignomialError<F>> {
        let y0 = min_norm_start(&program.A, &program.b)?;
        let worst = program.max_constraint(&y0);
        if worst < F::zero() {
            return Ok(Some(y0));
        }
        if !worst.is_finite() {
            return Err(SignomialError::NumericalProblem);
        }
        debug!("starting point violates a constraint by {worst}, running phase I");

        let n = program.n();
        let mut z0 = Array1::zeros(n + 1);
        z0.slice_mut(s![..n]).assign(&y0);
        z0[n] = worst + F::one();
        let (z, found) = self.barrier_method(&program.phase_one(), z0, Phase::One, iterations)?;
        if !found {
            return Ok(None);
        }
        Ok(Some(z.slice(s![..n]).to_owned()))
    }
}

/// Minimum-norm solution of `A y == b`, through a QR decomposition of `A'`.
///
/// Fails with a NumericalProblem if the rows of `A` are linearly dependent.
pub(super) fn min_norm_start<F: Float>(
    A: &Array2<F>,
    b: &Array1<F>,
) -> Result<Array1<F>, SignomialError<F>> {
    let (p, n) = A.dim();
    if p == 0 {
        return Ok(Array1::zeros(n));
    }
    if p > n {
        return Err(SignomialError::NumericalProblem);
    }
    let factor = || A.t().qr().or(Err(SignomialError::NumericalProblem));

    let R = factor()?.into_r();
    let diag = R.diag();
    let largest = diag.fold(F::zero(), |acc, &d| acc.max(d.abs()));
    let threshold = largest * F::epsilon().sqrt();
    if diag.iter().any(|&d| !(d.abs() > threshold)) {
        return Err(SignomialError::NumericalProblem);
    }

    let y = factor()?
        .solve_tr_into(b.view().insert_axis(Axis(1)).to_owned())
        .or(Err(SignomialError::NumericalProblem))?;
    Ok(y.remove_axis(Axis(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn min_norm_solution() {
        let A = array![[1.0, 1.0]];
        let b = array![2.0];
        let y = min_norm_start(&A, &b).unwrap();
        assert_abs_diff_eq!(y[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn satisfies_every_equality() {
        let A = array![[1.0, 2.0, 0.0], [0.0, 1.0, -1.0]];
        let b = array![1.0, -3.0];
        let y = min_norm_start(&A, &b).unwrap();
        let r = A.dot(&y) - &b;
        assert_abs_diff_eq!(r[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn no_equalities_start_at_the_origin() {
        let y = min_norm_start(&Array2::<f64>::zeros((0, 3)), &Array1::zeros(0)).unwrap();
        assert_eq!(y, Array1::zeros(3));
    }

    #[test]
    fn dependent_rows_are_rejected() {
        let A = array![[1.0, 1.0, 0.0], [2.0, 2.0, 0.0]];
        let b = array![0.0, 0.0];
        assert!(matches!(
            min_norm_start(&A, &b),
            Err(SignomialError::NumericalProblem)
        ));
        assert!(matches!(
            min_norm_start(&array![[1.0], [2.0]], &array![1.0, 2.0]),
            Err(SignomialError::NumericalProblem)
        ));
    }
}
