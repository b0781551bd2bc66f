#![allow(non_snake_case)]
use std::collections::BTreeMap;

use ndarray::prelude::*;

use crate::float::Float;
use crate::nomials::{Monomial, Posynomial, VarKey};
use crate::relaxation::Relaxation;

/// `ln(sum_k exp(e_k . y + b_k))`, the logarithm of a posynomial in the variables `y = ln(x)`.
#[derive(Clone, Debug)]
pub(crate) struct LogSumExp<F> {
    /// One row of exponents per term
    exps: Array2<F>,
    /// Logarithms of the coefficients
    b: Array1<F>,
}

/// Value, gradient and Hessian of a [`LogSumExp`] at a point.
pub(crate) struct Derivatives<F> {
    pub(crate) value: F,
    pub(crate) gradient: Array1<F>,
    pub(crate) hessian: Array2<F>,
}

impl<F: Float> LogSumExp<F> {
    pub(crate) fn from_posynomial(p: &Posynomial<F>, index: &BTreeMap<VarKey, usize>) -> Self {
        let n = index.len();
        let mut exps = Array2::zeros((p.len(), n));
        let mut b = Array1::zeros(p.len());
        for (k, m) in p.terms().iter().enumerate() {
            b[k] = m.c().ln();
            for (key, &e) in m.exps() {
                exps[[k, index[key]]] = e;
            }
        }
        LogSumExp { exps, b }
    }

    /// `sign * y_k - ln_bound`, which keeps `y_k` inside the box `|y_k| < ln_bound`.
    pub(crate) fn box_side(k: usize, n: usize, sign: F, ln_bound: F) -> Self {
        let mut exps = Array2::zeros((1, n));
        exps[[0, k]] = sign;
        LogSumExp {
            exps,
            b: Array1::from_elem(1, -ln_bound),
        }
    }

    /// The same function of `(y, s)` minus the extra variable `s`.
    pub(crate) fn with_slack(&self) -> Self {
        let (terms, n) = self.exps.dim();
        let mut exps = Array2::from_elem((terms, n + 1), -F::one());
        exps.slice_mut(s![.., ..n]).assign(&self.exps);
        LogSumExp {
            exps,
            b: self.b.clone(),
        }
    }

    fn exponents(&self, y: &Array1<F>) -> Array1<F> {
        self.exps.dot(y) + &self.b
    }

    pub(crate) fn value(&self, y: &Array1<F>) -> F {
        let v = self.exponents(y);
        let max = v.fold(F::neg_infinity(), |acc, &e| acc.max(e));
        if !max.is_finite() {
            return max;
        }
        max + v.mapv(|e| (e - max).exp()).sum().ln()
    }

    pub(crate) fn derivatives(&self, y: &Array1<F>) -> Derivatives<F> {
        let v = self.exponents(y);
        let max = v.fold(F::neg_infinity(), |acc, &e| acc.max(e));
        let e = v.mapv(|e| (e - max).exp());
        let total = e.sum();
        let p = e / total;

        let gradient = self.exps.t().dot(&p);
        let weighted = &self.exps * &p.view().insert_axis(Axis(1));
        let g = gradient.view().insert_axis(Axis(1));
        let hessian = self.exps.t().dot(&weighted) - g.dot(&g.t());
        Derivatives {
            value: max + total.ln(),
            gradient,
            hessian,
        }
    }
}

/// A relaxation in the variables `y = ln(x)`:
///
/// ```text
/// min_y  f_0(y)
/// st     f_i(y) <= 0
///        A y == b
/// ```
/// with every `f` a [`LogSumExp`].
pub(crate) struct LogSpaceProgram<F> {
    pub(crate) objective: LogSumExp<F>,
    pub(crate) constraints: Vec<LogSumExp<F>>,
    pub(crate) A: Array2<F>,
    pub(crate) b: Array1<F>,
}

impl<F: Float> LogSpaceProgram<F> {
    /// Transform a relaxation and box every variable into `[1 / bound, bound]`.
    pub(crate) fn from_relaxation(relaxation: &Relaxation<F>, bound: F) -> Self {
        let index: BTreeMap<VarKey, usize> = relaxation
            .variables()
            .iter()
            .enumerate()
            .map(|(k, key)| (key.clone(), k))
            .collect();
        let n = index.len();
        let ln_bound = bound.ln();

        let mut constraints: Vec<_> = relaxation
            .inequalities()
            .iter()
            .map(|p| LogSumExp::from_posynomial(p, &index))
            .collect();
        for k in 0..n {
            constraints.push(LogSumExp::box_side(k, n, F::one(), ln_bound));
            constraints.push(LogSumExp::box_side(k, n, -F::one(), ln_bound));
        }

        let (A, b) = linear_equalities(relaxation.equalities(), &index);
        LogSpaceProgram {
            objective: LogSumExp::from_posynomial(relaxation.objective(), &index),
            constraints,
            A,
            b,
        }
    }

    pub(crate) fn n(&self) -> usize {
        self.A.ncols()
    }

    /// Phase I program: minimize `s` subject to `f_i(y) <= s` and `A y == b`, over `(y, s)`.
    pub(crate) fn phase_one(&self) -> Self {
        let (p, n) = self.A.dim();
        let mut objective = Array2::zeros((1, n + 1));
        objective[[0, n]] = F::one();
        let mut A = Array2::zeros((p, n + 1));
        A.slice_mut(s![.., ..n]).assign(&self.A);
        LogSpaceProgram {
            objective: LogSumExp {
                exps: objective,
                b: Array1::zeros(1),
            },
            constraints: self.constraints.iter().map(|c| c.with_slack()).collect(),
            A,
            b: self.b.clone(),
        }
    }

    /// Largest constraint value at `y`, negative when `y` is strictly feasible.
    pub(crate) fn max_constraint(&self, y: &Array1<F>) -> F {
        self.constraints
            .iter()
            .map(|c| c.value(y))
            .fold(F::neg_infinity(), |acc, v| acc.max(v))
    }
}

/// `c * x^a == 1` is `a . y == -ln(c)`.
fn linear_equalities<F: Float>(
    equalities: &[Monomial<F>],
    index: &BTreeMap<VarKey, usize>,
) -> (Array2<F>, Array1<F>) {
    let mut A = Array2::zeros((equalities.len(), index.len()));
    let mut b = Array1::zeros(equalities.len());
    for (j, m) in equalities.iter().enumerate() {
        b[j] = -m.c().ln();
        for (key, &e) in m.exps() {
            A[[j, index[key]]] = e;
        }
    }
    (A, b)
}
