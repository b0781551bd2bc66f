//! Monomial lower bounds of posynomials by the weighted arithmetic-geometric mean inequality.
use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;
use crate::nomials::{Monomial, Posynomial, VarKey};
use std::collections::BTreeMap;

impl<F: Float> Posynomial<F> {
    /// Monomial `m` with `m(x0) = self(x0)` and `m(x) <= self(x)` for every positive `x`.
    ///
    /// With term values `v_k` at the anchor and weights `w_k = v_k / sum(v)`,
    /// `m(x) = prod_k (term_k(x) / w_k)^w_k`. The best local monomial fit to a
    /// posynomial in log space, which is also a global underestimator.
    ///
    /// ```
    /// use sp::prelude::*;
    ///
    /// let h = Monomial::<f64>::var("x") + Monomial::var("y");
    /// let x0: Assignment<f64> = [("x", 1.0), ("y", 1.0)].into_iter().collect();
    /// let m = h.mono_lower_bound(&x0).unwrap();
    /// // 2 * x^0.5 * y^0.5
    /// assert!((m.c() - 2.0).abs() < 1e-12);
    /// assert!((m.exponent("x") - 0.5).abs() < 1e-12);
    /// ```
    pub fn mono_lower_bound(&self, x0: &Assignment<F>) -> Result<Monomial<F>, SignomialError<F>> {
        if self.is_zero() {
            return Err(SignomialError::NumericalDegeneracy(
                "cannot approximate the zero posynomial".to_string(),
            ));
        }
        x0.covers(&self.vars())?;
        if let Some(m) = self.as_monomial() {
            return Ok(m.clone());
        }

        let values = self
            .terms()
            .iter()
            .map(|m| m.eval(x0))
            .collect::<Result<Vec<F>, _>>()?;
        if let Some((k, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_positive_finite())
        {
            return Err(SignomialError::NumericalDegeneracy(format!(
                "term {k} of `{self}` evaluates to {v} at the anchor"
            )));
        }
        let total = values.iter().fold(F::zero(), |acc, &v| acc + v);
        if !total.is_positive_finite() {
            return Err(SignomialError::NumericalDegeneracy(format!(
                "`{self}` evaluates to {total} at the anchor"
            )));
        }

        let mut log_c = F::zero();
        let mut exps: BTreeMap<VarKey, F> = BTreeMap::new();
        for (term, &v) in self.terms().iter().zip(&values) {
            let w = v / total;
            log_c += w * (term.c().ln() - w.ln());
            for (key, &e) in term.exps() {
                *exps.entry(key.clone()).or_insert_with(F::zero) += w * e;
            }
        }
        Ok(Monomial::new(log_c.exp(), exps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn point(x: f64, y: f64) -> Assignment<f64> {
        [("x", x), ("y", y)].into_iter().collect()
    }

    #[test]
    fn one_plus_x() {
        let h = Monomial::constant(1.0) + Monomial::var("x");
        let m = h.mono_lower_bound(&point(1.0, 1.0)).unwrap();
        assert_relative_eq!(m.c(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(m.exponent("x"), 0.5, epsilon = 1e-12);

        let m = h.mono_lower_bound(&point(3.0, 1.0)).unwrap();
        assert_relative_eq!(m.eval(&point(3.0, 1.0)).unwrap(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(m.exponent("x"), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn monomial_is_its_own_bound() {
        let h = Posynomial::from(Monomial::new(3.0, [("x", 2.0), ("y", -1.0)]));
        let m = h.mono_lower_bound(&point(0.5, 4.0)).unwrap();
        assert_eq!(&m, h.as_monomial().unwrap());
    }

    #[test]
    fn zero_posynomial_is_degenerate() {
        let h = Posynomial::<f64>::zero();
        assert!(matches!(
            h.mono_lower_bound(&point(1.0, 1.0)),
            Err(SignomialError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn underflowing_term_is_degenerate() {
        let h = Monomial::constant(1.0) + Monomial::new(1.0, [("x", -400.0)]);
        assert!(matches!(
            h.mono_lower_bound(&point(1e10, 1.0)),
            Err(SignomialError::NumericalDegeneracy(_))
        ));
    }

    #[test]
    fn anchor_must_cover_every_variable() {
        let h = Monomial::var("x") + Monomial::var("z");
        assert!(matches!(
            h.mono_lower_bound(&point(1.0, 1.0)),
            Err(SignomialError::InvalidAssignment(_))
        ));
        assert!(matches!(
            h.mono_lower_bound(&[("x", 1.0), ("z", -1.0)].into_iter().collect()),
            Err(SignomialError::InvalidAssignment(_))
        ));
    }

    fn posynomial() -> impl Strategy<Value = Posynomial<f64>> {
        prop::collection::vec((0.1f64..10.0, -3.0f64..3.0, -3.0f64..3.0), 1..5).prop_map(
            |terms| {
                Posynomial::new(
                    terms
                        .into_iter()
                        .map(|(c, a, b)| Monomial::new(c, [("x", a), ("y", b)]))
                        .collect(),
                )
            },
        )
    }

    proptest! {
        #[test]
        fn lower_bound_is_tight_at_the_anchor_and_below_everywhere(
            h in posynomial(),
            x0 in 0.1f64..10.0,
            y0 in 0.1f64..10.0,
            x in 0.1f64..10.0,
            y in 0.1f64..10.0,
        ) {
            let anchor = point(x0, y0);
            let m = h.mono_lower_bound(&anchor).unwrap();
            let at_anchor = h.eval(&anchor).unwrap();
            prop_assert!((m.eval(&anchor).unwrap() - at_anchor).abs() <= 1e-9 * at_anchor);
            let elsewhere = h.eval(&point(x, y)).unwrap();
            prop_assert!(m.eval(&point(x, y)).unwrap() <= elsewhere * (1.0 + 1e-9));
        }
    }
}
