//! Monomials and posynomials over named, strictly positive variables.
//!
//! A [`Monomial`] is `c * x_1^a_1 * ... * x_n^a_n`, a [`Posynomial`] is a sum of monomials.
//! Both are immutable values; arithmetic returns new values.
//!
//! ```
//! use sp::nomials::{Monomial, Posynomial};
//!
//! let x = Monomial::<f64>::var("x");
//! let y = Monomial::var("y");
//! let p = Posynomial::from(&x * &y) + x.powf(2.0) * 3.0;
//! assert_eq!(p.to_string(), "x*y + 3*x^2");
//! ```
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::ops::{Add, Div, Mul};
use std::sync::Arc;

use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;

/// Identifier of a decision variable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarKey(Arc<str>);

impl VarKey {
    pub fn new(name: &str) -> VarKey {
        VarKey(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VarKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VarKey {
    fn from(name: &str) -> Self {
        VarKey::new(name)
    }
}

impl From<String> for VarKey {
    fn from(name: String) -> Self {
        VarKey(Arc::from(name))
    }
}

impl From<&VarKey> for VarKey {
    fn from(key: &VarKey) -> Self {
        key.clone()
    }
}

impl Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A coefficient times a product of variables raised to real powers.
#[derive(Clone, Debug, PartialEq)]
pub struct Monomial<F> {
    c: F,
    exps: BTreeMap<VarKey, F>,
}

impl<F: Float> Monomial<F> {
    /// Build a monomial from its coefficient and `(variable, exponent)` pairs.
    /// Repeated variables have their exponents added, zero exponents are dropped.
    pub fn new<K, I>(c: F, exps: I) -> Monomial<F>
    where
        K: Into<VarKey>,
        I: IntoIterator<Item = (K, F)>,
    {
        let mut merged = BTreeMap::new();
        for (key, e) in exps {
            *merged.entry(key.into()).or_insert_with(F::zero) += e;
        }
        merged.retain(|_, e| *e != F::zero());
        Monomial { c, exps: merged }
    }

    pub fn constant(c: F) -> Monomial<F> {
        Monomial {
            c,
            exps: BTreeMap::new(),
        }
    }

    /// The monomial `x` for a single variable.
    pub fn var(name: &str) -> Monomial<F> {
        Monomial::new(F::one(), [(name, F::one())])
    }

    pub fn c(&self) -> F {
        self.c
    }

    pub fn exps(&self) -> &BTreeMap<VarKey, F> {
        &self.exps
    }

    /// Exponent of `var`, zero when the variable does not appear.
    pub fn exponent(&self, var: &str) -> F {
        self.exps.get(var).copied().unwrap_or_else(F::zero)
    }

    pub fn is_constant(&self) -> bool {
        self.exps.is_empty()
    }

    pub fn vars(&self) -> impl Iterator<Item = &VarKey> {
        self.exps.keys()
    }

    /// Evaluate at a positive point.
    ///
    /// Computed in log space so that large exponents underflow to exactly zero rather than
    /// producing `0 * inf`.
    pub fn eval(&self, x: &Assignment<F>) -> Result<F, SignomialError<F>> {
        let mut log_value = self.c.ln();
        for (key, &e) in &self.exps {
            let value = x.get(key.name()).ok_or_else(|| {
                SignomialError::InvalidAssignment(format!("no value for variable `{key}`"))
            })?;
            if !value.is_positive_finite() {
                return Err(SignomialError::InvalidAssignment(format!(
                    "variable `{key}` must be positive, got {value}"
                )));
            }
            log_value += e * value.ln();
        }
        Ok(log_value.exp())
    }

    pub fn powf(&self, p: F) -> Monomial<F> {
        Monomial::new(
            self.c.powf(p),
            self.exps.iter().map(|(key, &e)| (key, e * p)),
        )
    }
}

impl<F: Float> Mul<&Monomial<F>> for &Monomial<F> {
    type Output = Monomial<F>;

    fn mul(self, rhs: &Monomial<F>) -> Monomial<F> {
        Monomial::new(
            self.c * rhs.c,
            self.exps.iter().chain(rhs.exps.iter()).map(|(k, &e)| (k, e)),
        )
    }
}

impl<F: Float> Mul for Monomial<F> {
    type Output = Monomial<F>;

    fn mul(self, rhs: Monomial<F>) -> Monomial<F> {
        &self * &rhs
    }
}

impl<F: Float> Mul<F> for Monomial<F> {
    type Output = Monomial<F>;

    fn mul(self, rhs: F) -> Monomial<F> {
        Monomial {
            c: self.c * rhs,
            exps: self.exps,
        }
    }
}

impl<F: Float> Div<&Monomial<F>> for &Monomial<F> {
    type Output = Monomial<F>;

    fn div(self, rhs: &Monomial<F>) -> Monomial<F> {
        self * &rhs.powf(-F::one())
    }
}

impl<F: Float> Div for Monomial<F> {
    type Output = Monomial<F>;

    fn div(self, rhs: Monomial<F>) -> Monomial<F> {
        &self / &rhs
    }
}

fn fmt_exponent<F: Float>(f: &mut fmt::Formatter<'_>, key: &VarKey, e: F) -> fmt::Result {
    if e == F::one() {
        write!(f, "{key}")
    } else {
        write!(f, "{key}^{e}")
    }
}

impl<F: Float> Display for Monomial<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exps.is_empty() {
            return write!(f, "{}", self.c);
        }
        let mut first = true;
        if self.c != F::one() {
            write!(f, "{}", self.c)?;
            first = false;
        }
        for (key, &e) in &self.exps {
            if !first {
                f.write_str("*")?;
            }
            fmt_exponent(f, key, e)?;
            first = false;
        }
        Ok(())
    }
}

/// A sum of monomials. The empty sum is the zero posynomial.
#[derive(Clone, Debug, PartialEq)]
pub struct Posynomial<F> {
    terms: Vec<Monomial<F>>,
}

impl<F: Float> Posynomial<F> {
    pub fn new(terms: Vec<Monomial<F>>) -> Posynomial<F> {
        Posynomial { terms }
    }

    pub fn zero() -> Posynomial<F> {
        Posynomial { terms: Vec::new() }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Monomial<F>] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The single term of a one-term posynomial.
    pub fn as_monomial(&self) -> Option<&Monomial<F>> {
        match self.terms.as_slice() {
            [m] => Some(m),
            _ => None,
        }
    }

    /// Variables appearing in any term, in sorted order and without repetition.
    pub fn vars(&self) -> Vec<VarKey> {
        let mut vars: Vec<VarKey> = self.terms.iter().flat_map(|m| m.vars().cloned()).collect();
        vars.sort();
        vars.dedup();
        vars
    }

    pub fn eval(&self, x: &Assignment<F>) -> Result<F, SignomialError<F>> {
        self.terms
            .iter()
            .try_fold(F::zero(), |acc, m| Ok(acc + m.eval(x)?))
    }
}

impl<F: Float> From<Monomial<F>> for Posynomial<F> {
    fn from(m: Monomial<F>) -> Self {
        Posynomial { terms: vec![m] }
    }
}

impl<F: Float> From<&Monomial<F>> for Posynomial<F> {
    fn from(m: &Monomial<F>) -> Self {
        Posynomial {
            terms: vec![m.clone()],
        }
    }
}

impl<F: Float> Add for Posynomial<F> {
    type Output = Posynomial<F>;

    fn add(mut self, rhs: Posynomial<F>) -> Posynomial<F> {
        self.terms.extend(rhs.terms);
        self
    }
}

impl<F: Float> Add<Monomial<F>> for Posynomial<F> {
    type Output = Posynomial<F>;

    fn add(mut self, rhs: Monomial<F>) -> Posynomial<F> {
        self.terms.push(rhs);
        self
    }
}

impl<F: Float> Add for Monomial<F> {
    type Output = Posynomial<F>;

    fn add(self, rhs: Monomial<F>) -> Posynomial<F> {
        Posynomial::new(vec![self, rhs])
    }
}

impl<F: Float> Mul<&Monomial<F>> for &Posynomial<F> {
    type Output = Posynomial<F>;

    fn mul(self, rhs: &Monomial<F>) -> Posynomial<F> {
        Posynomial::new(self.terms.iter().map(|m| m * rhs).collect())
    }
}

impl<F: Float> Div<&Monomial<F>> for &Posynomial<F> {
    type Output = Posynomial<F>;

    fn div(self, rhs: &Monomial<F>) -> Posynomial<F> {
        Posynomial::new(self.terms.iter().map(|m| m / rhs).collect())
    }
}

impl<F: Float> Display for Posynomial<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (i, m) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{m}")?;
        }
        Ok(())
    }
}
