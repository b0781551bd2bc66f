//! Definition of a signomial program.
//!
//! To get started, see [`SignomialProgram::minimize`], which returns a [`SignomialProgramBuilder`].
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;
use crate::nomials::{Monomial, Posynomial, VarKey};

/// The inequality `g(x) - h(x) <= 1`.
///
/// With `h` the zero posynomial this is the ordinary posynomial constraint `g(x) <= 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct SignomialConstraint<F> {
    g: Posynomial<F>,
    h: Posynomial<F>,
}

impl<F: Float> SignomialConstraint<F> {
    pub fn new(g: impl Into<Posynomial<F>>, h: impl Into<Posynomial<F>>) -> Self {
        SignomialConstraint {
            g: g.into(),
            h: h.into(),
        }
    }

    /// The posynomial constraint `g(x) <= 1`.
    pub fn posynomial(g: impl Into<Posynomial<F>>) -> Self {
        SignomialConstraint {
            g: g.into(),
            h: Posynomial::zero(),
        }
    }

    pub fn g(&self) -> &Posynomial<F> {
        &self.g
    }

    pub fn h(&self) -> &Posynomial<F> {
        &self.h
    }

    pub fn is_signomial(&self) -> bool {
        !self.h.is_zero()
    }

    /// `g(x) - h(x) - 1`, positive when the constraint is violated.
    pub fn violation(&self, x: &Assignment<F>) -> Result<F, SignomialError<F>> {
        Ok(self.g.eval(x)? - self.h.eval(x)? - F::one())
    }
}

/// A constraint known only through the geometric-program approximations it supplies.
///
/// Use this for constraints evaluated by external code. At every pass of the local solve the
/// constraint is asked for a posynomial `p` with `p(x) <= 1` that approximates it around the
/// anchor. The approximation should be tight at the anchor and conservative; otherwise the cost
/// can increase between passes, which ends the solve.
///
/// ```
/// use approx::assert_abs_diff_eq;
/// use sp::prelude::*;
///
/// /// `y >= sin(x)` for `0 < x < pi`, replaced at the anchor by its tangent monomial in log
/// /// space, which lies above the sine.
/// #[derive(Debug)]
/// struct AboveSine;
///
/// impl GpConstraint<f64> for AboveSine {
///     fn variables(&self) -> Vec<VarKey> {
///         vec!["x".into(), "y".into()]
///     }
///
///     fn as_gp_constraint(
///         &self,
///         anchor: &Assignment<f64>,
///     ) -> Result<Posynomial<f64>, SignomialError<f64>> {
///         let x0 = anchor.get("x").unwrap_or(1.0);
///         let a = x0 / x0.tan();
///         Ok(Monomial::new(x0.sin() * x0.powf(-a), [("x", a), ("y", -1.0)]).into())
///     }
///
///     fn violation(&self, x: &Assignment<f64>) -> Result<f64, SignomialError<f64>> {
///         let (x, y) = (x.get("x").unwrap_or(1.0), x.get("y").unwrap_or(1.0));
///         Ok(x.sin() / y - 1.0)
///     }
/// }
///
/// // min y  st  pi/4 <= x <= pi/2, y >= sin(x)
/// let quarter = std::f64::consts::FRAC_PI_4;
/// let program = SignomialProgram::minimize(Monomial::var("y"))
///     .leq(Monomial::new(quarter, [("x", -1.0)]))
///     .leq(Monomial::new(0.5 / quarter, [("x", 1.0)]))
///     .external(AboveSine)
///     .build()
///     .unwrap();
///
/// let solution = LocalSolver::default().solve(&program, &Barrier::default()).unwrap();
/// assert!(solution.is_converged());
/// assert_abs_diff_eq!(solution.cost().unwrap(), quarter.sin(), epsilon = 1e-6);
/// ```
pub trait GpConstraint<F: Float>: Debug + Send + Sync {
    /// Every variable the constraint involves.
    fn variables(&self) -> Vec<VarKey>;

    /// The posynomial `p` of the approximation `p(x) <= 1` around `anchor`.
    fn as_gp_constraint(&self, anchor: &Assignment<F>) -> Result<Posynomial<F>, SignomialError<F>>;

    /// Positive when `x` violates the constraint itself.
    fn violation(&self, x: &Assignment<F>) -> Result<F, SignomialError<F>>;
}

/// Minimize a posynomial subject to monomial equalities and signomial inequalities.
///
/// ```text
/// min_x  f(x)
/// st     m_j(x) == 1
///        g_i(x) - h_i(x) <= 1
///                      x > 0
/// ```
/// Build one with [`SignomialProgram::minimize`].
#[derive(Clone, Debug)]
pub struct SignomialProgram<F> {
    objective: Posynomial<F>,
    equalities: Vec<Monomial<F>>,
    constraints: Vec<SignomialConstraint<F>>,
    external: Vec<Arc<dyn GpConstraint<F>>>,
    variables: Vec<VarKey>,
}

impl<F: Float> SignomialProgram<F> {
    /// Start building a program that minimizes `objective`.
    pub fn minimize(objective: impl Into<Posynomial<F>>) -> SignomialProgramBuilder<F> {
        SignomialProgramBuilder::new(objective.into())
    }

    pub fn objective(&self) -> &Posynomial<F> {
        &self.objective
    }

    /// Monomials `m` constrained to `m(x) == 1`.
    pub fn equalities(&self) -> &[Monomial<F>] {
        &self.equalities
    }

    pub fn constraints(&self) -> &[SignomialConstraint<F>] {
        &self.constraints
    }

    /// Constraints that supply their own approximation at every anchor.
    pub fn external(&self) -> &[Arc<dyn GpConstraint<F>>] {
        &self.external
    }

    /// Every variable of the program, sorted and without repetition.
    pub fn variables(&self) -> &[VarKey] {
        &self.variables
    }

    /// True when the program is not a GP: a constraint subtracts a posynomial or is external.
    pub fn is_signomial(&self) -> bool {
        !self.external.is_empty() || self.constraints.iter().any(|c| c.is_signomial())
    }

    /// The amount by which `x` violates the most violated constraint, zero for feasible points.
    pub fn max_violation(&self, x: &Assignment<F>) -> Result<F, SignomialError<F>> {
        x.covers(&self.variables)?;
        let mut worst = F::zero();
        for m in &self.equalities {
            worst = worst.max((m.eval(x)? - F::one()).abs());
        }
        for c in &self.constraints {
            worst = worst.max(c.violation(x)?);
        }
        for c in &self.external {
            worst = worst.max(c.violation(x)?);
        }
        Ok(worst)
    }

    pub fn is_feasible(&self, x: &Assignment<F>, tol: F) -> Result<bool, SignomialError<F>> {
        Ok(self.max_violation(x)? <= tol)
    }

    /// A starting point for programs solved without an explicit initial guess.
    ///
    /// Each variable bounded from both sides by single-term, single-variable constraints or
    /// equalities starts at the geometric mean of its bounds. A variable bounded from one side
    /// starts at 1 moved onto that bound if needed, every other variable at 1.
    pub fn default_anchor(&self) -> Assignment<F> {
        let mut bounds: BTreeMap<&VarKey, (Option<F>, Option<F>)> = BTreeMap::new();
        let plain = self
            .constraints
            .iter()
            .filter(|c| !c.is_signomial())
            .filter_map(|c| c.g.as_monomial());
        for (m, is_equality) in plain
            .map(|m| (m, false))
            .chain(self.equalities.iter().map(|m| (m, true)))
        {
            let mut exps = m.exps().iter();
            let (key, &a) = match (exps.next(), exps.next()) {
                (Some(only), None) => only,
                _ => continue,
            };
            // c * x^a <= 1 bounds x by c^(-1/a), from above when a > 0.
            let bound = m.c().powf(-a.recip());
            let (lo, up) = bounds.entry(key).or_insert((None, None));
            if a > F::zero() || is_equality {
                *up = Some(up.map_or(bound, |u| u.min(bound)));
            }
            if a < F::zero() || is_equality {
                *lo = Some(lo.map_or(bound, |l| l.max(bound)));
            }
        }

        self.variables
            .iter()
            .map(|key| {
                let value = match bounds.get(key) {
                    Some((Some(lo), Some(up))) => (*lo * *up).sqrt(),
                    Some((Some(lo), None)) => lo.max(F::one()),
                    Some((None, Some(up))) => up.min(F::one()),
                    _ => F::one(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

/// Construct a [`SignomialProgram`] from an objective and any number of constraints.
pub struct SignomialProgramBuilder<F> {
    objective: Posynomial<F>,
    equalities: Vec<Posynomial<F>>,
    constraints: Vec<SignomialConstraint<F>>,
    external: Vec<Arc<dyn GpConstraint<F>>>,
}

impl<F: Float> SignomialProgramBuilder<F> {
    pub fn new(objective: Posynomial<F>) -> SignomialProgramBuilder<F> {
        SignomialProgramBuilder {
            objective,
            equalities: Vec::new(),
            constraints: Vec::new(),
            external: Vec::new(),
        }
    }

    /// Require `m(x) == 1`. `m` must consist of a single term.
    pub fn eq(mut self, m: impl Into<Posynomial<F>>) -> Self {
        self.equalities.push(m.into());
        self
    }

    /// Require `p(x) <= 1`.
    pub fn leq(mut self, p: impl Into<Posynomial<F>>) -> Self {
        self.constraints.push(SignomialConstraint::posynomial(p));
        self
    }

    /// Require `g(x) - h(x) <= 1`.
    pub fn signomial(mut self, g: impl Into<Posynomial<F>>, h: impl Into<Posynomial<F>>) -> Self {
        self.constraints.push(SignomialConstraint::new(g, h));
        self
    }

    pub fn constraint(mut self, constraint: SignomialConstraint<F>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Require a constraint that is approximated by external code, see [`GpConstraint`].
    pub fn external(mut self, constraint: impl GpConstraint<F> + 'static) -> Self {
        self.external.push(Arc::new(constraint));
        self
    }

    /// Validate the inputs and construct the program.
    ///
    /// Returns [`SignomialError::InvalidProblem`] if the objective is empty, a coefficient is not
    /// positive and finite, an exponent is not finite, an equality is not a monomial in at least
    /// one variable, or a constraint has an empty `g`.
    pub fn build(self) -> Result<SignomialProgram<F>, SignomialError<F>> {
        if self.objective.is_zero() {
            return Err(SignomialError::InvalidProblem(
                "the objective has no terms".to_string(),
            ));
        }
        validate(&self.objective, "the objective")?;

        let mut equalities = Vec::with_capacity(self.equalities.len());
        for (j, p) in self.equalities.into_iter().enumerate() {
            validate(&p, &format!("equality {j}"))?;
            let m = match p.as_monomial() {
                Some(m) if !m.is_constant() => m.clone(),
                Some(_) => {
                    return Err(SignomialError::InvalidProblem(format!(
                        "equality {j} does not involve any variable"
                    )))
                }
                None => {
                    return Err(SignomialError::InvalidProblem(format!(
                        "equality {j} `{p} = 1` is not a monomial"
                    )))
                }
            };
            equalities.push(m);
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if c.g.is_zero() {
                return Err(SignomialError::InvalidProblem(format!(
                    "constraint {i} has no positive part"
                )));
            }
            validate(&c.g, &format!("the positive part of constraint {i}"))?;
            validate(&c.h, &format!("the subtracted part of constraint {i}"))?;
        }

        let mut variables = self.objective.vars();
        variables.extend(equalities.iter().flat_map(|m| m.vars().cloned()));
        for c in &self.constraints {
            variables.extend(c.g.vars());
            variables.extend(c.h.vars());
        }
        for c in &self.external {
            variables.extend(c.variables());
        }
        variables.sort();
        variables.dedup();

        Ok(SignomialProgram {
            objective: self.objective,
            equalities,
            constraints: self.constraints,
            external: self.external,
            variables,
        })
    }
}

pub(crate) fn validate<F: Float>(p: &Posynomial<F>, what: &str) -> Result<(), SignomialError<F>> {
    for m in p.terms() {
        if !m.c().is_positive_finite() {
            return Err(SignomialError::InvalidProblem(format!(
                "{what} has coefficient {}, coefficients must be positive and finite",
                m.c()
            )));
        }
        if let Some((key, e)) = m.exps().iter().find(|(_, e)| !e.is_finite()) {
            return Err(SignomialError::InvalidProblem(format!(
                "{what} raises `{key}` to the non-finite power {e}"
            )));
        }
    }
    Ok(())
}
