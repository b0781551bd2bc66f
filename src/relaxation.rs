//! Conservative geometric-program relaxations of signomial programs.
use crate::assignment::Assignment;
use crate::error::SignomialError;
use crate::float::Float;
use crate::nomials::{Monomial, Posynomial, VarKey};
use crate::signomial_program::{self, SignomialProgram};

/// A geometric program: minimize a posynomial subject to `p_i(x) <= 1` and `m_j(x) == 1`.
///
/// Every point feasible for a relaxation built by [`Relaxation::at`] is feasible for the
/// signomial program it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct Relaxation<F> {
    objective: Posynomial<F>,
    equalities: Vec<Monomial<F>>,
    inequalities: Vec<Posynomial<F>>,
    variables: Vec<VarKey>,
}

impl<F: Float> Relaxation<F> {
    /// Relax `program` around `anchor`.
    ///
    /// Posynomial constraints are kept. A signomial constraint `g - h <= 1` is replaced by
    /// `g / d <= 1` where `d` is the monomial lower bound at the anchor of `1 + m`, and `m` the
    /// monomial lower bound of `h`. The replacement is tight at the anchor. External constraints
    /// follow, in order, each replaced by the approximation it returns for the anchor.
    pub fn at(
        program: &SignomialProgram<F>,
        anchor: &Assignment<F>,
    ) -> Result<Relaxation<F>, SignomialError<F>> {
        let one = Monomial::constant(F::one());
        let mut inequalities = program
            .constraints()
            .iter()
            .map(|c| -> Result<Posynomial<F>, SignomialError<F>> {
                if !c.is_signomial() {
                    return Ok(c.g().clone());
                }
                let m = c.h().mono_lower_bound(anchor)?;
                let d = (one.clone() + m).mono_lower_bound(anchor)?;
                Ok(c.g() / &d)
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (i, c) in program.external().iter().enumerate() {
            let p = c.as_gp_constraint(anchor)?;
            external_approximation(&p, i, program.variables())?;
            inequalities.push(p);
        }

        Ok(Relaxation {
            objective: program.objective().clone(),
            equalities: program.equalities().to_vec(),
            inequalities,
            variables: program.variables().to_vec(),
        })
    }

    /// The program itself, for programs without signomial constraints.
    pub fn geometric(program: &SignomialProgram<F>) -> Result<Relaxation<F>, SignomialError<F>> {
        if program.is_signomial() {
            return Err(SignomialError::InvalidProblem(
                "the program has signomial or external constraints and needs an anchor".to_string(),
            ));
        }
        Relaxation::at(program, &Assignment::new())
    }

    pub fn objective(&self) -> &Posynomial<F> {
        &self.objective
    }

    pub fn equalities(&self) -> &[Monomial<F>] {
        &self.equalities
    }

    pub fn inequalities(&self) -> &[Posynomial<F>] {
        &self.inequalities
    }

    pub fn variables(&self) -> &[VarKey] {
        &self.variables
    }
}

/// An approximation must be a valid posynomial in the variables of the program.
fn external_approximation<F: Float>(
    p: &Posynomial<F>,
    i: usize,
    variables: &[VarKey],
) -> Result<(), SignomialError<F>> {
    if p.is_zero() {
        return Err(SignomialError::InvalidProblem(format!(
            "external constraint {i} returned an empty approximation"
        )));
    }
    signomial_program::validate(p, &format!("the approximation of external constraint {i}"))?;
    match p.vars().into_iter().find(|v| variables.binary_search(v).is_err()) {
        Some(v) => Err(SignomialError::InvalidProblem(format!(
            "the approximation of external constraint {i} involves the undeclared `{v}`"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signomial_program::GpConstraint;
    use approx::assert_relative_eq;

    /// `y >= x`, approximated around the anchor by `x0 / v <= 1` in the variable `v`.
    #[derive(Debug)]
    struct AboveAnchor(&'static str);

    impl GpConstraint<f64> for AboveAnchor {
        fn variables(&self) -> Vec<VarKey> {
            vec!["x".into(), "y".into()]
        }

        fn as_gp_constraint(
            &self,
            anchor: &Assignment<f64>,
        ) -> Result<Posynomial<f64>, SignomialError<f64>> {
            let x0 = anchor.get("x").unwrap_or(1.0);
            Ok(Monomial::new(x0, [(self.0, -1.0)]).into())
        }

        fn violation(&self, x: &Assignment<f64>) -> Result<f64, SignomialError<f64>> {
            Ok(x.get("x").unwrap() / x.get("y").unwrap() - 1.0)
        }
    }

    fn point(x: f64, y: f64) -> Assignment<f64> {
        [("x", x), ("y", y)].into_iter().collect()
    }

    fn program() -> SignomialProgram<f64> {
        // x + y^2 subject to x >= 0.1 and x + y >= 1
        SignomialProgram::minimize(Monomial::var("x") + Monomial::var("y").powf(2.0))
            .leq(Monomial::new(0.1, [("x", -1.0)]))
            .signomial(
                Monomial::constant(2.0),
                Monomial::var("x") + Monomial::var("y"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn posynomial_parts_pass_through() {
        let program = program();
        let r = Relaxation::at(&program, &point(1.0, 1.0)).unwrap();
        assert_eq!(r.objective(), program.objective());
        assert_eq!(&r.inequalities()[0], program.constraints()[0].g());
        assert_eq!(r.variables(), program.variables());
    }

    #[test]
    fn signomial_constraint_is_tight_and_conservative() {
        let program = program();
        let anchor = point(0.3, 2.0);
        let r = Relaxation::at(&program, &anchor).unwrap();
        let relaxed = &r.inequalities()[1];
        assert_eq!(relaxed.len(), 1);

        let on_boundary = point(0.4, 0.6);
        let r = Relaxation::at(&program, &on_boundary).unwrap();
        assert_relative_eq!(
            r.inequalities()[1].eval(&on_boundary).unwrap(),
            1.0,
            epsilon = 1e-12
        );

        for &(x, y) in &[(0.1, 0.1), (0.5, 0.5), (2.0, 0.2), (5.0, 5.0), (0.2, 3.0)] {
            let p = point(x, y);
            if relaxed.eval(&p).unwrap() <= 1.0 {
                assert!(program.constraints()[1].violation(&p).unwrap() <= 1e-12);
            }
        }
    }

    #[test]
    fn rebuilding_at_the_same_anchor_is_deterministic() {
        let program = program();
        let a = Relaxation::at(&program, &point(0.7, 0.9)).unwrap();
        let b = Relaxation::at(&program, &point(0.7, 0.9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn geometric_requires_a_gp() {
        assert!(matches!(
            Relaxation::geometric(&program()),
            Err(SignomialError::InvalidProblem(_))
        ));
        let gp = SignomialProgram::minimize(Monomial::<f64>::var("x"))
            .leq(Monomial::new(2.0, [("x", -1.0)]))
            .build()
            .unwrap();
        assert_eq!(Relaxation::geometric(&gp).unwrap().inequalities().len(), 1);
    }

    #[test]
    fn external_constraints_are_approximated_at_the_anchor() {
        let program = SignomialProgram::minimize(Monomial::var("y"))
            .leq(Monomial::new(0.5, [("x", -1.0)]))
            .external(AboveAnchor("y"))
            .build()
            .unwrap();
        assert!(program.is_signomial());
        assert!(matches!(
            Relaxation::geometric(&program),
            Err(SignomialError::InvalidProblem(_))
        ));

        let r = Relaxation::at(&program, &point(2.0, 1.0)).unwrap();
        assert_eq!(r.inequalities().len(), 2);
        assert_eq!(
            r.inequalities()[1],
            Posynomial::from(Monomial::new(2.0, [("y", -1.0)]))
        );
        let r = Relaxation::at(&program, &point(3.0, 1.0)).unwrap();
        assert_relative_eq!(r.inequalities()[1].terms()[0].c(), 3.0);
    }

    #[test]
    fn undeclared_variables_in_an_approximation_are_rejected() {
        let program = SignomialProgram::minimize(Monomial::var("y"))
            .external(AboveAnchor("z"))
            .build()
            .unwrap();
        assert!(matches!(
            Relaxation::at(&program, &point(2.0, 1.0)),
            Err(SignomialError::InvalidProblem(_))
        ));
    }
}
