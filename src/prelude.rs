#[doc(no_inline)]
pub use crate::assignment::Assignment;
#[doc(no_inline)]
pub use crate::error::SignomialError;
#[doc(no_inline)]
pub use crate::local_solve::{LocalSolver, Solution, Status};
#[doc(no_inline)]
pub use crate::nomials::{Monomial, Posynomial, VarKey};
#[doc(no_inline)]
pub use crate::relaxation::Relaxation;
#[doc(no_inline)]
pub use crate::signomial_program::{GpConstraint, SignomialConstraint, SignomialProgram};
#[doc(no_inline)]
pub use crate::solvers::{Barrier, GpOutcome, GpSolution, GpSolver};
