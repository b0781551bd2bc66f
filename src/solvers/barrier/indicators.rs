use std::fmt::{self, Display};

use crate::float::Float;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Phase {
    /// Search for a strictly feasible point
    One,
    /// Minimize the objective
    Two,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::One => f.write_str("I"),
            Phase::Two => f.write_str("II"),
        }
    }
}

/// Progress of the barrier method after one centering step.
pub(crate) struct Indicators<F> {
    pub(crate) phase: Phase,
    /// barrier weight
    pub(crate) t: F,
    /// bound on the suboptimality of the current point
    pub(crate) gap: F,
    /// objective value, the slack in phase I
    pub(crate) obj: F,
    /// Newton steps so far
    pub(crate) newton: usize,
}

pub(crate) const HEADER: &str = "phase\tt         \tgap       \tobj       \tnewton";

impl<F: Float> Display for Indicators<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{:3.3e}\t{:3.3e}\t{:3.8}\t{}",
            self.phase, self.t, self.gap, self.obj, self.newton
        )
    }
}
