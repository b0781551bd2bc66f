//! Per-iteration history of a local solve.
use std::fmt::{self, Display};

use crate::assignment::Assignment;
use crate::float::Float;
use crate::solvers::GpStatus;

/// One pass of the local solve: the anchor a relaxation was built at and what the solver made
/// of it.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationRecord<F> {
    iteration: usize,
    anchor: Assignment<F>,
    status: GpStatus,
    x: Option<Assignment<F>>,
    cost: Option<F>,
    improvement: Option<F>,
}

impl<F: Float> IterationRecord<F> {
    pub(crate) fn solved(
        iteration: usize,
        anchor: Assignment<F>,
        x: Assignment<F>,
        cost: F,
        improvement: F,
    ) -> Self {
        IterationRecord {
            iteration,
            anchor,
            status: GpStatus::Solved,
            x: Some(x),
            cost: Some(cost),
            improvement: Some(improvement),
        }
    }

    pub(crate) fn failed(iteration: usize, anchor: Assignment<F>, status: GpStatus) -> Self {
        IterationRecord {
            iteration,
            anchor,
            status,
            x: None,
            cost: None,
            improvement: None,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The point the relaxation was built around.
    pub fn anchor(&self) -> &Assignment<F> {
        &self.anchor
    }

    pub fn status(&self) -> GpStatus {
        self.status
    }

    /// Optimum of the relaxation, if it was solved.
    pub fn x(&self) -> Option<&Assignment<F>> {
        self.x.as_ref()
    }

    pub fn cost(&self) -> Option<F> {
        self.cost
    }

    /// Relative cost improvement over the previous pass, infinite for the first pass.
    pub fn improvement(&self) -> Option<F> {
        self.improvement
    }
}

/// Append-only list of [`IterationRecord`]s, in the order the passes ran.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Trace<F> {
    records: Vec<IterationRecord<F>>,
}

impl<F: Float> Trace<F> {
    pub(crate) fn new() -> Self {
        Trace {
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: IterationRecord<F>) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[IterationRecord<F>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &IterationRecord<F>> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&IterationRecord<F>> {
        self.records.last()
    }

    /// Costs of the solved passes, in order.
    pub fn costs(&self) -> Vec<F> {
        self.records.iter().filter_map(|r| r.cost).collect()
    }

    /// The solved pass with the lowest cost. Ties go to the earliest pass.
    pub fn best(&self) -> Option<&IterationRecord<F>> {
        self.records
            .iter()
            .filter(|r| r.cost.is_some())
            .fold(None, |best: Option<&IterationRecord<F>>, r| match best {
                Some(b) if b.cost <= r.cost => Some(b),
                _ => Some(r),
            })
    }
}

impl<'a, F> IntoIterator for &'a Trace<F> {
    type Item = &'a IterationRecord<F>;
    type IntoIter = std::slice::Iter<'a, IterationRecord<F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

pub(crate) const HEADER: &str = "iter\tstatus    \tcost          \timprovement";

impl<F: Float> Display for IterationRecord<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{:10}", self.iteration, self.status.to_string())?;
        match (self.cost, self.improvement) {
            (Some(cost), Some(r)) if r.is_finite() => write!(f, "\t{cost:.8e}\t{r:.3e}"),
            (Some(cost), _) => write!(f, "\t{cost:.8e}\t-"),
            _ => write!(f, "\t-\t-"),
        }
    }
}

impl<F: Float> Display for Trace<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}
