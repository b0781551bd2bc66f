use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::error::SignomialError;
use crate::float::Float;
use crate::nomials::VarKey;

/// A value for each of a set of variables.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Assignment<F> {
    values: BTreeMap<VarKey, F>,
}

impl<F: Float> Assignment<F> {
    pub fn new() -> Assignment<F> {
        Assignment {
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, var: &str) -> Option<F> {
        self.values.get(var).copied()
    }

    pub fn insert(&mut self, var: impl Into<VarKey>, value: F) -> Option<F> {
        self.values.insert(var.into(), value)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, F)> {
        self.values.iter().map(|(k, &v)| (k, v))
    }

    /// Check that every variable in `vars` has a finite, strictly positive value.
    pub fn covers<'a>(
        &self,
        vars: impl IntoIterator<Item = &'a VarKey>,
    ) -> Result<(), SignomialError<F>> {
        for key in vars {
            match self.get(key.name()) {
                None => {
                    return Err(SignomialError::InvalidAssignment(format!(
                        "no value for variable `{key}`"
                    )))
                }
                Some(v) if !v.is_positive_finite() => {
                    return Err(SignomialError::InvalidAssignment(format!(
                        "variable `{key}` must be positive and finite, got {v}"
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Restrict to the given variables, in their order.
    pub(crate) fn restrict(&self, vars: &[VarKey]) -> Assignment<F> {
        vars.iter()
            .filter_map(|k| self.get(k.name()).map(|v| (k.clone(), v)))
            .collect()
    }
}

impl<F: Float, K: Into<VarKey>> FromIterator<(K, F)> for Assignment<F> {
    fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
        Assignment {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<F: Float> Display for Assignment<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.values {
            writeln!(f, "{key}\t{value:.6e}")?;
        }
        Ok(())
    }
}
