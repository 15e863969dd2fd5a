//! Code for working with the model's time index.
//!
//! The time index (`t` in the model) is the ordered set of time steps over which every indexed
//! variable, parameter and constraint is defined.
use crate::id::TimeStepID;
use anyhow::{Result, ensure};
use indexmap::IndexSet;
use std::borrow::Borrow;
use std::hash::Hash;

/// The ordered set of time steps for a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeIndex(IndexSet<TimeStepID>);

impl TimeIndex {
    /// Create a [`TimeIndex`] from an iterator of time steps.
    ///
    /// The order of the time steps is preserved. Duplicate time steps are an error.
    pub fn from_iter_checked<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = TimeStepID>,
    {
        let mut steps = IndexSet::new();
        for step in iter {
            ensure!(
                !steps.contains(&step),
                "Duplicate time step {step} in time index"
            );
            steps.insert(step);
        }

        Ok(Self(steps))
    }

    /// Iterate over the time steps in order
    pub fn iter(&self) -> indexmap::set::Iter<'_, TimeStepID> {
        self.0.iter()
    }

    /// Whether the given time step is part of the index
    pub fn contains<Q>(&self, time_step: &Q) -> bool
    where
        Q: ?Sized + Hash + Eq,
        TimeStepID: Borrow<Q>,
    {
        self.0.contains(time_step)
    }

    /// The number of time steps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a TimeIndex {
    type Item = &'a TimeStepID;
    type IntoIter = indexmap::set::Iter<'a, TimeStepID>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_from_iter_checked() {
        let index =
            TimeIndex::from_iter_checked(["t2".into(), "t0".into(), "t1".into()]).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.contains("t0"));
        assert!(!index.contains("t3"));

        // Insertion order is kept
        assert_eq!(index.iter().map(ToString::to_string).join(","), "t2,t0,t1");
    }

    #[test]
    fn test_from_iter_checked_duplicate() {
        let result = TimeIndex::from_iter_checked(["t0".into(), "t0".into()]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Duplicate time step t0 in time index"
        );
    }
}
