//! Observations (indistinguishability classes) and per-player partitionings.

use crate::error::{MkbscError, Result};
use crate::transition::StateIndex;
use std::collections::BTreeSet;

/// A non-empty set of states that one player cannot distinguish between.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Observation(BTreeSet<StateIndex>);

impl Observation {
    /// Build an observation from a non-empty set of states.
    pub fn new(states: impl IntoIterator<Item = StateIndex>) -> Result<Self> {
        let set: BTreeSet<StateIndex> = states.into_iter().collect();
        if set.is_empty() {
            return Err(MkbscError::ValidationFailure(
                "an observation must be non-empty".to_string(),
            ));
        }
        Ok(Observation(set))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, state: StateIndex) -> bool {
        self.0.contains(&state)
    }

    pub fn iter(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.0.iter().copied()
    }

    pub fn as_set(&self) -> &BTreeSet<StateIndex> {
        &self.0
    }
}

/// One player's complete partition of the state set into observations.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Partitioning {
    observations: Vec<Observation>,
}

impl Partitioning {
    /// Build a partitioning from an ordered list of observations, without checking validity
    /// against any particular state set (see [`Partitioning::valid`]).
    pub fn new(observations: Vec<Observation>) -> Self {
        Partitioning { observations }
    }

    /// A trivial partitioning with one singleton observation per state, in state order. This is
    /// the partitioning that single-player KBSC produces: each state is its own knowledge.
    pub fn discrete(num_states: usize) -> Self {
        Partitioning {
            observations: (0..num_states)
                .map(|s| Observation::new([s]).expect("singleton is non-empty"))
                .collect(),
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The observation containing a given state, if any.
    pub fn observation_of(&self, state: StateIndex) -> Option<&Observation> {
        self.observations.iter().find(|o| o.contains(state))
    }

    /// True iff this partitioning's observations are pairwise disjoint and their union is
    /// exactly `states`.
    pub fn valid(&self, states: &BTreeSet<StateIndex>) -> bool {
        let mut seen = BTreeSet::new();
        for observation in &self.observations {
            for state in observation.iter() {
                if !seen.insert(state) {
                    return false;
                }
            }
        }
        &seen == states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn discrete_partitioning_is_singletons() {
        let p = Partitioning::discrete(3);
        assert_eq!(p.observations().len(), 3);
        assert!(p.observation_of(1).unwrap().contains(1));
    }

    #[test]
    fn valid_requires_exact_cover_no_overlap() {
        let states: BTreeSet<StateIndex> = [0, 1, 2].into_iter().collect();
        let good = Partitioning::new(vec![
            Observation::new([0, 1]).unwrap(),
            Observation::new([2]).unwrap(),
        ]);
        assert!(good.valid(&states));

        let overlapping = Partitioning::new(vec![
            Observation::new([0, 1]).unwrap(),
            Observation::new([1, 2]).unwrap(),
        ]);
        assert!(!overlapping.valid(&states));

        let incomplete = Partitioning::new(vec![Observation::new([0, 1]).unwrap()]);
        assert!(!incomplete.valid(&states));
    }

    #[test]
    fn empty_observation_rejected() {
        assert!(matches!(
            Observation::new(Vec::<StateIndex>::new()),
            Err(MkbscError::ValidationFailure(_))
        ));
    }
}
