//! The labelled multi-digraph at the center of the crate: states, a distinguished initial state,
//! a per-player alphabet, transitions, and per-player observation partitionings.

use crate::alphabet::Alphabet;
use crate::error::{MkbscError, Result};
use crate::knowledge::{Action, Knowledge};
use crate::observation::{Observation, Partitioning};
use crate::per_player::PerPlayer;
use crate::transition::{StateIndex, Transition};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// A finite multi-player game graph: states carrying [`Knowledge`] values, a per-player
/// alphabet, labelled transitions, and a partitioning of the state set for each player.
///
/// A `Game` owns all of its states, transitions, and partitionings outright; no structure is
/// shared with any other game, including the game it was derived from.
#[derive(Clone, Debug)]
pub struct Game {
    states: Vec<Knowledge>,
    index: HashMap<Knowledge, StateIndex>,
    initial: StateIndex,
    alphabet: Alphabet,
    transitions: Vec<Transition>,
    out_edges: Vec<Vec<usize>>,
    partitionings: PerPlayer<Partitioning>,
}

impl Game {
    /// Assemble a game from its parts, validating every invariant in §3 of the design:
    /// transition endpoints and actions are in range, partitionings are valid partitions of the
    /// state set, and the initial state is among the states.
    pub fn new(
        states: Vec<Knowledge>,
        initial: StateIndex,
        alphabet: Alphabet,
        transitions: Vec<Transition>,
        partitionings: PerPlayer<Partitioning>,
    ) -> Result<Self> {
        if initial >= states.len() {
            return Err(MkbscError::ValidationFailure(
                "initial state index out of range".to_string(),
            ));
        }
        if partitionings.num_players() != alphabet.num_players() {
            return Err(MkbscError::ValidationFailure(format!(
                "{} partitionings given for an alphabet of {} players",
                partitionings.num_players(),
                alphabet.num_players()
            )));
        }

        let mut index = HashMap::with_capacity(states.len());
        for (i, state) in states.iter().enumerate() {
            if index.insert(state.clone(), i).is_some() {
                return Err(MkbscError::ValidationFailure(
                    "duplicate state value in state list".to_string(),
                ));
            }
        }

        for t in &transitions {
            if t.start >= states.len() || t.end >= states.len() {
                return Err(MkbscError::ValidationFailure(format!(
                    "transition {t} has an endpoint outside the state set"
                )));
            }
            if t.joint_action.len() != alphabet.num_players() {
                return Err(MkbscError::ValidationFailure(format!(
                    "transition {t} has {} actions but the alphabet has {} players",
                    t.joint_action.len(),
                    alphabet.num_players()
                )));
            }
            for (player, action) in t.joint_action.iter().enumerate() {
                if !alphabet.player_actions(player)?.contains(action) {
                    return Err(MkbscError::ValidationFailure(format!(
                        "action {action} not in player {player}'s alphabet"
                    )));
                }
            }
        }

        let full_state_set: BTreeSet<StateIndex> = (0..states.len()).collect();
        for (player, partitioning) in partitionings.values().enumerate() {
            if !partitioning.valid(&full_state_set) {
                return Err(MkbscError::ValidationFailure(format!(
                    "player {player}'s partitioning is not a valid partition of the state set"
                )));
            }
        }

        let mut out_edges = vec![Vec::new(); states.len()];
        for (i, t) in transitions.iter().enumerate() {
            out_edges[t.start].push(i);
        }

        Ok(Game {
            states,
            index,
            initial,
            alphabet,
            transitions,
            out_edges,
            partitionings,
        })
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_players(&self) -> usize {
        self.alphabet.num_players()
    }

    pub fn states(&self) -> &[Knowledge] {
        &self.states
    }

    pub fn state(&self, index: StateIndex) -> &Knowledge {
        &self.states[index]
    }

    /// Look up a state's index by its knowledge value.
    pub fn index_of(&self, value: &Knowledge) -> Result<StateIndex> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| MkbscError::LookupMissing(format!("no state with value {value:?}")))
    }

    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Transitions leaving a given state.
    pub fn out_transitions(&self, state: StateIndex) -> impl Iterator<Item = &Transition> {
        self.out_edges[state].iter().map(move |&i| &self.transitions[i])
    }

    pub fn partitioning(&self, player: usize) -> Result<&Partitioning> {
        self.partitionings
            .values()
            .nth(player)
            .ok_or_else(|| MkbscError::LookupMissing(format!("no partitioning for player {player}")))
    }

    pub fn partitionings(&self) -> &PerPlayer<Partitioning> {
        &self.partitionings
    }

    /// `post(α, S) = { s' | ∃ s ∈ S, (s, α, s') ∈ T }`.
    pub fn post(&self, joint_action: &[Action], from: &BTreeSet<StateIndex>) -> BTreeSet<StateIndex> {
        let mut result = BTreeSet::new();
        for &s in from {
            for t in self.out_transitions(s) {
                if t.joint_action.as_slice() == joint_action {
                    result.insert(t.end);
                }
            }
        }
        result
    }

    /// All states reachable from the initial state by following transitions forward.
    pub fn reachable(&self) -> BTreeSet<StateIndex> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(self.initial);
        queue.push_back(self.initial);
        while let Some(s) = queue.pop_front() {
            for t in self.out_transitions(s) {
                if seen.insert(t.end) {
                    queue.push_back(t.end);
                }
            }
        }
        seen
    }

    /// Each player's non-trivial observations (those grouping more than one state), rendered via
    /// [`Knowledge::render_isocheck`] and sorted by observation size. Useful for inspecting why a
    /// fixpoint iteration has or hasn't stabilised with observations on a game too large to read
    /// verbosely: a wide partitioning with many size-1 observations tends to stabilise
    /// structurally well before it stabilises informationally.
    pub fn partitioning_profile(&self) -> Result<String> {
        let mut out = String::new();
        for player in 0..self.num_players() {
            let partitioning = self.partitioning(player)?;
            let mut multi: Vec<&Observation> = partitioning
                .observations()
                .iter()
                .filter(|o| o.len() > 1)
                .collect();
            multi.sort_by_key(|o| o.len());

            let mut groups = Vec::with_capacity(multi.len());
            for obs in multi {
                let mut isochecks: Vec<String> = obs
                    .iter()
                    .map(|s| self.state(s).render_isocheck())
                    .collect::<Result<_>>()?;
                isochecks.sort();
                groups.push(format!("({})", isochecks.join(", ")));
            }
            out.push_str(&format!("Player {player}: {}\n", groups.join(", ")));
        }
        Ok(out)
    }
}

/// A transition specification accepted by [`GameBuilder`]: either a single labelled edge, or a
/// wildcard that expands to one transition per joint action in the alphabet.
pub enum TransitionSpec {
    Labeled {
        start: Knowledge,
        action: Vec<Action>,
        end: Knowledge,
    },
    AllActions {
        start: Knowledge,
        end: Knowledge,
    },
}

/// A grouping entry for one player's partitioning: an explicit observation, or a catch-all
/// placing every state not otherwise covered into its own singleton observation.
pub enum GroupSpec {
    Group(Vec<Knowledge>),
    CatchAll,
}

/// An explicit, validating builder for [`Game`]s, mirroring the constructor surface described in
/// the external interfaces contract: states, an initial state, per-player alphabets, transition
/// triples (with a wildcard for "all joint actions"), and per-player groupings (with an ellipsis
/// catch-all for singleton observations).
pub struct GameBuilder {
    states: Vec<Knowledge>,
    initial: Knowledge,
    alphabet: Vec<Vec<Action>>,
    transitions: Vec<TransitionSpec>,
    groupings: Vec<Vec<GroupSpec>>,
}

impl GameBuilder {
    pub fn new(states: Vec<Knowledge>, initial: Knowledge, alphabet: Vec<Vec<Action>>) -> Self {
        GameBuilder {
            states,
            initial,
            alphabet,
            transitions: Vec::new(),
            groupings: Vec::new(),
        }
    }

    pub fn transition(mut self, start: Knowledge, action: Vec<Action>, end: Knowledge) -> Self {
        self.transitions.push(TransitionSpec::Labeled { start, action, end });
        self
    }

    pub fn transition_all_actions(mut self, start: Knowledge, end: Knowledge) -> Self {
        self.transitions.push(TransitionSpec::AllActions { start, end });
        self
    }

    pub fn grouping(mut self, player_groups: Vec<GroupSpec>) -> Self {
        self.groupings.push(player_groups);
        self
    }

    /// Validate and assemble the game.
    pub fn build(self) -> Result<Game> {
        let distinct_states: HashSet<Knowledge> = self.states.into_iter().collect();
        let states: Vec<Knowledge> = distinct_states.into_iter().collect();
        let mut index = HashMap::with_capacity(states.len());
        for (i, s) in states.iter().enumerate() {
            index.insert(s.clone(), i);
        }
        let lookup = |value: &Knowledge| -> Result<StateIndex> {
            index
                .get(value)
                .copied()
                .ok_or_else(|| MkbscError::LookupMissing(format!("no state with value {value:?}")))
        };

        let initial_index = lookup(&self.initial)?;
        let alphabet = Alphabet::new(self.alphabet)?;

        let mut transitions = Vec::new();
        for spec in &self.transitions {
            match spec {
                TransitionSpec::Labeled { start, action, end } => {
                    transitions.push(Transition::new(lookup(start)?, action.clone(), lookup(end)?));
                }
                TransitionSpec::AllActions { start, end } => {
                    let s = lookup(start)?;
                    let e = lookup(end)?;
                    for joint_action in alphabet.joint_actions() {
                        transitions.push(Transition::new(s, joint_action, e));
                    }
                }
            }
        }

        let mut partitionings = Vec::new();
        for player_groups in &self.groupings {
            let mut observations = Vec::new();
            let mut catch_all = false;
            for group in player_groups {
                match group {
                    GroupSpec::Group(members) => {
                        let indexes: Result<Vec<StateIndex>> =
                            members.iter().map(lookup).collect();
                        observations.push(Observation::new(indexes?)?);
                    }
                    GroupSpec::CatchAll => catch_all = true,
                }
            }
            if catch_all {
                let covered: BTreeSet<StateIndex> =
                    observations.iter().flat_map(|o| o.iter()).collect();
                for i in 0..states.len() {
                    if !covered.contains(&i) {
                        observations.push(Observation::new([i])?);
                    }
                }
            }
            partitionings.push(Partitioning::new(observations));
        }

        let partitionings = PerPlayer::new(partitionings)?;
        Game::new(states, initial_index, alphabet, transitions, partitionings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Symbol;
    use test_log::test;

    fn atom(i: i64) -> Knowledge {
        Knowledge::Atom(Symbol::Int(i))
    }

    fn sym(s: &str) -> Action {
        Symbol::Str(s.to_string())
    }

    fn two_state_game() -> Game {
        GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .transition(atom(1), vec![sym("a")], atom(0))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap()
    }

    #[test]
    fn builder_produces_well_formed_game() {
        let g = two_state_game();
        assert_eq!(g.num_states(), 2);
        assert_eq!(g.num_players(), 1);
        assert_eq!(g.transitions().len(), 2);
    }

    #[test]
    fn post_follows_labelled_edges() {
        let g = two_state_game();
        let from: BTreeSet<StateIndex> = [g.index_of(&atom(0)).unwrap()].into_iter().collect();
        let post = g.post(&[sym("a")], &from);
        assert_eq!(post, [g.index_of(&atom(1)).unwrap()].into_iter().collect());
    }

    #[test]
    fn reachable_covers_whole_cycle() {
        let g = two_state_game();
        assert_eq!(g.reachable().len(), 2);
    }

    #[test]
    fn wildcard_transition_expands_to_every_joint_action() {
        let g = GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a"), sym("b")]])
            .transition_all_actions(atom(0), atom(1))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap();
        assert_eq!(g.transitions().len(), 2);
    }

    #[test]
    fn unknown_initial_state_is_lookup_missing() {
        let result = GameBuilder::new(vec![atom(0)], atom(9), vec![vec![sym("a")]])
            .grouping(vec![GroupSpec::CatchAll])
            .build();
        assert!(matches!(result, Err(MkbscError::LookupMissing(_))));
    }

    #[test]
    fn action_outside_alphabet_is_validation_failure() {
        let result = GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("not-in-alphabet")], atom(1))
            .grouping(vec![GroupSpec::CatchAll])
            .build();
        assert!(matches!(result, Err(MkbscError::ValidationFailure(_))));
    }

    #[test]
    fn partitioning_profile_lists_only_multi_state_observations() {
        let g = GameBuilder::new(vec![atom(0), atom(1), atom(2)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .grouping(vec![
                GroupSpec::Group(vec![atom(0), atom(1)]),
                GroupSpec::Group(vec![atom(2)]),
            ])
            .build()
            .unwrap();
        let profile = g.partitioning_profile().unwrap();
        assert!(profile.contains("Player 0:"));
        assert!(profile.contains("0, 1"));
        assert!(!profile.contains("(2)"));
    }
}
