//! The synchronous product: combining per-player single-player KBSC games into a multi-player
//! knowledge game, pruned by base-state consistency and base-game witness edges.

use crate::error::{MkbscError, Result};
use crate::game::Game;
use crate::knowledge::{Action, Knowledge, KnowledgeSet};
use crate::observation::{Observation, Partitioning};
use crate::per_player::PerPlayer;
use crate::transition::{StateIndex, Transition};
use im::HashSet as ImHashSet;
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Recover the subset of `game`'s states that a single-player KBSC state represents. Every state
/// produced by [`crate::kbsc::kbsc_single_player`] is `Info([set])` where `set`'s members are
/// exactly the `game` states it was built from.
fn underlying_subset(game: &Game, value: &Knowledge) -> Result<BTreeSet<StateIndex>> {
    match value {
        Knowledge::Info(groups) if groups.len() == 1 => {
            groups[0].iter().map(|k| game.index_of(k)).collect()
        }
        other => Err(MkbscError::ValidationFailure(format!(
            "expected a single-player knowledge state, found {other:?}"
        ))),
    }
}

/// The base-game states the true state might be, given a product tuple: the intersection of the
/// per-player knowledge subsets.
fn possible(subsets: &[Vec<BTreeSet<StateIndex>>], tuple: &[StateIndex]) -> BTreeSet<StateIndex> {
    let mut components = tuple.iter().enumerate();
    let (first_player, &first_idx) = components.next().expect("at least one player");
    let mut acc = subsets[first_player][first_idx].clone();
    for (player, &idx) in components {
        acc = acc.intersection(&subsets[player][idx]).copied().collect();
    }
    acc
}

/// `synchronous_product(G, (G'_0, ..., G'_{n-1}))`: the multi-player knowledge game combining the
/// per-player KBSC'd projections, filtered by the consistency of each candidate product state and
/// by the existence of a witness edge in `game` (the *current* iteration's enclosing game, not
/// necessarily the original base game — see the fixpoint driver).
pub fn synchronous_product(game: &Game, per_player_games: &[Game]) -> Result<Game> {
    let n = per_player_games.len();
    debug_assert_eq!(n, game.num_players());

    let subsets: Vec<Vec<BTreeSet<StateIndex>>> = per_player_games
        .iter()
        .map(|g| {
            g.states()
                .iter()
                .map(|k| underlying_subset(game, k))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut witnesses: HashMap<Vec<Action>, Vec<(StateIndex, StateIndex)>> = HashMap::new();
    for t in game.transitions() {
        witnesses
            .entry(t.joint_action.clone())
            .or_default()
            .push((t.start, t.end));
    }

    let joint_actions = game.alphabet().joint_actions();

    let mut index: HashMap<Vec<StateIndex>, StateIndex> = HashMap::new();
    let mut product_states: Vec<Vec<StateIndex>> = Vec::new();
    let mut worklist: VecDeque<StateIndex> = VecDeque::new();
    let mut transitions = Vec::new();

    let initial_tuple: Vec<StateIndex> = per_player_games.iter().map(Game::initial).collect();
    if possible(&subsets, &initial_tuple).is_empty() {
        return Err(MkbscError::EmptyConstruction(
            "initial product state is inconsistent".to_string(),
        ));
    }
    let initial_index = intern(&mut index, &mut product_states, &mut worklist, initial_tuple);

    while let Some(q_idx) = worklist.pop_front() {
        let q = product_states[q_idx].clone();
        let possible_q = possible(&subsets, &q);
        log::debug!(
            "product worklist: popped state {q_idx} (possible base states: {}), {} remaining, {} interned so far",
            possible_q.len(),
            worklist.len(),
            product_states.len()
        );

        for joint_action in &joint_actions {
            let possible_post = game.post(joint_action, &possible_q);
            if possible_post.is_empty() {
                continue;
            }

            let mut candidates: Vec<Vec<StateIndex>> = Vec::with_capacity(n);
            let mut any_empty = false;
            for player in 0..n {
                let qi: BTreeSet<StateIndex> = [q[player]].into_iter().collect();
                let action_i = vec![joint_action[player].clone()];
                let raw = per_player_games[player].post(&action_i, &qi);
                let filtered: Vec<StateIndex> = raw
                    .into_iter()
                    .filter(|&p| !subsets[player][p].is_disjoint(&possible_post))
                    .collect();
                if filtered.is_empty() {
                    any_empty = true;
                    break;
                }
                candidates.push(filtered);
            }
            if any_empty {
                continue;
            }

            for combo in candidates.iter().map(|v| v.iter().copied()).multi_cartesian_product() {
                let possible_prime = possible(&subsets, &combo);
                if possible_prime.is_empty() {
                    continue;
                }

                let has_witness = witnesses
                    .get(joint_action)
                    .is_some_and(|edges| {
                        edges
                            .iter()
                            .any(|&(s, sp)| possible_q.contains(&s) && possible_prime.contains(&sp))
                    });
                if !has_witness {
                    continue;
                }

                let q_prime_idx = intern(&mut index, &mut product_states, &mut worklist, combo);
                transitions.push(Transition::new(q_idx, joint_action.clone(), q_prime_idx));
            }
        }
    }

    let states: Vec<Knowledge> = product_states
        .iter()
        .map(|tuple| {
            let groups: Vec<KnowledgeSet> = tuple
                .iter()
                .enumerate()
                .map(|(player, &idx)| {
                    let qi = per_player_games[player].state(idx).clone();
                    KnowledgeSet::new(ImHashSet::unit(qi))
                })
                .collect();
            Knowledge::Info(groups)
        })
        .collect();

    let partitionings = PerPlayer::generate(n, |player_index| {
        let player = player_index.index();
        let mut groups: HashMap<StateIndex, Vec<StateIndex>> = HashMap::new();
        for (i, tuple) in product_states.iter().enumerate() {
            groups.entry(tuple[player]).or_default().push(i);
        }
        let observations = groups
            .into_values()
            .map(|members| Observation::new(members).expect("non-empty by construction"))
            .collect();
        Partitioning::new(observations)
    })?;

    Game::new(
        states,
        initial_index,
        game.alphabet().clone(),
        transitions,
        partitionings,
    )
}

fn intern(
    index: &mut HashMap<Vec<StateIndex>, StateIndex>,
    product_states: &mut Vec<Vec<StateIndex>>,
    worklist: &mut VecDeque<StateIndex>,
    tuple: Vec<StateIndex>,
) -> StateIndex {
    if let Some(&i) = index.get(&tuple) {
        return i;
    }
    let i = product_states.len();
    product_states.push(tuple.clone());
    index.insert(tuple, i);
    worklist.push_back(i);
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameBuilder;
    use crate::kbsc::kbsc;
    use crate::knowledge::Symbol;
    use test_log::test;

    fn atom(i: i64) -> Knowledge {
        Knowledge::Atom(Symbol::Int(i))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::Str(s.to_string())
    }

    /// Scenario B ("magiian22"): three base states with a single joint action connecting each
    /// state to the other two. Without the witness-edge filter, inconsistent/unwitnessed
    /// candidate transitions would leak into the result; the correct KBSC has exactly 5 states.
    fn magiian22() -> Game {
        let states = vec![atom(0), atom(1), atom(2)];
        let alphabet = vec![vec![sym("x")], vec![sym("x")]];
        let builder = GameBuilder::new(states, atom(1), alphabet)
            .transition(atom(0), vec![sym("x"), sym("x")], atom(1))
            .transition(atom(0), vec![sym("x"), sym("x")], atom(2))
            .transition(atom(1), vec![sym("x"), sym("x")], atom(0))
            .transition(atom(1), vec![sym("x"), sym("x")], atom(2))
            .transition(atom(2), vec![sym("x"), sym("x")], atom(0))
            .transition(atom(2), vec![sym("x"), sym("x")], atom(1));
        use crate::game::GroupSpec;
        builder
            .grouping(vec![GroupSpec::CatchAll])
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap()
    }

    #[test]
    fn magiian22_kbsc_has_five_states() {
        let g = magiian22();
        let result = kbsc(&g).unwrap();
        assert_eq!(result.num_states(), 5);
    }

    #[test]
    fn every_product_state_is_consistent() {
        let g = magiian22();
        let result = kbsc(&g).unwrap();
        for state in result.states() {
            assert!(state.is_consistent().unwrap());
        }
    }
}
