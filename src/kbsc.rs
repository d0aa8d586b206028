//! The subset-construction core: single-player KBSC, and the dispatch that also invokes
//! projection and the synchronous product for multi-player games.

use crate::error::Result;
use crate::game::Game;
use crate::knowledge::{Knowledge, KnowledgeSet};
use crate::observation::Partitioning;
use crate::per_player::PerPlayer;
use crate::product::synchronous_product;
use crate::projection::project;
use crate::transition::{StateIndex, Transition};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Run the single-player KBSC over a single-player game: a worklist subset construction that
/// splits each post-image by observation, producing one successor knowledge state per
/// non-empty intersection.
pub fn kbsc_single_player(game: &Game) -> Result<Game> {
    debug_assert_eq!(game.num_players(), 1, "single-player KBSC requires a one-player game");

    let actions = game.alphabet().player_actions(0)?.to_vec();
    let partitioning = game.partitioning(0)?;

    let mut index: HashMap<BTreeSet<StateIndex>, StateIndex> = HashMap::new();
    let mut subsets: Vec<BTreeSet<StateIndex>> = Vec::new();
    let mut worklist: VecDeque<StateIndex> = VecDeque::new();
    let mut transitions = Vec::new();

    let initial_subset: BTreeSet<StateIndex> = [game.initial()].into_iter().collect();
    let initial_index = intern(&mut index, &mut subsets, &mut worklist, initial_subset);

    let mut popped = 0usize;
    while let Some(q_idx) = worklist.pop_front() {
        popped += 1;
        let q = subsets[q_idx].clone();
        log::debug!(
            "KBSC worklist: popped subset {q_idx} ({} states), {} remaining, {} interned so far",
            q.len(),
            worklist.len(),
            subsets.len()
        );
        for action in &actions {
            let joint_action = vec![action.clone()];
            let post = game.post(&joint_action, &q);
            if post.is_empty() {
                continue;
            }
            for observation in partitioning.observations() {
                let k: BTreeSet<StateIndex> =
                    post.intersection(observation.as_set()).copied().collect();
                if k.is_empty() {
                    continue;
                }
                let k_idx = intern(&mut index, &mut subsets, &mut worklist, k);
                transitions.push(Transition::new(q_idx, joint_action.clone(), k_idx));
            }
        }
    }
    log::debug!("KBSC worklist drained: {popped} subsets popped, {} interned", subsets.len());

    let states: Vec<Knowledge> = subsets
        .iter()
        .map(|subset| {
            let set: KnowledgeSet = subset.iter().map(|&i| game.state(i).clone()).collect();
            Knowledge::Info(vec![set])
        })
        .collect();

    let partitionings = PerPlayer::new(vec![Partitioning::discrete(states.len())])?;
    Game::new(
        states,
        initial_index,
        game.alphabet().clone(),
        transitions,
        partitionings,
    )
}

fn intern(
    index: &mut HashMap<BTreeSet<StateIndex>, StateIndex>,
    subsets: &mut Vec<BTreeSet<StateIndex>>,
    worklist: &mut VecDeque<StateIndex>,
    subset: BTreeSet<StateIndex>,
) -> StateIndex {
    if let Some(&i) = index.get(&subset) {
        return i;
    }
    let i = subsets.len();
    subsets.push(subset.clone());
    index.insert(subset, i);
    worklist.push_back(i);
    i
}

/// `KBSC(G)`: if `G` has a single player, run the subset construction directly; otherwise,
/// project onto each player, run single-player KBSC on each projection, and combine the results
/// with the synchronous product.
pub fn kbsc(game: &Game) -> Result<Game> {
    if game.num_players() == 1 {
        return kbsc_single_player(game);
    }

    let mut per_player_games = Vec::with_capacity(game.num_players());
    for player in 0..game.num_players() {
        let projected = project(game, player)?;
        per_player_games.push(kbsc_single_player(&projected)?);
    }
    synchronous_product(game, &per_player_games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameBuilder, GroupSpec};
    use crate::knowledge::Symbol;
    use test_log::test;

    fn atom(i: i64) -> Knowledge {
        Knowledge::Atom(Symbol::Int(i))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::Str(s.to_string())
    }

    // Scenario D: single-player KBSC on project(wagon, 0).
    fn projected_wagon_player_0() -> Game {
        let states = vec![atom(0), atom(1), atom(2)];
        let alphabet = vec![vec![sym("wait"), sym("push")]];
        let mut builder = GameBuilder::new(states, atom(0), alphabet);
        for s in 0..3i64 {
            builder = builder
                .transition(atom(s), vec![sym("wait")], atom(s))
                .transition(atom(s), vec![sym("push")], atom(s));
        }
        for &(from, to) in &[(0, 1), (1, 2), (2, 0)] {
            builder = builder.transition(atom(from), vec![sym("wait")], atom(to));
        }
        for &(from, to) in &[(0, 2), (2, 1), (1, 0)] {
            builder = builder.transition(atom(from), vec![sym("push")], atom(to));
        }
        builder
            .grouping(vec![
                GroupSpec::Group(vec![atom(0), atom(1)]),
                GroupSpec::Group(vec![atom(2)]),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn single_player_kbsc_yields_four_subsets() {
        let projected = projected_wagon_player_0();
        let result = kbsc_single_player(&projected).unwrap();
        assert_eq!(result.num_states(), 4);

        let expected_bases: Vec<BTreeSet<i64>> = vec![
            [0].into_iter().collect(),
            [1].into_iter().collect(),
            [2].into_iter().collect(),
            [0, 1].into_iter().collect(),
        ];
        let actual_bases: Vec<BTreeSet<i64>> = result
            .states()
            .iter()
            .map(|k| {
                k.consistent_base()
                    .unwrap()
                    .iter()
                    .map(|a| match a {
                        Symbol::Int(i) => *i,
                        Symbol::Str(_) => panic!("unexpected string atom"),
                    })
                    .collect()
            })
            .collect();
        for expected in &expected_bases {
            assert!(actual_bases.contains(expected), "missing subset {expected:?}");
        }
    }

    #[test]
    fn single_player_kbsc_result_has_discrete_partitioning() {
        let projected = projected_wagon_player_0();
        let result = kbsc_single_player(&projected).unwrap();
        for obs in result.partitioning(0).unwrap().observations() {
            assert_eq!(obs.len(), 1);
        }
    }
}
