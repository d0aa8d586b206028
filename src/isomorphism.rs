//! Label-respecting multi-digraph isomorphism, with a sentinel node pinning the initial state
//! and an optional observation-as-edge encoding for the stronger "stable with observations"
//! check.

use crate::game::Game;
use crate::knowledge::Action;
use crate::transition::StateIndex;
use std::collections::HashMap;

/// An edge label in the internal isomorphism graph: a real joint-action transition, a
/// player-indexed observation-equivalence edge, or the distinguished sentinel edge that pins the
/// initial state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EdgeLabel {
    Action(Vec<Action>),
    Observation(usize),
    Sentinel,
}

struct LabelledGraph {
    num_nodes: usize,
    out_edges: Vec<Vec<(usize, EdgeLabel)>>,
    in_edges: Vec<Vec<(usize, EdgeLabel)>>,
}

fn build_graph(game: &Game, consider_observations: bool) -> LabelledGraph {
    let n = game.num_states();
    let sentinel = n;
    let mut out_edges = vec![Vec::new(); n + 1];
    let mut in_edges = vec![Vec::new(); n + 1];

    for t in game.transitions() {
        out_edges[t.start].push((t.end, EdgeLabel::Action(t.joint_action.clone())));
        in_edges[t.end].push((t.start, EdgeLabel::Action(t.joint_action.clone())));
    }

    out_edges[sentinel].push((game.initial(), EdgeLabel::Sentinel));
    in_edges[game.initial()].push((sentinel, EdgeLabel::Sentinel));

    if consider_observations {
        for player in 0..game.num_players() {
            let Ok(partitioning) = game.partitioning(player) else {
                continue;
            };
            for obs in partitioning.observations() {
                if obs.len() <= 1 {
                    continue;
                }
                let members: Vec<StateIndex> = obs.iter().collect();
                for &a in &members {
                    for &b in &members {
                        if a != b {
                            out_edges[a].push((b, EdgeLabel::Observation(player)));
                            in_edges[b].push((a, EdgeLabel::Observation(player)));
                        }
                    }
                }
            }
        }
    }

    LabelledGraph {
        num_nodes: n + 1,
        out_edges,
        in_edges,
    }
}

/// A cheap local invariant used to prune candidate pairings before the expensive recursive
/// consistency check: degree pair plus sorted label multisets.
type Signature = (usize, usize, Vec<String>, Vec<String>);

fn signature(g: &LabelledGraph, node: usize) -> Signature {
    let mut out_labels: Vec<String> = g.out_edges[node].iter().map(|(_, l)| format!("{l:?}")).collect();
    let mut in_labels: Vec<String> = g.in_edges[node].iter().map(|(_, l)| format!("{l:?}")).collect();
    out_labels.sort();
    in_labels.sort();
    (g.out_edges[node].len(), g.in_edges[node].len(), out_labels, in_labels)
}

fn self_loop_labels(edges: &[(usize, EdgeLabel)], node: usize) -> Vec<String> {
    let mut labels: Vec<String> = edges
        .iter()
        .filter(|(to, _)| *to == node)
        .map(|(_, l)| format!("{l:?}"))
        .collect();
    labels.sort();
    labels
}

/// True iff extending the partial mapping with `node -> candidate` keeps every edge between
/// `node`/`candidate` and already-assigned nodes consistent, in both directions, including
/// self-loops.
fn consistent(
    g1: &LabelledGraph,
    g2: &LabelledGraph,
    assignment: &[Option<usize>],
    reverse: &[Option<usize>],
    node: usize,
    candidate: usize,
) -> bool {
    if self_loop_labels(&g1.out_edges[node], node) != self_loop_labels(&g2.out_edges[candidate], candidate) {
        return false;
    }

    let mut need_out: HashMap<(usize, EdgeLabel), usize> = HashMap::new();
    for (to, label) in &g1.out_edges[node] {
        if let Some(mapped) = assignment[*to] {
            *need_out.entry((mapped, label.clone())).or_insert(0) += 1;
        }
    }
    let mut have_out: HashMap<(usize, EdgeLabel), usize> = HashMap::new();
    for (to2, label2) in &g2.out_edges[candidate] {
        if reverse[*to2].is_some() {
            *have_out.entry((*to2, label2.clone())).or_insert(0) += 1;
        }
    }
    if need_out != have_out {
        return false;
    }

    let mut need_in: HashMap<(usize, EdgeLabel), usize> = HashMap::new();
    for (from, label) in &g1.in_edges[node] {
        if let Some(mapped) = assignment[*from] {
            *need_in.entry((mapped, label.clone())).or_insert(0) += 1;
        }
    }
    let mut have_in: HashMap<(usize, EdgeLabel), usize> = HashMap::new();
    for (from2, label2) in &g2.in_edges[candidate] {
        if reverse[*from2].is_some() {
            *have_in.entry((*from2, label2.clone())).or_insert(0) += 1;
        }
    }
    need_in == have_in
}

fn backtrack(
    g1: &LabelledGraph,
    g2: &LabelledGraph,
    order: &[usize],
    pos: usize,
    assignment: &mut [Option<usize>],
    reverse: &mut [Option<usize>],
    sig1: &[Signature],
    sig2: &[Signature],
) -> bool {
    if pos == order.len() {
        return true;
    }
    let node = order[pos];
    for candidate in 0..g2.num_nodes {
        if reverse[candidate].is_some() {
            continue;
        }
        if sig1[node] != sig2[candidate] {
            continue;
        }
        if !consistent(g1, g2, assignment, reverse, node, candidate) {
            continue;
        }
        assignment[node] = Some(candidate);
        reverse[candidate] = Some(node);
        if backtrack(g1, g2, order, pos + 1, assignment, reverse, sig1, sig2) {
            return true;
        }
        assignment[node] = None;
        reverse[candidate] = None;
    }
    false
}

/// `isomorphic(G, G', consider_observations)`: true iff there is a bijection between state sets
/// (plus a shared sentinel pinning the initial states together) preserving the labelled
/// multi-edge structure, and — if `consider_observations` — the per-player observation
/// equivalences as well.
pub fn isomorphic(g1: &Game, g2: &Game, consider_observations: bool) -> bool {
    let lg1 = build_graph(g1, consider_observations);
    let lg2 = build_graph(g2, consider_observations);
    if lg1.num_nodes != lg2.num_nodes {
        return false;
    }
    let n = lg1.num_nodes;

    let sig1: Vec<Signature> = (0..n).map(|i| signature(&lg1, i)).collect();
    let sig2: Vec<Signature> = (0..n).map(|i| signature(&lg2, i)).collect();

    let mut counts1: HashMap<&Signature, usize> = HashMap::new();
    for s in &sig1 {
        *counts1.entry(s).or_insert(0) += 1;
    }
    let mut counts2: HashMap<&Signature, usize> = HashMap::new();
    for s in &sig2 {
        *counts2.entry(s).or_insert(0) += 1;
    }
    if counts1 != counts2 {
        return false;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| counts1[&sig1[i]]);

    let mut assignment = vec![None; n];
    let mut reverse = vec![None; n];
    backtrack(&lg1, &lg2, &order, 0, &mut assignment, &mut reverse, &sig1, &sig2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameBuilder;
    use crate::knowledge::{Knowledge, Symbol};
    use crate::observation::{Observation, Partitioning};
    use test_log::test;
    use crate::per_player::PerPlayer;

    fn atom(i: i64) -> Knowledge {
        Knowledge::Atom(Symbol::Int(i))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::Str(s.to_string())
    }

    #[test]
    fn a_game_is_isomorphic_to_itself() {
        use crate::game::GroupSpec;
        let g = GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .transition(atom(1), vec![sym("a")], atom(0))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap();
        assert!(isomorphic(&g, &g, false));
        assert!(isomorphic(&g, &g, true));
    }

    #[test]
    fn relabelled_states_are_still_isomorphic() {
        use crate::game::GroupSpec;
        let g1 = GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .transition(atom(1), vec![sym("a")], atom(0))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap();
        // Same structure, states swapped and renamed.
        let g2 = GameBuilder::new(vec![atom(100), atom(200)], atom(200), vec![vec![sym("a")]])
            .transition(atom(200), vec![sym("a")], atom(100))
            .transition(atom(100), vec![sym("a")], atom(200))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap();
        assert!(isomorphic(&g1, &g2, false));
    }

    #[test]
    fn different_edge_count_is_not_isomorphic() {
        use crate::game::GroupSpec;
        let g1 = GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap();
        let g2 = GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .transition(atom(1), vec![sym("a")], atom(0))
            .grouping(vec![GroupSpec::CatchAll])
            .build()
            .unwrap();
        assert!(!isomorphic(&g1, &g2, false));
    }

    #[test]
    fn observation_structure_distinguishes_games_with_same_transitions() {
        let states = vec![atom(0), atom(1)];
        let alphabet = vec![vec![sym("a")]];
        let transitions = vec![
            crate::transition::Transition::new(0, vec![sym("a")], 0),
            crate::transition::Transition::new(1, vec![sym("a")], 1),
        ];
        let discrete = PerPlayer::new(vec![Partitioning::new(vec![
            Observation::new([0]).unwrap(),
            Observation::new([1]).unwrap(),
        ])])
        .unwrap();
        let grouped = PerPlayer::new(vec![Partitioning::new(vec![Observation::new([0, 1]).unwrap()])])
            .unwrap();

        let alphabet1 = crate::alphabet::Alphabet::new(alphabet.clone()).unwrap();
        let alphabet2 = crate::alphabet::Alphabet::new(alphabet).unwrap();

        let g_discrete = Game::new(states.clone(), 0, alphabet1, transitions.clone(), discrete).unwrap();
        let g_grouped = Game::new(states, 0, alphabet2, transitions, grouped).unwrap();

        assert!(isomorphic(&g_discrete, &g_grouped, false));
        assert!(!isomorphic(&g_discrete, &g_grouped, true));
    }
}
