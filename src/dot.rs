//! Graphviz (dot) export: a hidden sentinel node points at the initial state, parallel
//! transitions are merged into one labelled edge, and observation equivalences can be drawn as
//! dashed, per-player-coloured edges.

use crate::error::Result;
use crate::game::Game;
use std::collections::HashMap;

/// Which of the three knowledge renderings (§4.8) to use for node labels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LabelStyle {
    Verbose,
    Nice,
    Isocheck,
}

/// Export options for [`to_dot`].
#[derive(Clone, Debug)]
pub struct DotOptions {
    pub label_style: LabelStyle,
    pub show_observations: bool,
}

impl Default for DotOptions {
    fn default() -> Self {
        DotOptions {
            label_style: LabelStyle::Nice,
            show_observations: true,
        }
    }
}

const OBSERVATION_COLORS: &[&str] = &[
    "red", "blue", "darkgreen", "orange", "purple", "brown", "cyan4", "magenta",
];

fn node_id(index: usize) -> String {
    format!("s{index}")
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Render a game as a dot multidigraph.
pub fn to_dot(game: &Game, options: &DotOptions) -> Result<String> {
    let mut out = String::new();
    out.push_str("digraph game {\n");
    out.push_str("  nodesep=0.5;\n  ranksep=0.5;\n");

    out.push_str("  hidden [shape=none, label=\"\"];\n");
    out.push_str(&format!("  hidden -> {};\n", node_id(game.initial())));

    for (i, state) in game.states().iter().enumerate() {
        let label = match options.label_style {
            LabelStyle::Verbose => state.render_verbose(),
            LabelStyle::Nice => state.render_nice(),
            LabelStyle::Isocheck => state.render_isocheck()?,
        };
        out.push_str(&format!(
            "  {} [label=\"{}\"];\n",
            node_id(i),
            escape(&label)
        ));
    }

    // Merge parallel transitions between the same pair of states into one labelled edge.
    let mut grouped: HashMap<(usize, usize), Vec<String>> = HashMap::new();
    for t in game.transitions() {
        grouped.entry((t.start, t.end)).or_default().push(t.label());
    }
    let mut pairs: Vec<&(usize, usize)> = grouped.keys().collect();
    pairs.sort();
    for pair in pairs {
        let labels = &grouped[pair];
        out.push_str(&format!(
            "  {} -> {} [label=\"{}\"];\n",
            node_id(pair.0),
            node_id(pair.1),
            escape(&labels.join(", "))
        ));
    }

    if options.show_observations {
        for player in 0..game.num_players() {
            let partitioning = game.partitioning(player)?;
            let color = OBSERVATION_COLORS[player % OBSERVATION_COLORS.len()];
            for obs in partitioning.observations() {
                let members: Vec<usize> = obs.iter().collect();
                if members.len() <= 1 {
                    continue;
                }
                for (w, &a) in members.iter().enumerate() {
                    for &b in &members[w + 1..] {
                        out.push_str(&format!(
                            "  {} -> {} [style=dashed, dir=none, color={}, label=\"p{}\"];\n",
                            node_id(a),
                            node_id(b),
                            color,
                            player
                        ));
                    }
                }
            }
        }
    }

    out.push_str("}\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameBuilder, GroupSpec};
    use crate::knowledge::{Knowledge, Symbol};
    use test_log::test;

    fn atom(i: i64) -> Knowledge {
        Knowledge::Atom(Symbol::Int(i))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::Str(s.to_string())
    }

    fn small_game() -> Game {
        GameBuilder::new(vec![atom(0), atom(1)], atom(0), vec![vec![sym("a"), sym("b")]])
            .transition(atom(0), vec![sym("a")], atom(1))
            .transition(atom(0), vec![sym("b")], atom(1))
            .grouping(vec![GroupSpec::Group(vec![atom(0), atom(1)])])
            .build()
            .unwrap()
    }

    #[test]
    fn dot_output_has_sentinel_and_all_nodes() {
        let g = small_game();
        let dot = to_dot(&g, &DotOptions::default()).unwrap();
        assert!(dot.starts_with("digraph game {"));
        assert!(dot.contains("hidden -> s0;"));
        assert!(dot.contains("s0 ["));
        assert!(dot.contains("s1 ["));
    }

    #[test]
    fn parallel_transitions_are_merged_into_one_edge() {
        let g = small_game();
        let dot = to_dot(&g, &DotOptions::default()).unwrap();
        assert_eq!(dot.matches("s0 -> s1 [label").count(), 1);
        assert!(dot.contains("a, b") || dot.contains("b, a"));
    }

    #[test]
    fn observation_edges_are_dashed_when_requested() {
        let g = small_game();
        let dot = to_dot(&g, &DotOptions::default()).unwrap();
        assert!(dot.contains("style=dashed"));

        let mut no_obs = DotOptions::default();
        no_obs.show_observations = false;
        let dot2 = to_dot(&g, &no_obs).unwrap();
        assert!(!dot2.contains("style=dashed"));
    }
}
