//! Restriction of a multi-player game to a single player's action component.

use crate::error::Result;
use crate::game::Game;
use crate::per_player::PerPlayer;
use crate::transition::Transition;

/// `project(G, i)`: a single-player game with the same states, initial state, and player `i`'s
/// partitioning, but whose alphabet is `(Σᵢ,)` and whose transitions retain only player `i`'s
/// action component. Parallel transitions that collapse onto the same `(start, action, end)`
/// triple after projection are kept as distinct multi-edges — the result is not deduplicated.
pub fn project(game: &Game, player: usize) -> Result<Game> {
    let alphabet = game.alphabet().project(player)?;

    let transitions: Vec<Transition> = game
        .transitions()
        .iter()
        .map(|t| Transition::new(t.start, vec![t.action(player).clone()], t.end))
        .collect();

    let partitioning = game.partitioning(player)?.clone();
    let partitionings = PerPlayer::new(vec![partitioning])?;

    Game::new(
        game.states().to_vec(),
        game.initial(),
        alphabet,
        transitions,
        partitionings,
    )
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

    fn wagon() -> Game {
        // Two players, 3 states, (wait,push) rotates 0->1->2->0, (push,wait) rotates the other
        // way, matching actions are identities.
        let states = vec![atom(0), atom(1), atom(2)];
        let alphabet = vec![vec![sym("wait"), sym("push")], vec![sym("wait"), sym("push")]];
        let mut builder = GameBuilder::new(states, atom(0), alphabet);
        for s in 0..3 {
            builder = builder
                .transition(atom(s), vec![sym("wait"), sym("wait")], atom(s))
                .transition(atom(s), vec![sym("push"), sym("push")], atom(s));
        }
        let rotate_wp = [(0, 1), (1, 2), (2, 0)];
        let rotate_pw = [(0, 2), (2, 1), (1, 0)];
        for &(from, to) in &rotate_wp {
            builder = builder.transition(atom(from), vec![sym("wait"), sym("push")], atom(to));
        }
        for &(from, to) in &rotate_pw {
            builder = builder.transition(atom(from), vec![sym("push"), sym("wait")], atom(to));
        }
        builder
            .grouping(vec![
                GroupSpec::Group(vec![atom(0), atom(1)]),
                GroupSpec::Group(vec![atom(2)]),
            ])
            .grouping(vec![
                GroupSpec::Group(vec![atom(0), atom(2)]),
                GroupSpec::Group(vec![atom(1)]),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn projection_keeps_twelve_transitions_unduplicated() {
        let g = wagon();
        let projected = project(&g, 0).unwrap();
        assert_eq!(projected.num_players(), 1);
        assert_eq!(projected.transitions().len(), 12);
    }

    #[test]
    fn projection_restricts_partitioning_to_one_player() {
        let g = wagon();
        let projected = project(&g, 0).unwrap();
        let partitioning = projected.partitioning(0).unwrap();
        assert_eq!(partitioning.observations().len(), 2);
    }
}
