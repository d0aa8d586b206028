//! Per-player action alphabets and joint-action enumeration.

use crate::error::{MkbscError, Result};
use crate::knowledge::Action;
use crate::per_player::PerPlayer;
use itertools::Itertools;

/// The possible joint actions of a coalition of players: one finite, duplicate-free list of
/// actions per player.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Alphabet {
    actions: PerPlayer<Vec<Action>>,
}

impl Alphabet {
    /// Build an alphabet from one action list per player. Rejects a player whose action list
    /// contains a duplicate.
    pub fn new(per_player_actions: Vec<Vec<Action>>) -> Result<Self> {
        for (player, actions) in per_player_actions.iter().enumerate() {
            let mut seen = std::collections::HashSet::new();
            for action in actions {
                if !seen.insert(action) {
                    return Err(MkbscError::ValidationFailure(format!(
                        "player {player} alphabet contains duplicate action {action}"
                    )));
                }
            }
        }
        Ok(Alphabet {
            actions: PerPlayer::new(per_player_actions)?,
        })
    }

    /// The number of players this alphabet covers.
    pub fn num_players(&self) -> usize {
        self.actions.num_players()
    }

    /// A single player's action list.
    pub fn player_actions(&self, player: usize) -> Result<&[Action]> {
        let idx = self.actions.player(player)?;
        Ok(&self.actions[idx])
    }

    /// Every joint action: the Cartesian product of the per-player action lists, in unspecified
    /// but exhaustive and duplicate-free order.
    pub fn joint_actions(&self) -> Vec<Vec<Action>> {
        self.actions
            .values()
            .map(|actions| actions.iter().cloned())
            .multi_cartesian_product()
            .collect()
    }

    /// Restrict this alphabet to a single player, yielding a one-player alphabet `(Σᵢ,)`.
    pub fn project(&self, player: usize) -> Result<Alphabet> {
        let actions = self.player_actions(player)?.to_vec();
        Alphabet::new(vec![actions])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Symbol;
    use test_log::test;

    fn sym(s: &str) -> Action {
        Symbol::Str(s.to_string())
    }

    #[test]
    fn joint_actions_is_full_cartesian_product() {
        let alphabet = Alphabet::new(vec![
            vec![sym("wait"), sym("push")],
            vec![sym("wait"), sym("push")],
        ])
        .unwrap();
        let joint = alphabet.joint_actions();
        assert_eq!(joint.len(), 4);
        assert!(joint.contains(&vec![sym("wait"), sym("push")]));
        assert!(joint.contains(&vec![sym("push"), sym("wait")]));
    }

    #[test]
    fn duplicate_action_is_rejected() {
        let result = Alphabet::new(vec![vec![sym("a"), sym("a")]]);
        assert!(matches!(result, Err(MkbscError::ValidationFailure(_))));
    }

    #[test]
    fn project_keeps_one_players_actions() {
        let alphabet = Alphabet::new(vec![vec![sym("a")], vec![sym("b"), sym("c")]]).unwrap();
        let projected = alphabet.project(1).unwrap();
        assert_eq!(projected.num_players(), 1);
        assert_eq!(projected.player_actions(0).unwrap(), &[sym("b"), sym("c")]);
    }
}
