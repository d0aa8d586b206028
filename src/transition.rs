//! Labelled transitions between states, indexed by position within the owning game.

use crate::knowledge::Action;
use std::fmt;

/// An index into a [`Game`](crate::game::Game)'s state list. Only meaningful relative to the
/// game that produced it.
pub type StateIndex = usize;

/// A labelled edge `(start, joint_action, end)`. Multiple transitions may share the same
/// endpoints with distinct labels (multigraph), or share a label with distinct endpoints.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Transition {
    pub start: StateIndex,
    pub joint_action: Vec<Action>,
    pub end: StateIndex,
}

impl Transition {
    pub fn new(start: StateIndex, joint_action: Vec<Action>, end: StateIndex) -> Self {
        Transition {
            start,
            joint_action,
            end,
        }
    }

    /// The action for a single player's component of this transition's joint action.
    pub fn action(&self, player: usize) -> &Action {
        &self.joint_action[player]
    }

    /// A human-readable rendering of the joint action label: a bare action for a single player,
    /// a parenthesised tuple for more than one.
    pub fn label(&self) -> String {
        if self.joint_action.len() > 1 {
            format!(
                "({})",
                self.joint_action
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        } else {
            self.joint_action[0].to_string()
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}-> {}", self.start, self.label(), self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Symbol;
    use test_log::test;

    #[test]
    fn label_parenthesises_joint_actions() {
        let t = Transition::new(0, vec![Symbol::Str("a".into()), Symbol::Str("b".into())], 1);
        assert_eq!(t.label(), "(a, b)");
    }

    #[test]
    fn label_is_bare_for_single_player() {
        let t = Transition::new(0, vec![Symbol::Int(3)], 1);
        assert_eq!(t.label(), "3");
    }
}
