//! The line-oriented game text file format: parsing and serialisation.
//!
//! Ids are assigned so that every reference points only to an already-emitted id: base atoms
//! first, then knowledge states in an order where each state's groups only reference ids already
//! written (innermost knowledge layers before the ones built on top of them).

use crate::alphabet::Alphabet;
use crate::error::{MkbscError, Result};
use crate::game::Game;
use crate::knowledge::{Action, Knowledge, KnowledgeSet, Symbol};
use crate::observation::{Observation, Partitioning};
use crate::per_player::PerPlayer;
use crate::transition::{StateIndex, Transition};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

fn render_symbol(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Int(i) => i.to_string(),
        Symbol::Str(s) => format!("\"{s}\""),
    }
}

fn parse_symbol(token: &str) -> Result<Symbol> {
    let token = token.trim();
    match token.chars().next() {
        Some(c @ ('"' | '\'')) => {
            let closing = token.rfind(c).filter(|&i| i > 0).ok_or_else(|| {
                MkbscError::ParseError(format!("unterminated quoted action: {token}"))
            })?;
            Ok(Symbol::Str(token[1..closing].to_string()))
        }
        Some(_) => token
            .parse::<i64>()
            .map(Symbol::Int)
            .map_err(|_| MkbscError::ParseError(format!("invalid action token: {token}"))),
        None => Err(MkbscError::ParseError("empty action token".to_string())),
    }
}

/// Walk every state's knowledge value depth-first, recording each distinct node the first time
/// it's reached. Because children are always visited (and thus recorded) before their parent,
/// every id assigned from this order satisfies "only references earlier ids".
fn topological_nodes(game: &Game) -> Vec<Knowledge> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();

    fn visit(value: &Knowledge, seen: &mut HashSet<Knowledge>, order: &mut Vec<Knowledge>) {
        if seen.contains(value) {
            return;
        }
        if let Knowledge::Info(groups) = value {
            for group in groups {
                for member in group.iter() {
                    visit(member, seen, order);
                }
            }
        }
        seen.insert(value.clone());
        order.push(value.clone());
    }

    for state in game.states() {
        visit(state, &mut seen, &mut order);
    }
    order
}

/// Serialise a game to the text format, as a single `\n`-joined string.
pub fn to_string(game: &Game) -> Result<String> {
    let mut lines: Vec<String> = Vec::new();

    // Alphabet: a single counter assigns ids across all players' actions, in player order.
    let mut action_id = 0usize;
    let mut action_ids: Vec<HashMap<Action, usize>> = Vec::with_capacity(game.num_players());
    lines.push("Alphabet:".to_string());
    for player in 0..game.num_players() {
        let actions = game.alphabet().player_actions(player)?;
        let mut map = HashMap::new();
        let rendered: Vec<String> = actions
            .iter()
            .map(|a| {
                map.insert(a.clone(), action_id);
                action_id += 1;
                render_symbol(a)
            })
            .collect();
        action_ids.push(map);
        lines.push(rendered.join(","));
    }
    lines.push(String::new());

    // Base atoms come first, then knowledge states in an order where every reference points
    // only to already-assigned ids.
    let nodes = topological_nodes(game);
    let atoms: Vec<&Knowledge> = nodes.iter().filter(|k| matches!(k, Knowledge::Atom(_))).collect();
    let infos: Vec<&Knowledge> = nodes.iter().filter(|k| matches!(k, Knowledge::Info(_))).collect();

    let mut id_of: HashMap<Knowledge, usize> = HashMap::new();
    let mut next_id = 0usize;
    for atom in &atoms {
        id_of.insert((*atom).clone(), next_id);
        next_id += 1;
    }
    for info in &infos {
        id_of.insert((*info).clone(), next_id);
        next_id += 1;
    }

    lines.push("Base States:".to_string());
    for atom in &atoms {
        if let Knowledge::Atom(a) = atom {
            lines.push(format!("{}={}", id_of[atom], render_symbol(a)));
        }
    }
    lines.push(String::new());

    lines.push("Knowledge States:".to_string());
    for info in &infos {
        if let Knowledge::Info(groups) = info {
            let group_strs: Vec<String> = groups
                .iter()
                .map(|group| {
                    let mut ids: Vec<usize> = group.iter().map(|m| id_of[m]).collect();
                    ids.sort_unstable();
                    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
                })
                .collect();
            lines.push(format!("{}={}", id_of[info], group_strs.join("|")));
        }
    }
    lines.push(String::new());

    lines.push(format!("Initial State: {}", id_of[game.state(game.initial())]));
    lines.push(String::new());

    lines.push("Observations:".to_string());
    for player in 0..game.num_players() {
        let partitioning = game.partitioning(player)?;
        let obs_strs: Vec<String> = partitioning
            .observations()
            .iter()
            .map(|obs| {
                let mut ids: Vec<usize> = obs.iter().map(|s| id_of[game.state(s)]).collect();
                ids.sort_unstable();
                ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
            })
            .collect();
        lines.push(obs_strs.join("|"));
    }
    lines.push(String::new());

    lines.push("Transitions:".to_string());
    for t in game.transitions() {
        let action_str: Vec<String> = t
            .joint_action
            .iter()
            .enumerate()
            .map(|(player, action)| action_ids[player][action].to_string())
            .collect();
        lines.push(format!(
            "{} {} {}",
            id_of[game.state(t.start)],
            action_str.join(","),
            id_of[game.state(t.end)]
        ));
    }
    lines.push(String::new());

    lines.push("Attributes: {}".to_string());

    Ok(lines.join("\n"))
}

/// Write a game to a `.game` file.
pub fn to_file(game: &Game, path: impl AsRef<Path>) -> Result<()> {
    let text = to_string(game)?;
    fs::write(path, text).map_err(|e| MkbscError::ParseError(format!("failed to write game file: {e}")))
}

struct LineCursor<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> LineCursor<'a> {
    fn next_line(&mut self) -> Result<&'a str> {
        self.lines
            .next()
            .ok_or_else(|| MkbscError::ParseError("unexpected end of input".to_string()))
    }
}

/// Parse a game from the text format.
pub fn from_str(input: &str) -> Result<Game> {
    let mut cursor = LineCursor { lines: input.lines() };

    let header = cursor.next_line()?;
    if header.trim() != "Alphabet:" {
        return Err(MkbscError::ParseError(format!(
            "expected 'Alphabet:' header, found {header:?}"
        )));
    }

    let mut actions_by_id: HashMap<usize, Action> = HashMap::new();
    let mut per_player_actions: Vec<Vec<Action>> = Vec::new();
    let mut action_id = 0usize;
    loop {
        let line = cursor.next_line()?;
        if line.trim().is_empty() {
            break;
        }
        let mut player_actions = Vec::new();
        for token in line.split(',') {
            let symbol = parse_symbol(token)?;
            actions_by_id.insert(action_id, symbol.clone());
            player_actions.push(symbol);
            action_id += 1;
        }
        per_player_actions.push(player_actions);
    }

    let base_header = cursor.next_line()?;
    if base_header.trim() != "Base States:" {
        return Err(MkbscError::ParseError(format!(
            "expected 'Base States:' header, found {base_header:?}"
        )));
    }
    let mut states_by_id: HashMap<StateIndex, Knowledge> = HashMap::new();
    loop {
        let line = cursor.next_line()?;
        if line.trim().is_empty() {
            break;
        }
        let (id_str, value_str) = line
            .split_once('=')
            .ok_or_else(|| MkbscError::ParseError(format!("malformed base state line: {line}")))?;
        let id: StateIndex = id_str
            .parse()
            .map_err(|_| MkbscError::ParseError(format!("invalid state id: {id_str}")))?;
        let atom = parse_symbol(value_str)?;
        states_by_id.insert(id, Knowledge::Atom(atom));
    }

    let knowledge_header = cursor.next_line()?;
    if knowledge_header.trim() != "Knowledge States:" {
        return Err(MkbscError::ParseError(format!(
            "expected 'Knowledge States:' header, found {knowledge_header:?}"
        )));
    }
    loop {
        let line = cursor.next_line()?;
        if line.trim().is_empty() {
            break;
        }
        let (id_str, value_str) = line
            .split_once('=')
            .ok_or_else(|| MkbscError::ParseError(format!("malformed knowledge state line: {line}")))?;
        let id: StateIndex = id_str
            .parse()
            .map_err(|_| MkbscError::ParseError(format!("invalid state id: {id_str}")))?;

        let mut groups = Vec::new();
        for group_str in value_str.split('|') {
            let mut members = Vec::new();
            for ref_id in group_str.split(',') {
                let ref_id: StateIndex = ref_id
                    .trim()
                    .parse()
                    .map_err(|_| MkbscError::ParseError(format!("invalid member id: {ref_id}")))?;
                let member = states_by_id.get(&ref_id).ok_or_else(|| {
                    MkbscError::ParseError(format!("knowledge state references unknown id {ref_id}"))
                })?;
                members.push(member.clone());
            }
            groups.push(KnowledgeSet::new(members.into_iter().collect()));
        }
        states_by_id.insert(id, Knowledge::Info(groups));
    }

    let initial_line = cursor.next_line()?;
    let initial_str = initial_line
        .strip_prefix("Initial State: ")
        .ok_or_else(|| MkbscError::ParseError(format!("malformed initial state line: {initial_line}")))?;
    let initial_id: StateIndex = initial_str
        .trim()
        .parse()
        .map_err(|_| MkbscError::ParseError(format!("invalid initial state id: {initial_str}")))?;

    let blank = cursor.next_line()?;
    if !blank.trim().is_empty() {
        return Err(MkbscError::ParseError("expected blank line after initial state".to_string()));
    }
    let obs_header = cursor.next_line()?;
    if obs_header.trim() != "Observations:" {
        return Err(MkbscError::ParseError(format!(
            "expected 'Observations:' header, found {obs_header:?}"
        )));
    }

    let mut groupings: Vec<Vec<Vec<StateIndex>>> = Vec::new();
    loop {
        let line = cursor.next_line()?;
        if line.trim().is_empty() {
            break;
        }
        let mut grouping = Vec::new();
        for observation_str in line.split('|') {
            let ids: Result<Vec<StateIndex>> = observation_str
                .split(',')
                .map(|s| {
                    s.trim()
                        .parse()
                        .map_err(|_| MkbscError::ParseError(format!("invalid observation member: {s}")))
                })
                .collect();
            grouping.push(ids?);
        }
        groupings.push(grouping);
    }

    let transitions_header = cursor.next_line()?;
    if transitions_header.trim() != "Transitions:" {
        return Err(MkbscError::ParseError(format!(
            "expected 'Transitions:' header, found {transitions_header:?}"
        )));
    }
    let mut raw_transitions: Vec<(StateIndex, Vec<usize>, StateIndex)> = Vec::new();
    loop {
        let line = cursor.next_line()?;
        if line.trim().is_empty() {
            break;
        }
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() != 3 {
            log::warn!("malformed transition line (expected 3 fields, found {}): {line}", parts.len());
            return Err(MkbscError::ParseError(format!("malformed transition line: {line}")));
        }
        let from: StateIndex = parts[0]
            .parse()
            .map_err(|_| MkbscError::ParseError(format!("invalid transition source: {}", parts[0])))?;
        let to: StateIndex = parts[2]
            .parse()
            .map_err(|_| MkbscError::ParseError(format!("invalid transition target: {}", parts[2])))?;
        let action_ids: Result<Vec<usize>> = parts[1]
            .split(',')
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|_| MkbscError::ParseError(format!("invalid action id: {s}")))
            })
            .collect();
        raw_transitions.push((from, action_ids?, to));
    }

    let attributes_line = cursor.next_line().unwrap_or_else(|_| {
        log::warn!("game file has no 'Attributes:' line; defaulting to an empty object");
        "Attributes: {}"
    });
    let json_str = attributes_line.strip_prefix("Attributes: ").unwrap_or_else(|| {
        log::warn!("malformed 'Attributes:' line {attributes_line:?}; defaulting to an empty object");
        "{}"
    });
    let _attributes: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| MkbscError::ParseError(format!("invalid attributes JSON: {e}")))?;

    let num_states = states_by_id.len();
    let mut states = Vec::with_capacity(num_states);
    for id in 0..num_states {
        let state = states_by_id
            .remove(&id)
            .ok_or_else(|| MkbscError::ParseError(format!("state ids are not contiguous: missing {id}")))?;
        states.push(state);
    }

    let alphabet = Alphabet::new(per_player_actions)?;

    let transitions: Vec<Transition> = raw_transitions
        .into_iter()
        .map(|(from, action_ids, to)| -> Result<Transition> {
            let joint_action: Result<Vec<Action>> = action_ids
                .into_iter()
                .map(|id| {
                    actions_by_id
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| MkbscError::ParseError(format!("unknown action id {id}")))
                })
                .collect();
            Ok(Transition::new(from, joint_action?, to))
        })
        .collect::<Result<Vec<_>>>()?;

    let partitionings: Vec<Partitioning> = groupings
        .into_iter()
        .map(|grouping| {
            let observations: Result<Vec<Observation>> = grouping
                .into_iter()
                .map(Observation::new)
                .collect();
            observations.map(Partitioning::new)
        })
        .collect::<Result<Vec<_>>>()?;
    let partitionings = PerPlayer::new(partitionings)?;

    Game::new(states, initial_id, alphabet, transitions, partitionings)
}

/// Read a game from a `.game` file.
pub fn from_file(path: impl AsRef<Path>) -> Result<Game> {
    let text = fs::read_to_string(path)
        .map_err(|e| MkbscError::ParseError(format!("failed to read game file: {e}")))?;
    from_str(&text)
}
