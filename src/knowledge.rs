//! The recursive knowledge value at the heart of the construction: either a base atom, or one
//! information set per player, each set containing values from the previous iteration.

use crate::error::{MkbscError, Result};
use im::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A scalar identifying a base-game state or an action: a bare integer or a short string.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Symbol {
    /// A bare integer, e.g. `3`.
    Int(i64),
    /// A quoted string, e.g. `"push"`.
    Str(String),
}

/// A base-game atom identifying a state that the KBSC has not yet refined.
pub type Atom = Symbol;

/// An action label drawn from a player's alphabet.
pub type Action = Symbol;

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Int(i) => write!(f, "{i}"),
            Symbol::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Symbol {
    fn from(i: i64) -> Self {
        Symbol::Int(i)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::Str(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::Str(s)
    }
}

/// A recursive knowledge value: a base atom, or one information set per player.
///
/// Knowledge values have value semantics: two values are equal iff they are structurally equal.
/// The nesting depth of an `Info` value equals the number of KBSC iterations that produced it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Knowledge {
    /// An atomic base-game state.
    Atom(Atom),
    /// One non-empty information set per player, drawn from the previous iteration's states.
    Info(Vec<KnowledgeSet>),
}

/// A non-empty, unordered, deduplicated set of knowledge values: one player's information set.
///
/// Backed by [`im::HashSet`] for cheap structural sharing when the same information set recurs
/// across many product states, which happens often once the product construction starts
/// interning candidate successors.
#[derive(Clone, Debug)]
pub struct KnowledgeSet(HashSet<Knowledge>);

impl KnowledgeSet {
    /// Wrap a set of knowledge values. Every information set in a well-formed game is non-empty;
    /// this is enforced by the game builder and by the algorithms that produce new states, not
    /// here, since some intermediate computations build up a `KnowledgeSet` before knowing
    /// whether it will turn out empty (and therefore be discarded).
    pub fn new(set: HashSet<Knowledge>) -> Self {
        KnowledgeSet(set)
    }

    /// True if this set contains no knowledge values. A `KnowledgeSet` in this state never
    /// appears inside a constructed [`Knowledge::Info`] value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of distinct knowledge values in this set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the members of this set, in unspecified order.
    pub fn iter(&self) -> im::hashset::Iter<'_, Knowledge> {
        self.0.iter()
    }

    /// Borrow the underlying set.
    pub fn as_set(&self) -> &HashSet<Knowledge> {
        &self.0
    }
}

impl FromIterator<Knowledge> for KnowledgeSet {
    fn from_iter<I: IntoIterator<Item = Knowledge>>(iter: I) -> Self {
        KnowledgeSet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a KnowledgeSet {
    type Item = &'a Knowledge;
    type IntoIter = im::hashset::Iter<'a, Knowledge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PartialEq for KnowledgeSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for KnowledgeSet {}

impl Hash for KnowledgeSet {
    // `im::HashSet`, like `std::HashSet`, deliberately has no `Hash` impl: a set's iteration
    // order isn't part of its identity, so any impl would have to be order-insensitive. Fold
    // each member's hash with a commutative operator (wrapping addition) to build one here.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut acc: u64 = 0;
        for member in self.0.iter() {
            let mut h = DefaultHasher::new();
            member.hash(&mut h);
            acc = acc.wrapping_add(h.finish());
        }
        acc.hash(state);
    }
}

impl Knowledge {
    /// The set of base-game atoms compatible with this knowledge value, computed by repeatedly
    /// intersecting knowledge-sets down to the atoms at the leaves.
    ///
    /// A state is consistent iff this set is non-empty; this is the central semantic filter
    /// applied throughout the synchronous product.
    pub fn consistent_base(&self) -> Result<HashSet<Atom>> {
        match self {
            Knowledge::Atom(a) => Ok(HashSet::unit(a.clone())),
            Knowledge::Info(groups) => {
                let mut groups_iter = groups.iter();
                let first = groups_iter.next().ok_or_else(|| {
                    MkbscError::EmptyConstruction(
                        "knowledge value has no player groups".to_string(),
                    )
                })?;
                let mut acc = Self::group_base(first)?;
                for group in groups_iter {
                    acc = acc.intersection(Self::group_base(group)?);
                }
                Ok(acc)
            }
        }
    }

    fn group_base(group: &KnowledgeSet) -> Result<HashSet<Atom>> {
        if group.is_empty() {
            return Err(MkbscError::EmptyConstruction(
                "information set was empty while computing consistent base".to_string(),
            ));
        }
        let mut acc = HashSet::new();
        for member in group.iter() {
            acc = acc.union(member.consistent_base()?);
        }
        Ok(acc)
    }

    /// A state is consistent iff its [`consistent_base`](Self::consistent_base) is non-empty.
    pub fn is_consistent(&self) -> Result<bool> {
        Ok(!self.consistent_base()?.is_empty())
    }

    /// The most compact rendering: the comma-separated, sorted list of base atoms in the
    /// consistent base. Two structurally different states with the same consistent base share
    /// an isocheck rendering.
    pub fn render_isocheck(&self) -> Result<String> {
        let mut atoms: Vec<String> = self
            .consistent_base()?
            .iter()
            .map(ToString::to_string)
            .collect();
        atoms.sort();
        Ok(atoms.join(", "))
    }

    /// A compact, nested-set rendering suitable for a graph node label.
    pub fn render_nice(&self) -> String {
        match self {
            Knowledge::Atom(a) => a.to_string(),
            Knowledge::Info(groups) => groups
                .iter()
                .map(|group| {
                    let mut items: Vec<String> =
                        group.iter().map(Knowledge::render_nice).collect();
                    items.sort();
                    format!("{{{}}}", items.join(", "))
                })
                .collect::<Vec<_>>()
                .join("-"),
        }
    }

    /// A verbose, line-oriented rendering with `Player i knows:` / `or` connectives. Not
    /// recommended for heavily-iterated games.
    pub fn render_verbose(&self) -> String {
        self.render_verbose_at(0)
    }

    fn render_verbose_at(&self, level: usize) -> String {
        let indent = "\t".repeat(level);
        match self {
            Knowledge::Atom(a) => format!("{indent}We are in {a}\n"),
            Knowledge::Info(groups) => {
                let mut s = String::new();
                for (player, group) in groups.iter().enumerate() {
                    s.push_str(&format!("{indent}Player {player} knows:\n"));
                    let clauses: Vec<String> = group
                        .iter()
                        .map(|k| k.render_verbose_at(level + 1))
                        .collect();
                    s.push_str(&clauses.join(&format!("{}or\n", "\t".repeat(level + 1))));
                }
                s
            }
        }
    }
}
