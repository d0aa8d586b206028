//! Error types surfaced at the boundary of game construction, lookup, and (de)serialization.
//!
//! Within the core algorithms (KBSC, synchronous product, isomorphism, fixpoint iteration) these
//! conditions are invariants that cannot fire on well-formed input; they are only ever returned to
//! callers at the edges, e.g. from [`GameBuilder`](crate::GameBuilder) or the text-format parser.

use thiserror::Error;

/// The ways a game, or an attempt to parse/build one, can fail to be well-formed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MkbscError {
    /// A referenced state, atom, or action could not be found at construction time.
    #[error("lookup failed: {0}")]
    LookupMissing(String),

    /// An alphabet contained duplicate actions, a partitioning did not partition the state set,
    /// a transition endpoint was not in the state set, or an action was not in its alphabet.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// The game text file format was malformed.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Internal invariant violated: attempted to pick from an empty set while computing the
    /// consistent base of a state. This can only happen on an ill-formed game and is a
    /// programmer error rather than a user error.
    #[error("empty construction: {0}")]
    EmptyConstruction(String),
}

/// Convenience alias for fallible results throughout this crate.
pub type Result<T> = std::result::Result<T, MkbscError>;
