//! Multi-player Knowledge-Based Subset Construction (MKBSC): a fixpoint algorithm that refines a
//! game graph with imperfect information into one where each player's knowledge is explicit in
//! the state space.
//!
//! The pipeline: [`projection`] restricts a multi-player game to one player's action component,
//! [`kbsc`] subset-constructs a single-player projection against its observation partitioning,
//! [`product`] recombines the per-player results into a consistency- and witness-pruned
//! synchronous product, [`isomorphism`] decides when two iterations are the same game up to
//! relabelling, and [`fixpoint`] drives the loop to a stable point. [`serialize`] and [`dot`] are
//! the external interfaces: a line-oriented text format and a Graphviz export.

pub mod alphabet;
pub mod dot;
pub mod error;
pub mod fixpoint;
pub mod game;
pub mod isomorphism;
pub mod kbsc;
pub mod knowledge;
pub mod observation;
pub mod per_player;
pub mod product;
pub mod projection;
pub mod serialize;
pub mod transition;

pub use error::{MkbscError, Result};
pub use fixpoint::{iterate_until_isomorphic, FixpointResult, IterationRecord, Status};
pub use game::{Game, GameBuilder, GroupSpec, TransitionSpec};
pub use knowledge::{Action, Atom, Knowledge, KnowledgeSet, Symbol};
