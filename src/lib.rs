//! Exact, reproducible tabulation of weighted ranked and scored election
//! profiles.
//!
//! The engine turns a [`model::PreferenceProfile`] into an append-only log
//! of immutable round snapshots. Tied rankings are expanded into exact
//! permutation-weighted ballots at construction, every weight and quota is
//! an arbitrary-precision rational, and all randomness flows through
//! caller-seeded generators, so identical inputs always reproduce the same
//! audit trail.

pub mod election;
pub mod error;
pub mod model;
pub mod pairwise;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod ties;
pub mod transfer;
pub mod util;

pub use crate::election::{Election, ElectionState, RoundOutcome, Rule, Tiebreaks};
pub use crate::error::{ElectionError, Result};
pub use crate::model::{frac, whole, Ballot, Candidate, PreferenceProfile, Weight};
pub use crate::scoring::TieConvention;
pub use crate::util::TiebreakPolicy;
