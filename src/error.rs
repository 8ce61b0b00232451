use itertools::Itertools;
use thiserror::Error;

/// Errors raised while constructing or running an election.
///
/// Validation errors surface at construction time, before any round
/// executes. Tie errors surface mid-round when no tiebreak policy was
/// declared. The remaining variants guard state-machine invariants.
#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("Invalid score vector: {0}")]
    InvalidScoreVector(String),
    #[error("Invalid seat count: {0}")]
    InvalidSeats(String),
    #[error("Invalid quota: {0}")]
    InvalidQuota(String),
    #[error("Ballot validation failed: {0}")]
    InvalidBallot(String),
    #[error("Unresolved tie between candidates: {}", .0.iter().join(", "))]
    UnresolvedTie(Vec<String>),
    #[error("No scores recorded for round {0}")]
    MissingScores(usize),
    #[error("Election has already finished")]
    Finished,
    #[error("Round {0} exceeds the candidate-bounded round limit")]
    RoundOverflow(usize),
}

pub type Result<T> = std::result::Result<T, ElectionError>;
