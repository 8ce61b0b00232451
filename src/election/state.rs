use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::Candidate;
use crate::scoring::ScoreMap;

/// Record of the ties resolved in a round: tied set -> the strict ordering
/// the declared policy produced.
pub type Tiebreaks = BTreeMap<BTreeSet<Candidate>, Vec<BTreeSet<Candidate>>>;

/// Immutable snapshot of one completed round.
///
/// `elected` and `remaining` are ordered sequences of cohorts; a cohort
/// larger than one records candidates elected (or standing) as an exact
/// tie. Snapshots are appended to the election's state log and never
/// mutated afterwards, so the path to an outcome stays auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionState {
    pub round_number: usize,
    pub elected: Vec<BTreeSet<Candidate>>,
    pub eliminated: Vec<BTreeSet<Candidate>>,
    pub remaining: Vec<BTreeSet<Candidate>>,
    pub scores: Option<ScoreMap>,
    pub tiebreaks: Tiebreaks,
}

impl ElectionState {
    /// The round-0 snapshot: nobody elected or eliminated yet.
    pub fn initial(remaining: Vec<BTreeSet<Candidate>>, scores: Option<ScoreMap>) -> ElectionState {
        ElectionState {
            round_number: 0,
            elected: Vec::new(),
            eliminated: Vec::new(),
            remaining,
            scores,
            tiebreaks: Tiebreaks::new(),
        }
    }

    /// All candidates elected in this round, flattened in cohort order.
    pub fn elected_candidates(&self) -> Vec<Candidate> {
        self.elected
            .iter()
            .flat_map(|cohort| cohort.iter().cloned())
            .collect()
    }
}
