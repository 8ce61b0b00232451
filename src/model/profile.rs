use std::collections::{BTreeMap, BTreeSet};

use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::{Ballot, Candidate, Weight};
use crate::error::{ElectionError, Result};

/// An unordered multiset of weighted ballots plus the declared candidate
/// universe. Profiles are immutable values: every transformation (tie
/// resolution, candidate removal, transfers) builds a new profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    ballots: Vec<Ballot>,
    candidates: Vec<Candidate>,
}

impl PreferenceProfile {
    /// Build a profile with a declared candidate universe. Fails if a ballot
    /// references a candidate outside the universe or carries a negative
    /// weight.
    pub fn new(ballots: Vec<Ballot>, candidates: Vec<Candidate>) -> Result<PreferenceProfile> {
        let universe: BTreeSet<Candidate> = candidates.iter().cloned().collect();
        for ballot in &ballots {
            if ballot.weight < Weight::zero() {
                return Err(ElectionError::InvalidBallot(format!(
                    "negative weight {}",
                    ballot.weight
                )));
            }
            for candidate in ballot.referenced_candidates() {
                if !universe.contains(&candidate) {
                    return Err(ElectionError::InvalidBallot(format!(
                        "candidate {} is not in the declared universe",
                        candidate
                    )));
                }
            }
        }
        let mut candidates: Vec<Candidate> = universe.into_iter().collect();
        candidates.sort();
        Ok(PreferenceProfile { ballots, candidates })
    }

    /// Build a profile inferring the universe as the union of all
    /// candidates referenced by the ballots.
    pub fn from_ballots(ballots: Vec<Ballot>) -> PreferenceProfile {
        let mut universe = BTreeSet::new();
        for ballot in &ballots {
            universe.extend(ballot.referenced_candidates());
        }
        PreferenceProfile {
            ballots,
            candidates: universe.into_iter().collect(),
        }
    }

    /// Internal constructor for profiles derived from an already-validated
    /// one; skips universe checks.
    pub(crate) fn from_parts(ballots: Vec<Ballot>, candidates: Vec<Candidate>) -> PreferenceProfile {
        PreferenceProfile { ballots, candidates }
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn num_ballots(&self) -> usize {
        self.ballots.len()
    }

    /// Exact sum of all ballot weights.
    pub fn total_ballot_weight(&self) -> Weight {
        self.ballots
            .iter()
            .fold(Weight::zero(), |total, ballot| total + &ballot.weight)
    }

    /// Number of rank positions on the longest ballot.
    pub fn max_ballot_length(&self) -> usize {
        self.ballots
            .iter()
            .filter_map(|ballot| ballot.ranking.as_ref().map(|ranking| ranking.len()))
            .max()
            .unwrap_or(0)
    }

    /// Merge ballots with identical rankings and scores, summing weights
    /// and unioning voter annotations.
    pub fn condense(&self) -> PreferenceProfile {
        type Key = (
            Option<Vec<BTreeSet<Candidate>>>,
            Option<BTreeMap<Candidate, Weight>>,
        );
        let mut merged: BTreeMap<Key, (Weight, Option<BTreeSet<String>>)> = BTreeMap::new();
        for ballot in &self.ballots {
            let key = (ballot.ranking.clone(), ballot.scores.clone());
            let entry = merged
                .entry(key)
                .or_insert_with(|| (Weight::zero(), None));
            entry.0 += &ballot.weight;
            if let Some(voters) = &ballot.voters {
                entry
                    .1
                    .get_or_insert_with(BTreeSet::new)
                    .extend(voters.iter().cloned());
            }
        }
        let ballots = merged
            .into_iter()
            .map(|((ranking, scores), (weight, voters))| Ballot {
                ranking,
                scores,
                weight,
                voters,
            })
            .collect();
        PreferenceProfile {
            ballots,
            candidates: self.candidates.clone(),
        }
    }
}
