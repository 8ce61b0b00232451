use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{whole, Candidate, Weight};

/// One voter's preferences with an exact rational weight.
///
/// A ballot carries either a ranking (an ordered sequence of rank positions,
/// each position a set of candidates; a set larger than one marks a tie at
/// that position) or a per-candidate score assignment. The two forms are
/// mutually exclusive per rule family: ranking rules reject score ballots
/// and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ballot {
    pub ranking: Option<Vec<BTreeSet<Candidate>>>,
    pub scores: Option<BTreeMap<Candidate, Weight>>,
    pub weight: Weight,
    pub voters: Option<BTreeSet<String>>,
}

impl Ballot {
    /// A ranked ballot from explicit rank-position sets.
    pub fn ranked(ranking: Vec<BTreeSet<Candidate>>, weight: Weight) -> Ballot {
        Ballot {
            ranking: Some(ranking),
            scores: None,
            weight,
            voters: None,
        }
    }

    /// A ranked ballot with one candidate per position and unit weight
    /// unless scaled; `order` runs from most to least preferred.
    pub fn from_order(order: &[&str], weight: Weight) -> Ballot {
        let ranking = order
            .iter()
            .map(|name| {
                let mut position = BTreeSet::new();
                position.insert((*name).to_string());
                position
            })
            .collect();
        Ballot::ranked(ranking, weight)
    }

    /// A ranked ballot from position slices, so ties can be written
    /// directly: `&[&["a", "b"], &["c"]]` ties a and b at the top.
    pub fn from_positions(positions: &[&[&str]], weight: Weight) -> Ballot {
        let ranking = positions
            .iter()
            .map(|position| position.iter().map(|name| (*name).to_string()).collect())
            .collect();
        Ballot::ranked(ranking, weight)
    }

    /// A score ballot assigning an exact rating to each listed candidate.
    pub fn scored(scores: BTreeMap<Candidate, Weight>, weight: Weight) -> Ballot {
        Ballot {
            ranking: None,
            scores: Some(scores),
            weight,
            voters: None,
        }
    }

    /// A score ballot from name/score pairs.
    pub fn from_scores(pairs: &[(&str, Weight)], weight: Weight) -> Ballot {
        let scores = pairs
            .iter()
            .map(|(name, score)| ((*name).to_string(), score.clone()))
            .collect();
        Ballot::scored(scores, weight)
    }

    /// Attach voter-id annotations.
    pub fn with_voters(mut self, voters: BTreeSet<String>) -> Ballot {
        self.voters = Some(voters);
        self
    }

    /// True if any rank position holds more than one candidate.
    pub fn has_tie(&self) -> bool {
        match &self.ranking {
            Some(ranking) => ranking.iter().any(|position| position.len() > 1),
            None => false,
        }
    }

    /// Every candidate this ballot mentions, ranked or scored.
    pub fn referenced_candidates(&self) -> BTreeSet<Candidate> {
        let mut referenced = BTreeSet::new();
        if let Some(ranking) = &self.ranking {
            for position in ranking {
                referenced.extend(position.iter().cloned());
            }
        }
        if let Some(scores) = &self.scores {
            referenced.extend(scores.keys().cloned());
        }
        referenced
    }
}

impl Default for Ballot {
    fn default() -> Ballot {
        Ballot {
            ranking: None,
            scores: None,
            weight: whole(1),
            voters: None,
        }
    }
}
