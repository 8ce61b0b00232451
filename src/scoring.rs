//! Score functions mapping a profile to per-candidate scores: positional
//! scoring vectors, first-place votes, and aggregate ballot ratings.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{ElectionError, Result};
use crate::model::{whole, Candidate, PreferenceProfile, Weight};

/// How a tied block of candidates is awarded positional points.
///
/// For a block of k candidates occupying rank positions i..i+k: `High`
/// gives everyone the points of position i, `Low` the points of position
/// i+k-1, `Average` the mean across the block's positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieConvention {
    High,
    Low,
    Average,
}

/// Per-candidate exact scores for one round.
pub type ScoreMap = BTreeMap<Candidate, Weight>;

/// A score vector must be non-negative and non-increasing.
pub fn validate_score_vector(vector: &[Weight]) -> Result<()> {
    if vector.iter().any(|points| points < &Weight::zero()) {
        return Err(ElectionError::InvalidScoreVector(format!(
            "({}) contains a negative entry",
            vector.iter().join(", ")
        )));
    }
    if vector.windows(2).any(|pair| pair[0] < pair[1]) {
        return Err(ElectionError::InvalidScoreVector(format!(
            "({}) is not non-increasing",
            vector.iter().join(", ")
        )));
    }
    Ok(())
}

/// The conventional Borda vector (n, n-1, ..., 1).
pub fn borda_vector(length: usize) -> Vec<Weight> {
    (1..=length as u64).rev().map(whole).collect()
}

/// Points for rank position `index`, with short vectors padded by zeros.
fn points_at(vector: &[Weight], index: usize) -> Weight {
    vector.get(index).cloned().unwrap_or_else(Weight::zero)
}

/// Score a ranking profile with a positional vector. Candidates absent
/// from a ballot (or ranked beyond the vector) score zero on it; tied
/// blocks are awarded points per the convention; everything is scaled by
/// ballot weight. Fails on ballots without rankings.
pub fn score_profile_from_rankings(
    profile: &PreferenceProfile,
    vector: &[Weight],
    convention: TieConvention,
) -> Result<ScoreMap> {
    let mut scores: ScoreMap = profile
        .candidates()
        .iter()
        .map(|candidate| (candidate.clone(), Weight::zero()))
        .collect();

    for ballot in profile.ballots() {
        let ranking = ballot.ranking.as_ref().ok_or_else(|| {
            ElectionError::InvalidBallot("positional scoring requires ranked ballots".to_string())
        })?;
        let mut position = 0usize;
        for block in ranking {
            let size = block.len();
            let points = match convention {
                TieConvention::High => points_at(vector, position),
                TieConvention::Low => points_at(vector, position + size - 1),
                TieConvention::Average => {
                    let sum = (position..position + size)
                        .fold(Weight::zero(), |sum, index| sum + points_at(vector, index));
                    sum / whole(size as u64)
                }
            };
            for candidate in block {
                if let Some(score) = scores.get_mut(candidate) {
                    *score += &points * &ballot.weight;
                }
            }
            position += size;
        }
    }
    Ok(scores)
}

/// First-place votes: positional scoring with the vector (1, 0, ..., 0).
pub fn first_place_votes(
    profile: &PreferenceProfile,
    convention: TieConvention,
) -> Result<ScoreMap> {
    score_profile_from_rankings(profile, &[whole(1)], convention)
}

/// Aggregate declared ballot scores, scaled by ballot weight. Fails on
/// ballots without score assignments.
pub fn score_profile_from_ballot_scores(profile: &PreferenceProfile) -> Result<ScoreMap> {
    let mut totals: ScoreMap = profile
        .candidates()
        .iter()
        .map(|candidate| (candidate.clone(), Weight::zero()))
        .collect();

    for ballot in profile.ballots() {
        let scores = ballot.scores.as_ref().ok_or_else(|| {
            ElectionError::InvalidBallot("rating rules require score ballots".to_string())
        })?;
        for (candidate, score) in scores {
            if let Some(total) = totals.get_mut(candidate) {
                *total += score * &ballot.weight;
            }
        }
    }
    Ok(totals)
}

/// Order candidates by score, high to low, grouping equal scores into one
/// tied cohort.
pub fn score_map_to_ranking(scores: &ScoreMap) -> Vec<BTreeSet<Candidate>> {
    let mut by_score: Vec<(&Weight, &Candidate)> = scores
        .iter()
        .map(|(candidate, score)| (score, candidate))
        .collect();
    by_score.sort_by(|a, b| b.0.cmp(a.0).then_with(|| a.1.cmp(b.1)));

    let mut ranking: Vec<BTreeSet<Candidate>> = Vec::new();
    let mut current_score: Option<&Weight> = None;
    for (score, candidate) in by_score {
        if current_score == Some(score) {
            if let Some(cohort) = ranking.last_mut() {
                cohort.insert(candidate.clone());
            }
        } else {
            let mut cohort = BTreeSet::new();
            cohort.insert(candidate.clone());
            ranking.push(cohort);
            current_score = Some(score);
        }
    }
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{frac, Ballot};

    fn borda_profile() -> PreferenceProfile {
        PreferenceProfile::from_ballots(vec![
            Ballot::from_order(&["A", "B", "C"], whole(2)),
            Ballot::from_order(&["B", "A", "C"], whole(1)),
        ])
    }

    #[test]
    fn borda_example_scores() {
        let profile = borda_profile();
        let vector = borda_vector(3);
        let scores =
            score_profile_from_rankings(&profile, &vector, TieConvention::Low).unwrap();
        assert_eq!(scores["A"], whole(8));
        assert_eq!(scores["B"], whole(7));
        assert_eq!(scores["C"], whole(3));
    }

    #[test]
    fn scoring_is_deterministic() {
        let profile = borda_profile();
        let vector = borda_vector(3);
        let first =
            score_profile_from_rankings(&profile, &vector, TieConvention::Average).unwrap();
        let second =
            score_profile_from_rankings(&profile, &vector, TieConvention::Average).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tie_conventions_split_points() {
        // a and b tied at the top of a 3-candidate ballot, vector (3, 2, 1)
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_positions(
            &[&["a", "b"], &["c"]],
            whole(1),
        )]);
        let vector = borda_vector(3);

        let high = score_profile_from_rankings(&profile, &vector, TieConvention::High).unwrap();
        assert_eq!(high["a"], whole(3));
        assert_eq!(high["b"], whole(3));

        let low = score_profile_from_rankings(&profile, &vector, TieConvention::Low).unwrap();
        assert_eq!(low["a"], whole(2));
        assert_eq!(low["b"], whole(2));

        let average =
            score_profile_from_rankings(&profile, &vector, TieConvention::Average).unwrap();
        assert_eq!(average["a"], frac(5, 2));
        assert_eq!(average["b"], frac(5, 2));
        assert_eq!(average["c"], whole(1));
    }

    #[test]
    fn short_vectors_pad_with_zero() {
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_order(
            &["a", "b", "c"],
            whole(1),
        )]);
        let scores =
            score_profile_from_rankings(&profile, &[whole(1)], TieConvention::Low).unwrap();
        assert_eq!(scores["a"], whole(1));
        assert_eq!(scores["b"], Weight::zero());
        assert_eq!(scores["c"], Weight::zero());
    }

    #[test]
    fn tied_first_place_votes_follow_convention() {
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_positions(
            &[&["a", "b"], &["c"]],
            whole(1),
        )]);
        let average = first_place_votes(&profile, TieConvention::Average).unwrap();
        assert_eq!(average["a"], frac(1, 2));
        let high = first_place_votes(&profile, TieConvention::High).unwrap();
        assert_eq!(high["a"], whole(1));
        let low = first_place_votes(&profile, TieConvention::Low).unwrap();
        assert_eq!(low["a"], Weight::zero());
    }

    #[test]
    fn validate_rejects_bad_vectors() {
        assert!(validate_score_vector(&[whole(2), whole(1)]).is_ok());
        assert!(matches!(
            validate_score_vector(&[whole(1), whole(2)]),
            Err(ElectionError::InvalidScoreVector(_))
        ));
        assert!(matches!(
            validate_score_vector(&[frac(-1, 2), frac(-1, 2)]),
            Err(ElectionError::InvalidScoreVector(_))
        ));
    }

    #[test]
    fn ballot_scores_aggregate_by_weight() {
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_scores(&[("a", whole(2)), ("b", whole(1))], whole(2)),
            Ballot::from_scores(&[("b", whole(3))], whole(1)),
        ]);
        let totals = score_profile_from_ballot_scores(&profile).unwrap();
        assert_eq!(totals["a"], whole(4));
        assert_eq!(totals["b"], whole(5));
    }

    #[test]
    fn ranking_groups_equal_scores() {
        let mut scores = ScoreMap::new();
        scores.insert("a".to_string(), whole(3));
        scores.insert("b".to_string(), whole(3));
        scores.insert("c".to_string(), whole(1));
        let ranking = score_map_to_ranking(&scores);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].len(), 2);
        assert!(ranking[1].contains("c"));
    }
}
