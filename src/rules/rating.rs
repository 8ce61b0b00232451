use num_traits::Zero;

use crate::election::{ElectionState, RoundOutcome, Rule, Tiebreaks};
use crate::error::{ElectionError, Result};
use crate::model::{whole, PreferenceProfile, Weight};
use crate::scoring::{score_profile_from_ballot_scores, ScoreMap};
use crate::util::{elect_cands_from_set_ranking, remove_cand, TiebreakPolicy};

/// Rating family: voters score each candidate from 0 to a per-candidate
/// limit L, optionally under a total budget of k points per ballot; the m
/// highest aggregate scorers win.
///
/// `limited` fixes L = k <= m (each point goes to a distinct use), and
/// `cumulative` fixes k = m. Single-shot lifecycle, like `Positional`.
pub struct RatingElection {
    m: usize,
    per_candidate_limit: Weight,
    budget: Option<Weight>,
    tiebreak: Option<TiebreakPolicy>,
}

impl RatingElection {
    pub fn new(
        m: usize,
        per_candidate_limit: Weight,
        budget: Option<Weight>,
        tiebreak: Option<TiebreakPolicy>,
    ) -> Result<RatingElection> {
        if m == 0 {
            return Err(ElectionError::InvalidSeats("0 seats".to_string()));
        }
        if per_candidate_limit <= Weight::zero() {
            return Err(ElectionError::InvalidScoreVector(format!(
                "per-candidate limit {} must be positive",
                per_candidate_limit
            )));
        }
        if let Some(budget) = &budget {
            if budget <= &Weight::zero() {
                return Err(ElectionError::InvalidScoreVector(format!(
                    "budget {} must be positive",
                    budget
                )));
            }
            if &per_candidate_limit > budget {
                return Err(ElectionError::InvalidScoreVector(format!(
                    "per-candidate limit {} exceeds budget {}",
                    per_candidate_limit, budget
                )));
            }
        }
        Ok(RatingElection {
            m,
            per_candidate_limit,
            budget,
            tiebreak,
        })
    }

    /// Limited voting: a budget of k <= m points, at most one per candidate.
    pub fn limited(m: usize, k: Weight, tiebreak: Option<TiebreakPolicy>) -> Result<RatingElection> {
        if k > whole(m as u64) {
            return Err(ElectionError::InvalidScoreVector(format!(
                "budget {} exceeds the {} seats",
                k, m
            )));
        }
        RatingElection::new(m, k.clone(), Some(k), tiebreak)
    }

    /// Cumulative voting: a budget of exactly m points, freely divisible.
    pub fn cumulative(m: usize, tiebreak: Option<TiebreakPolicy>) -> Result<RatingElection> {
        RatingElection::new(m, whole(m as u64), Some(whole(m as u64)), tiebreak)
    }
}

impl Rule for RatingElection {
    fn initialize(&mut self, profile: &PreferenceProfile) -> Result<()> {
        if self.m > profile.candidates().len() {
            return Err(ElectionError::InvalidSeats(format!(
                "{} seats for {} candidates",
                self.m,
                profile.candidates().len()
            )));
        }
        for ballot in profile.ballots() {
            let scores = ballot.scores.as_ref().ok_or_else(|| {
                ElectionError::InvalidBallot("rating rules require score ballots".to_string())
            })?;
            for (candidate, score) in scores {
                if score < &Weight::zero() {
                    return Err(ElectionError::InvalidBallot(format!(
                        "negative score {} for {}",
                        score, candidate
                    )));
                }
                if score > &self.per_candidate_limit {
                    return Err(ElectionError::InvalidBallot(format!(
                        "score {} for {} exceeds the per-candidate limit {}",
                        score, candidate, self.per_candidate_limit
                    )));
                }
            }
            if let Some(budget) = &self.budget {
                let spent = scores
                    .values()
                    .fold(Weight::zero(), |sum, score| sum + score);
                if &spent > budget {
                    return Err(ElectionError::InvalidBallot(format!(
                        "ballot spends {} of a {} budget",
                        spent, budget
                    )));
                }
            }
        }
        Ok(())
    }

    fn step(&mut self, profile: &PreferenceProfile, prev: &ElectionState) -> Result<RoundOutcome> {
        let (elected, remaining, resolution) = elect_cands_from_set_ranking(
            &prev.remaining,
            self.m,
            profile,
            self.tiebreak.as_mut(),
        )?;

        let elected_set = elected.iter().flatten().cloned().collect();
        let new_profile = remove_cand(&elected_set, profile);
        let scores = score_profile_from_ballot_scores(&new_profile)?;

        let mut tiebreaks = Tiebreaks::new();
        if let Some((tied, ordered)) = resolution {
            tiebreaks.insert(tied, ordered);
        }

        Ok(RoundOutcome {
            elected,
            eliminated: Vec::new(),
            remaining,
            scores: Some(scores),
            tiebreaks,
            profile: new_profile,
        })
    }

    fn is_finished(&self, states: &[ElectionState]) -> bool {
        states.len() == 2
    }

    fn score_profile(&self, profile: &PreferenceProfile) -> Option<Result<ScoreMap>> {
        Some(score_profile_from_ballot_scores(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::Election;
    use crate::model::{frac, Ballot};

    #[test]
    fn highest_aggregate_scorers_win() {
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_scores(&[("a", whole(5)), ("b", whole(2))], whole(1)),
            Ballot::from_scores(&[("b", whole(4)), ("c", whole(1))], whole(2)),
        ]);
        let rule = RatingElection::new(2, whole(5), None, None).unwrap();
        let mut election = Election::new(profile, rule).unwrap();
        election.run_election().unwrap();
        // b = 2 + 8 = 10, a = 5, c = 2
        assert_eq!(election.winners(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn per_candidate_limit_is_enforced() {
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_scores(
            &[("a", whole(9))],
            whole(1),
        )]);
        let rule = RatingElection::new(1, whole(5), None, None).unwrap();
        assert!(matches!(
            Election::new(profile, rule),
            Err(ElectionError::InvalidBallot(_))
        ));
    }

    #[test]
    fn budget_is_enforced_across_candidates() {
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_scores(
            &[("a", whole(2)), ("b", whole(2))],
            whole(1),
        )]);
        let rule = RatingElection::cumulative(3, None).unwrap();
        assert!(matches!(
            Election::new(profile, rule),
            Err(ElectionError::InvalidBallot(_))
        ));
    }

    #[test]
    fn cumulative_allows_fractional_splits_within_budget() {
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_scores(&[("a", frac(3, 2)), ("b", frac(1, 2))], whole(1)),
            Ballot::from_scores(&[("b", whole(2))], whole(1)),
        ]);
        let rule = RatingElection::cumulative(2, None).unwrap();
        let mut election = Election::new(profile, rule).unwrap();
        election.run_election().unwrap();
        assert_eq!(election.winners(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn limited_budget_cannot_exceed_seats() {
        assert!(matches!(
            RatingElection::limited(2, whole(3), None),
            Err(ElectionError::InvalidScoreVector(_))
        ));
    }

    #[test]
    fn zero_seats_is_rejected() {
        assert!(matches!(
            RatingElection::new(0, whole(1), None, None),
            Err(ElectionError::InvalidSeats(_))
        ));
    }

    #[test]
    fn ranked_ballots_are_rejected() {
        let profile =
            PreferenceProfile::from_ballots(vec![Ballot::from_order(&["a", "b"], whole(1))]);
        let rule = RatingElection::new(1, whole(1), None, None).unwrap();
        assert!(matches!(
            Election::new(profile, rule),
            Err(ElectionError::InvalidBallot(_))
        ));
    }
}
