use crate::election::{ElectionState, RoundOutcome, Rule, Tiebreaks};
use crate::error::{ElectionError, Result};
use crate::model::{PreferenceProfile, Weight};
use crate::scoring::{
    borda_vector, score_profile_from_rankings, validate_score_vector, ScoreMap, TieConvention,
};
use crate::util::{elect_cands_from_set_ranking, remove_cand, TiebreakPolicy};

/// Positional scoring rule: a fixed non-increasing score vector awards
/// points by rank position and the top m aggregate scorers win. Borda is
/// the special case with vector (n, n-1, ..., 1).
///
/// Single-shot: round 0 holds the scored standing, round 1 the outcome.
pub struct Positional {
    m: usize,
    vector: Option<Vec<Weight>>,
    convention: TieConvention,
    tiebreak: Option<TiebreakPolicy>,
}

impl Positional {
    /// A positional rule with an explicit score vector. The vector is
    /// validated immediately; a malformed vector never reaches round 0.
    pub fn new(
        m: usize,
        vector: Vec<Weight>,
        convention: TieConvention,
        tiebreak: Option<TiebreakPolicy>,
    ) -> Result<Positional> {
        validate_score_vector(&vector)?;
        Ok(Positional {
            m,
            vector: Some(vector),
            convention,
            tiebreak,
        })
    }

    /// Borda: the conventional vector, sized to the profile's longest
    /// ballot at initialization.
    pub fn borda(
        m: usize,
        convention: TieConvention,
        tiebreak: Option<TiebreakPolicy>,
    ) -> Positional {
        Positional {
            m,
            vector: None,
            convention,
            tiebreak,
        }
    }

    fn resolved_vector(&self, profile: &PreferenceProfile) -> Vec<Weight> {
        match &self.vector {
            Some(vector) => vector.clone(),
            None => borda_vector(profile.max_ballot_length()),
        }
    }
}

impl Rule for Positional {
    fn initialize(&mut self, profile: &PreferenceProfile) -> Result<()> {
        if self.m == 0 || self.m > profile.candidates().len() {
            return Err(ElectionError::InvalidSeats(format!(
                "{} seats for {} candidates",
                self.m,
                profile.candidates().len()
            )));
        }
        if self.vector.is_none() {
            self.vector = Some(borda_vector(profile.max_ballot_length()));
        }
        for ballot in profile.ballots() {
            if ballot.ranking.is_none() {
                return Err(ElectionError::InvalidBallot(
                    "positional rules require ranked ballots".to_string(),
                ));
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
        let scores = score_profile_from_rankings(
            &new_profile,
            &self.resolved_vector(&new_profile),
            self.convention,
        )?;

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
        Some(score_profile_from_rankings(
            profile,
            &self.resolved_vector(profile),
            self.convention,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::Election;
    use crate::model::{whole, Ballot};

    fn borda_profile() -> PreferenceProfile {
        PreferenceProfile::from_ballots(vec![
            Ballot::from_order(&["A", "B", "C"], whole(2)),
            Ballot::from_order(&["B", "A", "C"], whole(1)),
        ])
    }

    #[test]
    fn borda_elects_highest_scorer() {
        let rule = Positional::borda(1, TieConvention::Low, None);
        let mut election = Election::new(borda_profile(), rule).unwrap();
        let state = election.run_election().unwrap();
        assert_eq!(state.round_number, 1);
        assert_eq!(election.winners(), vec!["A".to_string()]);

        let initial = election.scores(0).unwrap();
        assert_eq!(initial["A"], whole(8));
        assert_eq!(initial["B"], whole(7));
        assert_eq!(initial["C"], whole(3));
    }

    #[test]
    fn explicit_vector_must_be_well_formed() {
        let result = Positional::new(
            1,
            vec![whole(1), whole(2)],
            TieConvention::Low,
            None,
        );
        assert!(matches!(result, Err(ElectionError::InvalidScoreVector(_))));
    }

    #[test]
    fn seat_count_is_validated_against_candidates() {
        let rule = Positional::borda(4, TieConvention::Low, None);
        let result = Election::new(borda_profile(), rule);
        assert!(matches!(result, Err(ElectionError::InvalidSeats(_))));
    }

    #[test]
    fn cut_line_tie_without_policy_fails() {
        // A and B symmetric: both score 3 with vector (2, 1)
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_order(&["A", "B"], whole(1)),
            Ballot::from_order(&["B", "A"], whole(1)),
        ]);
        let rule = Positional::borda(1, TieConvention::Low, None);
        let mut election = Election::new(profile, rule).unwrap();
        let result = election.run_election();
        assert!(matches!(result, Err(ElectionError::UnresolvedTie(_))));
    }

    #[test]
    fn score_ballots_are_rejected_at_construction() {
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_scores(
            &[("A", whole(1))],
            whole(1),
        )]);
        let rule = Positional::borda(1, TieConvention::Low, None);
        assert!(matches!(
            Election::new(profile, rule),
            Err(ElectionError::InvalidBallot(_))
        ));
    }
}
