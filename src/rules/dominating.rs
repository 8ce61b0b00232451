use crate::election::{ElectionState, RoundOutcome, Rule, Tiebreaks};
use crate::error::{ElectionError, Result};
use crate::model::PreferenceProfile;
use crate::pairwise::PairwiseComparisonGraph;
use crate::util::remove_cand;

/// The Smith method: compute the dominating tiers of the head-to-head
/// relation and elect the entire top tier in one round. The number of
/// winners is emergent, not caller-specified; a top tier of size one is
/// the Condorcet winner.
#[derive(Debug, Clone, Default)]
pub struct DominatingSets;

impl Rule for DominatingSets {
    fn initialize(&mut self, profile: &PreferenceProfile) -> Result<()> {
        for ballot in profile.ballots() {
            if ballot.ranking.is_none() {
                return Err(ElectionError::InvalidBallot(
                    "pairwise rules require ranked ballots".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn step(&mut self, profile: &PreferenceProfile, _prev: &ElectionState) -> Result<RoundOutcome> {
        let graph = PairwiseComparisonGraph::new(profile);
        let mut tiers = graph.dominating_tiers();
        if tiers.is_empty() {
            return Err(ElectionError::InvalidBallot(
                "no candidates to compare".to_string(),
            ));
        }
        let top = tiers.remove(0);
        let new_profile = remove_cand(&top, profile);

        Ok(RoundOutcome {
            elected: vec![top],
            eliminated: Vec::new(),
            remaining: tiers,
            scores: None,
            tiebreaks: Tiebreaks::new(),
            profile: new_profile,
        })
    }

    fn is_finished(&self, states: &[ElectionState]) -> bool {
        states.len() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::Election;
    use crate::model::{whole, Ballot};

    #[test]
    fn condorcet_winner_is_elected_alone() {
        // a beats b, b beats c, a beats c
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_order(&["a", "b", "c"], whole(2)),
            Ballot::from_order(&["b", "c", "a"], whole(1)),
        ]);
        let mut election = Election::new(profile, DominatingSets).unwrap();
        let state = election.run_election().unwrap().clone();
        assert_eq!(state.round_number, 1);
        assert_eq!(election.winners(), vec!["a".to_string()]);
        assert_eq!(state.remaining.len(), 2);
    }

    #[test]
    fn full_cycle_elects_every_member_of_the_top_tier() {
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_order(&["a", "b", "c"], whole(1)),
            Ballot::from_order(&["b", "c", "a"], whole(1)),
            Ballot::from_order(&["c", "a", "b"], whole(1)),
        ]);
        let mut election = Election::new(profile, DominatingSets).unwrap();
        let state = election.run_election().unwrap();
        assert_eq!(state.elected.len(), 1);
        assert_eq!(state.elected[0].len(), 3);
        assert!(state.remaining.is_empty());
    }

    #[test]
    fn tied_input_ballots_are_resolved_before_comparison() {
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_positions(&[&["a", "b"], &["c"]], whole(2)),
            Ballot::from_order(&["a", "c", "b"], whole(1)),
        ]);
        let mut election = Election::new(profile, DominatingSets).unwrap();
        election.run_election().unwrap();
        // the permutation split leaves a ahead of b overall
        assert_eq!(election.winners(), vec!["a".to_string()]);
    }
}
