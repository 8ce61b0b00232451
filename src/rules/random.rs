use std::collections::BTreeSet;

use num_bigint::{BigInt, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::election::{ElectionState, RoundOutcome, Rule, Tiebreaks};
use crate::error::{ElectionError, Result};
use crate::model::{Candidate, PreferenceProfile, Weight};
use crate::scoring::{first_place_votes, TieConvention};
use crate::util::remove_cand;

/// Draw an index with probability exactly proportional to the rational
/// weights: everything is scaled to a common denominator and the draw is
/// a uniform integer below the scaled total, so no floating point enters
/// the lottery.
fn weighted_draw(rng: &mut ChaCha8Rng, weights: &[Weight]) -> Result<usize> {
    let mut denominator = BigInt::one();
    for weight in weights {
        denominator = denominator.lcm(weight.denom());
    }
    let scaled: Vec<BigInt> = weights
        .iter()
        .map(|weight| (weight * Weight::from_integer(denominator.clone())).to_integer())
        .collect();
    let total: BigInt = scaled.iter().fold(BigInt::zero(), |sum, w| sum + w);
    if total <= BigInt::zero() {
        return Err(ElectionError::InvalidBallot(
            "lottery requires positive total weight".to_string(),
        ));
    }
    let mut draw = rng.gen_bigint_range(&BigInt::zero(), &total);
    for (index, weight) in scaled.iter().enumerate() {
        if &draw < weight {
            return Ok(index);
        }
        draw -= weight;
    }
    Ok(weights.len() - 1)
}

fn lottery_outcome(
    winner_cohort: BTreeSet<Candidate>,
    profile: &PreferenceProfile,
) -> RoundOutcome {
    let new_profile = remove_cand(&winner_cohort, profile);
    let rest: BTreeSet<Candidate> = new_profile.candidates().iter().cloned().collect();
    let remaining = if rest.is_empty() { Vec::new() } else { vec![rest] };
    RoundOutcome {
        elected: vec![winner_cohort],
        eliminated: Vec::new(),
        remaining,
        scores: None,
        tiebreaks: Tiebreaks::new(),
        profile: new_profile,
    }
}

fn validate_ranked_nonempty(profile: &PreferenceProfile) -> Result<()> {
    if profile.num_ballots() == 0 {
        return Err(ElectionError::InvalidBallot(
            "lottery requires at least one ballot".to_string(),
        ));
    }
    for ballot in profile.ballots() {
        match &ballot.ranking {
            Some(ranking) if !ranking.is_empty() => {}
            _ => {
                return Err(ElectionError::InvalidBallot(
                    "lottery rules require ranked ballots".to_string(),
                ))
            }
        }
    }
    Ok(())
}

/// Random dictator: draw one ballot with probability proportional to its
/// weight; its top choice is the sole winner. Single round.
pub struct RandomDictator {
    rng: ChaCha8Rng,
}

impl RandomDictator {
    /// The generator is injected so a fixed seed reproduces the draw.
    pub fn new(rng: ChaCha8Rng) -> RandomDictator {
        RandomDictator { rng }
    }
}

impl Rule for RandomDictator {
    fn initialize(&mut self, profile: &PreferenceProfile) -> Result<()> {
        validate_ranked_nonempty(profile)
    }

    fn step(&mut self, profile: &PreferenceProfile, _prev: &ElectionState) -> Result<RoundOutcome> {
        let weights: Vec<Weight> = profile
            .ballots()
            .iter()
            .map(|ballot| ballot.weight.clone())
            .collect();
        let drawn = weighted_draw(&mut self.rng, &weights)?;
        let winner_cohort = profile.ballots()[drawn]
            .ranking
            .as_ref()
            .and_then(|ranking| ranking.first())
            .cloned()
            .ok_or_else(|| {
                ElectionError::InvalidBallot("drawn ballot has no ranking".to_string())
            })?;
        Ok(lottery_outcome(winner_cohort, profile))
    }

    fn is_finished(&self, states: &[ElectionState]) -> bool {
        states.len() == 2
    }
}

/// Boosted random dictator: with probability 1/2 run the plain lottery
/// over first-place weight, otherwise draw proportionally to the square
/// of first-place weight. The quadratic branch concentrates probability
/// on strong candidates and cuts lottery variance while keeping every
/// candidate's chance positive.
pub struct BoostedRandomDictator {
    rng: ChaCha8Rng,
}

impl BoostedRandomDictator {
    pub fn new(rng: ChaCha8Rng) -> BoostedRandomDictator {
        BoostedRandomDictator { rng }
    }
}

impl Rule for BoostedRandomDictator {
    fn initialize(&mut self, profile: &PreferenceProfile) -> Result<()> {
        validate_ranked_nonempty(profile)
    }

    fn step(&mut self, profile: &PreferenceProfile, _prev: &ElectionState) -> Result<RoundOutcome> {
        let first_place = first_place_votes(profile, TieConvention::Average)?;
        let candidates: Vec<Candidate> = first_place.keys().cloned().collect();
        let linear: Vec<Weight> = candidates
            .iter()
            .map(|candidate| first_place[candidate].clone())
            .collect();

        let weights = if self.rng.gen_bool(0.5) {
            linear
        } else {
            linear.iter().map(|weight| weight * weight).collect()
        };
        let drawn = weighted_draw(&mut self.rng, &weights)?;
        let mut winner_cohort = BTreeSet::new();
        winner_cohort.insert(candidates[drawn].clone());
        Ok(lottery_outcome(winner_cohort, profile))
    }

    fn is_finished(&self, states: &[ElectionState]) -> bool {
        states.len() == 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::Election;
    use crate::model::{frac, whole, Ballot};
    use rand::SeedableRng;

    #[test]
    fn weighted_draw_respects_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let weights = vec![Weight::zero(), whole(3), Weight::zero()];
        for _ in 0..50 {
            assert_eq!(weighted_draw(&mut rng, &weights).unwrap(), 1);
        }
    }

    #[test]
    fn weighted_draw_handles_fractional_weights_exactly() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let weights = vec![frac(1, 3), frac(2, 3)];
        let mut counts = [0u32; 2];
        for _ in 0..3000 {
            counts[weighted_draw(&mut rng, &weights).unwrap()] += 1;
        }
        // second entry should win about twice as often
        assert!(counts[1] > counts[0]);
    }

    #[test]
    fn dictator_elects_top_choice_of_drawn_ballot() {
        let profile = PreferenceProfile::from_ballots(vec![Ballot::from_order(
            &["a", "b"],
            whole(1),
        )]);
        let rule = RandomDictator::new(ChaCha8Rng::seed_from_u64(1));
        let mut election = Election::new(profile, rule).unwrap();
        let state = election.run_election().unwrap();
        assert_eq!(state.round_number, 1);
        assert_eq!(election.winners(), vec!["a".to_string()]);
    }

    #[test]
    fn empty_profile_is_rejected() {
        let profile = PreferenceProfile::from_ballots(vec![]);
        let rule = RandomDictator::new(ChaCha8Rng::seed_from_u64(1));
        assert!(matches!(
            Election::new(profile, rule),
            Err(ElectionError::InvalidBallot(_))
        ));
    }
}
