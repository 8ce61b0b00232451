//! Surplus-transfer strategies for quota-based rules.
//!
//! A strategy receives the ballots currently counting for an elected
//! candidate and returns the ballots to carry forward; the caller strips
//! elected candidates afterwards, so strategies only adjust weights or
//! select ballots.

use num_traits::{ToPrimitive, Zero};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::{ElectionError, Result};
use crate::model::{whole, Ballot, Weight};

pub trait TransferStrategy {
    /// Redistribute `ballots` (all counting for `winner`, whose current
    /// vote total is `votes`) given the election threshold.
    fn transfer(
        &mut self,
        winner: &str,
        votes: &Weight,
        ballots: &[Ballot],
        threshold: &Weight,
    ) -> Result<Vec<Ballot>>;
}

/// Deterministic fractional transfer: every transferring ballot keeps its
/// ranking and is rescaled by the exact surplus fraction
/// (votes - threshold) / votes.
#[derive(Debug, Clone, Default)]
pub struct FractionalTransfer;

impl TransferStrategy for FractionalTransfer {
    fn transfer(
        &mut self,
        _winner: &str,
        votes: &Weight,
        ballots: &[Ballot],
        threshold: &Weight,
    ) -> Result<Vec<Ballot>> {
        if votes <= &Weight::zero() {
            return Ok(Vec::new());
        }
        let fraction = (votes - threshold) / votes;
        Ok(ballots
            .iter()
            .map(|ballot| {
                let mut ballot = ballot.clone();
                ballot.weight = &ballot.weight * &fraction;
                ballot
            })
            .collect())
    }
}

/// Randomized transfer modeling indivisible ballots: decomposes the
/// winner's ballots into unit-weight ballots, shuffles them with the
/// injected generator, and moves exactly `surplus` units at full weight.
/// Every unit is equally likely to move, so the expected transferred
/// weight per continuation equals the fractional amount.
#[derive(Debug, Clone)]
pub struct RandomTransfer {
    rng: ChaCha8Rng,
}

impl RandomTransfer {
    pub fn new(rng: ChaCha8Rng) -> RandomTransfer {
        RandomTransfer { rng }
    }
}

impl TransferStrategy for RandomTransfer {
    fn transfer(
        &mut self,
        winner: &str,
        votes: &Weight,
        ballots: &[Ballot],
        threshold: &Weight,
    ) -> Result<Vec<Ballot>> {
        let surplus = votes - threshold;
        if !surplus.is_integer() {
            return Err(ElectionError::InvalidBallot(format!(
                "random transfer needs an integer surplus, got {} for {}",
                surplus, winner
            )));
        }
        let surplus = surplus
            .to_integer()
            .to_usize()
            .ok_or_else(|| {
                ElectionError::InvalidBallot(format!("surplus for {} is out of range", winner))
            })?;

        let mut units = Vec::new();
        for ballot in ballots {
            if !ballot.weight.is_integer() {
                return Err(ElectionError::InvalidBallot(format!(
                    "random transfer needs integer ballot weights, got {}",
                    ballot.weight
                )));
            }
            let count = ballot.weight.to_integer().to_usize().ok_or_else(|| {
                ElectionError::InvalidBallot(format!(
                    "ballot weight {} is out of range",
                    ballot.weight
                ))
            })?;
            for _ in 0..count {
                let mut unit = ballot.clone();
                unit.weight = whole(1);
                units.push(unit);
            }
        }

        units.shuffle(&mut self.rng);
        units.truncate(surplus.min(units.len()));
        Ok(units)
    }
}

/// No-surplus transfer: the winner's ballots carry forward at full weight
/// (the winner is removed by the caller). Used by the sequential
/// quota-rule variant, where reaching the threshold does not shrink the
/// transferring weight.
#[derive(Debug, Clone, Default)]
pub struct WholeBallotTransfer;

impl TransferStrategy for WholeBallotTransfer {
    fn transfer(
        &mut self,
        _winner: &str,
        _votes: &Weight,
        ballots: &[Ballot],
        _threshold: &Weight,
    ) -> Result<Vec<Ballot>> {
        Ok(ballots.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::frac;
    use num_traits::Zero;
    use rand::SeedableRng;

    #[test]
    fn fractional_transfer_scales_by_exact_surplus_fraction() {
        let ballots = vec![
            Ballot::from_order(&["a", "b"], whole(2)),
            Ballot::from_order(&["a", "c"], whole(1)),
        ];
        let mut strategy = FractionalTransfer;
        let out = strategy
            .transfer("a", &whole(3), &ballots, &whole(2))
            .unwrap();
        assert_eq!(out[0].weight, frac(2, 3));
        assert_eq!(out[1].weight, frac(1, 3));
        let total: Weight = out
            .iter()
            .fold(Weight::zero(), |sum, ballot| sum + &ballot.weight);
        assert_eq!(total, whole(1));
    }

    #[test]
    fn fractional_transfer_with_no_surplus_moves_nothing() {
        let ballots = vec![Ballot::from_order(&["a", "b"], whole(2))];
        let mut strategy = FractionalTransfer;
        let out = strategy
            .transfer("a", &whole(2), &ballots, &whole(2))
            .unwrap();
        assert!(out.iter().all(|ballot| ballot.weight == Weight::zero()));
    }

    #[test]
    fn random_transfer_moves_exactly_the_surplus_in_units() {
        let ballots = vec![
            Ballot::from_order(&["a", "c", "b"], whole(2)),
            Ballot::from_order(&["a", "b", "c"], whole(1)),
        ];
        let mut strategy = RandomTransfer::new(ChaCha8Rng::seed_from_u64(3));
        let out = strategy
            .transfer("a", &whole(3), &ballots, &whole(1))
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|ballot| ballot.weight == whole(1)));
    }

    #[test]
    fn random_transfer_rejects_fractional_weights() {
        let ballots = vec![Ballot::from_order(&["a", "b"], frac(3, 2))];
        let mut strategy = RandomTransfer::new(ChaCha8Rng::seed_from_u64(3));
        let result = strategy.transfer("a", &whole(3), &ballots, &whole(1));
        assert!(matches!(result, Err(ElectionError::InvalidBallot(_))));
    }

    #[test]
    fn whole_ballot_transfer_keeps_full_weight() {
        let ballots = vec![Ballot::from_order(&["a", "b"], whole(5))];
        let mut strategy = WholeBallotTransfer;
        let out = strategy
            .transfer("a", &whole(5), &ballots, &whole(2))
            .unwrap();
        assert_eq!(out, ballots);
    }
}
