use std::collections::BTreeSet;
use std::fmt;

use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::election::{ElectionState, RoundOutcome, Rule, Tiebreaks};
use crate::error::{ElectionError, Result};
use crate::model::{whole, Ballot, Candidate, PreferenceProfile, Weight};
use crate::scoring::{first_place_votes, score_map_to_ranking, ScoreMap, TieConvention};
use crate::transfer::{FractionalTransfer, TransferStrategy, WholeBallotTransfer};
use crate::util::{ballots_by_first_cand, remove_cand, tiebreak_set, TiebreakPolicy};

/// Quota formula for the transferable-vote family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quota {
    /// floor(total / (seats + 1)) + 1
    Droop,
    /// floor(total / seats)
    Hare,
}

impl Quota {
    pub fn threshold(&self, total_ballot_weight: &Weight, seats: usize) -> Result<Weight> {
        if seats == 0 {
            return Err(ElectionError::InvalidSeats("0 seats".to_string()));
        }
        match self {
            Quota::Droop => {
                let divisor = whole(seats as u64 + 1);
                Ok((total_ballot_weight / divisor).floor() + Weight::one())
            }
            Quota::Hare => {
                let divisor = whole(seats as u64);
                Ok((total_ballot_weight / divisor).floor())
            }
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Droop => write!(f, "droop"),
            Quota::Hare => write!(f, "hare"),
        }
    }
}

/// Single transferable vote: each round elects every candidate whose
/// first-place total meets the quota, redistributing surplus weight
/// through the installed transfer strategy; when nobody meets it, the
/// weakest candidate is eliminated and their ballots carry forward whole.
///
/// All ballots must be ranked and untied. Per-round scores are first-place
/// votes, so each state's `remaining` is tiered by current standing.
pub struct Stv {
    m: usize,
    quota: Quota,
    transfer: Box<dyn TransferStrategy>,
    simultaneous: bool,
    tiebreak: Option<TiebreakPolicy>,
    threshold: Weight,
    reference: Option<PreferenceProfile>,
    seats_filled: usize,
}

impl Stv {
    pub fn new(
        m: usize,
        quota: Quota,
        transfer: Box<dyn TransferStrategy>,
        simultaneous: bool,
        tiebreak: Option<TiebreakPolicy>,
    ) -> Result<Stv> {
        if m == 0 {
            return Err(ElectionError::InvalidSeats("0 seats".to_string()));
        }
        Ok(Stv {
            m,
            quota,
            transfer,
            simultaneous,
            tiebreak,
            threshold: Weight::one(),
            reference: None,
            seats_filled: 0,
        })
    }

    /// Instant-runoff voting: one seat, Droop quota, fractional transfer.
    pub fn irv(tiebreak: Option<TiebreakPolicy>) -> Stv {
        Stv {
            m: 1,
            quota: Quota::Droop,
            transfer: Box::new(FractionalTransfer),
            simultaneous: true,
            tiebreak,
            threshold: Weight::one(),
            reference: None,
            seats_filled: 0,
        }
    }

    /// Sequential variant: winners keep no surplus, their ballots carry
    /// forward at full weight.
    pub fn sequential(
        m: usize,
        quota: Quota,
        tiebreak: Option<TiebreakPolicy>,
    ) -> Result<Stv> {
        Stv::new(m, quota, Box::new(WholeBallotTransfer), true, tiebreak)
    }

    /// The quota threshold fixed from the round-0 profile.
    pub fn threshold(&self) -> &Weight {
        &self.threshold
    }

    fn reference(&self) -> &PreferenceProfile {
        // set in initialize, which runs before any step
        self.reference
            .as_ref()
            .expect("rule stepped before initialization")
    }

    /// Tiers (in first-place order) whose score meets the threshold.
    fn above_threshold(
        &self,
        remaining: &[BTreeSet<Candidate>],
        scores: &ScoreMap,
    ) -> Vec<BTreeSet<Candidate>> {
        let mut elected = Vec::new();
        for cohort in remaining {
            let meets = cohort
                .iter()
                .next()
                .and_then(|candidate| scores.get(candidate))
                .map(|score| score >= &self.threshold)
                .unwrap_or(false);
            if meets {
                elected.push(cohort.clone());
            } else {
                // remaining is ordered by score, nothing below can qualify
                break;
            }
        }
        elected
    }

    /// Elect the given cohorts: surplus-transfer their ballots, pass every
    /// other ballot through, and strip the winners from the result.
    fn elect_and_transfer(
        &mut self,
        elected: &[BTreeSet<Candidate>],
        profile: &PreferenceProfile,
        scores: &ScoreMap,
    ) -> Result<PreferenceProfile> {
        let winners: BTreeSet<Candidate> = elected.iter().flatten().cloned().collect();
        let by_first = ballots_by_first_cand(profile);

        let mut ballots: Vec<Ballot> = Vec::with_capacity(profile.num_ballots());
        for (candidate, held) in &by_first {
            if winners.contains(candidate) {
                let votes = scores
                    .get(candidate)
                    .cloned()
                    .ok_or_else(|| ElectionError::MissingScores(0))?;
                let transferred =
                    self.transfer
                        .transfer(candidate, &votes, held, &self.threshold)?;
                ballots.extend(transferred);
            } else {
                ballots.extend(held.iter().cloned());
            }
        }

        let stripped = PreferenceProfile::from_parts(ballots, profile.candidates().to_vec());
        Ok(remove_cand(&winners, &stripped))
    }

    /// Pick the candidate to eliminate from the lowest tier, breaking a
    /// tied tier by first-place votes on the round-0 profile, falling back
    /// to the declared policy if the reference cannot separate them.
    fn choose_elimination(
        &mut self,
        lowest: &BTreeSet<Candidate>,
    ) -> Result<(Candidate, Option<Vec<BTreeSet<Candidate>>>)> {
        if lowest.len() == 1 {
            let candidate = lowest.iter().next().cloned().ok_or_else(|| {
                ElectionError::UnresolvedTie(Vec::new())
            })?;
            return Ok((candidate, None));
        }
        let reference = self.reference().clone();
        let ordered = match tiebreak_set(&mut TiebreakPolicy::FirstPlace, lowest, &reference) {
            Ok(ordered) => ordered,
            Err(ElectionError::UnresolvedTie(_)) => match self.tiebreak.as_mut() {
                Some(policy) => tiebreak_set(policy, lowest, &reference)?,
                None => {
                    return Err(ElectionError::UnresolvedTie(
                        lowest.iter().cloned().collect(),
                    ))
                }
            },
            Err(error) => return Err(error),
        };
        let eliminated = ordered
            .last()
            .and_then(|cohort| cohort.iter().next())
            .cloned()
            .ok_or_else(|| ElectionError::UnresolvedTie(lowest.iter().cloned().collect()))?;
        Ok((eliminated, Some(ordered)))
    }
}

impl Rule for Stv {
    fn initialize(&mut self, profile: &PreferenceProfile) -> Result<()> {
        if self.m > profile.candidates().len() {
            return Err(ElectionError::InvalidSeats(format!(
                "{} seats for {} candidates",
                self.m,
                profile.candidates().len()
            )));
        }
        for ballot in profile.ballots() {
            match &ballot.ranking {
                None => {
                    return Err(ElectionError::InvalidBallot(
                        "quota rules require ranked ballots".to_string(),
                    ))
                }
                Some(ranking) if ranking.is_empty() => {
                    return Err(ElectionError::InvalidBallot(
                        "quota rules require non-empty rankings".to_string(),
                    ))
                }
                Some(_) if ballot.has_tie() => {
                    return Err(ElectionError::InvalidBallot(
                        "quota rules require untied rankings; resolve ties first".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }
        self.threshold = self
            .quota
            .threshold(&profile.total_ballot_weight(), self.m)?;
        self.reference = Some(profile.clone());
        self.seats_filled = 0;
        Ok(())
    }

    fn step(&mut self, profile: &PreferenceProfile, prev: &ElectionState) -> Result<RoundOutcome> {
        let prev_scores = prev
            .scores
            .as_ref()
            .ok_or(ElectionError::MissingScores(prev.round_number))?;

        let mut tiebreaks = Tiebreaks::new();
        let (elected, eliminated, new_profile) = {
            let above = self.above_threshold(&prev.remaining, prev_scores);
            if !above.is_empty() {
                let elected = if self.simultaneous {
                    above
                } else {
                    // one-by-one: only the strongest qualifier this round
                    let top = above[0].clone();
                    if top.len() > 1 {
                        let reference = self.reference().clone();
                        let ordered = match self.tiebreak.as_mut() {
                            Some(policy) => tiebreak_set(policy, &top, &reference)?,
                            None => {
                                return Err(ElectionError::UnresolvedTie(
                                    top.iter().cloned().collect(),
                                ))
                            }
                        };
                        tiebreaks.insert(top, ordered.clone());
                        vec![ordered[0].clone()]
                    } else {
                        vec![top]
                    }
                };
                let new_profile = self.elect_and_transfer(&elected, profile, prev_scores)?;
                (elected, Vec::new(), new_profile)
            } else if profile.candidates().len() == self.m - self.seats_filled {
                // nobody can reach quota anymore: elect all remaining
                let elected = prev.remaining.clone();
                let empty = PreferenceProfile::from_parts(Vec::new(), Vec::new());
                (elected, Vec::new(), empty)
            } else {
                let lowest = prev
                    .remaining
                    .last()
                    .cloned()
                    .ok_or(ElectionError::MissingScores(prev.round_number))?;
                let (candidate, resolution) = self.choose_elimination(&lowest)?;
                if let Some(ordered) = resolution {
                    tiebreaks.insert(lowest.clone(), ordered);
                }
                let mut removed = BTreeSet::new();
                removed.insert(candidate.clone());
                let new_profile = remove_cand(&removed, profile);
                (Vec::new(), vec![removed], new_profile)
            }
        };

        self.seats_filled += elected.iter().map(|cohort| cohort.len()).sum::<usize>();

        let scores = first_place_votes(&new_profile, TieConvention::Average)?;
        let remaining = score_map_to_ranking(&scores);

        Ok(RoundOutcome {
            elected,
            eliminated,
            remaining,
            scores: Some(scores),
            tiebreaks,
            profile: new_profile,
        })
    }

    fn is_finished(&self, _states: &[ElectionState]) -> bool {
        self.seats_filled >= self.m
    }

    fn score_profile(&self, profile: &PreferenceProfile) -> Option<Result<ScoreMap>> {
        Some(first_place_votes(profile, TieConvention::Average))
    }
}
