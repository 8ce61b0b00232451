//! The round scheduler: drives a rule's `step` until its termination
//! predicate holds, collecting an append-only log of round snapshots.

mod state;

pub use state::{ElectionState, Tiebreaks};

use std::collections::BTreeSet;

use crate::error::{ElectionError, Result};
use crate::model::{Candidate, PreferenceProfile};
use crate::scoring::{score_map_to_ranking, ScoreMap};
use crate::ties::resolve_input_ties;

/// What a rule's step hands back to the scheduler: the round's decisions
/// plus the transformed profile the next round runs on.
#[derive(Debug)]
pub struct RoundOutcome {
    pub elected: Vec<BTreeSet<Candidate>>,
    pub eliminated: Vec<BTreeSet<Candidate>>,
    pub remaining: Vec<BTreeSet<Candidate>>,
    pub scores: Option<ScoreMap>,
    pub tiebreaks: Tiebreaks,
    pub profile: PreferenceProfile,
}

/// The two-method contract every electoral rule implements, plus hooks for
/// construction-time validation and per-round scoring.
pub trait Rule {
    /// Validate rule parameters against the (tie-resolved) profile and
    /// precompute whatever the rule needs. Called once, before round 0 is
    /// stored; any error aborts construction.
    fn initialize(&mut self, _profile: &PreferenceProfile) -> Result<()> {
        Ok(())
    }

    /// Advance one round: decide who is elected or eliminated and how the
    /// remaining ballot weight is redistributed.
    fn step(&mut self, profile: &PreferenceProfile, prev: &ElectionState) -> Result<RoundOutcome>;

    /// Termination predicate over the accumulated state log.
    fn is_finished(&self, states: &[ElectionState]) -> bool;

    /// The rule's score function, if it has one; drives the tier ordering
    /// of `remaining` in stored states, round 0 included.
    fn score_profile(&self, _profile: &PreferenceProfile) -> Option<Result<ScoreMap>> {
        None
    }
}

/// A single election run: owns the tie-resolved profile, the working
/// profile the current round operates on, and the append-only state log.
pub struct Election<R: Rule> {
    rule: R,
    profile: PreferenceProfile,
    working: PreferenceProfile,
    states: Vec<ElectionState>,
}

impl<R: Rule> Election<R> {
    /// Construct an election, expanding tied ballots into exact
    /// permutation-weighted ballots first.
    pub fn new(profile: PreferenceProfile, rule: R) -> Result<Election<R>> {
        Election::build(resolve_input_ties(&profile), rule)
    }

    /// Construct an election without tie resolution, for callers who
    /// pre-resolve or deliberately study tied ballots.
    pub fn keeping_ties(profile: PreferenceProfile, rule: R) -> Result<Election<R>> {
        Election::build(profile, rule)
    }

    fn build(profile: PreferenceProfile, mut rule: R) -> Result<Election<R>> {
        rule.initialize(&profile)?;
        let (remaining, scores) = match rule.score_profile(&profile) {
            Some(scored) => {
                let scores = scored?;
                (score_map_to_ranking(&scores), Some(scores))
            }
            None => {
                let universe: BTreeSet<Candidate> = profile.candidates().iter().cloned().collect();
                let remaining = if universe.is_empty() {
                    Vec::new()
                } else {
                    vec![universe]
                };
                (remaining, None)
            }
        };
        let initial = ElectionState::initial(remaining, scores);
        Ok(Election {
            rule,
            working: profile.clone(),
            profile,
            states: vec![initial],
        })
    }

    pub fn is_finished(&self) -> bool {
        self.rule.is_finished(&self.states)
    }

    /// Advance exactly one round. Stepping a finished election is an
    /// error so interactive use stays loud.
    pub fn run_step(&mut self) -> Result<&ElectionState> {
        if self.is_finished() {
            return Err(ElectionError::Finished);
        }
        // a round always elects or eliminates someone, so a correct rule
        // terminates within the candidate count
        if self.states.len() > self.profile.candidates().len() + 1 {
            return Err(ElectionError::RoundOverflow(self.states.len()));
        }
        // the log always holds at least the round-0 state
        let prev = self.states[self.states.len() - 1].clone();
        let outcome = self.rule.step(&self.working, &prev)?;
        let state = ElectionState {
            round_number: prev.round_number + 1,
            elected: outcome.elected,
            eliminated: outcome.eliminated,
            remaining: outcome.remaining,
            scores: outcome.scores,
            tiebreaks: outcome.tiebreaks,
        };
        self.working = outcome.profile;
        self.states.push(state);
        Ok(&self.states[self.states.len() - 1])
    }

    /// Drive the round loop to completion and return the final state.
    /// Idempotent: on an already-finished election this appends nothing
    /// and returns the existing final state.
    pub fn run_election(&mut self) -> Result<&ElectionState> {
        while !self.is_finished() {
            self.run_step()?;
        }
        Ok(&self.states[self.states.len() - 1])
    }

    /// The append-only state log, round 0 first.
    pub fn states(&self) -> &[ElectionState] {
        &self.states
    }

    pub fn state(&self, round: usize) -> Option<&ElectionState> {
        self.states.get(round)
    }

    /// The tie-resolved profile the election started from.
    pub fn profile(&self) -> &PreferenceProfile {
        &self.profile
    }

    /// The installed rule, for inspecting rule-specific values such as a
    /// quota threshold.
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Elected cohorts across all rounds, in election order.
    pub fn elected(&self) -> Vec<BTreeSet<Candidate>> {
        self.states
            .iter()
            .flat_map(|state| state.elected.iter().cloned())
            .collect()
    }

    /// Eliminated cohorts across all rounds, in elimination order.
    pub fn eliminated(&self) -> Vec<BTreeSet<Candidate>> {
        self.states
            .iter()
            .flat_map(|state| state.eliminated.iter().cloned())
            .collect()
    }

    /// The latest round's remaining cohorts.
    pub fn remaining(&self) -> &[BTreeSet<Candidate>] {
        match self.states.last() {
            Some(state) => &state.remaining,
            None => &[],
        }
    }

    /// Flattened winner list, ordered by round then tier; members of a
    /// tied cohort appear in name order.
    pub fn winners(&self) -> Vec<Candidate> {
        self.states
            .iter()
            .flat_map(|state| state.elected_candidates())
            .collect()
    }

    /// Scores recorded for a round; a state-consistency error if the rule
    /// has no score function or the round does not exist.
    pub fn scores(&self, round: usize) -> Result<&ScoreMap> {
        self.state(round)
            .and_then(|state| state.scores.as_ref())
            .ok_or(ElectionError::MissingScores(round))
    }

    /// Ties resolved in a round; empty if no tie occurred.
    pub fn tiebreaks(&self, round: usize) -> Option<&Tiebreaks> {
        self.state(round).map(|state| &state.tiebreaks)
    }
}
