//! Shared helpers for rule implementations: candidate removal, grouping
//! ballots by first preference, and tiebreak resolution at decision
//! boundaries.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::{ElectionError, Result};
use crate::model::{Ballot, Candidate, PreferenceProfile};
use crate::scoring::{
    borda_vector, first_place_votes, score_map_to_ranking, score_profile_from_rankings, ScoreMap,
    TieConvention,
};

/// Strip the given candidates from every ballot. Emptied rank positions
/// collapse (later positions shift up); ballots left with no ranking and
/// no scores are dropped.
pub fn remove_cand_from_ballots(cands: &BTreeSet<Candidate>, ballots: &[Ballot]) -> Vec<Ballot> {
    let mut kept = Vec::with_capacity(ballots.len());
    for ballot in ballots {
        let mut ballot = ballot.clone();
        if let Some(ranking) = ballot.ranking.take() {
            let stripped: Vec<BTreeSet<Candidate>> = ranking
                .into_iter()
                .map(|position| {
                    position
                        .into_iter()
                        .filter(|candidate| !cands.contains(candidate))
                        .collect::<BTreeSet<Candidate>>()
                })
                .filter(|position| !position.is_empty())
                .collect();
            if !stripped.is_empty() {
                ballot.ranking = Some(stripped);
            }
        }
        if let Some(scores) = ballot.scores.take() {
            let stripped: BTreeMap<_, _> = scores
                .into_iter()
                .filter(|(candidate, _)| !cands.contains(candidate))
                .collect();
            if !stripped.is_empty() {
                ballot.scores = Some(stripped);
            }
        }
        if ballot.ranking.is_some() || ballot.scores.is_some() {
            kept.push(ballot);
        }
    }
    kept
}

/// Remove candidates from a profile: ballots are stripped and the
/// candidate universe shrinks accordingly.
pub fn remove_cand(cands: &BTreeSet<Candidate>, profile: &PreferenceProfile) -> PreferenceProfile {
    let ballots = remove_cand_from_ballots(cands, profile.ballots());
    let candidates = profile
        .candidates()
        .iter()
        .filter(|candidate| !cands.contains(*candidate))
        .cloned()
        .collect();
    PreferenceProfile::from_parts(ballots, candidates)
}

/// Group ballots by their first-ranked candidate. Requires untied first
/// positions (quota rules validate this up front).
pub fn ballots_by_first_cand(profile: &PreferenceProfile) -> BTreeMap<Candidate, Vec<Ballot>> {
    let mut groups: BTreeMap<Candidate, Vec<Ballot>> = profile
        .candidates()
        .iter()
        .map(|candidate| (candidate.clone(), Vec::new()))
        .collect();
    for ballot in profile.ballots() {
        let first = ballot
            .ranking
            .as_ref()
            .and_then(|ranking| ranking.first())
            .and_then(|position| position.iter().next());
        if let Some(first) = first {
            if let Some(group) = groups.get_mut(first) {
                group.push(ballot.clone());
            }
        }
    }
    groups
}

/// A declared policy for resolving an otherwise-undecidable tie.
///
/// `Random` shuffles with its own caller-seeded generator so runs stay
/// reproducible; `FirstPlace` and `Borda` rank the tied candidates by the
/// respective score on a reference profile.
#[derive(Debug, Clone)]
pub enum TiebreakPolicy {
    Random(ChaCha8Rng),
    FirstPlace,
    Borda,
}

/// Resolve a tied set into a strict ordering of singletons. Score-based
/// policies fail with `UnresolvedTie` if the reference profile cannot
/// separate the candidates.
pub fn tiebreak_set(
    policy: &mut TiebreakPolicy,
    tied: &BTreeSet<Candidate>,
    profile: &PreferenceProfile,
) -> Result<Vec<BTreeSet<Candidate>>> {
    match policy {
        TiebreakPolicy::Random(rng) => {
            let mut order: Vec<Candidate> = tied.iter().cloned().collect();
            order.shuffle(rng);
            Ok(order.into_iter().map(singleton).collect())
        }
        TiebreakPolicy::FirstPlace => {
            let scores = first_place_votes(profile, TieConvention::Average)?;
            rank_tied_by_scores(tied, &scores)
        }
        TiebreakPolicy::Borda => {
            let vector = borda_vector(profile.max_ballot_length());
            let scores = score_profile_from_rankings(profile, &vector, TieConvention::Low)?;
            rank_tied_by_scores(tied, &scores)
        }
    }
}

fn rank_tied_by_scores(
    tied: &BTreeSet<Candidate>,
    scores: &ScoreMap,
) -> Result<Vec<BTreeSet<Candidate>>> {
    let restricted: ScoreMap = scores
        .iter()
        .filter(|(candidate, _)| tied.contains(*candidate))
        .map(|(candidate, score)| (candidate.clone(), score.clone()))
        .collect();
    let ranking = score_map_to_ranking(&restricted);
    if let Some(cohort) = ranking.iter().find(|cohort| cohort.len() > 1) {
        return Err(ElectionError::UnresolvedTie(
            cohort.iter().cloned().collect(),
        ));
    }
    Ok(ranking)
}

fn singleton(candidate: Candidate) -> BTreeSet<Candidate> {
    let mut set = BTreeSet::new();
    set.insert(candidate);
    set
}

/// Split a tier ranking at the top-m cut line.
///
/// Returns the elected cohorts, the remaining cohorts, and the tiebreak
/// resolution applied if a cohort straddled the cut. Straddling without a
/// declared policy is an `UnresolvedTie` naming the tied candidates.
#[allow(clippy::type_complexity)]
pub fn elect_cands_from_set_ranking(
    ranking: &[BTreeSet<Candidate>],
    m: usize,
    profile: &PreferenceProfile,
    mut policy: Option<&mut TiebreakPolicy>,
) -> Result<(
    Vec<BTreeSet<Candidate>>,
    Vec<BTreeSet<Candidate>>,
    Option<(BTreeSet<Candidate>, Vec<BTreeSet<Candidate>>)>,
)> {
    let mut elected: Vec<BTreeSet<Candidate>> = Vec::new();
    let mut remaining: Vec<BTreeSet<Candidate>> = Vec::new();
    let mut resolution = None;
    let mut seats = 0usize;

    for cohort in ranking {
        if seats >= m {
            remaining.push(cohort.clone());
            continue;
        }
        if seats + cohort.len() <= m {
            seats += cohort.len();
            elected.push(cohort.clone());
            continue;
        }
        // cohort straddles the cut line
        let open = m - seats;
        let ordered = match policy.as_mut() {
            Some(policy) => tiebreak_set(policy, cohort, profile)?,
            None => {
                return Err(ElectionError::UnresolvedTie(
                    cohort.iter().cloned().collect(),
                ))
            }
        };
        resolution = Some((cohort.clone(), ordered.clone()));
        for (position, single) in ordered.into_iter().enumerate() {
            if position < open {
                elected.push(single);
            } else {
                remaining.push(single);
            }
        }
        seats = m;
    }

    Ok((elected, remaining, resolution))
}
