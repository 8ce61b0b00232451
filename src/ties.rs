//! Expansion of tied rank positions into permutation-weighted ballots.
//!
//! Runs once, at election construction, unless the caller keeps ties on
//! purpose. A tied position of k candidates on a ballot of weight w becomes
//! k! ballots of weight w/k!, one per permutation of the tied block; a
//! ballot with several tied positions is expanded position by position, so
//! total weight is conserved exactly.

use itertools::Itertools;
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::model::{Ballot, PreferenceProfile};

/// Replace every tied ballot in the profile with its full permutation
/// expansion. Untied ballots pass through unchanged.
pub fn resolve_input_ties(profile: &PreferenceProfile) -> PreferenceProfile {
    let mut resolved = Vec::with_capacity(profile.num_ballots());
    for ballot in profile.ballots() {
        if ballot.has_tie() {
            resolved.extend(expand_ballot(ballot.clone()));
        } else {
            resolved.push(ballot.clone());
        }
    }
    PreferenceProfile::from_parts(resolved, profile.candidates().to_vec())
}

/// Fully expand one ballot: resolve the first tied position, then feed the
/// partially resolved ballots back in until no ties remain.
fn expand_ballot(ballot: Ballot) -> Vec<Ballot> {
    match fix_first_tie(&ballot) {
        None => vec![ballot],
        Some(partial) => partial.into_iter().flat_map(expand_ballot).collect(),
    }
}

/// Resolve the first (highest) tied position into one ballot per
/// permutation of the tied block, each carrying weight w/k!. Returns None
/// for an untied ballot.
fn fix_first_tie(ballot: &Ballot) -> Option<Vec<Ballot>> {
    let ranking = ballot.ranking.as_ref()?;
    let (index, tied) = ranking
        .iter()
        .enumerate()
        .find(|(_, position)| position.len() > 1)?;

    let share = &ballot.weight / BigRational::from_integer(factorial(tied.len()));
    let mut permuted = Vec::new();
    for order in tied.iter().cloned().permutations(tied.len()) {
        let mut new_ranking = ranking[..index].to_vec();
        for candidate in order {
            let mut position = std::collections::BTreeSet::new();
            position.insert(candidate);
            new_ranking.push(position);
        }
        new_ranking.extend_from_slice(&ranking[index + 1..]);
        let mut resolved = ballot.clone();
        resolved.ranking = Some(new_ranking);
        resolved.weight = share.clone();
        permuted.push(resolved);
    }
    Some(permuted)
}

fn factorial(k: usize) -> BigInt {
    (1..=k as u64).fold(BigInt::from(1), |product, n| product * BigInt::from(n))
}
