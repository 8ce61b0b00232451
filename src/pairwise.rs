//! Weighted head-to-head comparison graph and dominating-tier (Smith set)
//! decomposition.

use std::collections::{BTreeMap, BTreeSet};

use num_traits::Zero;

use crate::model::{Candidate, PreferenceProfile, Weight};

/// Outcome of one head-to-head comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// The first candidate is ranked above the second on more ballot weight.
    First,
    /// The second candidate is ranked above the first on more ballot weight.
    Second,
    Tie,
}

/// The pairwise dominance relation over a profile's candidates.
///
/// For each ordered pair (a, b), `support` holds the total weight of
/// ballots ranking a strictly above b. A candidate missing from a ballot
/// ranks below every candidate the ballot ranks; candidates tied at a
/// position contribute no support either way.
#[derive(Debug, Clone)]
pub struct PairwiseComparisonGraph {
    candidates: Vec<Candidate>,
    support: BTreeMap<(Candidate, Candidate), Weight>,
}

impl PairwiseComparisonGraph {
    pub fn new(profile: &PreferenceProfile) -> PairwiseComparisonGraph {
        let candidates: Vec<Candidate> = profile.candidates().to_vec();
        let mut support: BTreeMap<(Candidate, Candidate), Weight> = BTreeMap::new();

        for ballot in profile.ballots() {
            let ranking = match &ballot.ranking {
                Some(ranking) => ranking,
                None => continue,
            };
            // rank position per candidate; unranked candidates sit below all
            let mut position: BTreeMap<&Candidate, usize> = BTreeMap::new();
            for (index, block) in ranking.iter().enumerate() {
                for candidate in block {
                    position.entry(candidate).or_insert(index);
                }
            }
            for (i, a) in candidates.iter().enumerate() {
                for b in candidates.iter().skip(i + 1) {
                    let pos_a = position.get(a).copied().unwrap_or(usize::MAX);
                    let pos_b = position.get(b).copied().unwrap_or(usize::MAX);
                    if pos_a < pos_b {
                        *support
                            .entry((a.clone(), b.clone()))
                            .or_insert_with(Weight::zero) += &ballot.weight;
                    } else if pos_b < pos_a {
                        *support
                            .entry((b.clone(), a.clone()))
                            .or_insert_with(Weight::zero) += &ballot.weight;
                    }
                }
            }
        }

        PairwiseComparisonGraph {
            candidates,
            support,
        }
    }

    /// Weight of ballots ranking `a` strictly above `b`.
    pub fn support(&self, a: &str, b: &str) -> Weight {
        self.support
            .get(&(a.to_string(), b.to_string()))
            .cloned()
            .unwrap_or_else(Weight::zero)
    }

    pub fn head_to_head(&self, a: &str, b: &str) -> Dominance {
        let for_a = self.support(a, b);
        let for_b = self.support(b, a);
        if for_a > for_b {
            Dominance::First
        } else if for_b > for_a {
            Dominance::Second
        } else {
            Dominance::Tie
        }
    }

    fn beats(&self, a: &str, b: &str) -> bool {
        self.head_to_head(a, b) == Dominance::First
    }

    /// Decompose the candidates into dominating tiers. Tier 0 is the Smith
    /// set: the minimal set whose members each beat every outsider
    /// head-to-head. Lower tiers repeat the computation on the remainder.
    pub fn dominating_tiers(&self) -> Vec<BTreeSet<Candidate>> {
        let mut rest: BTreeSet<Candidate> = self.candidates.iter().cloned().collect();
        let mut tiers = Vec::new();
        while !rest.is_empty() {
            let tier = self.top_tier(&rest);
            for candidate in &tier {
                rest.remove(candidate);
            }
            tiers.push(tier);
        }
        tiers
    }

    /// The Condorcet winner, if the top tier is a single candidate.
    pub fn condorcet_winner(&self) -> Option<Candidate> {
        let tiers = self.dominating_tiers();
        let top = tiers.first()?;
        if top.len() == 1 {
            top.iter().next().cloned()
        } else {
            None
        }
    }

    /// Minimal dominating set within `pool`: seed with the maximum-Copeland
    /// candidates, then close under "not strictly beaten by a member".
    fn top_tier(&self, pool: &BTreeSet<Candidate>) -> BTreeSet<Candidate> {
        let copeland: BTreeMap<&Candidate, isize> = pool
            .iter()
            .map(|candidate| {
                let wins = pool
                    .iter()
                    .filter(|other| *other != candidate && self.beats(candidate, other))
                    .count() as isize;
                let losses = pool
                    .iter()
                    .filter(|other| *other != candidate && self.beats(other, candidate))
                    .count() as isize;
                (candidate, wins - losses)
            })
            .collect();
        let best = match copeland.values().max() {
            Some(best) => *best,
            None => return BTreeSet::new(),
        };

        let mut tier: BTreeSet<Candidate> = copeland
            .iter()
            .filter(|(_, score)| **score == best)
            .map(|(candidate, _)| (*candidate).clone())
            .collect();

        loop {
            let mut grew = false;
            for outsider in pool {
                if tier.contains(outsider) {
                    continue;
                }
                let escapes = tier
                    .iter()
                    .any(|member| !self.beats(member, outsider));
                if escapes {
                    tier.insert(outsider.clone());
                    grew = true;
                }
            }
            if !grew {
                return tier;
            }
        }
    }
}
