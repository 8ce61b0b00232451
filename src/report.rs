//! Serializable round-by-round election reports and a console summary.
//! Persistence stays with the caller: this module only builds values and
//! prints to the terminal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::election::{Election, Rule};

/// Full report for one finished (or partially run) election.
#[derive(Debug, Serialize, Deserialize)]
pub struct ElectionReport {
    #[serde(rename = "ballotCount")]
    pub ballot_count: usize,
    pub candidates: Vec<String>,
    pub rounds: Vec<RoundReport>,
    pub summary: ResultSummary,
}

/// One round: exact tallies (rendered as rational strings), elected
/// cohorts, and eliminated candidates.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: usize,
    pub tally: BTreeMap<String, String>,
    pub elected: Vec<Vec<String>>,
    pub eliminated: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultSummary {
    pub winners: Vec<String>,
    #[serde(rename = "totalRounds")]
    pub total_rounds: usize,
    #[serde(rename = "totalBallotWeight")]
    pub total_ballot_weight: String,
}

impl ElectionReport {
    pub fn from_election<R: Rule>(election: &Election<R>) -> ElectionReport {
        let rounds: Vec<RoundReport> = election
            .states()
            .iter()
            .map(|state| RoundReport {
                round: state.round_number,
                tally: state
                    .scores
                    .as_ref()
                    .map(|scores| {
                        scores
                            .iter()
                            .map(|(candidate, score)| (candidate.clone(), score.to_string()))
                            .collect()
                    })
                    .unwrap_or_default(),
                elected: state
                    .elected
                    .iter()
                    .map(|cohort| cohort.iter().cloned().collect())
                    .collect(),
                eliminated: state
                    .eliminated
                    .iter()
                    .flat_map(|cohort| cohort.iter().cloned())
                    .collect(),
            })
            .collect();

        ElectionReport {
            ballot_count: election.profile().num_ballots(),
            candidates: election.profile().candidates().to_vec(),
            summary: ResultSummary {
                winners: election.winners(),
                total_rounds: rounds.len().saturating_sub(1),
                total_ballot_weight: election.profile().total_ballot_weight().to_string(),
            },
            rounds,
        }
    }
}

/// Print a round-by-round summary to the console.
pub fn print_summary(report: &ElectionReport) {
    use colored::*;

    println!("\n{}", "Election Summary".bright_cyan().bold());
    println!("{}", "=".repeat(50).bright_cyan());
    println!(
        "{}: {} ballots, {} candidates, total weight {}",
        "Profile".bright_white().bold(),
        report.ballot_count.to_string().bright_yellow(),
        report.candidates.len().to_string().bright_yellow(),
        report.summary.total_ballot_weight.bright_yellow()
    );

    for round in &report.rounds {
        if round.round == 0 {
            continue;
        }
        println!("{}", "-".repeat(50).bright_cyan());
        println!("{} {}", "Round".bright_white().bold(), round.round);
        for cohort in &round.elected {
            println!("  elected: {}", cohort.join(", ").bright_green());
        }
        for candidate in &round.eliminated {
            println!("  eliminated: {}", candidate.red());
        }
        for (candidate, votes) in &round.tally {
            println!("  {}: {}", candidate, votes.bright_white());
        }
    }

    println!("{}", "=".repeat(50).bright_cyan());
    println!(
        "{}: {}",
        "Winners".bright_white().bold(),
        report.summary.winners.join(", ").bright_green().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{whole, Ballot, PreferenceProfile};
    use crate::rules::Positional;
    use crate::scoring::TieConvention;

    fn finished_election() -> Election<Positional> {
        let profile = PreferenceProfile::from_ballots(vec![
            Ballot::from_order(&["A", "B", "C"], whole(2)),
            Ballot::from_order(&["B", "A", "C"], whole(1)),
        ]);
        let rule = Positional::borda(1, TieConvention::Low, None);
        let mut election = Election::new(profile, rule).unwrap();
        election.run_election().unwrap();
        election
    }

    #[test]
    fn report_captures_rounds_and_winners() {
        let election = finished_election();
        let report = ElectionReport::from_election(&election);
        assert_eq!(report.ballot_count, 2);
        assert_eq!(report.summary.total_rounds, 1);
        assert_eq!(report.summary.winners, vec!["A".to_string()]);
        assert_eq!(report.rounds[0].tally["A"], "8");
        assert_eq!(report.rounds[1].elected, vec![vec!["A".to_string()]]);
    }

    #[test]
    fn report_serializes_to_json() {
        let election = finished_election();
        let report = ElectionReport::from_election(&election);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"ballotCount\":2"));
        assert!(json.contains("\"totalBallotWeight\":\"3\""));
    }
}
