/*!
Precinct-level aggregation of raw election returns.

The support pipeline runs in five steps over the records of one state:
[`filter_race`], [`aggregate`], [`join_metrics`], [`sanity_filter`] and
[`assemble`]. [`run_state_pipeline`] chains them and is the usual entry point.
The [`turnout`] module holds the turnout variant.

```
use precinct_metrics::*;

let row = |candidate: &str, party: &str, votes: f64| RawRecord {
    precinct: "101".to_string(),
    office: "PRESIDENT".to_string(),
    party: party.to_string(),
    mode: "TOTAL".to_string(),
    stage: "GEN".to_string(),
    votes,
    candidate: Some(candidate.to_string()),
    state: "AZ".to_string(),
    year: 2020,
    writein: None,
};
let records = vec![row("BIDEN", DEMOCRAT, 60.0), row("TRUMP", REPUBLICAN, 40.0)];
let out = run_state_pipeline("AZ", &records, &PipelineConfig::default())?;
assert_eq!(out.metrics[0].precinct_id, "AZ_101");
assert_eq!(out.metrics[0].support_percent, 60.0);
# Ok::<(), PipelineErrors>(())
```
*/

mod config;
pub mod manual;
pub mod turnout;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

/// Selects the records of one race.
///
/// An empty result is not an error at this level.
pub fn filter_race<'a>(records: &'a [RawRecord], race: &RaceSpec) -> Vec<&'a RawRecord> {
    records.iter().filter(|r| race.matches(r)).collect()
}

/// Groups the race rows by precinct and by candidate.
///
/// Only rows of a qualifying party with a named candidate are counted, in
/// both the totals and the candidate sums, so that the numerator and the
/// denominator of the support percentage cover the same population.
pub fn aggregate(filtered: &[&RawRecord], qualifying_parties: &[String]) -> Aggregates {
    let parties: HashSet<&str> = qualifying_parties.iter().map(|p| p.as_str()).collect();

    let mut totals: Vec<PrecinctTotal> = Vec::new();
    let mut total_index: HashMap<&str, usize> = HashMap::new();
    let mut candidates: Vec<CandidateAggregate> = Vec::new();
    let mut candidate_index: HashMap<(&str, &str, &str), usize> = HashMap::new();

    for r in filtered.iter() {
        let candidate = match r.candidate_name() {
            Some(c) if parties.contains(r.party.as_str()) => c,
            _ => continue,
        };

        let t_idx = *total_index.entry(r.precinct.as_str()).or_insert_with(|| {
            totals.push(PrecinctTotal {
                precinct: r.precinct.clone(),
                total_votes: 0.0,
            });
            totals.len() - 1
        });
        totals[t_idx].total_votes += r.votes;

        let key = (r.precinct.as_str(), candidate, r.party.as_str());
        let c_idx = *candidate_index.entry(key).or_insert_with(|| {
            candidates.push(CandidateAggregate {
                precinct: r.precinct.clone(),
                candidate: candidate.to_string(),
                party: r.party.clone(),
                votes: 0.0,
            });
            candidates.len() - 1
        });
        candidates[c_idx].votes += r.votes;
    }

    debug!(
        "aggregate: {} precincts, {} candidate aggregates",
        totals.len(),
        candidates.len()
    );
    Aggregates { totals, candidates }
}

/// Inner join of the candidate aggregates with the precinct totals.
///
/// Only precincts with a strictly positive total can be joined, so the
/// division below never sees a zero denominator.
pub fn join_metrics(aggregates: &Aggregates, stats: &mut DropStats) -> Vec<CandidateSupport> {
    let denominators: HashMap<&str, f64> = aggregates
        .totals
        .iter()
        .filter(|t| t.total_votes > 0.0)
        .map(|t| (t.precinct.as_str(), t.total_votes))
        .collect();
    stats.non_positive_total_precincts += aggregates.totals.len() - denominators.len();

    let mut res: Vec<CandidateSupport> = Vec::with_capacity(aggregates.candidates.len());
    for ca in aggregates.candidates.iter() {
        match denominators.get(ca.precinct.as_str()) {
            Some(&total_votes) => res.push(CandidateSupport {
                precinct: ca.precinct.clone(),
                candidate: ca.candidate.clone(),
                party: ca.party.clone(),
                votes: ca.votes,
                total_votes,
                support_percent: 100.0 * ca.votes / total_votes,
            }),
            None => {
                stats.non_positive_total_rows += 1;
            }
        }
    }
    res
}

/// Keeps the rows with `0 < support_percent <= 100`.
///
/// The other rows are dropped without error and counted in `stats`.
pub fn sanity_filter(rows: Vec<CandidateSupport>, stats: &mut DropStats) -> Vec<CandidateSupport> {
    let mut res: Vec<CandidateSupport> = Vec::with_capacity(rows.len());
    for row in rows {
        if row.support_percent > 100.0 {
            debug!(
                "sanity_filter: precinct {:?} candidate {:?}: support {} above 100",
                row.precinct, row.candidate, row.support_percent
            );
            stats.over_limit_support_rows += 1;
        } else if row.support_percent > 0.0 {
            res.push(row);
        } else {
            // Also catches NaN.
            stats.non_positive_support_rows += 1;
        }
    }
    res
}

/// Builds the output rows. Totals are truncated to integers here, after the
/// percentages have been computed.
pub fn assemble(rows: &[CandidateSupport], state: &str, election_year: i64) -> Vec<PrecinctMetric> {
    rows.iter()
        .map(|row| PrecinctMetric {
            precinct_id: format!("{}_{}", state, row.precinct),
            precinct_name: row.precinct.clone(),
            election_year,
            total_votes: row.total_votes as i64,
            candidate: row.candidate.clone(),
            candidate_party: row.party.clone(),
            support_percent: row.support_percent,
            state: state.to_string(),
        })
        .collect()
}

/// Runs the support pipeline on the records of one state.
///
/// Arguments:
/// * `state` the state code, used as the prefix of the precinct ids
/// * `records` all the records of the state
/// * `config` the race and party settings, shared by all the states of a batch
pub fn run_state_pipeline(
    state: &str,
    records: &[RawRecord],
    config: &PipelineConfig,
) -> Result<StateOutput, PipelineErrors> {
    info!(
        "run_state_pipeline: {}: processing {} records",
        state,
        records.len()
    );
    let mut stats = DropStats::default();

    let race_rows = filter_race(records, &config.race);
    stats.race_rows = race_rows.len();
    if race_rows.is_empty() {
        return Err(PipelineErrors::NoRaceData);
    }

    let aggregates = aggregate(&race_rows, &config.qualifying_parties);
    if aggregates.candidates.is_empty() {
        return Err(PipelineErrors::NoQualifyingData);
    }
    stats.qualifying_rows = race_rows
        .iter()
        .filter(|r| {
            r.candidate_name().is_some() && config.qualifying_parties.iter().any(|p| *p == r.party)
        })
        .count();
    stats.precincts = aggregates.totals.len();

    let joined = join_metrics(&aggregates, &mut stats);
    let kept = sanity_filter(joined, &mut stats);
    let metrics = assemble(&kept, state, config.election_year);
    stats.emitted_rows = metrics.len();

    debug!("run_state_pipeline: {}: stats {:?}", state, stats);
    Ok(StateOutput {
        state: state.to_string(),
        metrics,
        stats,
    })
}
