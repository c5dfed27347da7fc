//! Turnout against registered voters, with the support of the two major parties.
//!
//! Registered voter counts are carried in the returns themselves, as rows whose
//! candidate is a fixed label (`REGISTERED VOTERS`). Some states do not report
//! them at all, and some report them for only part of their precincts: what
//! happens to the latter is controlled by [`RegistrationPolicy`].

use log::{debug, info, warn};
use serde::Serialize;

use std::collections::HashMap;

use crate::config::*;
use crate::filter_race;

pub const REGISTERED_VOTERS: &str = "REGISTERED VOTERS";

/// What to do with precincts that have race returns but no registered voters.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RegistrationPolicy {
    /// Drop these precincts only.
    DropPrecinct,
    /// Reject the whole state.
    DropState,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TurnoutConfig {
    pub race: RaceSpec,
    pub registered_label: String,
    pub registered_mode: String,
    pub democrat_party: String,
    pub republican_party: String,
    pub election_year: i64,
    pub registration_policy: RegistrationPolicy,
}

impl Default for TurnoutConfig {
    fn default() -> Self {
        TurnoutConfig {
            race: RaceSpec::presidential_general(),
            registered_label: REGISTERED_VOTERS.to_string(),
            registered_mode: "TOTAL".to_string(),
            democrat_party: DEMOCRAT.to_string(),
            republican_party: REPUBLICAN.to_string(),
            election_year: DEFAULT_ELECTION_YEAR,
            registration_policy: RegistrationPolicy::DropPrecinct,
        }
    }
}

pub const REGISTERED_VOTERS_COLUMN: &str = "registered_voters";
pub const TURNOUT_PERCENT: &str = "turnout_percent";
pub const DEM_SUPPORT_PERCENT: &str = "dem_support_percent";
pub const REP_SUPPORT_PERCENT: &str = "rep_support_percent";

pub const TURNOUT_COLUMNS: [&str; 9] = [
    PRECINCT_ID,
    PRECINCT_NAME,
    ELECTION_YEAR,
    STATE,
    TOTAL_VOTES,
    REGISTERED_VOTERS_COLUMN,
    TURNOUT_PERCENT,
    DEM_SUPPORT_PERCENT,
    REP_SUPPORT_PERCENT,
];

/// One precinct of the turnout output. Field order matches [`TURNOUT_COLUMNS`].
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct TurnoutSupport {
    pub precinct_id: String,
    pub precinct_name: String,
    pub election_year: i64,
    pub state: String,
    pub total_votes: i64,
    pub registered_voters: i64,
    pub turnout_percent: f64,
    pub dem_support_percent: f64,
    pub rep_support_percent: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct TurnoutStats {
    pub precincts: usize,
    pub missing_registration: usize,
    pub missing_party: usize,
    pub non_positive_total: usize,
    pub turnout_out_of_range: usize,
    pub emitted_rows: usize,
}

impl std::ops::AddAssign for TurnoutStats {
    fn add_assign(&mut self, rhs: TurnoutStats) {
        self.precincts += rhs.precincts;
        self.missing_registration += rhs.missing_registration;
        self.missing_party += rhs.missing_party;
        self.non_positive_total += rhs.non_positive_total;
        self.turnout_out_of_range += rhs.turnout_out_of_range;
        self.emitted_rows += rhs.emitted_rows;
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TurnoutOutput {
    pub state: String,
    pub rows: Vec<TurnoutSupport>,
    pub stats: TurnoutStats,
}

// Sums of votes per precinct, keeping the order in which precincts appear.
#[derive(Default)]
struct PrecinctSums<'a> {
    order: Vec<&'a str>,
    sums: HashMap<&'a str, f64>,
}

impl<'a> PrecinctSums<'a> {
    fn add(&mut self, precinct: &'a str, votes: f64) {
        let e = self.sums.entry(precinct).or_insert_with(|| {
            self.order.push(precinct);
            0.0
        });
        *e += votes;
    }

    fn get(&self, precinct: &str) -> Option<f64> {
        self.sums.get(precinct).cloned()
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Computes turnout and two-party support for each precinct of one state.
pub fn compute_turnout(
    state: &str,
    records: &[RawRecord],
    config: &TurnoutConfig,
) -> Result<TurnoutOutput, PipelineErrors> {
    info!(
        "compute_turnout: {}: processing {} records",
        state,
        records.len()
    );
    let race_rows = filter_race(records, &config.race);
    if race_rows.is_empty() {
        return Err(PipelineErrors::NoRaceData);
    }

    let mut registered = PrecinctSums::default();
    for r in records.iter() {
        if r.mode == config.registered_mode
            && r.candidate_name() == Some(config.registered_label.as_str())
        {
            registered.add(r.precinct.as_str(), r.votes);
        }
    }
    if registered.is_empty() {
        warn!("compute_turnout: no registered voters data found for {}", state);
        return Err(PipelineErrors::NoRegistrationData);
    }

    // Without any write-in flag in the state, every race row counts.
    // Otherwise only the rows explicitly flagged as not write-in do.
    let has_writein = race_rows.iter().any(|r| r.writein.is_some());
    if !has_writein {
        debug!("compute_turnout: {}: no write-in flags, counting all race rows", state);
    }

    let mut totals = PrecinctSums::default();
    let mut dem = PrecinctSums::default();
    let mut rep = PrecinctSums::default();
    for r in race_rows.iter() {
        if !has_writein || r.writein == Some(false) {
            totals.add(r.precinct.as_str(), r.votes);
        }
        if r.party == config.democrat_party {
            dem.add(r.precinct.as_str(), r.votes);
        } else if r.party == config.republican_party {
            rep.add(r.precinct.as_str(), r.votes);
        }
    }

    let mut stats = TurnoutStats {
        precincts: totals.order.len(),
        ..TurnoutStats::default()
    };
    let mut rows: Vec<TurnoutSupport> = Vec::new();
    for precinct in totals.order.iter() {
        let total = totals.get(precinct).unwrap_or(0.0);
        let registered_voters = match registered.get(precinct) {
            Some(x) => x,
            None => {
                stats.missing_registration += 1;
                continue;
            }
        };
        let (dem_votes, rep_votes) = match (dem.get(precinct), rep.get(precinct)) {
            (Some(d), Some(r)) => (d, r),
            _ => {
                stats.missing_party += 1;
                continue;
            }
        };
        if total <= 0.0 {
            stats.non_positive_total += 1;
            continue;
        }
        if registered_voters <= 0.0 {
            stats.turnout_out_of_range += 1;
            continue;
        }
        let turnout_percent = 100.0 * total / registered_voters;
        if !(turnout_percent > 0.0 && turnout_percent <= 100.0) {
            debug!(
                "compute_turnout: precinct {:?}: turnout {} out of range",
                precinct, turnout_percent
            );
            stats.turnout_out_of_range += 1;
            continue;
        }
        rows.push(TurnoutSupport {
            precinct_id: format!("{}_{}", state, precinct),
            precinct_name: precinct.to_string(),
            election_year: config.election_year,
            state: state.to_string(),
            total_votes: total as i64,
            registered_voters: registered_voters as i64,
            turnout_percent,
            dem_support_percent: 100.0 * dem_votes / total,
            rep_support_percent: 100.0 * rep_votes / total,
        });
    }

    if stats.missing_registration > 0 {
        warn!(
            "compute_turnout: {}: {} precincts without registered voters",
            state, stats.missing_registration
        );
        if config.registration_policy == RegistrationPolicy::DropState {
            return Err(PipelineErrors::MissingRegistration {
                precincts: stats.missing_registration,
            });
        }
    }
    stats.emitted_rows = rows.len();
    debug!("compute_turnout: {}: stats {:?}", state, stats);
    Ok(TurnoutOutput {
        state: state.to_string(),
        rows,
        stats,
    })
}
