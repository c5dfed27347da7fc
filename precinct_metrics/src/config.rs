// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::ops::AddAssign;

use serde::Serialize;

/// One row of a state's raw election returns.
///
/// Records are produced by the loader and never mutated afterwards.
#[derive(PartialEq, Debug, Clone)]
pub struct RawRecord {
    pub precinct: String,
    pub office: String,
    pub party: String,
    pub mode: String,
    pub stage: String,
    /// Fractional counts are tolerated: some sources report them.
    pub votes: f64,
    /// An empty cell in the source is a missing candidate.
    pub candidate: Option<String>,
    pub state: String,
    pub year: i64,
    /// `None` when the source has no write-in column or the cell is blank.
    pub writein: Option<bool>,
}

impl RawRecord {
    /// The candidate name, if present and not empty.
    pub fn candidate_name(&self) -> Option<&str> {
        match self.candidate.as_deref() {
            Some(c) if !c.is_empty() => Some(c),
            _ => None,
        }
    }
}

/// The race to extract from the raw returns.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RaceSpec {
    pub office: String,
    pub mode: String,
    pub stage: String,
}

impl RaceSpec {
    pub fn new(office: &str, mode: &str, stage: &str) -> RaceSpec {
        RaceSpec {
            office: office.to_string(),
            mode: mode.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Presidential race, general election, all voting modes combined.
    pub fn presidential_general() -> RaceSpec {
        RaceSpec::new("PRESIDENT", "TOTAL", "GEN")
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        record.office == self.office && record.mode == self.mode && record.stage == self.stage
    }
}

// ********* Configuration **********

pub const DEFAULT_ELECTION_YEAR: i64 = 2020;
pub const DEMOCRAT: &str = "DEMOCRAT";
pub const REPUBLICAN: &str = "REPUBLICAN";

/// Settings for one run of the support pipeline.
///
/// The same value is handed to every state: nothing in it changes between
/// states.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PipelineConfig {
    pub race: RaceSpec,
    /// The parties that make up the denominator of the support percentages.
    pub qualifying_parties: Vec<String>,
    pub election_year: i64,
}

impl PipelineConfig {
    pub fn new(race: RaceSpec, qualifying_parties: &[&str], election_year: i64) -> PipelineConfig {
        PipelineConfig {
            race,
            qualifying_parties: qualifying_parties.iter().map(|p| p.to_string()).collect(),
            election_year,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::new(
            RaceSpec::presidential_general(),
            &[DEMOCRAT, REPUBLICAN],
            DEFAULT_ELECTION_YEAR,
        )
    }
}

// ******** Intermediate data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct PrecinctTotal {
    pub precinct: String,
    pub total_votes: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CandidateAggregate {
    pub precinct: String,
    pub candidate: String,
    pub party: String,
    pub votes: f64,
}

/// Both groupings of the qualifying rows of one race.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Aggregates {
    /// One entry per precinct, in order of first appearance.
    pub totals: Vec<PrecinctTotal>,
    /// One entry per (precinct, candidate, party), in order of first appearance.
    pub candidates: Vec<CandidateAggregate>,
}

/// A candidate aggregate joined with its precinct total.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateSupport {
    pub precinct: String,
    pub candidate: String,
    pub party: String,
    pub votes: f64,
    pub total_votes: f64,
    pub support_percent: f64,
}

// ******** Output data structures *********

pub const PRECINCT_ID: &str = "precinct_id";
pub const PRECINCT_NAME: &str = "precinct_name";
pub const ELECTION_YEAR: &str = "election_year";
pub const TOTAL_VOTES: &str = "total_votes";
pub const CANDIDATE: &str = "candidate";
pub const CANDIDATE_PARTY: &str = "candidate_party";
pub const SUPPORT_PERCENT: &str = "support_percent";
pub const STATE: &str = "state";

/// Column names of the support output, in order. Downstream consumers index by name.
pub const METRIC_COLUMNS: [&str; 8] = [
    PRECINCT_ID,
    PRECINCT_NAME,
    ELECTION_YEAR,
    TOTAL_VOTES,
    CANDIDATE,
    CANDIDATE_PARTY,
    SUPPORT_PERCENT,
    STATE,
];

/// One output row: the support of one candidate in one precinct.
///
/// Field order matches [`METRIC_COLUMNS`].
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct PrecinctMetric {
    pub precinct_id: String,
    pub precinct_name: String,
    pub election_year: i64,
    pub total_votes: i64,
    pub candidate: String,
    pub candidate_party: String,
    pub support_percent: f64,
    pub state: String,
}

/// Counters of what the cleaning steps removed for one state.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct DropStats {
    /// Rows matching the race filter.
    pub race_rows: usize,
    /// Race rows with a qualifying party and a candidate name.
    pub qualifying_rows: usize,
    pub precincts: usize,
    /// Precincts whose qualifying total is zero or negative.
    pub non_positive_total_precincts: usize,
    /// Candidate rows lost because their precinct had no positive total.
    pub non_positive_total_rows: usize,
    pub non_positive_support_rows: usize,
    pub over_limit_support_rows: usize,
    pub emitted_rows: usize,
}

impl DropStats {
    pub fn dropped_rows(&self) -> usize {
        self.non_positive_total_rows + self.non_positive_support_rows + self.over_limit_support_rows
    }
}

impl AddAssign for DropStats {
    fn add_assign(&mut self, rhs: DropStats) {
        self.race_rows += rhs.race_rows;
        self.qualifying_rows += rhs.qualifying_rows;
        self.precincts += rhs.precincts;
        self.non_positive_total_precincts += rhs.non_positive_total_precincts;
        self.non_positive_total_rows += rhs.non_positive_total_rows;
        self.non_positive_support_rows += rhs.non_positive_support_rows;
        self.over_limit_support_rows += rhs.over_limit_support_rows;
        self.emitted_rows += rhs.emitted_rows;
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StateOutput {
    pub state: String,
    pub metrics: Vec<PrecinctMetric>,
    pub stats: DropStats,
}

/// Errors that prevent a state from producing output.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PipelineErrors {
    /// No row matched the race filter.
    NoRaceData,
    /// Race rows exist, but none belongs to a qualifying party with a named candidate.
    NoQualifyingData,
    /// The state carries no registered voter rows.
    NoRegistrationData,
    /// Some precincts have no registered voter rows and the policy rejects the state.
    MissingRegistration { precincts: usize },
}

impl Error for PipelineErrors {}

impl Display for PipelineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineErrors::NoRaceData => write!(f, "no rows match the requested race"),
            PipelineErrors::NoQualifyingData => {
                write!(f, "no qualifying party rows with a candidate")
            }
            PipelineErrors::NoRegistrationData => write!(f, "no registered voters data found"),
            PipelineErrors::MissingRegistration { precincts } => write!(
                f,
                "{} precincts have no registered voters data",
                precincts
            ),
        }
    }
}
