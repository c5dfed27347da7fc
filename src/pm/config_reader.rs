use crate::pm::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RaceSettings {
    pub office: Option<String>,
    pub mode: Option<String>,
    pub stage: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurnoutSettings {
    #[serde(rename = "registeredVotersLabel")]
    pub registered_voters_label: Option<String>,
    #[serde(rename = "democratParty")]
    pub democrat_party: Option<String>,
    #[serde(rename = "republicanParty")]
    pub republican_party: Option<String>,
    #[serde(rename = "registrationPolicy")]
    pub registration_policy: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchConfig {
    #[serde(rename = "inputDirectory")]
    pub input_directory: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "electionYear")]
    pub election_year: Option<i64>,
    pub race: Option<RaceSettings>,
    #[serde(rename = "qualifyingParties")]
    pub qualifying_parties: Option<Vec<String>>,
    pub states: Option<Vec<String>>,
    pub analysis: Option<String>,
    pub turnout: Option<TurnoutSettings>,
}

pub fn read_config(path: &str) -> PmResult<BatchConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: BatchConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn parse_analysis(s: &str) -> PmResult<Analysis> {
    match s {
        "support" => Ok(Analysis::Support),
        "turnout" => Ok(Analysis::Turnout),
        x => whatever!("unknown analysis {:?}: expected support or turnout", x),
    }
}

pub fn parse_registration_policy(s: &str) -> PmResult<RegistrationPolicy> {
    match s {
        "dropPrecinct" => Ok(RegistrationPolicy::DropPrecinct),
        "dropState" => Ok(RegistrationPolicy::DropState),
        x => whatever!(
            "unknown registration policy {:?}: expected dropPrecinct or dropState",
            x
        ),
    }
}
