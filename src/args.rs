use clap::Parser;

/// This program turns raw precinct election returns into precinct-level support and turnout tables.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the batch. For more information about
    /// the file format, read the manual of the precinct_metrics crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default data/raw/2020_precinct) The directory containing one CSV file per state.
    /// Setting this option overrides what may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (directory, default data/processed) The directory where the output tables are written.
    /// It is created if it does not exist.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default 2020) The year of the election. It selects the input files and is written in the output.
    #[clap(long, value_parser)]
    pub year: Option<i64>,

    /// (list of state codes or not specified) If specified, only these states are processed.
    /// Otherwise, all the states found in the input directory are processed.
    #[clap(long, value_parser)]
    pub states: Option<Vec<String>>,

    /// (support or turnout, default support) The table to produce.
    #[clap(long, value_parser)]
    pub analysis: Option<String>,

    /// (dropPrecinct or dropState, default dropPrecinct) For the turnout analysis, what to do with
    /// precincts that have no registered voters data.
    #[clap(long, value_parser)]
    pub registration_policy: Option<String>,

    /// (file path) A reference CSV file. If provided, the CSV output is checked against it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
