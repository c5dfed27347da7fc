use log::{debug, info, warn};

use precinct_metrics::turnout::{compute_turnout, RegistrationPolicy, TurnoutConfig, TurnoutStats};
use precinct_metrics::*;
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

use crate::args::Args;
use crate::pm::config_reader::*;
use crate::pm::io_common::*;
use crate::pm::io_csv::{read_state_csv, write_csv};
use crate::pm::io_parquet::{metrics_to_batch, turnout_to_batch, write_parquet};

mod config_reader;
mod io_common;
mod io_csv;
mod io_parquet;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PmError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error listing the input directory {path}"))]
    ListingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No input file at {path}"))]
    MissingStateFile { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Missing required column {column} in {path}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display(
        "Line {lineno} of {path}: column {column} should be {expected}, found {content:?}"
    ))]
    InvalidValue {
        path: String,
        lineno: usize,
        column: String,
        content: String,
        expected: String,
    },
    #[snafu(display("State {state}: {source}"))]
    Pipeline {
        source: PipelineErrors,
        state: String,
    },
    #[snafu(display("No state data was successfully processed ({count} states failed)"))]
    BatchExhausted { count: usize },
    #[snafu(display("No output row was produced"))]
    EmptyOutput {},
    #[snafu(display("Error reading {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error building the output table"))]
    Arrow { source: arrow::error::ArrowError },
    #[snafu(display("Error writing Parquet file {path}"))]
    Parquet {
        source: parquet::errors::ParquetError,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PmResult<T> = Result<T, PmError>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Analysis {
    Support,
    Turnout,
}

/// The settings of one batch, after merging the defaults, the configuration
/// file and the command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BatchSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub states: Option<Vec<String>>,
    pub analysis: Analysis,
    pub pipeline: PipelineConfig,
    pub turnout: TurnoutConfig,
}

pub const DEFAULT_INPUT_DIR: &str = "data/raw/2020_precinct";
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

// Relative paths of the configuration file are relative to the file itself.
fn config_path(root: Option<&Path>, p: &str) -> PathBuf {
    match root {
        Some(r) if Path::new(p).is_relative() => r.join(p),
        _ => PathBuf::from(p),
    }
}

impl BatchSettings {
    pub fn resolve(args: &Args) -> PmResult<BatchSettings> {
        let config = match &args.config {
            Some(p) => read_config(p)?,
            None => BatchConfig::default(),
        };
        let root: Option<&Path> = args.config.as_deref().and_then(|p| Path::new(p).parent());

        let input_dir = match (&args.input, &config.input_directory) {
            (Some(p), _) => PathBuf::from(p),
            (None, Some(p)) => config_path(root, p),
            (None, None) => PathBuf::from(DEFAULT_INPUT_DIR),
        };
        let output_dir = match (&args.out, &config.output_directory) {
            (Some(p), _) => PathBuf::from(p),
            (None, Some(p)) => config_path(root, p),
            (None, None) => PathBuf::from(DEFAULT_OUTPUT_DIR),
        };
        let election_year = args
            .year
            .or(config.election_year)
            .unwrap_or(DEFAULT_ELECTION_YEAR);

        let default_race = RaceSpec::presidential_general();
        let race_settings = config.race.clone().unwrap_or_default();
        let race = RaceSpec {
            office: race_settings.office.unwrap_or(default_race.office),
            mode: race_settings.mode.unwrap_or(default_race.mode),
            stage: race_settings.stage.unwrap_or(default_race.stage),
        };

        let qualifying_parties = match &config.qualifying_parties {
            Some(parties) if parties.is_empty() => {
                whatever!("qualifyingParties must name at least one party")
            }
            Some(parties) => parties.clone(),
            None => PipelineConfig::default().qualifying_parties,
        };

        let analysis = match args.analysis.as_ref().or(config.analysis.as_ref()) {
            Some(s) => parse_analysis(s)?,
            None => Analysis::Support,
        };

        let turnout_settings = config.turnout.clone().unwrap_or_default();
        let default_turnout = TurnoutConfig::default();
        let registration_policy = match args
            .registration_policy
            .as_ref()
            .or(turnout_settings.registration_policy.as_ref())
        {
            Some(s) => parse_registration_policy(s)?,
            None => default_turnout.registration_policy,
        };
        let turnout = TurnoutConfig {
            race: race.clone(),
            registered_label: turnout_settings
                .registered_voters_label
                .unwrap_or(default_turnout.registered_label),
            registered_mode: default_turnout.registered_mode,
            democrat_party: turnout_settings
                .democrat_party
                .unwrap_or(default_turnout.democrat_party),
            republican_party: turnout_settings
                .republican_party
                .unwrap_or(default_turnout.republican_party),
            election_year,
            registration_policy,
        };

        let states = args.states.clone().or_else(|| config.states.clone());

        Ok(BatchSettings {
            input_dir,
            output_dir,
            states,
            analysis,
            pipeline: PipelineConfig {
                race,
                qualifying_parties,
                election_year,
            },
            turnout,
        })
    }

    pub fn election_year(&self) -> i64 {
        self.pipeline.election_year
    }

    fn output_stem(&self) -> String {
        match self.analysis {
            Analysis::Support => format!("precinct_turnout_support_{}", self.election_year()),
            Analysis::Turnout => format!("precinct_turnout_{}", self.election_year()),
        }
    }

    pub fn csv_output(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.output_stem()))
    }

    pub fn parquet_output(&self) -> PathBuf {
        self.output_dir.join(format!("{}.parquet", self.output_stem()))
    }
}

/// A state that was skipped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StateFailure {
    pub state: String,
    pub reason: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StateSummary<S> {
    pub state: String,
    pub rows: usize,
    pub stats: S,
}

#[derive(PartialEq, Debug, Clone)]
pub struct BatchReport<R, S> {
    pub rows: Vec<R>,
    pub states: Vec<StateSummary<S>>,
    pub failures: Vec<StateFailure>,
}

fn read_state(state: &str, path: &Path) -> PmResult<Vec<RawRecord>> {
    if !path.is_file() {
        return MissingStateFileSnafu {
            path: path.display().to_string(),
        }
        .fail();
    }
    info!("Attempting to read file {} for {}", path.display(), state);
    read_state_csv(path)
}

/// Runs `compute` on each state. A state that fails is logged and skipped.
fn process_states<R, S, F>(settings: &BatchSettings, compute: F) -> PmResult<BatchReport<R, S>>
where
    F: Fn(&str, &[RawRecord]) -> Result<(Vec<R>, S), PipelineErrors>,
    S: std::fmt::Debug,
{
    let files = match &settings.states {
        Some(states) => state_files(&settings.input_dir, settings.election_year(), states),
        None => discover_state_files(&settings.input_dir, settings.election_year())?,
    };
    info!("process_states: {} state files", files.len());

    let mut report = BatchReport {
        rows: Vec::new(),
        states: Vec::new(),
        failures: Vec::new(),
    };
    for (state, path) in files.iter() {
        let res = read_state(state, path).and_then(|records| {
            compute(state.as_str(), &records).context(PipelineSnafu {
                state: state.clone(),
            })
        });
        match res {
            Ok((mut rows, stats)) => {
                info!(
                    "process_states: {}: {} rows, stats: {:?}",
                    state,
                    rows.len(),
                    stats
                );
                report.states.push(StateSummary {
                    state: state.clone(),
                    rows: rows.len(),
                    stats,
                });
                report.rows.append(&mut rows);
            }
            Err(e) => {
                warn!("Error processing {}: {}", state, e);
                report.failures.push(StateFailure {
                    state: state.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.states.is_empty() {
        return BatchExhaustedSnafu {
            count: report.failures.len(),
        }
        .fail();
    }
    if report.rows.is_empty() {
        return EmptyOutputSnafu {}.fail();
    }
    Ok(report)
}

pub fn run_support_batch(settings: &BatchSettings) -> PmResult<BatchReport<PrecinctMetric, DropStats>> {
    let report = process_states(settings, |state, records| {
        let out = run_state_pipeline(state, records, &settings.pipeline)?;
        Ok((out.metrics, out.stats))
    })?;

    let mut total = DropStats::default();
    for s in report.states.iter() {
        total += s.stats;
    }
    info!(
        "run_support_batch: {} rows kept, {} rows dropped ({} zero-total precincts, {} rows at or below 0%, {} rows above 100%)",
        report.rows.len(),
        total.dropped_rows(),
        total.non_positive_total_precincts,
        total.non_positive_support_rows,
        total.over_limit_support_rows
    );

    write_outputs(settings, &report.rows, &metrics_to_batch(&report.rows)?)?;
    Ok(report)
}

pub fn run_turnout_batch(
    settings: &BatchSettings,
) -> PmResult<BatchReport<precinct_metrics::turnout::TurnoutSupport, TurnoutStats>> {
    let report = process_states(settings, |state, records| {
        let out = compute_turnout(state, records, &settings.turnout)?;
        Ok((out.rows, out.stats))
    })?;

    let mut total = TurnoutStats::default();
    for s in report.states.iter() {
        total += s.stats;
    }
    info!(
        "run_turnout_batch: {} rows kept; {} precincts without registration, {} turnout out of range",
        report.rows.len(),
        total.missing_registration,
        total.turnout_out_of_range
    );

    write_outputs(settings, &report.rows, &turnout_to_batch(&report.rows)?)?;
    Ok(report)
}

fn write_outputs<R: serde::Serialize>(
    settings: &BatchSettings,
    rows: &[R],
    batch: &arrow::record_batch::RecordBatch,
) -> PmResult<()> {
    fs::create_dir_all(&settings.output_dir).context(WritingOutputSnafu {
        path: settings.output_dir.display().to_string(),
    })?;
    write_parquet(&settings.parquet_output(), batch)?;
    // Also save a CSV for easier inspection
    write_csv(&settings.csv_output(), rows)?;
    info!(
        "write_outputs: wrote {} and {}",
        settings.parquet_output().display(),
        settings.csv_output().display()
    );
    Ok(())
}

/// Compares the CSV output with a reference file.
pub fn check_reference(output: &Path, reference: &str) -> PmResult<()> {
    let produced = fs::read_to_string(output).context(ReadingFileSnafu {
        path: output.display().to_string(),
    })?;
    let expected = fs::read_to_string(reference).context(ReadingFileSnafu { path: reference })?;
    if produced != expected {
        warn!("Found differences with the reference file {}", reference);
        print_diff(expected.as_str(), produced.as_str(), "\n");
        whatever!("Difference detected between the output and the reference {}", reference);
    }
    info!("check_reference: output matches {}", reference);
    Ok(())
}

fn print_summary<R: std::fmt::Debug>(rows: &[R], columns: &[&str], failures: &[StateFailure]) {
    println!("Successfully processed {} rows", rows.len());
    println!("\nSample of processed data:");
    for r in rows.iter().take(5) {
        println!("{:?}", r);
    }
    println!("\nData shape: ({}, {})", rows.len(), columns.len());
    println!("\nColumns: {:?}", columns);
    if !failures.is_empty() {
        println!("\nSkipped states:");
        for f in failures.iter() {
            println!("  {}: {}", f.state, f.reason);
        }
    }
}

pub fn run(args: &Args) -> PmResult<()> {
    let settings = BatchSettings::resolve(args)?;
    debug!("run: settings: {:?}", settings);

    match settings.analysis {
        Analysis::Support => {
            let report = run_support_batch(&settings)?;
            print_summary(&report.rows, &METRIC_COLUMNS, &report.failures);
        }
        Analysis::Turnout => {
            let report = run_turnout_batch(&settings)?;
            print_summary(
                &report.rows,
                &precinct_metrics::turnout::TURNOUT_COLUMNS,
                &report.failures,
            );
        }
    }

    if let Some(reference) = &args.reference {
        check_reference(&settings.csv_output(), reference)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "precinct,office,party_simplified,mode,votes,candidate,state_po,year,stage,writein";

    fn write_state(dir: &Path, state: &str, lines: &[String]) {
        let mut contents = vec![HEADER.to_string()];
        contents.extend(lines.iter().cloned());
        fs::write(
            dir.join(state_file_name(2020, state)),
            contents.join("\n"),
        )
        .unwrap();
    }

    fn line(state: &str, precinct: &str, party: &str, candidate: &str, votes: &str) -> String {
        format!(
            "{},PRESIDENT,{},TOTAL,{},{},{},2020,GEN,FALSE",
            precinct, party, votes, candidate, state
        )
    }

    fn settings(input: &Path, output: &Path) -> BatchSettings {
        let args = Args {
            input: Some(input.display().to_string()),
            out: Some(output.display().to_string()),
            ..Args::default()
        };
        BatchSettings::resolve(&args).unwrap()
    }

    fn az_lines() -> Vec<String> {
        vec![
            line("AZ", "101", "DEMOCRAT", "JOSEPH R BIDEN", "60"),
            line("AZ", "101", "REPUBLICAN", "DONALD J TRUMP", "40"),
            line("AZ", "102", "DEMOCRAT", "JOSEPH R BIDEN", "0"),
            line("AZ", "102", "REPUBLICAN", "DONALD J TRUMP", "0"),
        ]
    }

    fn ga_lines() -> Vec<String> {
        vec![
            line("GA", "101", "DEMOCRAT", "JOSEPH R BIDEN", "25.0"),
            line("GA", "101", "REPUBLICAN", "DONALD J TRUMP", "75"),
            line("GA", "101", "LIBERTARIAN", "JO JORGENSEN", "12"),
        ]
    }

    #[test]
    fn default_settings() {
        let s = BatchSettings::resolve(&Args::default()).unwrap();
        assert_eq!(s.input_dir, PathBuf::from(DEFAULT_INPUT_DIR));
        assert_eq!(s.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(s.pipeline, PipelineConfig::default());
        assert_eq!(s.analysis, Analysis::Support);
        assert_eq!(
            s.csv_output(),
            PathBuf::from(DEFAULT_OUTPUT_DIR).join("precinct_turnout_support_2020.csv")
        );
    }

    #[test]
    fn settings_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("batch.json");
        fs::write(
            &p,
            r#"{ "inputDirectory": "raw", "outputDirectory": "/tmp/abs",
                 "electionYear": 2016, "race": { "stage": "PRI" },
                 "turnout": { "democratParty": "DEM" } }"#,
        )
        .unwrap();
        let args = Args {
            config: Some(p.display().to_string()),
            analysis: Some("turnout".to_string()),
            registration_policy: Some("dropState".to_string()),
            ..Args::default()
        };
        let s = BatchSettings::resolve(&args).unwrap();
        assert_eq!(s.input_dir, dir.path().join("raw"));
        assert_eq!(s.output_dir, PathBuf::from("/tmp/abs"));
        assert_eq!(s.election_year(), 2016);
        assert_eq!(s.pipeline.race, RaceSpec::new("PRESIDENT", "TOTAL", "PRI"));
        assert_eq!(s.analysis, Analysis::Turnout);
        assert_eq!(s.turnout.democrat_party, "DEM");
        assert_eq!(s.turnout.election_year, 2016);
        assert_eq!(s.turnout.registration_policy, RegistrationPolicy::DropState);
        assert_eq!(
            s.parquet_output(),
            PathBuf::from("/tmp/abs").join("precinct_turnout_2016.parquet")
        );

        let args = Args {
            config: Some(p.display().to_string()),
            input: Some("elsewhere".to_string()),
            year: Some(2020),
            ..Args::default()
        };
        let s = BatchSettings::resolve(&args).unwrap();
        assert_eq!(s.input_dir, PathBuf::from("elsewhere"));
        assert_eq!(s.election_year(), 2020);
    }

    #[test]
    fn bad_options() {
        let args = Args {
            analysis: Some("scatter".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            BatchSettings::resolve(&args),
            Err(PmError::Whatever { .. })
        ));
    }

    #[test]
    fn support_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(input.path(), "GA", &ga_lines());
        write_state(input.path(), "AZ", &az_lines());
        let s = settings(input.path(), &output.path().join("processed"));

        let report = run_support_batch(&s).unwrap();
        let ids: Vec<(&str, f64)> = report
            .rows
            .iter()
            .map(|r| (r.precinct_id.as_str(), r.support_percent))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("AZ_101", 60.0),
                ("AZ_101", 40.0),
                ("GA_101", 25.0),
                ("GA_101", 75.0)
            ]
        );
        assert!(report.rows.iter().all(|r| r.total_votes == 100));
        assert!(report.failures.is_empty());
        assert_eq!(report.states[0].stats.non_positive_total_precincts, 1);

        let csv = fs::read_to_string(s.csv_output()).unwrap();
        assert!(csv.starts_with(&METRIC_COLUMNS.join(",")));
        assert_eq!(csv.lines().count(), 5);
        assert!(s.parquet_output().is_file());
    }

    #[test]
    fn idempotent_output() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(input.path(), "AZ", &az_lines());
        write_state(input.path(), "GA", &ga_lines());
        let s = settings(input.path(), output.path());

        run_support_batch(&s).unwrap();
        let first = fs::read(s.csv_output()).unwrap();
        run_support_batch(&s).unwrap();
        let second = fs::read(s.csv_output()).unwrap();
        assert_eq!(first, second);

        let reference = output.path().join("reference.csv");
        fs::write(&reference, &first).unwrap();
        check_reference(&s.csv_output(), reference.to_str().unwrap()).unwrap();
        fs::write(&reference, "precinct_id\n").unwrap();
        assert!(matches!(
            check_reference(&s.csv_output(), reference.to_str().unwrap()),
            Err(PmError::Whatever { .. })
        ));
    }

    #[test]
    fn unreadable_reference() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("out.csv");
        fs::write(&produced, "precinct_id\n").unwrap();
        let missing = dir.path().join("missing.csv");
        match check_reference(&produced, missing.to_str().unwrap()) {
            Err(PmError::ReadingFile { path, .. }) => assert_eq!(path, missing.display().to_string()),
            x => panic!("unexpected result {:?}", x),
        }
        match check_reference(&dir.path().join("nothing.csv"), produced.to_str().unwrap()) {
            Err(PmError::ReadingFile { path, .. }) => assert!(path.ends_with("nothing.csv")),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn failing_state_is_isolated() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(input.path(), "AZ", &az_lines());
        let s = settings(input.path(), output.path());
        let alone = run_support_batch(&s).unwrap();

        // Corrupted votes, missing column, no race data.
        write_state(
            input.path(),
            "CO",
            &[line("CO", "1", "DEMOCRAT", "JOSEPH R BIDEN", "lots")],
        );
        fs::write(
            input.path().join(state_file_name(2020, "DE")),
            "precinct,office\n1,PRESIDENT\n",
        )
        .unwrap();
        write_state(
            input.path(),
            "FL",
            &["1,GOVERNOR,DEMOCRAT,TOTAL,3,SOMEONE,FL,2020,GEN,FALSE".to_string()],
        );
        let with_failures = run_support_batch(&s).unwrap();

        assert_eq!(alone.rows, with_failures.rows);
        let failed: Vec<&str> = with_failures
            .failures
            .iter()
            .map(|f| f.state.as_str())
            .collect();
        assert_eq!(failed, vec!["CO", "DE", "FL"]);
        assert!(with_failures.failures[1].reason.contains("Missing required column"));
        assert!(with_failures.failures[2]
            .reason
            .contains("no rows match the requested race"));
    }

    #[test]
    fn all_states_fail() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(
            input.path(),
            "CO",
            &[line("CO", "1", "DEMOCRAT", "JOSEPH R BIDEN", "lots")],
        );
        let s = settings(input.path(), &output.path().join("processed"));
        let res = run_support_batch(&s);
        assert!(matches!(res, Err(PmError::BatchExhausted { count: 1 })));
        assert!(!s.csv_output().exists());
        assert!(!s.parquet_output().exists());
    }

    #[test]
    fn empty_input_dir() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let s = settings(input.path(), output.path());
        assert!(matches!(
            run_support_batch(&s),
            Err(PmError::BatchExhausted { count: 0 })
        ));
    }

    #[test]
    fn only_dropped_rows() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(
            input.path(),
            "AZ",
            &[
                line("AZ", "1", "DEMOCRAT", "JOSEPH R BIDEN", "0"),
                line("AZ", "1", "REPUBLICAN", "DONALD J TRUMP", "0"),
            ],
        );
        let s = settings(input.path(), output.path());
        assert!(matches!(
            run_support_batch(&s),
            Err(PmError::EmptyOutput {})
        ));
    }

    #[test]
    fn explicit_states() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(input.path(), "AZ", &az_lines());
        write_state(input.path(), "GA", &ga_lines());
        let mut s = settings(input.path(), output.path());
        s.states = Some(vec!["ga".to_string(), "WY".to_string()]);

        let report = run_support_batch(&s).unwrap();
        assert!(report.rows.iter().all(|r| r.state == "GA"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].state, "WY");
        assert!(report.failures[0].reason.contains("No input file"));
    }

    #[test]
    fn repeated_state_processed_once() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_state(input.path(), "AZ", &az_lines());
        let mut s = settings(input.path(), output.path());
        s.states = Some(vec!["AZ".to_string()]);
        let once = run_support_batch(&s).unwrap();

        s.states = Some(vec!["AZ".to_string(), "az".to_string()]);
        let twice = run_support_batch(&s).unwrap();
        assert_eq!(once.rows, twice.rows);
        assert_eq!(twice.states.len(), 1);
        let ids: Vec<(&str, &str)> = twice
            .rows
            .iter()
            .map(|r| (r.precinct_id.as_str(), r.candidate.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![("AZ_101", "JOSEPH R BIDEN"), ("AZ_101", "DONALD J TRUMP")]
        );
    }

    #[test]
    fn turnout_batch() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut lines = az_lines();
        lines.push("101,REGISTERED VOTERS,,TOTAL,200,REGISTERED VOTERS,AZ,2020,GEN,FALSE".to_string());
        write_state(input.path(), "AZ", &lines);
        // No registration rows: skipped.
        write_state(input.path(), "GA", &ga_lines());
        let mut s = settings(input.path(), output.path());
        s.analysis = Analysis::Turnout;

        let report = run_turnout_batch(&s).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].precinct_id, "AZ_101");
        assert_eq!(report.rows[0].turnout_percent, 50.0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].state, "GA");

        let csv = fs::read_to_string(s.csv_output()).unwrap();
        assert!(csv.starts_with(&precinct_metrics::turnout::TURNOUT_COLUMNS.join(",")));
        assert!(s
            .parquet_output()
            .ends_with("precinct_turnout_2020.parquet"));
    }
}
