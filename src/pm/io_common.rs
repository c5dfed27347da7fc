use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::pm::*;

const FILE_SUFFIX: &str = "-precinct-general.csv";

pub fn state_file_name(year: i64, state: &str) -> String {
    format!("{}-{}{}", year, state.to_lowercase(), FILE_SUFFIX)
}

/// Extracts the state code from a file name such as `2020-az-precinct-general.csv`.
pub fn state_from_file_name(file_name: &str, year: i64) -> Option<String> {
    let prefix = format!("{}-", year);
    let state = file_name.strip_prefix(prefix.as_str())?.strip_suffix(FILE_SUFFIX)?;
    if state.is_empty() || state.contains('-') {
        None
    } else {
        Some(state.to_uppercase())
    }
}

/// Lists the state files of the input directory, sorted by state code.
pub fn discover_state_files(dir: &Path, year: i64) -> PmResult<Vec<(String, PathBuf)>> {
    let path = dir.display().to_string();
    let mut res: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).context(ListingInputSnafu { path: path.clone() })? {
        let entry = entry.context(ListingInputSnafu { path: path.clone() })?;
        let name = entry.file_name();
        if let Some(state) = name.to_str().and_then(|n| state_from_file_name(n, year)) {
            res.push((state, entry.path()));
        }
    }
    res.sort();
    debug!("discover_state_files: {:?}", res);
    Ok(res)
}

/// The files for an explicit list of states. Existence is checked when each state is read.
///
/// State codes are case insensitive. A state listed more than once is only kept
/// at its first position.
pub fn state_files(dir: &Path, year: i64, states: &[String]) -> Vec<(String, PathBuf)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut res: Vec<(String, PathBuf)> = Vec::new();
    for s in states.iter() {
        let state = s.trim().to_uppercase();
        if !seen.insert(state.clone()) {
            debug!("state_files: {} listed more than once", state);
            continue;
        }
        let p = dir.join(state_file_name(year, &state));
        res.push((state, p));
    }
    res
}

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(state_file_name(2020, "AZ"), "2020-az-precinct-general.csv");
        assert_eq!(
            state_from_file_name("2020-tx-precinct-general.csv", 2020),
            Some("TX".to_string())
        );
        assert_eq!(state_from_file_name("2016-tx-precinct-general.csv", 2020), None);
        assert_eq!(state_from_file_name("2020-tx-precinct-primary.csv", 2020), None);
        assert_eq!(state_from_file_name("2020--precinct-general.csv", 2020), None);
    }

    #[test]
    fn discover_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "2020-wy-precinct-general.csv",
            "2020-ak-precinct-general.csv",
            "README.md",
            "2018-ak-precinct-general.csv",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let found = discover_state_files(dir.path(), 2020).unwrap();
        let states: Vec<&str> = found.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(states, vec!["AK", "WY"]);
        assert_eq!(
            simplify_file_name(&found[0].1),
            "2020-ak-precinct-general.csv"
        );
    }

    #[test]
    fn discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let res = discover_state_files(&dir.path().join("nope"), 2020);
        assert!(matches!(res, Err(PmError::ListingInput { .. })));
    }

    #[test]
    fn explicit_states() {
        let files = state_files(Path::new("raw"), 2020, &["az".to_string()]);
        assert_eq!(files[0].0, "AZ");
        assert_eq!(files[0].1, Path::new("raw").join("2020-az-precinct-general.csv"));
    }

    #[test]
    fn repeated_states() {
        let states: Vec<String> = ["GA", "az", "AZ", "ga", " Az "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let files = state_files(Path::new("raw"), 2020, &states);
        let codes: Vec<&str> = files.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(codes, vec!["GA", "AZ"]);
    }
}
