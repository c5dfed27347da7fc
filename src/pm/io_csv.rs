// Primitives for reading and writing CSV files.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::pm::{io_common::simplify_file_name, *};

/// The fields of a raw record, as found in the input files.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum InputField {
    Precinct,
    Office,
    Party,
    Mode,
    Votes,
    Candidate,
    State,
    Year,
    Stage,
    WriteIn,
}

/// How the text of a cell is interpreted.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ColumnKind {
    Text,
    /// Integer or decimal. An empty cell counts as zero.
    Number,
    Integer,
    /// TRUE or FALSE, case insensitive. An empty cell is unknown.
    Flag,
}

impl ColumnKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Number => "a number",
            ColumnKind::Integer => "an integer",
            ColumnKind::Flag => "TRUE or FALSE",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub field: InputField,
    /// Accepted header names, by order of preference.
    pub names: &'static [&'static str],
    pub required: bool,
}

pub const INPUT_SCHEMA: [ColumnSpec; 10] = [
    ColumnSpec {
        field: InputField::Precinct,
        names: &["precinct"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Office,
        names: &["office"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Party,
        names: &["party_simplified", "party_detailed"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Mode,
        names: &["mode"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Votes,
        names: &["votes"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Candidate,
        names: &["candidate"],
        required: true,
    },
    ColumnSpec {
        field: InputField::State,
        names: &["state_po"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Year,
        names: &["year"],
        required: true,
    },
    ColumnSpec {
        field: InputField::Stage,
        names: &["stage"],
        required: true,
    },
    ColumnSpec {
        field: InputField::WriteIn,
        names: &["writein"],
        required: false,
    },
];

impl InputField {
    pub fn kind(&self) -> ColumnKind {
        match self {
            InputField::Precinct
            | InputField::Office
            | InputField::Party
            | InputField::Mode
            | InputField::Candidate
            | InputField::State
            | InputField::Stage => ColumnKind::Text,
            InputField::Votes => ColumnKind::Number,
            InputField::Year => ColumnKind::Integer,
            InputField::WriteIn => ColumnKind::Flag,
        }
    }
}

/// The position of each field in the rows of one file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndex {
    positions: HashMap<InputField, (usize, &'static str)>,
}

/// Matches the header of a file against [`INPUT_SCHEMA`].
pub fn resolve_columns(header: &csv::StringRecord, path: &str) -> PmResult<ColumnIndex> {
    let mut positions: HashMap<InputField, (usize, &'static str)> = HashMap::new();
    for spec in INPUT_SCHEMA.iter() {
        let found = spec
            .names
            .iter()
            .find_map(|name| header.iter().position(|h| h.trim() == *name).map(|idx| (idx, *name)));
        match found {
            Some(x) => {
                positions.insert(spec.field, x);
            }
            None if spec.required => {
                return MissingColumnSnafu {
                    path,
                    column: spec.names.join(" or "),
                }
                .fail();
            }
            None => {
                debug!("resolve_columns: {}: no optional column {:?}", path, spec.names);
            }
        }
    }
    Ok(ColumnIndex { positions })
}

struct RowReader<'a> {
    line: &'a csv::StringRecord,
    index: &'a ColumnIndex,
    path: &'a str,
    lineno: usize,
}

impl<'a> RowReader<'a> {
    fn cell(&self, field: InputField) -> PmResult<Option<(&'a str, &'static str)>> {
        match self.index.positions.get(&field) {
            Some((idx, name)) => {
                let s = self.line.get(*idx).context(CsvLineTooShortSnafu {
                    path: self.path,
                    lineno: self.lineno,
                })?;
                Ok(Some((s, *name)))
            }
            None => Ok(None),
        }
    }

    fn text(&self, field: InputField) -> PmResult<String> {
        Ok(self
            .cell(field)?
            .map(|(s, _)| s.to_string())
            .unwrap_or_default())
    }

    fn invalid<T>(&self, field: InputField, column: &str, content: &str) -> PmResult<T> {
        InvalidValueSnafu {
            path: self.path,
            lineno: self.lineno,
            column,
            content,
            expected: field.kind().describe(),
        }
        .fail()
    }

    fn number(&self, field: InputField) -> PmResult<f64> {
        match self.cell(field)? {
            Some((s, _)) if s.trim().is_empty() => {
                debug!(
                    "read_state_csv: {} line {}: empty {:?}, counted as 0",
                    self.path, self.lineno, field
                );
                Ok(0.0)
            }
            Some((s, name)) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(x),
                _ => self.invalid(field, name, s),
            },
            None => Ok(0.0),
        }
    }

    fn integer(&self, field: InputField) -> PmResult<i64> {
        match self.cell(field)? {
            Some((s, name)) => match s.trim().parse::<i64>() {
                Ok(x) => Ok(x),
                Err(_) => self.invalid(field, name, s),
            },
            None => Ok(0),
        }
    }

    fn flag(&self, field: InputField) -> PmResult<Option<bool>> {
        match self.cell(field)? {
            Some((s, _)) if s.trim().is_empty() => Ok(None),
            Some((s, _)) if s.trim().eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some((s, _)) if s.trim().eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some((s, name)) => self.invalid(field, name, s),
            None => Ok(None),
        }
    }

    fn record(&self) -> PmResult<RawRecord> {
        let candidate = self.text(InputField::Candidate)?;
        Ok(RawRecord {
            precinct: self.text(InputField::Precinct)?,
            office: self.text(InputField::Office)?,
            party: self.text(InputField::Party)?,
            mode: self.text(InputField::Mode)?,
            stage: self.text(InputField::Stage)?,
            votes: self.number(InputField::Votes)?,
            candidate: if candidate.is_empty() {
                None
            } else {
                Some(candidate)
            },
            state: self.text(InputField::State)?,
            year: self.integer(InputField::Year)?,
            writein: self.flag(InputField::WriteIn)?,
        })
    }
}

/// Reads all the records of one state file.
pub fn read_state_csv(path: &Path) -> PmResult<Vec<RawRecord>> {
    let path_s = path.display().to_string();
    // Row lengths are checked against the resolved columns, not the header.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path_s.clone(),
        })?;
    let header = rdr
        .headers()
        .context(CsvLineParseSnafu {
            path: path_s.clone(),
            lineno: 1_usize,
        })?
        .clone();
    let index = resolve_columns(&header, &path_s)?;

    let mut res: Vec<RawRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: path_s.clone(),
            lineno,
        })?;
        let row = RowReader {
            line: &line,
            index: &index,
            path: &path_s,
            lineno,
        };
        res.push(row.record()?);
    }
    info!(
        "read_state_csv: read {} records from {}",
        res.len(),
        simplify_file_name(path)
    );
    Ok(res)
}

/// Writes rows with a header made of the field names of `T`.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> PmResult<()> {
    let path_s = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu {
        path: path_s.clone(),
    })?;
    for row in rows.iter() {
        wtr.serialize(row).context(CsvWriteSnafu {
            path: path_s.clone(),
        })?;
    }
    wtr.flush().context(WritingOutputSnafu { path: path_s })?;
    Ok(())
}
