//! Survey Data Loader Module
//! Reads the favorite-Pokemon survey CSV into keyed records using Polars.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DataFormatError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Row {row}: votes value '{value}' is not a whole number")]
    InvalidVotes { row: usize, value: String },
    #[error("Row {row}: negative vote count {value}")]
    NegativeVotes { row: usize, value: i64 },
    #[error("Row {row}: malformed value in column '{column}'")]
    MalformedCell { column: String, row: usize },
}

/// National dex number; equal to the 1-based row position in the survey
/// sheet, so dropped rows leave gaps instead of renumbering later entries.
pub type DexId = u32;

/// One cleaned survey row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyRecord {
    pub id: DexId,
    pub name: String,
    pub votes: u32,
    pub types: Vec<String>,
    pub generation: u8,
    pub family: String,
}

/// Load the survey CSV (`name,votes,types,generation,family`) into records
/// keyed by dex id.
///
/// Rows missing any field are dropped. Present but malformed vote counts are
/// a hard error; a non-numeric generation counts as missing.
pub fn load_survey_records(
    path: &Path,
) -> Result<BTreeMap<DexId, SurveyRecord>, DataFormatError> {
    let df = read_table(path)?;
    if df.width() == 0 {
        return Ok(BTreeMap::new());
    }

    let names = require_column(&df, "name")?;
    let votes = require_column(&df, "votes")?;
    let types = require_column(&df, "types")?;
    let generations = require_column(&df, "generation")?;
    let families = require_column(&df, "family")?;

    let mut records = BTreeMap::new();
    for i in 0..df.height() {
        // The dex id is fixed by row position before any row is dropped.
        let id = (i + 1) as DexId;

        let (Some(name), Some(family)) = (string_cell(names, i), string_cell(families, i))
        else {
            debug!("dropping survey row {id}: missing name or family");
            continue;
        };
        let Some(votes_raw) = string_cell(votes, i) else {
            debug!("dropping survey row {id}: missing vote count");
            continue;
        };
        let votes = parse_votes(&votes_raw, i + 1)?;
        let Some(generation) = string_cell(generations, i).and_then(|g| parse_generation(&g))
        else {
            debug!("dropping survey row {id}: missing or non-numeric generation");
            continue;
        };
        let type_list = string_cell(types, i)
            .map(|t| split_types(&t))
            .unwrap_or_default();
        if type_list.is_empty() {
            debug!("dropping survey row {id}: missing types");
            continue;
        }

        records.insert(
            id,
            SurveyRecord {
                id,
                name,
                votes,
                types: type_list,
                generation,
                family,
            },
        );
    }

    info!(
        "loaded {} survey records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Read a CSV with every cell typed as a string, so callers own coercion and
/// can tell missing values apart from malformed ones.
pub(crate) fn read_table(path: &Path) -> Result<DataFrame, DataFormatError> {
    if fs::metadata(path)?.len() == 0 {
        return Ok(DataFrame::empty());
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;
    Ok(df)
}

pub(crate) fn require_column<'a>(
    df: &'a DataFrame,
    name: &str,
) -> Result<&'a Column, DataFormatError> {
    df.column(name)
        .map_err(|_| DataFormatError::MissingColumn(name.to_string()))
}

/// Cell as trimmed text; `None` for null, empty, or whitespace-only cells.
pub(crate) fn string_cell(column: &Column, row: usize) -> Option<String> {
    let val = column.get(row).ok()?;
    if val.is_null() {
        return None;
    }
    let text = val.to_string().trim_matches('"').trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_votes(raw: &str, row: usize) -> Result<u32, DataFormatError> {
    let value: i64 = match raw.parse::<i64>() {
        Ok(v) => v,
        // Spreadsheet exports write integer columns as "10.0" once a blank
        // forces the column to float.
        Err(_) => match raw.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => {
                return Err(DataFormatError::InvalidVotes {
                    row,
                    value: raw.to_string(),
                })
            }
        },
    };
    if value < 0 {
        return Err(DataFormatError::NegativeVotes { row, value });
    }
    u32::try_from(value).map_err(|_| DataFormatError::InvalidVotes {
        row,
        value: raw.to_string(),
    })
}

fn parse_generation(raw: &str) -> Option<u8> {
    if let Ok(g) = raw.parse::<u8>() {
        return Some(g);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u8::MAX as f64)
        .map(|f| f as u8)
}

/// Split a raw type cell ("grass/poison", "water, flying") into a
/// deduplicated list that keeps the listed order.
fn split_types(raw: &str) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for part in raw.split(['/', ',']) {
        let name = part.trim();
        if !name.is_empty() && !types.iter().any(|t| t == name) {
            types.push(name.to_string());
        }
    }
    types
}
