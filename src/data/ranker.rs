//! Ranking Module
//! Derives overall and per-generation rankings and maintains the on-disk
//! ranking cache.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::loader::{read_table, require_column, string_cell, DataFormatError, DexId, SurveyRecord};

/// A survey record together with its derived ranks. Read-only by
/// construction; recomputed from the records, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRecord {
    #[serde(flatten)]
    pub record: SurveyRecord,
    pub overall_rank: u32,
    pub generation_rank: u32,
}

/// Rank records by votes, descending.
///
/// `overall_rank` is the 1-based position in a stable sort, so on equal
/// votes the lower dex id takes the better rank. `generation_rank` applies
/// the same rule within each generation cohort.
pub fn rank(records: &BTreeMap<DexId, SurveyRecord>) -> BTreeMap<DexId, RankedRecord> {
    // BTreeMap iteration is ascending by dex id; the stable sort preserves
    // that order among ties.
    let mut order: Vec<&SurveyRecord> = records.values().collect();
    order.sort_by(|a, b| b.votes.cmp(&a.votes));

    let mut ranked = BTreeMap::new();
    let mut seen_in_generation: BTreeMap<u8, u32> = BTreeMap::new();
    for (position, record) in order.into_iter().enumerate() {
        let in_generation = seen_in_generation.entry(record.generation).or_insert(0);
        *in_generation += 1;
        ranked.insert(
            record.id,
            RankedRecord {
                record: record.clone(),
                overall_rank: (position + 1) as u32,
                generation_rank: *in_generation,
            },
        );
    }
    ranked
}

/// Rank with an opportunistic cache: while `cache_path` exists its contents
/// are served as-is, so a stale file wins over fresh input until it is
/// deleted. An unreadable cache is recomputed and rewritten, not an error.
pub fn rank_with_cache(
    records: &BTreeMap<DexId, SurveyRecord>,
    cache_path: &Path,
) -> BTreeMap<DexId, RankedRecord> {
    if cache_path.exists() {
        match load_cache(cache_path) {
            Ok(cached) => {
                debug!(
                    "serving {} ranked records from cache {}",
                    cached.len(),
                    cache_path.display()
                );
                return cached;
            }
            Err(err) => warn!(
                "ranking cache {} unreadable ({err}); recomputing",
                cache_path.display()
            ),
        }
    }

    let ranked = rank(records);
    if let Err(err) = write_cache(&ranked, cache_path) {
        warn!(
            "failed to persist ranking cache {}: {err}",
            cache_path.display()
        );
    }
    ranked
}

fn load_cache(path: &Path) -> Result<BTreeMap<DexId, RankedRecord>, DataFormatError> {
    let df = read_table(path)?;
    let ids = require_column(&df, "id")?;
    let names = require_column(&df, "name")?;
    let votes = require_column(&df, "votes")?;
    let types = require_column(&df, "types")?;
    let generations = require_column(&df, "generation")?;
    let families = require_column(&df, "family")?;
    let overall = require_column(&df, "overall_rank")?;
    let per_generation = require_column(&df, "generation_rank")?;

    let malformed = |column: &str, row: usize| DataFormatError::MalformedCell {
        column: column.to_string(),
        row,
    };
    let parse = |cell: Option<String>, column: &str, row: usize| {
        cell.and_then(|raw| raw.parse::<u32>().ok())
            .ok_or_else(|| malformed(column, row))
    };

    let mut ranked = BTreeMap::new();
    for i in 0..df.height() {
        let row = i + 1;
        let id = parse(string_cell(ids, i), "id", row)?;
        let name = string_cell(names, i).ok_or_else(|| malformed("name", row))?;
        let family = string_cell(families, i).ok_or_else(|| malformed("family", row))?;
        let type_list: Vec<String> = string_cell(types, i)
            .map(|t| t.split('/').map(str::to_string).collect())
            .unwrap_or_default();
        ranked.insert(
            id,
            RankedRecord {
                record: SurveyRecord {
                    id,
                    name,
                    votes: parse(string_cell(votes, i), "votes", row)?,
                    types: type_list,
                    generation: u8::try_from(parse(string_cell(generations, i), "generation", row)?)
                        .map_err(|_| malformed("generation", row))?,
                    family,
                },
                overall_rank: parse(string_cell(overall, i), "overall_rank", row)?,
                generation_rank: parse(string_cell(per_generation, i), "generation_rank", row)?,
            },
        );
    }
    Ok(ranked)
}

fn write_cache(
    ranked: &BTreeMap<DexId, RankedRecord>,
    path: &Path,
) -> Result<(), DataFormatError> {
    let mut ids: Vec<u32> = Vec::with_capacity(ranked.len());
    let mut names: Vec<String> = Vec::with_capacity(ranked.len());
    let mut votes: Vec<u32> = Vec::with_capacity(ranked.len());
    let mut types: Vec<String> = Vec::with_capacity(ranked.len());
    let mut generations: Vec<u32> = Vec::with_capacity(ranked.len());
    let mut families: Vec<String> = Vec::with_capacity(ranked.len());
    let mut overall: Vec<u32> = Vec::with_capacity(ranked.len());
    let mut per_generation: Vec<u32> = Vec::with_capacity(ranked.len());

    for entry in ranked.values() {
        ids.push(entry.record.id);
        names.push(entry.record.name.clone());
        votes.push(entry.record.votes);
        types.push(entry.record.types.join("/"));
        generations.push(u32::from(entry.record.generation));
        families.push(entry.record.family.clone());
        overall.push(entry.overall_rank);
        per_generation.push(entry.generation_rank);
    }

    let mut df = DataFrame::new(vec![
        Column::new("id".into(), ids),
        Column::new("name".into(), names),
        Column::new("votes".into(), votes),
        Column::new("types".into(), types),
        Column::new("generation".into(), generations),
        Column::new("family".into(), families),
        Column::new("overall_rank".into(), overall),
        Column::new("generation_rank".into(), per_generation),
    ])?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}
