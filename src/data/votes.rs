//! Vote Log Module
//! Loads the live vote log and aggregates per-subject hourly counts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use super::loader::{read_table, require_column, string_cell, DataFormatError};

/// One raw vote submission. Duplicates are expected; every row counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEvent {
    pub timestamp: NaiveDateTime,
    pub name: String,
}

/// Vote count for one clock hour. Hours with no votes are never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteBucket {
    pub hour: NaiveDateTime,
    pub count: u64,
}

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Load the vote log CSV (`timestamp,vote`), sorted by timestamp.
///
/// Rows with a blank name or a timestamp that matches none of the accepted
/// formats are dropped.
pub fn load_vote_log(path: &Path) -> Result<Vec<VoteEvent>, DataFormatError> {
    let df = read_table(path)?;
    if df.width() == 0 {
        return Ok(Vec::new());
    }

    let timestamps = require_column(&df, "timestamp")?;
    let votes = require_column(&df, "vote")?;

    let mut events = Vec::new();
    for i in 0..df.height() {
        let (Some(raw), Some(name)) = (string_cell(timestamps, i), string_cell(votes, i))
        else {
            continue;
        };
        let Some(timestamp) = parse_timestamp(&raw) else {
            debug!("dropping vote row {}: unparseable timestamp '{raw}'", i + 1);
            continue;
        };
        events.push(VoteEvent { timestamp, name });
    }
    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

/// Count votes for `subject` per clock hour. Matching is exact and
/// case-sensitive; buckets come back in ascending hour order.
pub fn aggregate_votes_hourly(log: &[VoteEvent], subject: &str) -> Vec<VoteBucket> {
    let mut buckets: BTreeMap<NaiveDateTime, u64> = BTreeMap::new();
    for event in log {
        if event.name != subject {
            continue;
        }
        let Some(hour) = truncate_to_hour(event.timestamp) else {
            continue;
        };
        *buckets.entry(hour).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(hour, count)| VoteBucket { hour, count })
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn truncate_to_hour(timestamp: NaiveDateTime) -> Option<NaiveDateTime> {
    timestamp.date().and_hms_opt(timestamp.hour(), 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 7, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn vote(day: u32, hour: u32, minute: u32, name: &str) -> VoteEvent {
        VoteEvent {
            timestamp: at(day, hour, minute),
            name: name.to_string(),
        }
    }

    #[test]
    fn counts_per_truncated_hour_in_ascending_order() {
        let log = vec![
            vote(1, 14, 55, "Pikachu"),
            vote(1, 9, 5, "Pikachu"),
            vote(1, 9, 59, "Pikachu"),
            vote(1, 14, 0, "Pikachu"),
            vote(1, 9, 30, "Eevee"),
        ];

        let buckets = aggregate_votes_hourly(&log, "Pikachu");
        assert_eq!(
            buckets,
            vec![
                VoteBucket { hour: at(1, 9, 0), count: 2 },
                VoteBucket { hour: at(1, 14, 0), count: 2 },
            ]
        );
    }

    #[test]
    fn empty_log_and_unknown_subject_yield_no_buckets() {
        assert!(aggregate_votes_hourly(&[], "Pikachu").is_empty());

        let log = vec![vote(1, 9, 5, "Eevee")];
        assert!(aggregate_votes_hourly(&log, "Pikachu").is_empty());
    }

    #[test]
    fn subject_matching_is_case_sensitive() {
        let log = vec![vote(1, 9, 5, "Pikachu"), vote(1, 9, 6, "pikachu")];
        let buckets = aggregate_votes_hourly(&log, "Pikachu");
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn buckets_spanning_days_stay_ordered() {
        let log = vec![
            vote(2, 0, 10, "Mew"),
            vote(1, 23, 50, "Mew"),
            vote(1, 23, 10, "Mew"),
        ];

        let buckets = aggregate_votes_hourly(&log, "Mew");
        assert_eq!(
            buckets,
            vec![
                VoteBucket { hour: at(1, 23, 0), count: 2 },
                VoteBucket { hour: at(2, 0, 0), count: 1 },
            ]
        );
    }

    #[test]
    fn accepts_all_documented_timestamp_formats() {
        for raw in [
            "2019-07-01 09:30:00",
            "2019-07-01T09:30:00",
            "07/01/2019 09:30:00",
        ] {
            assert_eq!(parse_timestamp(raw), Some(at(1, 9, 30)), "{raw}");
        }
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn loads_sorted_log_and_drops_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            b"timestamp,vote\n\
              2019-07-01 14:02:11,Pikachu\n\
              2019-07-01 09:15:00,Eevee\n\
              soon,Pikachu\n\
              2019-07-01 10:00:00,\n",
        )
        .unwrap();

        let log = load_vote_log(&path).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].name, "Eevee");
        assert_eq!(log[1].name, "Pikachu");
    }
}
