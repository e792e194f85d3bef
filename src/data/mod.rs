//! Data module - survey loading, ranking, and vote aggregation

mod loader;
mod ranker;
mod votes;

pub use loader::{load_survey_records, DataFormatError, DexId, SurveyRecord};
pub use ranker::{rank, rank_with_cache, RankedRecord};
pub use votes::{aggregate_votes_hourly, load_vote_log, VoteBucket, VoteEvent};
