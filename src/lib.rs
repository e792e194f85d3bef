//! pokedash - favorite-Pokemon survey analytics and report generation.
//!
//! Loads the survey sheet and the live vote log, derives overall and
//! per-generation rankings with an opportunistic on-disk cache, resolves
//! sprites from PokeAPI with a bundled fallback, and renders the dashboard
//! panels as static HTML + PNG artifacts.

pub mod charts;
pub mod data;
pub mod palette;
pub mod report;
pub mod sprites;

pub use data::{
    aggregate_votes_hourly, load_survey_records, load_vote_log, rank, rank_with_cache,
    DataFormatError, DexId, RankedRecord, SurveyRecord, VoteBucket, VoteEvent,
};
pub use report::ReportBuilder;
pub use sprites::{dominant_color, sprite_markup, SpriteError, SpriteResolver, SpriteResult};
