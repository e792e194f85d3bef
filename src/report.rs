//! Report Generator Module
//! Builds the static dashboard report: ranking charts, vote timeline, and an
//! info panel for one selected Pokemon, written as HTML + PNG artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};

use crate::charts::ChartRenderer;
use crate::data::{self, DexId, RankedRecord, VoteBucket};
use crate::palette;
use crate::sprites::{self, SpriteResolver, SpriteResult};

const SURVEY_FILE: &str = "responses.csv";
const VOTES_FILE: &str = "votes.csv";
const CACHE_FILE: &str = "ranked.csv";
const SPRITE_WIDTH_PX: u32 = 150;

enum Subject {
    First,
    Name(String),
    Id(DexId),
}

/// Orchestrates one report run. Configure with the builder methods, then
/// call [`generate`](Self::generate).
pub struct ReportBuilder {
    data_dir: PathBuf,
    out_dir: PathBuf,
    subject: Subject,
    resolver: SpriteResolver,
    refresh: bool,
}

impl ReportBuilder {
    pub fn new(data_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            out_dir: out_dir.into(),
            subject: Subject::First,
            resolver: SpriteResolver::new(),
            refresh: false,
        }
    }

    /// Focus the report on a Pokemon by name (matched case-insensitively).
    pub fn subject_name(mut self, name: impl Into<String>) -> Self {
        self.subject = Subject::Name(name.into());
        self
    }

    /// Focus the report on a Pokemon by dex id.
    pub fn subject_id(mut self, id: DexId) -> Self {
        self.subject = Subject::Id(id);
        self
    }

    /// Drop the ranking cache before ranking.
    pub fn refresh_cache(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn sprite_resolver(mut self, resolver: SpriteResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Generate all artifacts and return the path of the HTML report.
    pub fn generate(&self) -> Result<PathBuf> {
        // 1. Survey data and rankings
        let survey_path = self.data_dir.join(SURVEY_FILE);
        let records = data::load_survey_records(&survey_path)
            .with_context(|| format!("loading survey data from {}", survey_path.display()))?;
        if records.is_empty() {
            bail!("survey data {} has no usable rows", survey_path.display());
        }

        let cache_path = self.data_dir.join(CACHE_FILE);
        if self.refresh && cache_path.exists() {
            fs::remove_file(&cache_path)
                .with_context(|| format!("removing ranking cache {}", cache_path.display()))?;
        }
        let ranked = data::rank_with_cache(&records, &cache_path);

        let subject = self.select_subject(&ranked)?;
        self.resolver.ensure_fallback_asset()?;

        // 2. Sprite and its dominant color
        let sprite = self.resolver.resolve_sprite_uri(subject.record.id);
        let sprite_bytes = self.resolver.fetch_sprite_image(subject.record.id)?;
        let color = match sprites::dominant_color(&sprite_bytes) {
            Ok(color) => color,
            Err(err) => {
                warn!(
                    "no usable sprite color for #{}: {err}; using the generation color",
                    subject.record.id
                );
                palette::generation_color(subject.record.generation)
                    .unwrap_or(palette::DEFAULT_COLOR)
                    .to_string()
            }
        };

        // 3. Vote timeline data (optional input)
        let votes_path = self.data_dir.join(VOTES_FILE);
        let buckets = if votes_path.exists() {
            let log = data::load_vote_log(&votes_path)
                .with_context(|| format!("loading vote log from {}", votes_path.display()))?;
            data::aggregate_votes_hourly(&log, &subject.record.name)
        } else {
            info!("no vote log at {}; skipping the timeline", votes_path.display());
            Vec::new()
        };

        // 4. Chart artifacts
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating output directory {}", self.out_dir.display()))?;

        let mut charts: Vec<(String, String)> = Vec::new();

        let overall_png = self.out_dir.join("overall_ranking.png");
        ChartRenderer::render_overall_ranking(&overall_png, &ranked, Some(subject.record.id))
            .map_err(|err| anyhow!("rendering {}: {err}", overall_png.display()))?;
        charts.push(("Overall ranking".to_string(), file_name(&overall_png)));

        let generation_png = self
            .out_dir
            .join(format!("generation_{}_ranking.png", subject.record.generation));
        ChartRenderer::render_generation_ranking(
            &generation_png,
            &ranked,
            subject.record.generation,
            Some(subject.record.id),
        )
        .map_err(|err| anyhow!("rendering {}: {err}", generation_png.display()))?;
        charts.push((
            format!("Generation {} ranking", subject.record.generation),
            file_name(&generation_png),
        ));

        if buckets.is_empty() {
            info!("no recorded votes for {}; timeline chart skipped", subject.record.name);
        } else {
            let timeline_png = self.out_dir.join("vote_timeline.png");
            ChartRenderer::render_vote_timeline(
                &timeline_png,
                &buckets,
                &color,
                &subject.record.name,
            )
            .map_err(|err| anyhow!("rendering {}: {err}", timeline_png.display()))?;
            charts.push(("Votes in time".to_string(), file_name(&timeline_png)));
        }

        // 5. HTML report
        let report_path = self.out_dir.join("report.html");
        let html = render_html(subject, &sprite, &color, &buckets, &charts);
        fs::write(&report_path, html)
            .with_context(|| format!("writing report {}", report_path.display()))?;

        info!("report written to {}", report_path.display());
        Ok(report_path)
    }

    fn select_subject<'a>(
        &self,
        ranked: &'a BTreeMap<DexId, RankedRecord>,
    ) -> Result<&'a RankedRecord> {
        match &self.subject {
            Subject::Id(id) => ranked
                .get(id)
                .ok_or_else(|| anyhow!("no survey entry for dex id {id}")),
            Subject::Name(name) => ranked
                .values()
                .find(|row| row.record.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("no survey entry named '{name}'")),
            Subject::First => ranked
                .values()
                .next()
                .ok_or_else(|| anyhow!("survey data is empty")),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn render_html(
    subject: &RankedRecord,
    sprite: &SpriteResult,
    color: &str,
    buckets: &[VoteBucket],
    charts: &[(String, String)],
) -> String {
    let record = &subject.record;
    let name = escape_html(&record.name);

    let type_badges: String = record
        .types
        .iter()
        .map(|type_name| {
            let fill = palette::type_color(type_name).unwrap_or(palette::DEFAULT_COLOR);
            format!(
                "<span class=\"type\" style=\"background:{fill}\">{}</span>",
                escape_html(type_name)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    let total_votes_in_log: u64 = buckets.iter().map(|bucket| bucket.count).sum();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{name} - favorite Pokemon report</title>\n"));
    html.push_str(
        "<style>\n\
         body { font-family: sans-serif; margin: 2em; }\n\
         table { border-collapse: collapse; }\n\
         td { border: 1px solid #ccc; padding: 4px 10px; }\n\
         .type { color: #fff; padding: 2px 8px; border-radius: 4px; }\n\
         .panel { display: flex; gap: 2em; align-items: center; }\n\
         img.chart { max-width: 100%; }\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str("<div class=\"panel\">\n");
    html.push_str(&sprites::sprite_markup(sprite, &name, SPRITE_WIDTH_PX));
    html.push_str(&format!("\n<div>\n<h2>{}. {name}</h2>\n<table>\n", record.id));
    html.push_str(&format!(
        "<tr><td>Generation</td><td style=\"background:{}\">{}</td></tr>\n",
        palette::generation_color(record.generation).unwrap_or(palette::DEFAULT_COLOR),
        record.generation
    ));
    html.push_str(&format!(
        "<tr><td>Family</td><td>{}</td></tr>\n",
        escape_html(&record.family)
    ));
    html.push_str(&format!("<tr><td>Types</td><td>{type_badges}</td></tr>\n"));
    html.push_str(&format!(
        "<tr><td>Votes</td><td>{}</td></tr>\n",
        record.votes
    ));
    html.push_str(&format!(
        "<tr><td>Ranking overall</td><td>{}</td></tr>\n",
        subject.overall_rank
    ));
    html.push_str(&format!(
        "<tr><td>Ranking in generation</td><td>{}</td></tr>\n",
        subject.generation_rank
    ));
    html.push_str(&format!(
        "<tr><td>Sprite color</td><td style=\"background:{color}\">{color}</td></tr>\n"
    ));
    html.push_str("</table>\n</div>\n</div>\n");

    if buckets.is_empty() {
        html.push_str(&format!(
            "<p>No votes recorded for {name} in the live vote log.</p>\n"
        ));
    } else {
        html.push_str(&format!(
            "<p>{total_votes_in_log} live votes for {name} across {} hour(s).</p>\n",
            buckets.len()
        ));
    }

    for (title, file) in charts {
        html.push_str(&format!(
            "<h3>{}</h3>\n<img class=\"chart\" src=\"{}\" alt=\"{}\">\n",
            escape_html(title),
            escape_html(file),
            escape_html(title)
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SurveyRecord;
    use chrono::NaiveDate;

    fn subject() -> RankedRecord {
        RankedRecord {
            record: SurveyRecord {
                id: 6,
                name: "Charizard".to_string(),
                votes: 1107,
                types: vec!["fire".to_string(), "flying".to_string()],
                generation: 1,
                family: "Charmander".to_string(),
            },
            overall_rank: 1,
            generation_rank: 1,
        }
    }

    #[test]
    fn html_report_carries_the_info_panel() {
        let sprite = SpriteResult {
            source_uri: "https://img.example/6.png".to_string(),
            is_fallback: false,
        };
        let buckets = vec![VoteBucket {
            hour: NaiveDate::from_ymd_opt(2019, 7, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            count: 4,
        }];
        let charts = vec![("Overall ranking".to_string(), "overall_ranking.png".to_string())];

        let html = render_html(&subject(), &sprite, "#f08030", &buckets, &charts);

        assert!(html.contains("<h2>6. Charizard</h2>"));
        assert!(html.contains("<tr><td>Ranking overall</td><td>1</td></tr>"));
        assert!(html.contains("alt=\"Charizard\""));
        assert!(html.contains("background:#F08030"));
        assert!(html.contains("4 live votes"));
        assert!(html.contains("src=\"overall_ranking.png\""));
    }

    #[test]
    fn html_escapes_untrusted_names() {
        let mut ranked = subject();
        ranked.record.name = "Mr<script>".to_string();
        let sprite = SpriteResult {
            source_uri: "assets/pokeball.png".to_string(),
            is_fallback: true,
        };

        let html = render_html(&ranked, &sprite, "#000000", &[], &[]);
        assert!(html.contains("Mr&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
