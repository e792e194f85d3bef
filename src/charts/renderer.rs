//! Static Chart Renderer
//! Renders the three dashboard panels as PNG files via plotters:
//!
//! 1. Overall ranking: horizontal bars, best rank on top, one color per
//!    generation, legend in the corner
//! 2. Generation ranking: the same view for a single cohort
//! 3. Vote timeline: vertical bars per clock hour, filled with the
//!    subject's dominant sprite color

use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::data::{DexId, RankedRecord, VoteBucket};
use crate::palette;

const BAR_CHART_WIDTH: u32 = 1080;
const TIMELINE_SIZE: (u32, u32) = (960, 420);
/// Vertical pixels per ranking bar; total height is clamped below.
const BAR_BAND_PX: u32 = 14;
const MIN_BAR_CHART_HEIGHT: u32 = 360;
const MAX_BAR_CHART_HEIGHT: u32 = 4096;
/// Past this many bars the y axis stops labeling every name.
const MAX_NAME_LABELS: usize = 40;

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render the full ranking, one bar per record, best overall rank at
    /// the top. `highlight` outlines one record's bar and dims the rest.
    pub fn render_overall_ranking(
        path: &Path,
        ranked: &BTreeMap<DexId, RankedRecord>,
        highlight: Option<DexId>,
    ) -> Result<(), Box<dyn Error>> {
        let mut rows: Vec<&RankedRecord> = ranked.values().collect();
        rows.sort_by_key(|row| row.overall_rank);
        Self::render_ranking_bars(
            path,
            "Overall ranking",
            &rows,
            |row| row.overall_rank,
            highlight,
            true,
        )
    }

    /// Render the ranking within one generation cohort.
    pub fn render_generation_ranking(
        path: &Path,
        ranked: &BTreeMap<DexId, RankedRecord>,
        generation: u8,
        highlight: Option<DexId>,
    ) -> Result<(), Box<dyn Error>> {
        let mut rows: Vec<&RankedRecord> = ranked
            .values()
            .filter(|row| row.record.generation == generation)
            .collect();
        rows.sort_by_key(|row| row.generation_rank);
        Self::render_ranking_bars(
            path,
            &format!("Generation {generation} ranking"),
            &rows,
            |row| row.generation_rank,
            highlight,
            false,
        )
    }

    /// Render hourly vote counts as vertical bars labeled `%H:%M`, filled
    /// with the subject's sprite color.
    pub fn render_vote_timeline(
        path: &Path,
        buckets: &[VoteBucket],
        color_hex: &str,
        subject: &str,
    ) -> Result<(), Box<dyn Error>> {
        if buckets.is_empty() {
            return Err("no vote buckets to draw".into());
        }
        let n = buckets.len();
        let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(1);
        let fill = hex_fill(color_hex);

        let root = BitMapBackend::new(path, TIMELINE_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Votes in time: {subject}"), ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(42)
            .y_label_area_size(48)
            .build_cartesian_2d((0..n).into_segmented(), 0u64..max_count + 1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) if *i < n => {
                    buckets[*i].hour.format("%H:%M").to_string()
                }
                _ => String::new(),
            })
            .x_labels(n.min(24))
            .y_desc("Votes")
            .label_style(("sans-serif", 12))
            .draw()?;

        chart.draw_series(buckets.iter().enumerate().map(|(i, bucket)| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), bucket.count),
                ],
                fill.filled(),
            );
            bar.set_margin(0, 0, 2, 2);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    /// Shared horizontal-bar core. `rows` must be pre-sorted by `rank_of`
    /// and `rank_of` must assign 1..=len over them.
    fn render_ranking_bars(
        path: &Path,
        title: &str,
        rows: &[&RankedRecord],
        rank_of: fn(&RankedRecord) -> u32,
        highlight: Option<DexId>,
        with_legend: bool,
    ) -> Result<(), Box<dyn Error>> {
        if rows.is_empty() {
            return Err("no ranked records to draw".into());
        }
        let n = rows.len();

        // Best rank lands in the top band.
        let mut bands: Vec<Option<&RankedRecord>> = vec![None; n];
        for &row in rows {
            match n.checked_sub(rank_of(row) as usize) {
                Some(band) if band < n => bands[band] = Some(row),
                _ => continue,
            }
        }

        let max_votes = rows
            .iter()
            .map(|row| row.record.votes)
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        let height =
            (n as u32 * BAR_BAND_PX + 160).clamp(MIN_BAR_CHART_HEIGHT, MAX_BAR_CHART_HEIGHT);

        let root = BitMapBackend::new(path, (BAR_CHART_WIDTH, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 26))
            .margin(12)
            .x_label_area_size(42)
            .y_label_area_size(150)
            .build_cartesian_2d(0f64..max_votes * 1.05, (0..n).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(band) | SegmentValue::Exact(band) => bands
                    .get(*band)
                    .copied()
                    .flatten()
                    .map(|row| row.record.name.clone())
                    .unwrap_or_default(),
                SegmentValue::Last => String::new(),
            })
            .y_labels(n.min(MAX_NAME_LABELS))
            .x_desc("Votes")
            .label_style(("sans-serif", 12))
            .draw()?;

        // One series per generation so the legend gets one swatch each.
        let mut generations: Vec<u8> = rows.iter().map(|row| row.record.generation).collect();
        generations.sort_unstable();
        generations.dedup();

        for generation in generations {
            let fill = hex_fill(
                palette::generation_color(generation).unwrap_or(palette::DEFAULT_COLOR),
            );
            let series = chart.draw_series(
                rows.iter()
                    .filter(|row| row.record.generation == generation)
                    .filter_map(|row| {
                        let band = n.checked_sub(rank_of(row) as usize)?;
                        if band >= n {
                            return None;
                        }
                        // With a highlight in play, every other bar fades.
                        let style = match highlight {
                            Some(id) if id != row.record.id => fill.mix(0.55).filled(),
                            _ => fill.filled(),
                        };
                        let mut bar = Rectangle::new(
                            [
                                (0.0, SegmentValue::Exact(band)),
                                (row.record.votes as f64, SegmentValue::Exact(band + 1)),
                            ],
                            style,
                        );
                        bar.set_margin(1, 1, 0, 0);
                        Some(bar)
                    }),
            )?;
            if with_legend {
                series
                    .label(format!("Gen {generation}"))
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled())
                    });
            }
        }

        if let Some(id) = highlight {
            if let Some(row) = rows.iter().find(|row| row.record.id == id) {
                if let Some(band) = n.checked_sub(rank_of(row) as usize).filter(|b| *b < n) {
                    chart.draw_series(std::iter::once(Rectangle::new(
                        [
                            (0.0, SegmentValue::Exact(band)),
                            (row.record.votes as f64, SegmentValue::Exact(band + 1)),
                        ],
                        BLACK.stroke_width(2),
                    )))?;
                }
            }
        }

        if with_legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK.mix(0.4))
                .label_font(("sans-serif", 14))
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}

/// Parse `#rrggbb` into a plotters color; malformed input becomes gray
/// rather than a render failure.
fn hex_fill(hex: &str) -> RGBColor {
    let digits = hex.trim_start_matches('#');
    let channel = |at: usize| {
        digits
            .get(at..at + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0x7f)
    };
    RGBColor(channel(0), channel(2), channel(4))
}
