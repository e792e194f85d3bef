//! pokedash CLI - favorite-Pokemon survey reports from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pokedash::{data, RankedRecord, ReportBuilder};

#[derive(Parser)]
#[command(name = "pokedash", version, about = "Favorite-Pokemon survey reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the HTML report with its chart artifacts
    Report {
        /// Directory holding responses.csv and votes.csv
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Directory for the report and chart files
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
        /// Pokemon to focus on, by name
        #[arg(long, conflicts_with = "dex_id")]
        pokemon: Option<String>,
        /// Pokemon to focus on, by national dex id
        #[arg(long)]
        dex_id: Option<u32>,
        /// Drop the ranking cache before ranking
        #[arg(long)]
        refresh: bool,
        /// Open the finished report with the system default viewer
        #[arg(long)]
        open: bool,
    },
    /// Print the ranking table
    Top {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// How many rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Restrict to one generation and order by its cohort rank
        #[arg(long)]
        generation: Option<u8>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print hourly vote counts for one Pokemon
    Timeline {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long)]
        pokemon: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report {
            data_dir,
            out_dir,
            pokemon,
            dex_id,
            refresh,
            open,
        } => run_report(data_dir, out_dir, pokemon, dex_id, refresh, open),
        Command::Top {
            data_dir,
            limit,
            generation,
            json,
        } => run_top(data_dir, limit, generation, json),
        Command::Timeline { data_dir, pokemon } => run_timeline(data_dir, pokemon),
    }
}

fn run_report(
    data_dir: PathBuf,
    out_dir: PathBuf,
    pokemon: Option<String>,
    dex_id: Option<u32>,
    refresh: bool,
    open: bool,
) -> Result<()> {
    let mut builder = ReportBuilder::new(data_dir, out_dir).refresh_cache(refresh);
    if let Some(name) = pokemon {
        builder = builder.subject_name(name);
    }
    if let Some(id) = dex_id {
        builder = builder.subject_id(id);
    }

    let report = builder.generate()?;
    println!("report: {}", report.display());
    if open {
        open::that(&report)
            .with_context(|| format!("opening {}", report.display()))?;
    }
    Ok(())
}

fn run_top(
    data_dir: PathBuf,
    limit: usize,
    generation: Option<u8>,
    json: bool,
) -> Result<()> {
    let survey_path = data_dir.join("responses.csv");
    let records = data::load_survey_records(&survey_path)
        .with_context(|| format!("loading survey data from {}", survey_path.display()))?;
    let ranked = data::rank(&records);

    let mut rows: Vec<&RankedRecord> = ranked
        .values()
        .filter(|row| generation.map_or(true, |g| row.record.generation == g))
        .collect();
    rows.sort_by_key(|row| match generation {
        Some(_) => row.generation_rank,
        None => row.overall_rank,
    });
    rows.truncate(limit);

    if json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &rows)?;
        println!();
        return Ok(());
    }

    println!("{:>4}  {:>5}  {:<14}  {:>3}  types", "rank", "votes", "name", "gen");
    for row in rows {
        let rank = match generation {
            Some(_) => row.generation_rank,
            None => row.overall_rank,
        };
        println!(
            "{:>4}  {:>5}  {:<14}  {:>3}  {}",
            rank,
            row.record.votes,
            row.record.name,
            row.record.generation,
            row.record.types.join("/")
        );
    }
    Ok(())
}

fn run_timeline(data_dir: PathBuf, pokemon: String) -> Result<()> {
    let votes_path = data_dir.join("votes.csv");
    let log = data::load_vote_log(&votes_path)
        .with_context(|| format!("loading vote log from {}", votes_path.display()))?;

    let buckets = data::aggregate_votes_hourly(&log, &pokemon);
    if buckets.is_empty() {
        println!("no recorded votes for {pokemon}");
        return Ok(());
    }
    for bucket in buckets {
        println!("{}  {:>4}", bucket.hour.format("%Y-%m-%d %H:%M"), bucket.count);
    }
    Ok(())
}
