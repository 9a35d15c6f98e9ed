//! Statcast batted-ball metrics from the command line.
//!
//! Usage:
//!   statcast-engine <FILE> summarize [--view NAME] [--where EXPR]... [--metric M]
//!   statcast-engine <FILE> player <NAME>
//!   statcast-engine <FILE> leaderboard [--min-bbe N] [--limit N]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use statcast_engine::predicate::{Predicate, standard_view, standard_views};
use statcast_engine::report::{self, PlayerReport};
use statcast_engine::subset::Binning;
use statcast_engine::{EngineConfig, Metric, Subset, SubsetEngine, Summary, load_file};

#[derive(Parser)]
#[command(
    name = "statcast-engine",
    about = "Batted-ball quality metrics for Statcast-style data",
    version
)]
struct Cli {
    /// Event file (.parquet, .csv or .json)
    file: PathBuf,

    /// TOML config file with thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hard-hit exit velocity threshold (mph)
    #[arg(long)]
    hard_hit_threshold: Option<f64>,

    /// Lower bound of the optimal launch angle window (degrees)
    #[arg(long, allow_hyphen_values = true)]
    la_low: Option<f64>,

    /// Upper bound of the optimal launch angle window (degrees)
    #[arg(long, allow_hyphen_values = true)]
    la_high: Option<f64>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter events and summarise one metric
    Summarize {
        /// Built-in view, applied first
        #[arg(long)]
        view: Option<String>,

        /// Extra condition such as `launch_angle>=8`; repeat to chain
        #[arg(long = "where", value_name = "EXPR", allow_hyphen_values = true)]
        conditions: Vec<String>,

        /// Metric to summarise
        #[arg(long, default_value = "exit_velocity")]
        metric: String,

        /// Number of histogram bins, 0 disables [default: Knuth's rule]
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Compare one batter with the league
    Player {
        /// Batter name as it appears in the data
        name: String,
    },

    /// League leaderboard by median exit velocity
    Leaderboard {
        /// Only batters with more than this many batted balls
        #[arg(long, default_value = "100")]
        min_bbe: usize,

        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    }
    .with_overrides(cli.hard_hit_threshold, cli.la_low, cli.la_high);
    let engine = SubsetEngine::new(config).context("invalid configuration")?;
    let dataset = load_file(&cli.file)?;

    match cli.command {
        Commands::Summarize {
            view,
            conditions,
            metric,
            bins,
        } => {
            let metric: Metric = metric.parse().map_err(anyhow::Error::msg)?;
            let mut steps: Vec<(String, Predicate)> = Vec::new();
            if let Some(name) = view {
                let view = standard_view(&name).with_context(|| {
                    let known: Vec<_> = standard_views().into_iter().map(|v| v.name).collect();
                    format!("unknown view '{name}' (known: {})", known.join(", "))
                })?;
                steps.push((view.name, view.predicate));
            }
            for expr in conditions {
                let predicate: Predicate = expr.parse().map_err(anyhow::Error::msg)?;
                steps.push((expr, predicate));
            }

            let mut subset = Subset::all(&dataset);
            for (label, predicate) in &steps {
                subset = engine.filter(&subset, predicate);
                if !cli.json {
                    println!(
                        "{label:<28} {:>7} events ({} undetermined)",
                        subset.len(),
                        subset.undetermined()
                    );
                }
            }

            let summary = engine.summarize(&subset, metric);
            let binning = bins.map_or(Binning::Knuth, Binning::Fixed);
            let histogram = engine.histogram(&subset, metric, binning);
            if cli.json {
                #[derive(Serialize)]
                struct Output {
                    metric: Metric,
                    events: usize,
                    summary: Summary,
                    histogram: Option<statcast_engine::Histogram>,
                }
                let out = Output {
                    metric,
                    events: subset.len(),
                    summary,
                    histogram,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_summary(metric, &summary);
                if let Some(h) = histogram {
                    for (i, count) in h.counts.iter().enumerate() {
                        println!("  [{:>8.2}, {:>8.2})  {count}", h.edges[i], h.edges[i + 1]);
                    }
                }
            }
        }

        Commands::Player { name } => {
            let id = dataset
                .find_batter(&name)
                .with_context(|| format!("no batter named '{name}' in {}", cli.file.display()))?;
            let profiles = report::league_profiles(&dataset, &engine);
            let profile = profiles
                .iter()
                .find(|p| p.batter == id)
                .cloned()
                .with_context(|| format!("no profile for batter {id}"))?;
            let report = PlayerReport::new(profile, &profiles);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Player: {} ({} batted balls)", report.profile.name, report.profile.bbe);
                println!("{:<12} {:>10} {:>10} {:>10}", "Stat", "Player", "League", "Pctile");
                for row in &report.rows {
                    println!(
                        "{:<12} {:>10} {:>10} {:>10}",
                        row.stat,
                        fmt_opt(row.player),
                        fmt_opt(row.league),
                        fmt_opt(row.percentile)
                    );
                }
            }
        }

        Commands::Leaderboard { min_bbe, limit } => {
            let profiles = report::league_profiles(&dataset, &engine);
            let mut board = report::leaderboard(&profiles, min_bbe);
            if let Some(limit) = limit {
                board.truncate(limit);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                println!(
                    "{:<24} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9}",
                    "Batter", "BBE", "Med EV", "90th EV", "Med LA", "Optimal%", "HardHit%"
                );
                for p in &board {
                    println!(
                        "{:<24} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9}",
                        p.name,
                        p.bbe,
                        fmt_opt(p.median_exit_velocity),
                        fmt_opt(p.p90_exit_velocity),
                        fmt_opt(p.median_launch_angle),
                        fmt_opt(p.optimal_pct),
                        fmt_opt(p.hard_hit_pct)
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_summary(metric: Metric, summary: &Summary) {
    match summary {
        Summary::NoData => println!("{metric}: no data"),
        Summary::Stats(s) => println!(
            "{metric}: n={} mean={:.2} min={:.2} median={:.2} p90={:.2} max={:.2}",
            s.count, s.mean, s.min, s.median, s.p90, s.max
        ),
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}
