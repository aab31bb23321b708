//! Per-year emitter table for a combined dataset: value, quantile bucket,
//! percentile and rank for every country, highest emitter first.
//! Useful for checking a freshly combined file before it ships.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use methane_core::classify::{classify_year, ordinal};
use methane_core::config::{MapConfig, MAX_YEAR};
use methane_core::{Dataset, YearValue};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rankings", about = "Print the per-year emissions ranking of a combined dataset")]
struct Args {
    /// Combined GeoJSON written by `combine`.
    #[arg(short, long, default_value = "data/country-emissions.geo.json")]
    input: PathBuf,

    /// Year to classify.
    #[arg(short, long, default_value_t = MAX_YEAR)]
    year: i32,

    /// Number of quantile buckets (defaults to the map palette size).
    #[arg(short, long)]
    buckets: Option<usize>,

    /// Emit JSON instead of a text table.
    #[arg(long)]
    json: bool,
}

// ── Output rows ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
struct Row {
    id: String,
    name: String,
    value: Option<f64>,
    bucket: Option<usize>,
    percentile: Option<u32>,
    rank: Option<usize>,
}

fn build_rows(dataset: &Dataset, year: i32, buckets: usize) -> Vec<Row> {
    let classes = classify_year(dataset, year, buckets);
    let mut rows: Vec<Row> = dataset
        .features
        .iter()
        .zip(classes)
        .map(|(f, c)| Row {
            id: f.id.clone(),
            name: f.name().to_string(),
            value: f.emissions(year).value(),
            bucket: c.bucket,
            percentile: c.percentile(buckets),
            rank: c.rank,
        })
        .collect();
    // Ranked rows first, ties in feature order; no-data rows last by name.
    rows.sort_by(|a, b| match (a.rank, b.rank) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    rows
}

fn format_table(rows: &[Row], year: i32) -> String {
    let mut out = format!(
        "{:>6}  {:<5} {:<36} {:>14} {:>6} {:>10}\n",
        "rank", "id", "country", format!("kt CO2e {year}"), "bucket", "percentile"
    );
    for row in rows {
        let rank = row.rank.map_or_else(|| "-".to_string(), ordinal);
        let value = row
            .value
            .map_or_else(|| YearValue::NoData.to_string(), |v| format!("{v:.1}"));
        let bucket = row.bucket.map_or_else(|| "-".to_string(), |b| b.to_string());
        let percentile = row.percentile.map_or_else(|| "-".to_string(), |p| p.to_string());
        out.push_str(&format!(
            "{:>6}  {:<5} {:<36} {:>14} {:>6} {:>10}\n",
            rank, row.id, row.name, value, bucket, percentile
        ));
    }
    out
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let buckets = args.buckets.unwrap_or_else(|| MapConfig::default().color_stops());
    if buckets == 0 {
        bail!("--buckets must be at least 1");
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let dataset = Dataset::from_json_str(&text)
        .with_context(|| format!("decoding {}", args.input.display()))?;

    if let Some((first, last)) = dataset.year_span() {
        if args.year < first || args.year > last {
            tracing::warn!(year = args.year, first, last, "year outside the dataset's span");
        }
    }

    let rows = build_rows(&dataset, args.year, buckets);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", format_table(&rows, args.year));
        let ranked = rows.iter().filter(|r| r.rank.is_some()).count();
        eprintln!("{ranked} of {} countries have data for {}.", rows.len(), args.year);
    }
    Ok(())
}
