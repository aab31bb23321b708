/// Build-time merge of country boundaries with the World Bank methane table.
/// Writes the combined GeoJSON the map loads at runtime.
///
/// Unmatched countries on either side are logged and skipped. Malformed input
/// aborts before the output file is touched.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use methane_core::config::DEFAULT_BASE_YEAR;
use methane_core::merge::{merge_sources, MergeReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "combine",
    about = "Merge country boundary GeoJSON with per-country methane emissions CSV"
)]
struct Args {
    /// Country boundaries (GeoJSON FeatureCollection, feature `id` = ISO alpha-3)
    #[arg(long, default_value = "data/raw/countries.geo.json")]
    countries: PathBuf,

    /// World Bank indicator export (name, code, 2 ignored columns, one cell per year)
    #[arg(long, default_value = "data/raw/API_EN.ATM.METH.KT.CE_DS2_en_csv_v2_823144.csv")]
    emissions: PathBuf,

    /// Combined output file
    #[arg(short, long, default_value = "data/country-emissions.geo.json")]
    output: PathBuf,

    /// Year of the first year column when the table has no header row
    #[arg(long, default_value_t = DEFAULT_BASE_YEAR)]
    base_year: i32,
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

fn combine(countries: &Path, emissions: &Path, base_year: i32) -> Result<(String, MergeReport)> {
    let boundaries_json = fs::read_to_string(countries)
        .with_context(|| format!("reading country boundaries {}", countries.display()))?;
    let emissions_csv = fs::read_to_string(emissions)
        .with_context(|| format!("reading emissions table {}", emissions.display()))?;

    merge_sources(&boundaries_json, &emissions_csv, base_year).with_context(|| {
        format!(
            "merging {} with {}",
            countries.display(),
            emissions.display()
        )
    })
}

/// Write via a sibling temp file and rename, so readers never observe a
/// half-written artifact.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .with_context(|| format!("output path {} has no file name", path.display()))?;
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("moving {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (text, report) = combine(&args.countries, &args.emissions, args.base_year)?;
    write_atomically(&args.output, &text)?;

    info!(
        features = report.dataset.len(),
        dropped_boundaries = report.unmatched_features.len(),
        missing_boundaries = report.missing_countries.len(),
        output = %args.output.display(),
        "combined dataset written"
    );
    if let Some((first, last)) = report.dataset.year_span() {
        info!(first, last, "year span");
    }
    Ok(())
}
