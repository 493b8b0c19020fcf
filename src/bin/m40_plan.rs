//! Generate and rank every Modalidad 40 strategy for one request
//!
//! Reads a JSON request, writes the JSON response (stdout or `--output`)
//! and optionally a flat CSV of the returned scenarios.

use anyhow::{Context, Result};
use clap::Parser;
use m40_advisor::scenario::{plan, GeneratorConfig, PlanRequest, PreferenceFilter, RiskBands};
use m40_advisor::{load_tables, ReferenceTables, ScenarioResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "m40_plan", about = "Rank Modalidad 40 contribution strategies")]
struct Args {
    /// Request JSON file
    #[arg(short, long)]
    request: PathBuf,

    /// Directory with substitute CSV reference tables
    #[arg(short, long)]
    tables: Option<PathBuf>,

    /// Generator and filter settings (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Response JSON file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the returned scenarios as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

/// Settings file layout
#[derive(Debug, Default, Deserialize)]
struct PlanConfig {
    #[serde(flatten)]
    generator: GeneratorConfig,
    #[serde(default)]
    risk_bands: RiskBands,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    token: &'a str,
    duration_months: u32,
    uma_level: u32,
    mode: &'a str,
    start: String,
    gross_pension: Option<f64>,
    pension_with_bonus: Option<f64>,
    investment_total: Option<f64>,
    monthly_contribution_max: Option<f64>,
    roi: Option<f64>,
    payback_months: Option<u32>,
    net_pension: Option<f64>,
    error: Option<String>,
}

impl<'a> CsvRow<'a> {
    fn from_result(result: &'a ScenarioResult) -> Self {
        let metrics = result.metrics();
        Self {
            token: &result.token,
            duration_months: result.strategy.duration_months,
            uma_level: result.strategy.uma_level,
            mode: result.strategy.mode.code(),
            start: result.strategy.start.format("%Y-%m").to_string(),
            gross_pension: metrics.map(|m| m.gross_pension),
            pension_with_bonus: metrics.map(|m| m.pension_with_bonus),
            investment_total: metrics.map(|m| m.investment_total),
            monthly_contribution_max: metrics.map(|m| m.monthly_contribution_max),
            roi: metrics.map(|m| m.roi),
            payback_months: metrics.map(|m| m.payback_months),
            net_pension: metrics.and_then(|m| m.isr.map(|isr| isr.net)),
            error: result.error().map(|e| e.to_string()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let request: PlanRequest = read_json(&args.request)?;

    let tables = match &args.tables {
        Some(dir) => ReferenceTables::from_loaded(
            &load_tables(dir).with_context(|| format!("loading tables from {}", dir.display()))?,
        ),
        None => ReferenceTables::default(),
    };

    let config: PlanConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => PlanConfig::default(),
    };

    let filter = PreferenceFilter::new(config.risk_bands);
    let response = plan(&request, &tables, config.generator, &filter)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &response)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &response)?;
            writeln!(out)?;
        }
    }

    if let Some(path) = &args.csv {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for result in &response.results {
            writer.serialize(CsvRow::from_result(result))?;
        }
        writer.flush()?;
    }

    let meta = &response.metadata;
    eprintln!(
        "{} generated, {} failed, {} over ceiling, {} returned in {:?}",
        meta.total_generated,
        meta.total_failed,
        meta.skipped_over_ceiling,
        response.results.len(),
        start.elapsed()
    );
    if let Some(note) = &meta.note {
        eprintln!("{}", note);
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}
