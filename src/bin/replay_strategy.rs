//! Replay one strategy token with its full contribution ledger

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use m40_advisor::assumptions::JanuaryUmaPolicy;
use m40_advisor::scenario::{replay, GeneratorConfig};
use m40_advisor::{load_tables, Dependents, ReferenceTables};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "replay_strategy", about = "Replay a Modalidad 40 strategy token")]
struct Args {
    /// Token as returned with each scenario
    token: String,

    /// conyuge or ninguno
    #[arg(long, default_value = "ninguno")]
    dependents: String,

    /// Directory with substitute CSV reference tables
    #[arg(short, long)]
    tables: Option<PathBuf>,

    /// Use the current year's UMA for January contributions
    #[arg(long)]
    january_current_year: bool,

    /// Report ROI on pension net of ISR
    #[arg(long)]
    apply_isr: bool,

    /// Write the contribution ledger as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dependents = Dependents::from_code(&args.dependents)
        .ok_or_else(|| anyhow!("unknown dependents '{}'", args.dependents))?;
    let tables = match &args.tables {
        Some(dir) => ReferenceTables::from_loaded(
            &load_tables(dir).with_context(|| format!("loading tables from {}", dir.display()))?,
        ),
        None => ReferenceTables::default(),
    };
    let config = GeneratorConfig {
        january_policy: if args.january_current_year {
            JanuaryUmaPolicy::CurrentYear
        } else {
            JanuaryUmaPolicy::PriorYear
        },
        apply_isr: args.apply_isr,
        ..Default::default()
    };

    let report = replay(&args.token, dependents, &tables, config)?;

    if let Some(path) = &args.csv {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for record in &report.ledger {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let strategy = &report.scenario.strategy;
    println!("Token: {}", report.token);
    println!(
        "Strategy: {} months, UMA {}, {}, from {}",
        strategy.duration_months,
        strategy.uma_level,
        strategy.mode,
        strategy.start.format("%Y-%m")
    );

    let metrics = match (report.scenario.metrics(), report.scenario.error()) {
        (Some(metrics), _) => metrics,
        (None, Some(error)) => {
            println!("Scenario failed: {}", error);
            return Ok(());
        }
        (None, None) => return Ok(()),
    };

    println!("{:<6} {:<4} {:>10} {:>10} {:>8} {:>12}", "Year", "Mon", "UMA", "SDI", "Rate", "Payment");
    for r in &report.ledger {
        println!(
            "{:<6} {:<4} {:>10.2} {:>10.2} {:>8.4} {:>12.2}",
            r.year, r.month, r.daily_uma, r.daily_sdi, r.rate, r.monthly_contribution
        );
    }

    println!();
    println!("Average SDI:        {:>12.2}", metrics.average_sdi);
    println!("Total weeks:        {:>12}", metrics.total_weeks);
    println!("Pension start:      {:>12}", metrics.pension_start.to_string());
    println!("Age at pension:     {:>12}", metrics.age_at_pension);
    println!("Gross pension:      {:>12.2}", metrics.gross_pension);
    println!("With year-end bonus:{:>12.2}", metrics.pension_with_bonus);
    println!("Investment:         {:>12.2}", metrics.investment_total);
    println!("ROI:                {:>12.4}", metrics.roi);
    println!("Payback (months):   {:>12}", metrics.payback_months);
    println!(
        "Pension percent:    {:>12.4} (art. 167 {:.4})",
        metrics.effective_percent, metrics.bracket_percent
    );
    if metrics.edge_guard_applied {
        println!("(raised to the lower bracket's edge amount)");
    }
    if metrics.floor_applied {
        println!("(minimum guaranteed pension applied)");
    }

    println!();
    println!("{:<6} {:>12} {:>10} {:>12} {:>8}", "Year", "Gross", "ISR", "Net", "Eff%");
    for y in &report.net_projection {
        println!(
            "{:<6} {:>12.2} {:>10.2} {:>12.2} {:>8.2}",
            y.year_index + 1,
            y.gross_monthly,
            y.isr_monthly,
            y.net_monthly,
            y.effective_rate
        );
    }

    Ok(())
}
