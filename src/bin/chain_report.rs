//! Chain Report CLI
//!
//! Runs stored chain snapshots through validation, liquidity scoring and
//! surface construction and prints a per-symbol summary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use premium_analytics::prelude::*;

/// Options chain analytics report
#[derive(Parser, Debug)]
#[command(name = "chain_report")]
#[command(about = "Validate option chain snapshots and summarize liquidity and volatility")]
struct Args {
    /// Snapshot JSON files
    #[arg(required = true)]
    snapshots: Vec<PathBuf>,

    /// Analytics config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Number of most liquid contracts to list
    #[arg(short, long, default_value = "5")]
    top: usize,
}

#[derive(Debug, Serialize)]
struct SymbolReport {
    symbol: String,
    valid: bool,
    quality_score: f64,
    confidence_level: f64,
    accepted: usize,
    rejected: usize,
    synthesized: usize,
    issues: usize,
    top_liquid: Vec<LiquidLine>,
    surface: Option<SurfaceLine>,
    note: Option<String>,
}

#[derive(Debug, Serialize)]
struct LiquidLine {
    contract: String,
    liquidity_score: f64,
    spread_percentage: f64,
    effective_spread: f64,
}

#[derive(Debug, Serialize)]
struct SurfaceLine {
    expirations: usize,
    strikes: usize,
    observed_fraction: f64,
    atm: Vec<(f64, f64)>,
    front_skew: Option<SkewMetrics>,
    term_structure: Option<TermStructure>,
}

fn summarize(analysis: &SymbolAnalysis, top: usize) -> SymbolReport {
    let v = &analysis.validation;

    let top_liquid = analysis
        .liquidity()
        .iter()
        .take(top)
        .map(|cl| LiquidLine {
            contract: cl.contract.label(),
            liquidity_score: cl.metrics.liquidity_score,
            spread_percentage: cl.metrics.spread_percentage,
            effective_spread: cl.metrics.effective_spread,
        })
        .collect();

    let surface = analysis.surface().map(|s| SurfaceLine {
        expirations: s.days.len(),
        strikes: s.strikes.len(),
        observed_fraction: s.observed_fraction(),
        atm: s.atm_term_structure(),
        front_skew: s.days.first().and_then(|&d| s.calculate_skew(d)),
        term_structure: s.calculate_term_structure(),
    });

    let note = match &analysis.outcome {
        AnalysisOutcome::Rejected { reason } => Some(reason.clone()),
        AnalysisOutcome::Analyzed {
            surface: SurfaceStatus::Unavailable { reason },
            ..
        } => Some(reason.clone()),
        _ => None,
    };

    SymbolReport {
        symbol: analysis.symbol.clone(),
        valid: v.is_valid,
        quality_score: v.quality_score,
        confidence_level: v.confidence_level,
        accepted: v.accepted_contracts,
        rejected: v.rejected_contracts,
        synthesized: v.synthesized_contracts,
        issues: v.issues.len(),
        top_liquid,
        surface,
        note,
    }
}

fn print_report(report: &SymbolReport) {
    println!("{}", report.symbol);
    println!("{}", "=".repeat(report.symbol.len()));
    println!(
        "  Valid: {}  quality {:.3}  confidence {:.3}",
        report.valid, report.quality_score, report.confidence_level
    );
    println!(
        "  Contracts: {} accepted, {} rejected, {} synthesized, {} issues",
        report.accepted, report.rejected, report.synthesized, report.issues
    );

    if !report.top_liquid.is_empty() {
        println!("\n  Most liquid:");
        for line in &report.top_liquid {
            println!(
                "    {:<28} score {:.2}  spread {:>6.2}%  effective {:>6.2}%",
                line.contract,
                line.liquidity_score,
                line.spread_percentage * 100.0,
                line.effective_spread * 100.0
            );
        }
    }

    if let Some(s) = &report.surface {
        println!(
            "\n  Surface: {} strikes x {} expirations ({:.0}% quoted)",
            s.strikes,
            s.expirations,
            s.observed_fraction * 100.0
        );
        for (dte, vol) in &s.atm {
            println!("    {:>4.0}d ATM vol {:.2}%", dte, vol * 100.0);
        }
        if let Some(skew) = &s.front_skew {
            println!(
                "    Front skew: call {:.3}  put {:.3}  net {:+.3}",
                skew.call_skew_ratio, skew.put_skew_ratio, skew.net_skew
            );
        }
        if let Some(ts) = &s.term_structure {
            println!(
                "    Term structure: short {:.2}%  long {:.2}%  premium {:+.2}%",
                ts.short_term_avg * 100.0,
                ts.long_term_avg * 100.0,
                ts.term_premium * 100.0
            );
        }
    }

    if let Some(note) = &report.note {
        println!("\n  Note: {}", note);
    }
    println!();
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("premium_analytics=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => AnalyticsConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };

    let snapshots = args
        .snapshots
        .iter()
        .map(|path| read_snapshot(path).with_context(|| format!("reading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;
    info!("Loaded {} snapshots", snapshots.len());

    let pipeline =
        AnalyticsPipeline::from_config(&config)?.with_cache(Arc::new(MemorySurfaceCache::new()));
    let reports: Vec<SymbolReport> = pipeline
        .process_batch(snapshots)
        .iter()
        .map(|analysis| summarize(analysis, args.top))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    Ok(())
}
