// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands them to a Layer 2 use case
// and prints the returned summary. Nothing else prints.
//
//   1. `prepare`  — labelled phishing pages → QA dataset
//   2. `evaluate` — score an inference engine on held-out samples
//   3. `analyze`  — metrics, triage and exports from a saved table
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AnalyzeArgs, Commands, EvaluateArgs, PrepareArgs};

use crate::domain::record::BrandMetrics;

#[derive(Parser, Debug)]
#[command(
    name = "phish-brand-qa",
    version = "0.1.0",
    about = "Identify the brand a phishing page impersonates with extractive QA over its HTML."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args)  => run_prepare(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Analyze(args)  => run_analyze(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let out_dir = args.out_dir.clone();
    let summary = PrepareUseCase::new(args.into_config()?).execute()?;

    println!("Records read:   {}", summary.records_read);
    println!("Records kept:   {}", summary.records_kept);
    println!("JSONL rows:     {}", summary.jsonl_rows);
    println!("Samples:        {}", summary.samples);
    println!("Brands:         {}", summary.brands);
    if let Some(n) = summary.aligned {
        println!("Aligned:        {}", n);
    }
    println!("Written to '{}'", out_dir.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let output  = args.output.clone();
    let summary = EvaluateUseCase::new(args.into_config()?).execute()?;

    println!(
        "\nAccuracy: {:.4} ({}/{})",
        summary.accuracy, summary.correct, summary.total
    );
    print_metrics("Per-brand metrics", &summary.per_brand);
    print_metrics("Low-performing brands", &summary.low_performing);
    if let Some(path) = output {
        println!("Results saved to '{}'", path.display());
    }
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    use crate::application::analyze_use_case::AnalyzeUseCase;

    let report = AnalyzeUseCase::new(args.into_config()?).execute()?;

    println!("\nRows: {}  Accuracy: {:.4}", report.rows, report.accuracy);
    print_metrics("Per-brand metrics", &report.metrics);
    print_metrics("Low-performing brands", &report.low_performing);
    if let Some(subset) = &report.subset_metrics {
        println!("\nSubset brands: {}", report.subset_brands.join(", "));
        print_metrics("Subset metrics", subset);
    }
    for e in &report.exported {
        println!(
            "Exported '{}' (inference '{}', identified '{}') to '{}'",
            e.record.ground_truth_brand,
            e.record.raw_extraction,
            e.record.resolved_brand,
            e.path.display()
        );
    }
    Ok(())
}

fn print_metrics(title: &str, metrics: &[BrandMetrics]) {
    println!("\n{} ({})", title, metrics.len());
    if metrics.is_empty() {
        return;
    }
    println!("{:<30} {:>6} {:>8} {:>9} {:>8}", "brand", "count", "recall", "precision", "f1");
    for m in metrics {
        println!(
            "{:<30} {:>6} {:>8.4} {:>9.4} {:>8.4}",
            m.brand, m.count, m.recall, m.precision, m.f1
        );
    }
}
