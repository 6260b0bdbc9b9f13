use std::path::PathBuf;

use clap::Parser;
use cut_planner::catalog::StockCatalog;
use cut_planner::config::{self, PlanOptions};
use cut_planner::logging;
use cut_planner::plan::{BarSource, CutSource, CuttingPlan};
use cut_planner::pool::RemnantPool;
use cut_planner::solver::{Outcome, Report, Solver};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cut_planner",
    about = "Plans panel and bar purchases, reusing offcuts between requirements"
)]
struct Cli {
    /// Requirements document (JSON with `requirements` and optional `remnants`)
    #[arg(long)]
    input: PathBuf,

    /// Stock catalog (JSON); the built-in catalog when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Planner options (JSON)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Log level for messages on stderr
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

fn describe_source(source: &CutSource) -> String {
    match source {
        CutSource::NewStock {
            stock,
            pieces_per_unit,
            units,
        } => format!("from {units} x {stock} ({pieces_per_unit} per unit)"),
        CutSource::Remnant { remnant } => format!("from remnant #{remnant}"),
        CutSource::Offcut { remnant } => format!("from offcut #{remnant}"),
        CutSource::Tiered {
            tier,
            whole,
            segment,
        } => {
            let mut text = format!("{tier:?}: {} whole bar", whole.len());
            if whole.len() != 1 {
                text.push('s');
            }
            if let Some(segment) = segment {
                text.push_str(&format!(" + {segment} cut"));
            }
            text
        }
    }
}

fn print_plan(plan: &CuttingPlan) {
    let units = plan.units();
    println!(
        "  {} / {}: {} unit{} ({} whole)",
        plan.family,
        plan.category,
        units,
        if units == 1 { "" } else { "s" },
        plan.whole_units,
    );
    for usage in &plan.stock {
        println!(
            "    {} x{} ({} whole, {} cut)",
            usage.stock,
            usage.units(),
            usage.whole,
            usage.cut
        );
    }
    for cut in &plan.cuts {
        println!("    {} x{} {}", cut.shape, cut.count, describe_source(&cut.source));
    }
    for bar in &plan.bars {
        let from = match &bar.source {
            BarSource::Stock { stock } => stock.clone(),
            BarSource::Remnant { remnant } => format!("remnant #{remnant}"),
        };
        let kept = match bar.kept_as {
            Some(id) => format!(" [kept as #{id}]"),
            None => String::new(),
        };
        println!(
            "    bar {} ({}): {:?}, leftover {}{}",
            bar.length, from, bar.segments, bar.leftover, kept
        );
    }
    if plan.joints > 0 {
        println!("    joints: {}", plan.joints);
    }
}

fn print_report(report: &Report) {
    for requirement in &report.requirements {
        println!("{}:", requirement.id);
        match &requirement.outcome {
            Outcome::Planned { plans } => plans.iter().for_each(print_plan),
            Outcome::Failed { error, .. } => println!("  failed: {error}"),
        }
        println!();
    }

    let units: u32 = report.totals.stock.iter().map(|s| s.units()).sum();
    let waste = |w: Option<f64>| w.map_or_else(|| "-".to_string(), |w| format!("{w:.1}%"));
    let stock = format!("{units} unit{} of new stock", if units == 1 { "" } else { "s" });
    println!(
        "Summary: {stock}, {} area waste, {} length waste, {} remnant{} left, {} failed",
        waste(report.totals.area_waste_percent),
        waste(report.totals.length_waste_percent),
        report.remnants.len(),
        if report.remnants.len() == 1 { "" } else { "s" },
        report.failed(),
    );
}

fn main() {
    let cli = Cli::parse();
    logging::init_stderr(cli.log_level);

    let catalog = match &cli.catalog {
        Some(path) => config::load_catalog(path).unwrap_or_else(|e| fail(e)),
        None => StockCatalog::builtin(),
    };
    let options = match &cli.options {
        Some(path) => config::load_options(path).unwrap_or_else(|e| fail(e)),
        None => PlanOptions::default(),
    };
    let input = config::load_input(&cli.input).unwrap_or_else(|e| fail(e));

    let solver = Solver::new(catalog, options);
    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &input.remnants)
        .unwrap_or_else(|e| fail(e));
    let report = solver
        .solve(&input.requirements, &mut pool)
        .unwrap_or_else(|e| fail(e));

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(e),
        }
    } else {
        print_report(&report);
    }
}
