use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cutting_stock::features::WasteFeatures;
use cutting_stock::layout::PatternLayout;
use cutting_stock::problem::Problem;
use cutting_stock::report::{OptimizationResult, RunningStats, StatsSnapshot};
use cutting_stock::solver::Solver;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cutting_stock",
    about = "2D cutting stock optimizer over generated cutting patterns"
)]
struct Cli {
    /// Problem files in JSON; each is solved in its own session
    #[arg(long = "problem", num_args = 1.., required_unless_present = "example")]
    problems: Vec<PathBuf>,

    /// Solve a bundled problem instead: paper or glass
    #[arg(long, conflicts_with = "problems")]
    example: Option<String>,

    /// Maximum number of patterns to generate (overrides the problem file)
    #[arg(long, env = "CUTTING_STOCK_MAX_PATTERNS")]
    max_patterns: Option<usize>,

    /// Solver time limit in seconds (overrides the problem file)
    #[arg(long, env = "CUTTING_STOCK_TIME_LIMIT")]
    time_limit: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show the placements of each used pattern
    #[arg(long)]
    layout: bool,

    /// Show the waste predictor feature vector of each problem
    #[arg(long)]
    features: bool,
}

#[derive(Serialize)]
struct Report {
    problem: String,
    result: OptimizationResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    layouts: Vec<PatternLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<WasteFeatures>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let problems: Vec<(String, Problem)> = match &cli.example {
        Some(name) => vec![(name.clone(), Problem::example(name)?)],
        None => cli
            .problems
            .iter()
            .map(|path| -> anyhow::Result<(String, Problem)> {
                let problem = Problem::from_path(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                Ok((path.display().to_string(), problem))
            })
            .collect::<anyhow::Result<_>>()?,
    };

    let stats = Arc::new(RunningStats::new());
    let mut reports = Vec::with_capacity(problems.len());

    for (label, problem) in problems {
        let mut solver = Solver::from_problem(&problem, stats.clone())
            .with_context(|| format!("invalid problem {label}"))?;
        let mut config = solver.config().clone();
        if let Some(max_patterns) = cli.max_patterns {
            config.max_patterns = max_patterns;
        }
        if let Some(time_limit) = cli.time_limit {
            config.time_limit = time_limit;
        }
        solver.set_config(config.use_substitution, config.max_patterns, config.time_limit)?;

        let result = solver.solve();
        let layouts = if cli.layout {
            solver.used_layouts()
        } else {
            Vec::new()
        };
        let features = cli.features.then(|| WasteFeatures::from(&problem));
        let label = problem.name.clone().unwrap_or(label);

        let report = Report {
            problem: label,
            result,
            layouts,
            features,
        };
        if !cli.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_stats(&stats.snapshot());
    }
    Ok(())
}

fn print_report(report: &Report) {
    let result = &report.result;
    println!("{} [{}]: {}", report.problem, result.id, result.status);
    for line in &result.instructions {
        println!("  {line}");
    }
    for used in &result.summary.used_patterns {
        println!(
            "  pattern {} x{} on {} ({:.1} waste per unit)",
            used.pattern_id, used.count, used.material_name, used.waste_per_unit
        );
    }
    for layout in &report.layouts {
        println!(
            "  layout of pattern {} ({} {}x{}):",
            layout.pattern_id, layout.material_name, layout.material_width, layout.material_height
        );
        for p in &layout.pieces {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("    {} {}x{} @ ({}, {}){}", p.name, p.width, p.height, p.x, p.y, rot);
        }
    }
    for unmet in &result.unmet_demand {
        println!(
            "  unmet: {} (id {}) {} of {}",
            unmet.name, unmet.piece_id, unmet.supplied, unmet.demand
        );
    }
    if let Some(error) = &result.error {
        println!("  note: {error}");
    }
    if let Some(f) = &report.features {
        println!(
            "  features: {} materials, {} pieces, material area {:.1}, piece area {:.1}",
            f.num_materials, f.num_pieces, f.total_material_area, f.total_pieces_area
        );
        println!("  estimated utilization {:.2}", f.estimated_utilization);
    }

    let waste = result
        .waste
        .map_or_else(|| "n/a".to_string(), |w| format!("{w:.1}"));
    println!(
        "Summary: {} unit{} cut, waste {}, {:.1}% utilization, {:.2}s",
        result.patterns_used,
        if result.patterns_used == 1 { "" } else { "s" },
        waste,
        result.summary.material_utilization_pct,
        result.time,
    );
    println!();
}

fn print_stats(stats: &StatsSnapshot) {
    println!(
        "Stats: {} optimization{}, average waste {:.1}, average time {:.2}s",
        stats.total_optimizations,
        if stats.total_optimizations == 1 { "" } else { "s" },
        stats.avg_waste,
        stats.avg_time,
    );
}
