//! CLI entry point for the nutrient similarity index.

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use nutrient_index::config::DEFAULT_LABEL_COLUMN;
use nutrient_index::{
    EngineConfig, EvaluationReport, FeatureSchema, FittedModel, NUTRIENT_DESCRIPTIONS, Neighbor,
    RawValue, RecommendationEngine, evaluate, ingest, train_test_split,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Nearest-neighbor food recommendations from nutrient profiles",
    long_about = "Fits an exact k-nearest-neighbor index over standardized nutrient profiles \
                  and recommends the foods closest to a queried profile.\n\n\
                  FEATURE ORDER:\n  \
                  ENERC PROTCNT CHOAVLDF FATCE FIBTG ASH FIBINS\n\n\
                  EXAMPLES:\n  \
                  # Fit a model from a food composition table\n  \
                  nutrient-index fit -i foods.csv -o model.json\n\n  \
                  # Fit and report holdout recall\n  \
                  nutrient-index fit -i foods.csv --evaluate\n\n  \
                  # Recommend five foods (missing values allowed)\n  \
                  nutrient-index recommend -m model.json 200 10 30 5 NA 900 20"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a model from a CSV table and save it
    Fit(FitArgs),
    /// Recommend the foods nearest to a nutrient profile
    Recommend(RecommendArgs),
    /// Show the statistics stored in a model
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Path to the CSV food composition table
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the fitted model
    #[arg(short, long, default_value = "nutrient_model.json")]
    output: PathBuf,

    /// Column holding the food name
    #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
    label_column: String,

    /// Default number of recommendations (also used for evaluation)
    #[arg(short, long, default_value = "5")]
    k: usize,

    /// Evaluate on a seeded holdout split before fitting on all rows
    #[arg(long)]
    evaluate: bool,

    /// Share of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    holdout_fraction: f64,

    /// Seed for the holdout shuffle
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Path to a model written by `fit`
    #[arg(short, long)]
    model: PathBuf,

    /// Number of foods to recommend
    #[arg(short, long, default_value = "5", allow_negative_numbers = true)]
    k: i64,

    /// Nutrient values in feature order; `NA` or blanks are imputed
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    values: Vec<String>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Path to a model written by `fit`
    #[arg(short, long)]
    model: PathBuf,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    match &cli.command {
        Command::Fit(args) => run_fit(args, cli.json),
        Command::Recommend(args) => run_recommend(args, cli.json),
        Command::Inspect(args) => run_inspect(args, cli.json),
    }
}

fn run_fit(args: &FitArgs, json_output: bool) -> Result<()> {
    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = EngineConfig::builder()
        .label_column(&args.label_column)
        .default_k(args.k)
        .holdout_fraction(args.holdout_fraction)
        .seed(args.seed)
        .build()?;

    let dataset = ingest::load_dataset(&args.input, &config)?;
    let engine = RecommendationEngine::new(config)?;

    let evaluation = if args.evaluate {
        let cfg = engine.config();
        let (train, test) = train_test_split(&dataset, cfg.holdout_fraction, cfg.seed)?;
        info!("Evaluating on {} held-out samples", test.len());
        let holdout_model = engine.fit(&train)?;
        Some(evaluate(&holdout_model, &test, i64::try_from(cfg.default_k)?)?)
    } else {
        None
    };

    let model = engine.fit(&dataset)?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    model.save(&args.output)?;

    if json_output {
        let summary = json!({
            "model": args.output,
            "samples": model.metadata().n_samples,
            "features": model.schema().names(),
            "evaluation": evaluation,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("{}", "=".repeat(60));
    println!("MODEL FITTED");
    println!("{}", "=".repeat(60));
    println!("  Samples:  {}", model.metadata().n_samples);
    println!("  Features: {}", model.schema().names().join(", "));
    println!("  Saved to: {}", args.output.display());
    if let Some(report) = &evaluation {
        print_evaluation(report);
    }
    Ok(())
}

fn print_evaluation(report: &EvaluationReport) {
    println!();
    println!("HOLDOUT EVALUATION");
    println!("{}", "-".repeat(40));
    println!("  Test samples:          {}", report.evaluated);
    if report.skipped > 0 {
        println!("  Skipped:               {}", report.skipped);
    }
    println!("  Recall@{}:              {:.3}", report.k, report.recall_at_k);
    println!("  Mean nearest distance: {:.4}", report.mean_nearest_distance);
}

fn run_recommend(args: &RecommendArgs, json_output: bool) -> Result<()> {
    let model = FittedModel::load(&args.model)?;
    let query: Vec<RawValue> = args.values.iter().map(|v| RawValue::from(v.as_str())).collect();
    let neighbors = model.recommend_neighbors(&query, args.k)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&neighbors)?);
        return Ok(());
    }

    print_neighbors(&neighbors);
    Ok(())
}

fn print_neighbors(neighbors: &[Neighbor]) {
    if neighbors.is_empty() {
        println!("No recommendations.");
        return;
    }

    println!("{:<6} {:<50} {:>10}", "Rank", "Food", "Distance");
    println!("{}", "-".repeat(68));
    for (rank, neighbor) in neighbors.iter().enumerate() {
        println!(
            "{:<6} {:<50} {:>10.4}",
            rank + 1,
            truncate_str(&neighbor.label, 49),
            neighbor.distance
        );
    }
}

fn run_inspect(args: &InspectArgs, json_output: bool) -> Result<()> {
    let model = FittedModel::load(&args.model)?;
    let schema = model.schema();

    if json_output {
        let features: Vec<_> = (0..schema.len())
            .map(|i| {
                json!({
                    "name": schema.name(i),
                    "median": model.imputation().fill_value(i),
                    "mean": model.scaling().mean(i),
                    "std_dev": model.scaling().std_dev(i),
                })
            })
            .collect();
        let summary = json!({
            "metadata": model.metadata(),
            "features": features,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let meta = model.metadata();
    let is_nutrient_schema = *schema == FeatureSchema::nutrients();
    println!("Fitted at: {}", meta.fitted_at);
    println!("Samples:   {}", meta.n_samples);
    println!("Format:    v{}", meta.format_version);
    println!();
    println!(
        "{:<10} {:<24} {:>12} {:>12} {:>12}",
        "Feature", "Description", "Median", "Mean", "Std dev"
    );
    println!("{}", "-".repeat(74));
    for i in 0..schema.len() {
        let description = if is_nutrient_schema {
            NUTRIENT_DESCRIPTIONS[i]
        } else {
            ""
        };
        println!(
            "{:<10} {:<24} {:>12.4} {:>12.4} {:>12.4}",
            truncate_str(schema.name(i), 9),
            description,
            model.imputation().fill_value(i).unwrap_or(f64::NAN),
            model.scaling().mean(i).unwrap_or(f64::NAN),
            model.scaling().std_dev(i).unwrap_or(f64::NAN),
        );
    }
    Ok(())
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
