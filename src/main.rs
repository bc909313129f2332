use clap::{Parser, Subcommand};
use failure_predictor::{
    config::Config,
    data::LabelRule,
    ml::{PipelineOptions, PipelineRun, PipelineRunner},
    profiles::{PipelineProfile, ProfileKind},
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

#[derive(Parser)]
#[command(name = "failure-predictor", version)]
#[command(about = "Train a decision tree on equipment data and predict failures", long_about = None)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "FAILURE_PREDICTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for the train/test split and synthetic data
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Fraction of rows held out for evaluation
    #[arg(short, long, global = true)]
    test_size: Option<f64>,

    /// Print the run as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Battery replacement from usage history CSV files
    Battery {
        /// Directory containing the CSV files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Measurement table file name
        #[arg(long)]
        primary: Option<PathBuf>,

        /// Problem timestamp table file name
        #[arg(long)]
        problems: Option<PathBuf>,
    },

    /// Turbine maintenance from synthetic readings
    Turbine {
        /// Number of synthetic rows
        #[arg(short, long)]
        rows: Option<usize>,

        /// independent-draws or generated-columns
        #[arg(short, long)]
        label_rule: Option<LabelRule>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (config, kind) = resolve_config(&cli)?;
    init_tracing(&config);

    tracing::info!("Starting failure-predictor v{}", env!("CARGO_PKG_VERSION"));

    execute(&cli, &config, kind)
}

/// Load configuration and apply command-line overrides.
///
/// Any load or validation failure is returned to the caller.
fn resolve_config(cli: &Cli) -> anyhow::Result<(Config, ProfileKind)> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(seed) = cli.seed {
        config.pipeline.seed = seed;
    }
    if let Some(test_size) = cli.test_size {
        config.pipeline.test_size = test_size;
    }

    let kind = match &cli.command {
        Some(Commands::Battery {
            data_dir,
            primary,
            problems,
        }) => {
            if let Some(dir) = data_dir {
                config.battery.data_dir = dir.clone();
            }
            if let Some(file) = primary {
                config.battery.primary_file = file.clone();
            }
            if let Some(file) = problems {
                config.battery.problems_file = file.clone();
            }
            ProfileKind::Battery
        }
        Some(Commands::Turbine { rows, label_rule }) => {
            if let Some(rows) = rows {
                config.turbine.rows = *rows;
            }
            if let Some(rule) = label_rule {
                config.turbine.label_rule = *rule;
            }
            ProfileKind::Turbine
        }
        None => config.pipeline.profile,
    };

    config.validate()?;

    Ok((config, kind))
}

/// Run one profile and print the outcome.
///
/// A missing input file is reported on stderr and yields exit status 1;
/// every other failure is returned as an error.
fn execute(cli: &Cli, config: &Config, kind: ProfileKind) -> anyhow::Result<ExitCode> {
    let profile = match kind {
        ProfileKind::Battery => PipelineProfile::battery(&config.battery)?,
        ProfileKind::Turbine => PipelineProfile::turbine(&config.turbine, config.pipeline.seed)?,
    };
    let options = PipelineOptions {
        test_size: config.pipeline.test_size,
        seed: config.pipeline.seed,
        max_depth: config.pipeline.max_depth,
    };

    let runner = PipelineRunner::new(profile, options);
    let run = match runner.run() {
        Ok(run) => run,
        Err(e) if e.is_data_unavailable() => {
            eprintln!("Error loading file: {}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        print_json(runner.profile(), &run)?;
    } else {
        print_text(runner.profile(), &run);
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("failure_predictor={}", config.observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_text(profile: &PipelineProfile, run: &PipelineRun) {
    if let Some(summary) = &run.summary {
        println!("{}", summary);
    }

    println!();
    println!("{}", run.trained.report());

    println!();
    println!("--- {} ---", profile.examples_title);
    for (i, (example, prediction)) in run.examples.iter().enumerate() {
        println!(
            "Input {}: {} -> Status: {}",
            i + 1,
            profile.describe_input(&example.record),
            prediction
        );
    }
}

fn print_json(profile: &PipelineProfile, run: &PipelineRun) -> anyhow::Result<()> {
    let examples: Vec<_> = run
        .examples
        .iter()
        .map(|(example, prediction)| {
            json!({
                "input": example.record,
                "label": prediction.label,
                "status": prediction.status,
            })
        })
        .collect();

    let body = json!({
        "profile": profile.kind,
        "schema": profile.schema.names(),
        "dataset": run.summary,
        "evaluation": run.trained.report(),
        "examples": examples,
    });

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
