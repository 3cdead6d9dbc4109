//! CLI entry point for the preprocessing pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use titanic_prep::{
    ImageFormat, PrepConfig, PrepError, StageKind, StageSummary, ZeroVariancePolicy, run_all,
    run_stage,
};
use tracing::{error, info};

/// CLI-compatible chart format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImageFormat {
    /// Vector charts, no font libraries needed
    Svg,
    /// Raster charts, the default (requires the `png` feature)
    Png,
}

impl From<CliImageFormat> for ImageFormat {
    fn from(cli: CliImageFormat) -> Self {
        match cli {
            CliImageFormat::Svg => ImageFormat::Svg,
            CliImageFormat::Png => ImageFormat::Png,
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Shape, head, describe table, null counts and diagnostic charts
    Explore,
    /// Label and one-hot encoding of the categorical column
    Encode,
    /// Standardization and min-max normalization of numerical columns
    Scale,
    /// IQR outlier analysis and the cleaned table
    Outliers,
    /// All four stages in order (default)
    All,
}

impl Command {
    fn stages(self) -> Vec<StageKind> {
        match self {
            Command::Explore => vec![StageKind::Explore],
            Command::Encode => vec![StageKind::Encode],
            Command::Scale => vec![StageKind::Scale],
            Command::Outliers => vec![StageKind::Outliers],
            Command::All => StageKind::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory preprocessing pipeline for the Titanic passenger table",
    long_about = "Runs the explorer, encoder, scaler and outlier handler stages over a\n\
                  passenger CSV, writing text reports, charts and a cleaned table.\n\n\
                  EXAMPLES:\n  \
                  # All stages with the default paths (titanic.csv, current directory)\n  \
                  titanic-prep\n\n  \
                  # Only the outlier stage, results under out/\n  \
                  titanic-prep -i data/titanic.csv -o out outliers\n\n  \
                  # Stage summaries as JSON\n  \
                  titanic-prep --json | jq '.[].artifacts'"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the passenger CSV file
    #[arg(short, long, default_value = "titanic.csv", global = true)]
    input: PathBuf,

    /// Directory receiving reports, charts and the cleaned table
    #[arg(short, long, default_value = ".", global = true)]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print stage summaries as JSON to stdout
    ///
    /// Disables all logs; errors are printed as {"error": {code, message}}.
    #[arg(long, global = true)]
    json: bool,

    /// Fail on constant numerical columns instead of scaling them by 1
    #[arg(long, global = true)]
    strict_variance: bool,

    /// Chart file format
    #[arg(long, value_enum, default_value = "png", global = true)]
    format: CliImageFormat,

    /// TrueType font for PNG chart labels
    #[arg(long, global = true)]
    font: Option<PathBuf>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON summaries.
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

fn build_config(args: &Args) -> Result<PrepConfig> {
    let policy = if args.strict_variance {
        ZeroVariancePolicy::Reject
    } else {
        ZeroVariancePolicy::UnitScale
    };

    let mut builder = PrepConfig::builder()
        .input_path(&args.input)
        .output_dir(&args.output)
        .zero_variance_policy(policy)
        .image_format(args.format.into());
    if let Some(ref font) = args.font {
        builder = builder.font_path(font);
    }
    Ok(builder.build()?)
}

fn run_stages(
    stages: &[StageKind],
    config: &PrepConfig,
) -> titanic_prep::PrepResult<Vec<StageSummary>> {
    if stages == StageKind::ALL {
        return run_all(config);
    }
    stages.iter().map(|&kind| run_stage(kind, config)).collect()
}

fn print_summary(summaries: &[StageSummary]) {
    println!();
    println!("Preprocessing complete:");
    for summary in summaries {
        println!(
            "  {:<16} {} ({} file(s) written)",
            summary.stage.display_name(),
            summary.report_path.display(),
            summary.artifacts.len()
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Validate input file exists
    if !args.input.exists() {
        let err = PrepError::MissingInput(args.input.clone());
        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "error": err }))?
            );
        }
        return Err(anyhow!(err));
    }

    let config = build_config(&args)?;
    let stages = args.command.unwrap_or(Command::All).stages();
    info!(
        "Running {} stage(s) on {}",
        stages.len(),
        config.input_path.display()
    );

    match run_stages(&stages, &config) {
        Ok(summaries) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print_summary(&summaries);
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "error": err }))?
                );
            } else {
                error!("Stage failed [{}]: {}", err.error_code(), err);
            }
            Err(anyhow!(err))
        }
    }
}
