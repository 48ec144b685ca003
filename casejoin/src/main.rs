use anyhow::{Context, Result};
use casejoin_core::{CaseJoiner, JoinConfig, JoinError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

mod formatter;

#[derive(Parser)]
#[command(name = "casejoin")]
#[command(about = "Join test-case identifiers against a reference sheet", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log file (appended to)
    #[arg(long, value_name = "LOG", default_value = "app.log", global = true)]
    log_file: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract identifiers, match them and write the result workbook
    Run {
        /// Workbook holding the reference sheet
        #[arg(value_name = "REFERENCE")]
        reference: PathBuf,

        /// Workbook holding the identifier sheet (defaults to REFERENCE)
        #[arg(value_name = "IDENTIFIERS")]
        identifiers: Option<PathBuf>,

        /// Output workbook
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Identifier column in the identifier sheet
        #[arg(long)]
        goal_column: Option<String>,

        /// Step column carried into the Checker output column
        #[arg(long, conflicts_with = "no_step")]
        step_column: Option<String>,

        /// Ignore any step column from the configuration
        #[arg(long)]
        no_step: bool,

        /// Match identifiers in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Print the value column of reference rows matching a name
    Find {
        /// Workbook holding the reference sheet
        #[arg(value_name = "REFERENCE")]
        reference: PathBuf,

        /// Name to look for (case-insensitive substring)
        #[arg(value_name = "NAME")]
        name: String,

        #[command(flatten)]
        columns: ColumnArgs,
    },
}

#[derive(Args)]
struct ColumnArgs {
    /// Identifier column in the reference sheet
    #[arg(long)]
    id_column: Option<String>,

    /// Value column in the reference sheet
    #[arg(long)]
    value_column: Option<String>,
}

impl ColumnArgs {
    fn apply(self, config: &mut JoinConfig) {
        if let Some(id_column) = self.id_column {
            config.reference.id_column = id_column;
        }
        if let Some(value_column) = self.value_column {
            config.reference.value_column = value_column;
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_file, cli.verbose)?;
    tracing::info!("casejoin start");

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        JoinConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("casejoin.toml");
        if default_config_path.exists() {
            JoinConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            JoinConfig::default()
        }
    };

    let exit_code = match cli.command {
        Commands::Run {
            reference,
            identifiers,
            output,
            columns,
            goal_column,
            step_column,
            no_step,
            parallel,
        } => {
            columns.apply(&mut config);
            if let Some(output) = output {
                config.output.path = output;
            }
            if let Some(goal_column) = goal_column {
                config.identifiers.goal_column = goal_column;
            }
            if step_column.is_some() {
                config.identifiers.step_column = step_column;
            }
            if no_step {
                config.identifiers.step_column = None;
            }
            config.parallel |= parallel;
            config.validate().context("Invalid configuration")?;

            let identifiers = identifiers.unwrap_or_else(|| reference.clone());
            run(config, &reference, &identifiers, &cli.format)?
        }
        Commands::Find {
            reference,
            name,
            columns,
        } => {
            columns.apply(&mut config);
            config.validate().context("Invalid configuration")?;

            let joiner = CaseJoiner::with_config(config);
            let values = joiner
                .find(&reference, &name)
                .map_err(log_failure)
                .with_context(|| format!("Failed to search {}", reference.display()))?;

            match cli.format {
                OutputFormat::Human => formatter::print_values_human(&name, &values),
                OutputFormat::Json => formatter::print_values_json(&name, &values)?,
            }
            0
        }
    };

    tracing::info!("casejoin end");
    std::process::exit(exit_code);
}

fn run(config: JoinConfig, reference: &Path, identifiers: &Path, format: &OutputFormat) -> Result<i32> {
    let joiner = CaseJoiner::with_config(config);
    let report = joiner
        .run(reference, identifiers)
        .map_err(log_failure)
        .with_context(|| {
            format!(
                "Failed to join {} against {}",
                identifiers.display(),
                reference.display()
            )
        })?;

    match format {
        OutputFormat::Human => formatter::print_report_human(&report),
        OutputFormat::Json => formatter::print_report_json(&report)?,
    }

    // Exit with appropriate code
    Ok(if report.persistence_error.is_some() { 2 } else { 0 })
}

fn log_failure(err: JoinError) -> JoinError {
    tracing::error!(error = %err, "run aborted");
    err
}

fn init_logging(log_file: &Path, verbose: u8) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}
