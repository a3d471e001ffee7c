//! tripmetrics - Command-line interface for trip-metrics
//!
//! Commands:
//! - compute: Compute metrics for a trip snapshot
//! - settle: Print balances and settlement transactions
//! - validate: Check a snapshot for data-entry problems
//! - doctor: Diagnose installation and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use trip_metrics::encoder::{MetricsEncoder, REPORT_VERSION};
use trip_metrics::types::Settlement;
use trip_metrics::{
    compute_metrics_with, parse_snapshot, snapshot_fingerprint, validate_snapshot,
    MetricsConfig, MetricsError, TripSnapshot, PRODUCER_NAME, TRIP_METRICS_VERSION,
};

/// tripmetrics - Financial reconciliation and metrics for road trips
#[derive(Parser)]
#[command(name = "tripmetrics")]
#[command(version = TRIP_METRICS_VERSION)]
#[command(about = "Compute costs, balances and planning metrics for a trip", long_about = None)]
struct Cli {
    /// Log level for this crate (e.g. "debug"), or full filter directives
    /// (e.g. "trip_metrics=trace,warn") passed through unchanged
    #[arg(long, global = true, env = "TRIP_METRICS_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a trip snapshot
    Compute {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Route speed configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print balances and settlement transactions
    Settle {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output settlement as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a snapshot for data-entry problems
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Route speed configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose installation and configuration
    Doctor {
        /// Check route speed configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact metrics JSON
    Json,
    /// Pretty-printed metrics JSON
    JsonPretty,
    /// Metrics wrapped in a report envelope
    Report,
}

/// A bare level applies to this crate only; directives are used as given
fn log_filter(log_level: &str) -> String {
    let log_level = log_level.trim();
    if log_level.contains('=') || log_level.contains(',') {
        log_level.to_string()
    } else {
        format!("trip_metrics={log_level},tripmetrics={log_level}")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli.log_level))
        .with_writer(io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), TripCliError> {
    match command {
        Commands::Compute {
            input,
            output,
            format,
            config,
        } => cmd_compute(&input, &output, format, config.as_deref()),

        Commands::Settle { input, json } => cmd_settle(&input, json),

        Commands::Validate {
            input,
            config,
            json,
        } => cmd_validate(&input, config.as_deref(), json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_compute(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), TripCliError> {
    let snapshot = read_snapshot(input)?;
    let config = load_config(config)?;

    let metrics = compute_metrics_with(&snapshot, &config);

    let output_data = match format {
        OutputFormat::Json => serde_json::to_string(&metrics)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&metrics)?,
        OutputFormat::Report => {
            let fingerprint = snapshot_fingerprint(&snapshot)?;
            MetricsEncoder::new().encode_to_json(&metrics, fingerprint)?
        }
    };

    if is_stdio(output) {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
        tracing::info!(path = %output.display(), "wrote metrics");
    }

    Ok(())
}

fn cmd_settle(input: &Path, json: bool) -> Result<(), TripCliError> {
    let snapshot = read_snapshot(input)?;
    let settlement = compute_metrics_with(&snapshot, &MetricsConfig::default()).settlement;

    if json {
        println!("{}", serde_json::to_string_pretty(&settlement)?);
    } else {
        print_settlement(&settlement);
    }

    Ok(())
}

fn print_settlement(settlement: &Settlement) {
    println!("Settlement");
    println!("==========");
    println!("Total shared:     {:.2}", settlement.total_shared);
    println!("Share per person: {:.2}", settlement.share_per_person);

    if !settlement.balances.is_empty() {
        println!("\nBalances:");
        for entry in &settlement.balances {
            println!(
                "  {:<20} paid {:>10.2}  balance {:>+10.2}",
                entry.name, entry.paid, entry.balance
            );
        }
    }

    println!("\nTransactions:");
    if settlement.transactions.is_empty() {
        println!("  Nothing to settle");
    }
    for transaction in &settlement.transactions {
        println!(
            "  {} -> {}: {:.2}",
            transaction.from, transaction.to, transaction.amount
        );
    }
}

fn cmd_validate(input: &Path, config: Option<&Path>, json: bool) -> Result<(), TripCliError> {
    let snapshot = read_snapshot(input)?;
    let config = load_config(config)?;

    let issues = validate_snapshot(&snapshot, &config);

    let report = ValidationReport {
        participants: snapshot.participants.len(),
        days: snapshot.days.len(),
        expenses: snapshot.general_expenses.len()
            + snapshot.days.iter().map(|day| day.expenses.len()).sum::<usize>(),
        issues: issues
            .iter()
            .map(|issue| ValidationIssueDetail {
                code: issue.code().to_string(),
                message: issue.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Participants: {}", report.participants);
        println!("Days:         {}", report.days);
        println!("Expenses:     {}", report.expenses);
        println!("Issues:       {}", report.issues.len());

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!("  - [{}] {}", issue.code, issue.message);
            }
        }
    }

    if report.issues.is_empty() {
        Ok(())
    } else {
        Err(TripCliError::ValidationFailed(report.issues.len()))
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), TripCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("trip-metrics version {}", TRIP_METRICS_VERSION),
    });

    checks.push(DoctorCheck {
        name: "report_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Report schema: {}", REPORT_VERSION),
    });

    // Check configuration file if provided
    if let Some(config_path) = config {
        let check = if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match MetricsConfig::from_json(&content) {
                    Ok(loaded) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Configuration valid ({} route types, default {} km/h)",
                            loaded.route_speeds.len(),
                            loaded.default_speed_kmh
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid configuration: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read configuration file: {}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Configuration file does not exist".to_string(),
            }
        };
        checks.push(check);
    } else {
        checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Using built-in route table ({} route types)",
                MetricsConfig::default().route_speeds.len()
            ),
        });
    }

    // Check stdin is available for `--input -`
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: TRIP_METRICS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("tripmetrics Doctor Report");
        println!("=========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(TripCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_snapshot(input: &Path) -> Result<TripSnapshot, TripCliError> {
    let input_data = if is_stdio(input) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    if input_data.trim().is_empty() {
        return Err(TripCliError::EmptyInput);
    }

    Ok(parse_snapshot(&input_data)?)
}

fn load_config(path: Option<&Path>) -> Result<MetricsConfig, TripCliError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            tracing::debug!(path = %path.display(), "loading configuration");
            Ok(MetricsConfig::from_json(&content)?)
        }
        None => Ok(MetricsConfig::default()),
    }
}

// Error types

#[derive(Debug)]
enum TripCliError {
    Io(io::Error),
    Metrics(MetricsError),
    Json(serde_json::Error),
    EmptyInput,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for TripCliError {
    fn from(e: io::Error) -> Self {
        TripCliError::Io(e)
    }
}

impl From<MetricsError> for TripCliError {
    fn from(e: MetricsError) -> Self {
        TripCliError::Metrics(e)
    }
}

impl From<serde_json::Error> for TripCliError {
    fn from(e: serde_json::Error) -> Self {
        TripCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TripCliError> for CliError {
    fn from(e: TripCliError) -> Self {
        match e {
            TripCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TripCliError::Metrics(MetricsError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'tripmetrics doctor --config <file>' for details".to_string()),
            },
            TripCliError::Metrics(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is a trip snapshot in camelCase JSON".to_string()),
            },
            TripCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TripCliError::EmptyInput => CliError {
                code: "EMPTY_INPUT".to_string(),
                message: "No snapshot found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            TripCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} validation issues found", count),
                hint: Some(
                    "Metrics are still computed; fix the issues for accurate results".to_string(),
                ),
            },
            TripCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    participants: usize,
    days: usize,
    expenses: usize,
    issues: Vec<ValidationIssueDetail>,
}

#[derive(serde::Serialize)]
struct ValidationIssueDetail {
    code: String,
    message: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
