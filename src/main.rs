use clap::{ArgAction, Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

use faultline::config::RecoveryConfig;
use faultline::error::{
    kind_message, suggestions, user_message, ClassifiedError, ErrorKind, Fault, FaultNormalizer,
    Severity, Strategy,
};
use faultline::logging::{init_logging, LoggingConfig};
use faultline::retry::{saturating_millis, RetryPolicy};

#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(version)]
#[command(about = "Inspect how faults are classified and recovered")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a raw error message
    Classify {
        /// The error message, as raised by the failing operation
        message: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Explain how a known error kind is handled
    Explain {
        /// Error kind tag, e.g. TIMEOUT_ERROR
        kind: String,

        /// Severity (low, medium, high, critical); defaults to the kind's own
        #[arg(long, short)]
        severity: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the retry backoff schedule for the effective configuration
    Backoff {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

mod exit_codes {
    use std::process::ExitCode;

    pub fn usage() -> ExitCode {
        ExitCode::from(2)
    }

    pub fn config() -> ExitCode {
        ExitCode::from(78)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Classify { message, json } => {
            let error = FaultNormalizer::new().normalize(Fault::raw(message));
            print_error(&error, json);
            ExitCode::SUCCESS
        }
        Commands::Explain {
            kind,
            severity,
            json,
        } => {
            let Some(kind) = ErrorKind::from_tag(&kind) else {
                eprintln!("{} unknown error kind `{}`", "error:".red().bold(), kind);
                eprintln!("known kinds:");
                for kind in ErrorKind::ALL {
                    eprintln!("  {}", kind);
                }
                return exit_codes::usage();
            };
            let severity = match severity.as_deref().map(Severity::from_tag) {
                None => kind.default_severity(),
                Some(Some(severity)) => severity,
                Some(None) => {
                    eprintln!(
                        "{} severity must be one of low, medium, high, critical",
                        "error:".red().bold()
                    );
                    return exit_codes::usage();
                }
            };
            let error = ClassifiedError::new(kind, severity, kind_message(kind));
            print_error(&error, json);
            ExitCode::SUCCESS
        }
        Commands::Backoff { json } => {
            let config = match RecoveryConfig::load_or_default(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    return exit_codes::config();
                }
            };
            print_backoff(&RetryPolicy::from(&config), json);
            ExitCode::SUCCESS
        }
    }
}

fn print_error(error: &ClassifiedError, as_json: bool) {
    if as_json {
        let report = json!({
            "kind": error.kind(),
            "category": error.category(),
            "severity": error.severity(),
            "recoverable": error.is_recoverable(),
            "strategy": error.strategy(),
            "userMessage": user_message(error),
            "suggestions": suggestions(error.kind()),
        });
        println!("{}", report);
        return;
    }

    println!("{:<12} {}", "kind".dimmed(), error.kind().bold());
    println!("{:<12} {:?}", "category".dimmed(), error.category());
    println!("{:<12} {}", "severity".dimmed(), error.severity());
    println!("{:<12} {}", "recoverable".dimmed(), error.is_recoverable());
    println!("{:<12} {}", "strategy".dimmed(), paint_strategy(error.strategy()));
    println!("{:<12} {}", "message".dimmed(), user_message(error));
    if error.strategy() == Strategy::UserIntervention {
        println!("{}", "suggestions".dimmed());
        for suggestion in suggestions(error.kind()) {
            println!("  - {}", suggestion);
        }
    }
}

fn paint_strategy(strategy: Strategy) -> String {
    match strategy {
        Strategy::Retry => strategy.cyan().to_string(),
        Strategy::Fallback => strategy.blue().to_string(),
        Strategy::GracefulDegradation => strategy.yellow().to_string(),
        Strategy::UserIntervention => strategy.magenta().to_string(),
        Strategy::Abort => strategy.red().bold().to_string(),
    }
}

fn print_backoff(policy: &RetryPolicy, as_json: bool) {
    let schedule = policy.schedule();
    let total = policy.worst_case_total();

    if as_json {
        let report = json!({
            "maxRetries": policy.max_retries,
            "baseDelayMs": saturating_millis(policy.base_delay),
            "backoffMultiplier": policy.backoff_multiplier,
            "delaysMs": schedule.iter().copied().map(saturating_millis).collect::<Vec<_>>(),
            "worstCaseTotalMs": saturating_millis(total),
        });
        println!("{}", report);
        return;
    }

    println!(
        "max retries {}, base delay {:?}, multiplier {}",
        policy.max_retries, policy.base_delay, policy.backoff_multiplier
    );
    for (attempt, delay) in schedule.iter().enumerate() {
        println!("  retry {:>2}: wait {:?}", attempt + 1, delay);
    }
    println!("worst case total: {}", format!("{:?}", total).bold());
}
