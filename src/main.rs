mod commands;
mod core;
mod flags;
mod notify;
mod oracle;
mod orchestrator;
mod readiness;
mod release;
mod risk;
mod rollback;
mod schedule;
mod store;
mod ui;

use clap::{Parser, Subcommand};
use crate::core::error::{RelayError, print_error};
use std::path::PathBuf;

/// Release orchestration: gated go/no-go, rollback plans, deployment
/// windows, and phased feature-flag rollouts
#[derive(Parser)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct RelayCli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Setup & Inspection
  // ============================================================================
  /// Initialize relay.toml configuration for a workspace
  Init {
    /// Overwrite an existing relay.toml with defaults
    #[arg(long)]
    force: bool,
  },

  /// Show all tracked releases, windows, and flags
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Release Pipeline
  // ============================================================================
  /// Resolve the next version for a change set (writes no state)
  Plan {
    /// Path to the change set JSON file
    changes: PathBuf,
    /// Current released version (semver)
    #[arg(long)]
    current: String,
    /// Pre-release suffix to append verbatim (e.g. rc.1)
    #[arg(long)]
    pre_release: Option<String>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run a full orchestration pass: version, gate, risk, plan, window, flags
  Run {
    /// Path to the change set JSON file
    changes: PathBuf,
    /// Current released version (semver)
    #[arg(long)]
    current: String,
    /// Pre-release suffix to append verbatim (e.g. rc.1)
    #[arg(long)]
    pre_release: Option<String>,
    /// Path to a readiness inputs JSON file (omitted fields count as unknown)
    #[arg(long)]
    readiness: Option<PathBuf>,
    /// Output the pass result in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Re-run the pipeline for releases awaiting a verdict
  Reevaluate {
    /// Path to a readiness inputs JSON file
    #[arg(long)]
    readiness: Option<PathBuf>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Settle a CONDITIONAL-GO release with an explicit decision
  #[command(disable_version_flag = true)]
  Resolve {
    /// Release version to resolve
    version: String,
    /// Accept the conditions and mark the release ready
    #[arg(long)]
    go: bool,
    /// Block the release (requires --reason)
    #[arg(long)]
    no_go: bool,
    /// Recorded reason for a --no-go decision
    #[arg(long)]
    reason: Option<String>,
  },

  /// Record that a release went out in its scheduled window
  #[command(disable_version_flag = true)]
  Deploy {
    /// Release version that was deployed
    version: String,
  },

  /// Record that a deployed release was rolled back
  #[command(disable_version_flag = true)]
  Rollback {
    /// Release version that was rolled back
    version: String,
  },

  // ============================================================================
  // Feature Flags
  // ============================================================================
  /// Phased feature-flag rollout operations
  #[command(subcommand)]
  Flags(FlagCommands),
}

#[derive(Subcommand)]
enum FlagCommands {
  /// Advance due rollout phases and report cleanup candidates
  Scan {
    /// Currently-breached monitoring conditions (repeatable); any overlap
    /// with a flag's kill-switch conditions halts its advancement
    #[arg(long = "active-condition")]
    active_conditions: Vec<String>,
    /// Output scan results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Fire a kill switch: disable a flag, freezing exposure in place
  Kill {
    /// Flag name
    name: String,
    /// Recorded reason for the kill
    #[arg(long)]
    reason: String,
  },

  /// Archive a cleanup-eligible flag
  Archive {
    /// Flag name
    name: String,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_tracing() {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  init_tracing();
  let cli = RelayCli::parse();

  let result = match cli.command {
    // Setup & Inspection
    Commands::Init { force } => commands::run_init(force),
    Commands::Status { json } => commands::run_status(json),

    // Release Pipeline
    Commands::Plan {
      changes,
      current,
      pre_release,
      json,
    } => commands::run_plan(changes, current, pre_release, json),
    Commands::Run {
      changes,
      current,
      pre_release,
      readiness,
      json,
    } => commands::run_orchestrate(changes, current, pre_release, readiness, json),
    Commands::Reevaluate { readiness, json } => commands::run_reevaluate(readiness, json),
    Commands::Resolve {
      version,
      go,
      no_go,
      reason,
    } => commands::run_resolve(version, go, no_go, reason),
    Commands::Deploy { version } => commands::run_deploy(version),
    Commands::Rollback { version } => commands::run_rollback(version),

    // Feature Flags
    Commands::Flags(flag_cmd) => match flag_cmd {
      FlagCommands::Scan {
        active_conditions,
        json,
      } => commands::run_flags_scan(active_conditions, json),
      FlagCommands::Kill { name, reason } => commands::run_flags_kill(name, reason),
      FlagCommands::Archive { name } => commands::run_flags_archive(name),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RelayError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
