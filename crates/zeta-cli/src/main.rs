//! Zeta CLI - run gated state machines described in YAML.
//!
//! - `zeta run <config>` - tick a machine and print the active nodes
//! - `zeta check <config>` - report likely mistakes in a description

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use zeta_cli::{build_machine, simulate, MachineConfig};
use zeta_tools::{enable_trace_log, take_trace_log};

#[derive(Parser)]
#[command(name = "zeta")]
#[command(about = "Gated state machine runner", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a machine
    Run {
        /// Machine description (YAML)
        config: PathBuf,

        /// Override the number of ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Print the simulation trace as JSON when done
        #[arg(long)]
        trace: bool,
    },

    /// Validate a machine description
    Check {
        /// Machine description (YAML)
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            trace,
        } => run_machine(&config, ticks, trace),
        Commands::Check { config } => check_machine(&config),
    }
}

fn run_machine(path: &Path, ticks: Option<u64>, trace: bool) -> Result<()> {
    let config = MachineConfig::load(path)?;
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }

    let mut machine = build_machine(&config)?;
    if trace {
        enable_trace_log(machine.state_mut());
    }

    let ticks = ticks.unwrap_or(config.ticks);
    tracing::info!(
        machine = %path.display(),
        nodes = machine.len(),
        ticks,
        "Starting machine"
    );

    for report in simulate(&mut machine, ticks, config.fixed_every) {
        let phase = if report.fixed { "fixed" } else { "update" };
        println!("[{:>4}] {:<6} {}", report.tick, phase, report.active.join(", "));
    }

    if trace {
        let log = take_trace_log(machine.state_mut()).unwrap_or_default();
        let json = serde_json::to_string_pretty(&log).context("Failed to encode trace")?;
        println!("{json}");
    }

    Ok(())
}

fn check_machine(path: &Path) -> Result<()> {
    let config = MachineConfig::load(path)?;
    let warnings = config.validate();

    println!(
        "{}: {} nodes, {} connections, {} listeners",
        path.display(),
        config.nodes.len(),
        config.connections.len(),
        config.listeners.len()
    );
    for warning in &warnings {
        println!("  warning: {warning}");
    }

    build_machine(&config)?;

    if warnings.is_empty() {
        println!("OK");
        Ok(())
    } else {
        bail!("{} warning(s)", warnings.len())
    }
}
