//! armfake CLI
//!
//! Entry point for the `armfake` command-line tool.

use armfake::config::{EffectiveConfig, Settings};
use armfake::scenario::{self, ExitCode, Scenario};
use armfake::signal::{install_interrupt_handler, CancelToken};
use armfake::{logging, FakeError, FakeTransport};
use armfake_wire::{ErrorDetail, WireResponse};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "armfake")]
#[command(about = "Simulated resource-management backend for client tests", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every operation of a scenario and check its expectations
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Harness config file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Override poll.max_polls
        #[arg(long)]
        max_polls: Option<u32>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario file without running it
    Check {
        /// Scenario file (TOML)
        scenario: PathBuf,
    },

    /// Serve a scenario over JSON lines (wire requests on stdin, responses on stdout)
    Serve {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Harness config file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            max_polls,
            json,
        } => {
            let overrides = max_polls.map(|n| serde_json::json!({"poll": {"max_polls": n}}));
            let settings = load_settings(config.as_deref(), overrides);
            run_scenario(&scenario, &settings, json);
        }
        Commands::Check { scenario } => {
            run_check(&scenario);
        }
        Commands::Serve { scenario, config } => {
            let settings = load_settings(config.as_deref(), None);
            run_serve(&scenario, settings);
        }
    }
}

fn exit(code: ExitCode) -> ! {
    process::exit(code.as_i32())
}

fn load_settings(config_path: Option<&Path>, overrides: Option<serde_json::Value>) -> Settings {
    let settings = EffectiveConfig::build(config_path, overrides).and_then(|c| c.settings());
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            exit(ExitCode::Usage);
        }
    };

    if let Err(e) = logging::init(&settings.log) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    settings
}

fn load_scenario(path: &Path) -> Scenario {
    match Scenario::load(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading scenario: {}", e);
            exit(ExitCode::Usage);
        }
    }
}

fn run_scenario(path: &Path, settings: &Settings, json_output: bool) {
    let scenario = load_scenario(path);
    let server = scenario.build_server(&settings.subscription_id);

    let token = CancelToken::new();
    if let Err(e) = install_interrupt_handler(token.clone()) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let options = settings.poll.to_options();
    let report = match scenario::run(
        &scenario,
        &server,
        &settings.subscription_id,
        &options,
        Some(&token),
    ) {
        Ok(report) => report,
        Err(FakeError::Cancelled { polls }) => {
            eprintln!("Cancelled after consuming {} responses", polls);
            exit(ExitCode::Cancelled);
        }
        Err(e) => {
            eprintln!("Harness error ({}): {}", e.code(), e);
            exit(ExitCode::Usage);
        }
    };

    if json_output {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                exit(ExitCode::Usage);
            }
        }
    } else {
        println!("Scenario: {}", report.scenario);
        for op in &report.operations {
            let mark = if op.passed() { "ok" } else { "FAILED" };
            println!("  {} ... {}", op.operation, mark);
            for failure in &op.failures {
                println!("    - {}", failure);
            }
        }
        println!();
        println!("{}", report.human_summary);
    }

    exit(report.exit_code());
}

fn run_check(path: &Path) {
    let scenario = load_scenario(path);
    println!("Scenario valid: {}", path.display());
    println!("  Name: {}", scenario.name);
    println!("  Resource group: {}", scenario.resource_group);
    println!("  Resource type: {}/{}", scenario.provider, scenario.resource_type);
    for op in &scenario.operations {
        println!("  {} ({})", op.name, op.kind);
    }
}

fn run_serve(path: &Path, settings: Settings) {
    let scenario = load_scenario(path);
    let server = scenario.build_server(&settings.subscription_id);
    let transport = FakeTransport::new(server, settings.transport);

    tracing::info!(scenario = %scenario.name, "serving fake backend on stdin/stdout");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error reading stdin: {}", e);
                exit(ExitCode::Usage);
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = transport.handle_json(&line).unwrap_or_else(|e| {
            let resp = WireResponse::error(400, ErrorDetail::new("MalformedRequest", e.to_string()));
            serde_json::to_string(&resp).unwrap_or_default()
        });

        if writeln!(stdout, "{}", response).and_then(|_| stdout.flush()).is_err() {
            // reader went away
            break;
        }
    }
}
