// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Interactive command shell for the Tello.
//!
//! Binds, enters SDK mode, then forwards stdin lines to the drone
//! verbatim and prints the responses. `state` shows the latest
//! telemetry snapshot.

mod config;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info};

use tello_app::{init_logging, ConfigFile};
use tello_core::TelemetryRecord;
use tello_driver::{DriverError, Tello};

use config::CliConfig;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - interactive Tello shell");
const PROMPT: &str = "tello> ";

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about = PKG_DESCRIPTION)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Drone IP address
    #[arg(long = "ip")]
    ip: Option<String>,
    /// Local command port (0 = let the OS pick)
    #[arg(long = "local-port")]
    local_port: Option<u16>,
    /// Skip the identity queries after the handshake
    #[arg(long = "no-info")]
    no_info: bool,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", CliConfig::example_toml());
        return Ok(());
    }

    let (mut cfg, config_path) = CliConfig::load(cli.config.as_deref())?;
    init_logging(
        cli.log_level
            .as_deref()
            .or(cfg.general.log_level.as_deref()),
    );
    if let Some(path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    // CLI flags win over the config file.
    if let Some(ip) = cli.ip {
        cfg.driver.ip = ip;
    }
    if let Some(port) = cli.local_port {
        cfg.driver.local_command_port = port;
    }

    let mut tello = Tello::bind(&cfg.driver).await?;

    if let Err(e) = tello.handshake(&cfg.driver.handshake_policy()).await {
        error!("{}", e);
        tello.shutdown().await;
        std::process::exit(1);
    }
    if !cli.no_info {
        tello.query_info(&cfg.driver.response_policy()).await?;
    }

    let result = run_shell(&mut tello, &cfg).await;
    tello.shutdown().await;
    result
}

async fn run_shell(
    tello: &mut Tello,
    cfg: &CliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!();
                info!("Ctrl+C received, shutting down");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match line.trim() {
                    "" => {}
                    "exit" | "quit" => return Ok(()),
                    "help" => print_help(),
                    "state" => print_state(&tello.state()),
                    command => {
                        match tello
                            .send_command_await_response(command, &cfg.driver.response_policy())
                            .await
                        {
                            Ok(response) => println!("{}", response),
                            Err(e @ DriverError::CommandTimeout { .. }) => println!("{}", e),
                            Err(e) => return Err(e.into()),
                        }
                    }
                }
                print_prompt();
            }
        }
    }
}

fn print_prompt() {
    print!("{}", PROMPT);
    let _ = std::io::stdout().flush();
}

fn print_state(record: &TelemetryRecord) {
    if record.is_empty() {
        println!("no state received yet");
        return;
    }
    let width = record.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in record.iter() {
        println!("  {:>width$}  {}", key, value, width = width);
    }
}

fn print_help() {
    println!("state        show the latest telemetry snapshot");
    println!("help         show this help");
    println!("exit         leave the shell");
    println!("anything else is sent to the drone verbatim,");
    println!("e.g. 'takeoff', 'up 50', 'battery?', 'land'");
}
