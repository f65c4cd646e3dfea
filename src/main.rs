//! Luxtronik heat pump CLI
//!
//! A command-line interface (CLI) application for Luxtronik heat pump
//! controllers reachable over TCP.
//!
//! This tool allows users to:
//! - Read all values and parameters once and print them as named channels.
//! - Write operation modes, target temperatures and cooling delays.
//! - Run in a continuous daemon mode that polls the heat pump and prints every
//!   refresh to the console.
//!
//! The CLI leverages the `luxtronik_lib` crate for the protocol, the session
//! handling and the polling.

use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use luxtronik_lib::{
    command::{Command, CommandTarget, Encoding, COMMAND_TABLE},
    config::HeatpumpConfig,
    connector::TcpConnect,
    handler::HeatpumpHandler,
    protocol::{ParameterSnapshot, ValueSnapshot},
    session::{DeviceSession, SessionState, StatusSink},
};
use std::any::Any;
use std::io::{stdout, Write};
use std::panic;
use std::path::Path;

mod commandline;

/// Extracts the message of a panic payload.
fn panic_cause(payload: &(dyn Any + Send)) -> &str {
    match payload.downcast_ref::<&str>() {
        Some(cause) => *cause,
        None => payload
            .downcast_ref::<String>()
            .map_or("<unknown_panic_cause>", String::as_str),
    }
}

/// Starts logging at `loglevel` unless `RUST_LOG` says otherwise, and routes
/// panics through the logger so they reach the daemon's log.
fn logging_init(loglevel: LevelFilter) -> Result<LoggerHandle> {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .and_then(|logger| logger.start())
        .with_context(|| "Cannot start logging")?;

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map_or(("<unknown_file>", 0, 0), |loc| {
                (loc.file(), loc.line(), loc.column())
            });
        error!(
            target: "panic",
            "Thread '{}' panicked at {filename}:{line}:{column}: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            panic_cause(panic_info.payload()),
        );
    }));
    Ok(log_handle)
}

/// Prints every published channel to the standard output.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn publish(&self, values: &ValueSnapshot, parameters: &ParameterSnapshot) {
        let mut out = stdout().lock();
        let updates = values
            .channel_updates()
            .into_iter()
            .chain(parameters.channel_updates());
        for (channel, state) in updates {
            // A closed stdout is not worth a panic in daemon mode.
            let _ = writeln!(out, "{channel}: {state}");
        }
        let _ = out.flush();
    }

    fn status_changed(&self, state: &SessionState) {
        match &state.last_error {
            Some(error) => warn!("Heat pump is {}: {error}", state.status),
            None => info!("Heat pump is {}", state.status),
        }
    }
}

fn load_config(file: &Path) -> Result<HeatpumpConfig> {
    let reader = std::fs::File::open(file)
        .with_context(|| format!("Cannot open config file '{}'", file.display()))?;
    serde_yaml::from_reader(reader)
        .with_context(|| format!("Invalid config file '{}'", file.display()))
}

fn parse_command(target: CommandTarget, value: &str) -> Result<Command> {
    Ok(match target.rule().encoding {
        Encoding::Mode { .. } => Command::from(value),
        Encoding::Tenths => Command::Decimal(
            value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("'{value}' is not a decimal value for '{target}'"))?,
        ),
    })
}

fn print_channels() {
    println!("{:<30} {:>9}  values", "channel", "parameter");
    for rule in COMMAND_TABLE.iter() {
        let accepted = match rule.encoding {
            Encoding::Mode { min, max } => format!("mode {min}..={max}"),
            Encoding::Tenths => "decimal, 0.1 resolution".to_string(),
        };
        println!(
            "{:<30} {:>9}  {accepted}",
            rule.channel,
            rule.register.to_string()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter())?;

    let (mut config, command) = match args.connection {
        commandline::CliConnection::Tcp {
            host,
            port,
            command,
        } => (HeatpumpConfig::new(host).with_port(port), command),
        commandline::CliConnection::Config { file, command } => (load_config(&file)?, command),
        commandline::CliConnection::Channels => {
            print_channels();
            return Ok(());
        }
    };
    if let Some(timeout) = args.timeout {
        config = config.with_connection_timeout(timeout);
    }
    debug!("Using heat pump configuration {config:?}");

    match command {
        commandline::CliCommands::Read => {
            let address = config.address();
            let session = DeviceSession::new(config, TcpConnect, ConsoleSink);
            session
                .refresh()
                .await
                .with_context(|| format!("Cannot read heat pump at '{address}'"))?;
        }
        commandline::CliCommands::Daemon { poll_interval } => {
            if let Some(poll_interval) = poll_interval {
                config = config.with_polling_interval(poll_interval);
            }
            info!(
                "Starting daemon mode: address={}, interval={:?}",
                config.address(),
                config.polling_interval
            );
            let mut handler = HeatpumpHandler::new(config, TcpConnect, ConsoleSink);
            handler.initialize();
            tokio::signal::ctrl_c()
                .await
                .with_context(|| "Cannot listen for Ctrl-C")?;
            info!("Stopping daemon mode");
            handler.shutdown().await;
        }
        commandline::CliCommands::Set { channel, value } => {
            let command = parse_command(channel, &value)?;
            let address = config.address();
            let session = DeviceSession::new(config, TcpConnect, ConsoleSink);
            session
                .send_command(channel, &command)
                .await
                .with_context(|| {
                    format!("Failed to set '{channel}' to {value} on heat pump at '{address}'")
                })?;
            println!("Set {channel} to {value}");
        }
    }
    Ok(())
}
