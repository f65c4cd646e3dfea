use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use luxtronik_lib::{command::CommandTarget, config::DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;

fn parse_channel(s: &str) -> Result<CommandTarget, String> {
    CommandTarget::from_channel(s)
        .ok_or_else(|| format!("'{s}' is not a writable channel, see the 'channels' command"))
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliConnection {
    /// Connect to a heat pump controller via TCP.
    Tcp {
        /// The IP address or hostname of the controller.
        /// Example: "192.168.1.20" or "heatpump.local".
        #[clap(verbatim_doc_comment)]
        host: String,

        /// The TCP port of the controller.
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Commands for the connected heat pump.
        #[command(subcommand)]
        command: CliCommands,
    },
    /// Read the connection settings from a YAML file.
    /// Example content:
    ///   host: 192.168.1.20
    ///   port: 8889
    ///   connection_timeout: 5s
    ///   polling_interval: 1m
    #[clap(verbatim_doc_comment)]
    Config {
        /// Path of the YAML configuration file.
        file: PathBuf,

        /// Commands for the configured heat pump.
        #[command(subcommand)]
        command: CliCommands,
    },
    /// List the writable channels with their parameter register and accepted values.
    Channels,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Run in daemon mode: poll the heat pump at a fixed interval and print
    /// every channel until Ctrl-C is pressed.
    #[clap(verbatim_doc_comment)]
    Daemon {
        /// Delay between two refresh cycles (e.g., "30s", "1m").
        /// Defaults to the configured polling interval.
        #[arg(value_parser = humantime::parse_duration, short, long, verbatim_doc_comment)]
        poll_interval: Option<Duration>,
    },

    /// Read and display all values and parameters once.
    Read,

    /// Write a value to a writable channel.
    /// Operation modes take a mode number, temperatures a value in °C
    /// and the cooling delays a number of hours.
    /// Example: "set warmwater_temperature 48.5" or "set heating_operation_mode 0".
    #[clap(verbatim_doc_comment)]
    Set {
        /// Target channel, see the 'channels' command.
        #[arg(value_parser = parse_channel)]
        channel: CommandTarget,
        /// The new value.
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
}

const fn about_text() -> &'static str {
    "Luxtronik heat pump CLI - Read values and parameters and control a Luxtronik heat pump via TCP."
}

#[derive(Parser, Debug)]
#[command(name="heatpump", author, version, about=about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace. Default is warn.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Specifies the connection and the heat pump commands.
    #[command(subcommand)]
    pub connection: CliConnection,

    /// Timeout for connecting and for every request to the controller.
    /// Overrides the configured value. Examples: "5s", "500ms".
    #[arg(global = true, long, value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub timeout: Option<Duration>,
}
