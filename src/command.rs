//! Translation of inbound commands into parameter register writes.
//!
//! Every writable channel is described by one row of [`COMMAND_TABLE`]: the
//! parameter register it addresses and the rule that turns a command value into
//! the raw register value.
use crate::{protocol::ParameterIndex, Error, Result};
use std::fmt;

/// An externally addressable control point mapped to one parameter register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTarget {
    HeatingOperationMode,
    HeatingTemperature,
    WarmwaterOperationMode,
    WarmwaterTemperature,
    CoolingOperationMode,
    CoolingReleaseTemperature,
    CoolingInletTemperature,
    CoolingStartAfterHours,
    CoolingStopAfterHours,
}

/// How a command value becomes a register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// A textual mode number within an inclusive range.
    Mode { min: i32, max: i32 },
    /// A decimal value stored in tenths, truncated toward zero.
    Tenths,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandRule {
    pub target: CommandTarget,
    pub channel: &'static str,
    pub register: ParameterIndex,
    pub encoding: Encoding,
}

const OPERATION_MODE: Encoding = Encoding::Mode { min: 0, max: 4 };
const COOLING_MODE: Encoding = Encoding::Mode { min: 0, max: 1 };

/// All writable channels of the heat pump.
pub static COMMAND_TABLE: [CommandRule; 9] = [
    CommandRule {
        target: CommandTarget::HeatingOperationMode,
        channel: "heating_operation_mode",
        register: ParameterIndex::HEATING_OPERATION_MODE,
        encoding: OPERATION_MODE,
    },
    CommandRule {
        target: CommandTarget::HeatingTemperature,
        channel: "heating_temperature",
        register: ParameterIndex::HEATING_TEMPERATURE,
        encoding: Encoding::Tenths,
    },
    CommandRule {
        target: CommandTarget::WarmwaterOperationMode,
        channel: "warmwater_operation_mode",
        register: ParameterIndex::WARMWATER_OPERATION_MODE,
        encoding: OPERATION_MODE,
    },
    CommandRule {
        target: CommandTarget::WarmwaterTemperature,
        channel: "warmwater_temperature",
        register: ParameterIndex::WARMWATER_TEMPERATURE,
        encoding: Encoding::Tenths,
    },
    CommandRule {
        target: CommandTarget::CoolingOperationMode,
        channel: "cooling_operation_mode",
        register: ParameterIndex::COOLING_OPERATION_MODE,
        encoding: COOLING_MODE,
    },
    CommandRule {
        target: CommandTarget::CoolingReleaseTemperature,
        channel: "cooling_release_temperature",
        register: ParameterIndex::COOLING_RELEASE_TEMPERATURE,
        encoding: Encoding::Tenths,
    },
    CommandRule {
        target: CommandTarget::CoolingInletTemperature,
        channel: "cooling_inlet_temperature",
        register: ParameterIndex::COOLING_INLET_TEMPERATURE,
        encoding: Encoding::Tenths,
    },
    CommandRule {
        target: CommandTarget::CoolingStartAfterHours,
        channel: "cooling_start_after_hours",
        register: ParameterIndex::COOLING_START_AFTER_HOURS,
        encoding: Encoding::Tenths,
    },
    CommandRule {
        target: CommandTarget::CoolingStopAfterHours,
        channel: "cooling_stop_after_hours",
        register: ParameterIndex::COOLING_STOP_AFTER_HOURS,
        encoding: Encoding::Tenths,
    },
];

impl CommandTarget {
    /// Looks up the target addressed by a channel id.
    pub fn from_channel(channel: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|rule| rule.channel == channel)
            .map(|rule| rule.target)
    }

    pub fn rule(self) -> &'static CommandRule {
        // Every variant has exactly one row.
        match COMMAND_TABLE.iter().find(|rule| rule.target == self) {
            Some(rule) => rule,
            None => unreachable!("no command rule for {self:?}"),
        }
    }

    pub fn channel(self) -> &'static str {
        self.rule().channel
    }

    pub fn register(self) -> ParameterIndex {
        self.rule().register
    }

    /// Encodes a command for this target.
    ///
    /// Returns `Ok(None)` for [`Command::Refresh`], which never writes.
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedCommandType`] if the value kind does not match the target.
    /// * [`Error::OutOfRange`] if a mode is unknown or a decimal does not fit a register.
    pub fn encode(self, command: &Command) -> Result<Option<(ParameterIndex, i32)>> {
        let rule = self.rule();
        let value = match (rule.encoding, command) {
            (_, Command::Refresh) => return Ok(None),
            (Encoding::Mode { min, max }, Command::Text(text)) => {
                encode_mode(rule.channel, text, min, max)?
            }
            (Encoding::Tenths, Command::Decimal(value)) => encode_tenths(rule.channel, *value)?,
            (Encoding::Mode { .. }, Command::Decimal(_)) => {
                return Err(Error::UnsupportedCommandType {
                    channel: rule.channel,
                    expected: "text",
                })
            }
            (Encoding::Tenths, Command::Text(_)) => {
                return Err(Error::UnsupportedCommandType {
                    channel: rule.channel,
                    expected: "decimal",
                })
            }
        };
        Ok(Some((rule.register, value)))
    }
}

impl fmt::Display for CommandTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.channel())
    }
}

/// A command value submitted by an external caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Re-read the channel; answered by the next scheduled refresh.
    Refresh,
    /// A decimal value such as a temperature in °C or a number of hours.
    Decimal(f64),
    /// A textual value such as an operation mode number.
    Text(String),
}

impl From<f64> for Command {
    fn from(value: f64) -> Self {
        Command::Decimal(value)
    }
}

impl From<&str> for Command {
    fn from(value: &str) -> Self {
        Command::Text(value.to_string())
    }
}

fn encode_mode(channel: &'static str, text: &str, min: i32, max: i32) -> Result<i32> {
    match text.trim().parse::<i32>() {
        Ok(mode) if (min..=max).contains(&mode) => Ok(mode),
        _ => Err(Error::OutOfRange {
            channel,
            value: text.to_string(),
        }),
    }
}

fn encode_tenths(channel: &'static str, value: f64) -> Result<i32> {
    let tenths = (value * 10.0).trunc();
    if tenths.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&tenths) {
        Ok(tenths as i32)
    } else {
        Err(Error::OutOfRange {
            channel,
            value: value.to_string(),
        })
    }
}

/// Encodes a command addressed by channel id.
///
/// Channels without a rule are not owned by the heat pump and yield `Ok(None)`.
pub fn encode_command(channel: &str, command: &Command) -> Result<Option<(ParameterIndex, i32)>> {
    match CommandTarget::from_channel(channel) {
        Some(target) => target.encode(command),
        None => Ok(None),
    }
}
