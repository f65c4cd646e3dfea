//! Errors raised while talking to a heat pump controller or while translating
//! its registers.
use std::time::Duration;

/// Represents all possible errors of a refresh or command cycle.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The configured host could not be resolved to a socket address.
    #[error("Cannot resolve heat pump address '{address}': {source}")]
    AddressResolution {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Wraps `std::io::Error` raised by the transport.
    #[error(transparent)]
    Transport(#[from] std::io::Error),

    /// The device did not answer within the connection timeout.
    #[error("No answer from heat pump within {0:?}")]
    Timeout(Duration),

    /// A register array is shorter than the fixed layout requires.
    #[error("Malformed {array} array: expected at least {expected} registers, got {actual}")]
    MalformedPayload {
        array: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The command value has the wrong type for the addressed channel.
    #[error("Channel '{channel}' expects a {expected} command")]
    UnsupportedCommandType {
        channel: &'static str,
        expected: &'static str,
    },

    /// The command value lies outside the channel's accepted range.
    #[error("Value {value} is out of range for channel '{channel}'")]
    OutOfRange {
        channel: &'static str,
        value: String,
    },
}

impl Error {
    /// Returns `true` for I/O failures, timeouts included.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }

    /// Returns `true` for failures that mean the device could not be reached.
    pub fn is_connectivity(&self) -> bool {
        self.is_transport() || matches!(self, Error::AddressResolution { .. })
    }
}

/// The result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;
