//! Connection and polling settings of one heat pump.
use std::time::Duration;

/// Settings of one heat pump, fixed for the lifetime of a [`crate::session::DeviceSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct HeatpumpConfig {
    /// Host name or IP address of the controller.
    pub host: String,
    #[cfg_attr(feature = "serde", serde(default = "default_port"))]
    pub port: u16,
    /// Upper bound for connecting and for every request/response exchange.
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_connection_timeout", with = "humantime_serde")
    )]
    pub connection_timeout: Duration,
    /// Delay between two refresh cycles.
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_polling_interval", with = "humantime_serde")
    )]
    pub polling_interval: Duration,
}

pub const DEFAULT_PORT: u16 = 8889;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_polling_interval() -> Duration {
    Duration::from_secs(60)
}

impl HeatpumpConfig {
    /// Creates a configuration with default port, timeout and polling interval.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            connection_timeout: default_connection_timeout(),
            polling_interval: default_polling_interval(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// The `host:port` address used for connecting and in log messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
