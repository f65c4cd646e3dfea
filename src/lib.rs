//! A library for polling and controlling Luxtronik heat pump controllers.
//!
//! The controller exposes two fixed-layout register arrays over TCP: measured
//! values and writable parameters. This crate reads both periodically, decodes
//! them into typed snapshots and encodes commands back into parameter writes.
//!
//! ## Features
//!
//! - **Register decoding**: [`protocol`] turns the raw arrays into [`protocol::ValueSnapshot`]
//!   and [`protocol::ParameterSnapshot`], including the firmware correction of the
//!   thermal energy counters.
//! - **Command encoding**: [`command`] maps writable channels to parameter registers
//!   through a static table.
//! - **Serialized device access**: [`session::DeviceSession`] guarantees that only one
//!   exchange with the controller is in flight and tracks connectivity.
//! - **Polling**: [`scheduler::PollingScheduler`] and [`handler::HeatpumpHandler`] drive
//!   refresh cycles at a fixed delay and stop cleanly on dispose.
//!
//! ## Quick Start
//!
//! ```no_run
//! use luxtronik_lib::{config::HeatpumpConfig, connector::{Connect, Connector, TcpConnect}, protocol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HeatpumpConfig::new("192.168.1.20");
//!     let mut connector = TcpConnect.connect(&config).await?;
//!     let values = connector.read_values().await?;
//!     let parameters = connector.read_parameters().await?;
//!     connector.close();
//!
//!     let (values, parameters) = protocol::decode(&values, &parameters)?;
//!     println!(
//!         "Supply {} °C, heating mode {}",
//!         values.temperatures.supply, parameters.heating_operation_mode
//!     );
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod command;
pub mod config;
pub mod connector;
mod error;
pub mod handler;
pub mod protocol;
pub mod scheduler;
pub mod session;

pub use error::{Error, Result};
