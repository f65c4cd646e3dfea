//! Refresh and command cycles against one heat pump.
//!
//! A [`DeviceSession`] serializes all device I/O: at most one refresh or
//! command exchange is in flight at any time, because the controller only
//! answers one request at a time. The lock covers the "connect, exchange,
//! close" sequence and the state transition that follows it, never a call
//! into the [`StatusSink`].
//!
//! Failures never escape as panics. Connectivity failures of a refresh turn
//! the session [`ConnectionStatus::Offline`] once it has been online before,
//! failed writes are only reported, and malformed payloads keep the status.
use crate::{
    command::{Command, CommandTarget},
    config::HeatpumpConfig,
    connector::{Connect, Connector},
    protocol::{self, ParameterIndex, ParameterSnapshot, ValueSnapshot},
    Result,
};
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{watch, Mutex};

/// Connectivity of the device as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No refresh has succeeded yet.
    #[default]
    Unknown,
    Online,
    Offline,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConnectionStatus::Unknown => "UNKNOWN",
            ConnectionStatus::Online => "ONLINE",
            ConnectionStatus::Offline => "OFFLINE",
        })
    }
}

/// Connectivity state shared between the polling and the command path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub status: ConnectionStatus,
    /// Detail of the failure that caused the last offline transition.
    pub last_error: Option<String>,
    /// Completion time of the last successful refresh.
    pub last_success: Option<DateTime<Local>>,
}

impl SessionState {
    /// Whether at least one refresh has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.last_success.is_some()
    }
}

/// Receives everything a session publishes.
pub trait StatusSink: Send + Sync {
    /// Called once per successful refresh cycle.
    fn publish(&self, values: &ValueSnapshot, parameters: &ParameterSnapshot);

    /// Called whenever status or error detail changes.
    fn status_changed(&self, state: &SessionState);
}

impl<T: StatusSink + ?Sized> StatusSink for std::sync::Arc<T> {
    fn publish(&self, values: &ValueSnapshot, parameters: &ParameterSnapshot) {
        (**self).publish(values, parameters)
    }

    fn status_changed(&self, state: &SessionState) {
        (**self).status_changed(state)
    }
}

/// Orchestrates refresh and command cycles for one heat pump.
pub struct DeviceSession<C, S> {
    config: HeatpumpConfig,
    connect: C,
    sink: S,
    io: Mutex<()>,
    state: watch::Sender<SessionState>,
    disposed: AtomicBool,
    /// Bumped by every reset, so cycles started before it cannot touch the new state.
    generation: AtomicU64,
}

impl<C, S> DeviceSession<C, S>
where
    C: Connect,
    S: StatusSink,
{
    pub fn new(config: HeatpumpConfig, connect: C, sink: S) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            config,
            connect,
            sink,
            io: Mutex::new(()),
            state,
            disposed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HeatpumpConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resets the state to [`ConnectionStatus::Unknown`] and accepts cycles again.
    ///
    /// Refresh cycles still in flight from before the reset publish nothing.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.disposed.store(false, Ordering::SeqCst);
        self.state.send_replace(SessionState::default());
    }

    /// Stops all further state transitions and publications.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Runs one refresh cycle: read both arrays, decode them and publish.
    ///
    /// The device lock is released before the sink is called, so a slow sink
    /// never delays commands or the next refresh.
    ///
    /// # Errors
    ///
    /// Returns the failure of the cycle after it has been recovered into the
    /// session state, so callers may ignore it.
    pub async fn refresh(&self) -> Result<()> {
        let generation = self.generation.load(Ordering::SeqCst);
        let io = self.io.lock().await;

        let (values, parameters) = match self.read_registers().await {
            Ok(registers) => registers,
            Err(error) => {
                debug!(
                    "Couldn't read heat pump [address '{}']: {error}",
                    self.config.address()
                );
                let initialized = self.state().is_initialized();
                let changed = initialized
                    && self.update_state(
                        generation,
                        ConnectionStatus::Offline,
                        Some(error.to_string()),
                    );
                drop(io);
                if changed {
                    self.notify_status(generation);
                }
                return Err(error);
            }
        };

        let decoded = protocol::decode(&values, &parameters).inspect_err(|error| {
            warn!(
                "Heat pump at '{}' sent a malformed payload: {error}",
                self.config.address()
            )
        });
        let changed =
            decoded.is_ok() && self.update_state(generation, ConnectionStatus::Online, None);
        drop(io);
        let (value_snapshot, parameter_snapshot) = decoded?;

        if !self.is_current(generation) {
            debug!("Discarding refresh result, session disposed or reset");
            return Ok(());
        }
        self.sink.publish(&value_snapshot, &parameter_snapshot);
        if changed {
            self.notify_status(generation);
        }
        Ok(())
    }

    /// Runs one command cycle for `target`.
    ///
    /// Encoding errors reject the command before the device is touched. Write
    /// failures are logged and returned but never change the session state.
    pub async fn send_command(&self, target: CommandTarget, command: &Command) -> Result<()> {
        let (index, value) = match target.encode(command) {
            Ok(Some(write)) => write,
            Ok(None) => return Ok(()),
            Err(error) => {
                warn!("Heat pump command {command:?} for channel '{target}' rejected: {error}");
                return Err(error);
            }
        };

        let io = self.io.lock().await;
        let written = self.write_register(index, value).await;
        drop(io);
        written.inspect_err(|error| {
            warn!(
                "Couldn't set parameter {index} of heat pump [address '{}']: {error}",
                self.config.address()
            )
        })?;
        info!("Set heat pump channel '{target}' (parameter {index}) to {value}");
        Ok(())
    }

    async fn read_registers(&self) -> Result<(Vec<i32>, Vec<i32>)> {
        let mut connector = self.connect.connect(&self.config).await?;
        let registers = read_both(&mut connector).await;
        connector.close();
        registers
    }

    async fn write_register(&self, index: ParameterIndex, value: i32) -> Result<()> {
        let mut connector = self.connect.connect(&self.config).await?;
        let written = connector.write_parameter(index, value).await;
        connector.close();
        written
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_disposed() && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Applies a transition and reports whether status or error detail changed.
    fn update_state(
        &self,
        generation: u64,
        status: ConnectionStatus,
        last_error: Option<String>,
    ) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state.send_if_modified(|state| {
            let changed = state.status != status || state.last_error != last_error;
            state.status = status;
            state.last_error = last_error;
            if status == ConnectionStatus::Online {
                state.last_success = Some(Local::now());
            }
            changed
        })
    }

    fn notify_status(&self, generation: u64) {
        if self.is_current(generation) {
            self.sink.status_changed(&self.state());
        }
    }
}

async fn read_both<K: Connector>(connector: &mut K) -> Result<(Vec<i32>, Vec<i32>)> {
    let values = connector.read_values().await?;
    let parameters = connector.read_parameters().await?;
    Ok((values, parameters))
}
