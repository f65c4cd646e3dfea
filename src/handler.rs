//! Lifecycle of one heat pump: polling, command dispatch and disposal.
use crate::{
    command::{Command, CommandTarget},
    config::HeatpumpConfig,
    connector::Connect,
    scheduler::PollingScheduler,
    session::{DeviceSession, SessionState, StatusSink},
    Result,
};
use std::sync::Arc;

/// Owns the [`DeviceSession`] of one heat pump and the scheduler driving it.
///
/// ## Example
///
/// ```no_run
/// use luxtronik_lib::{
///     config::HeatpumpConfig,
///     connector::TcpConnect,
///     handler::HeatpumpHandler,
///     protocol::{ParameterSnapshot, ValueSnapshot},
///     session::{SessionState, StatusSink},
/// };
///
/// struct Print;
///
/// impl StatusSink for Print {
///     fn publish(&self, values: &ValueSnapshot, _: &ParameterSnapshot) {
///         println!("Supply: {} °C", values.temperatures.supply);
///     }
///     fn status_changed(&self, state: &SessionState) {
///         println!("Status: {}", state.status);
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let config = HeatpumpConfig::new("192.168.1.20");
///     let mut handler = HeatpumpHandler::new(config, TcpConnect, Print);
///     handler.initialize();
///     tokio::signal::ctrl_c().await.ok();
///     handler.dispose();
/// }
/// ```
pub struct HeatpumpHandler<C, S> {
    session: Arc<DeviceSession<C, S>>,
    scheduler: Option<PollingScheduler>,
}

impl<C, S> HeatpumpHandler<C, S>
where
    C: Connect + 'static,
    S: StatusSink + 'static,
{
    pub fn new(config: HeatpumpConfig, connect: C, sink: S) -> Self {
        Self {
            session: Arc::new(DeviceSession::new(config, connect, sink)),
            scheduler: None,
        }
    }

    pub fn session(&self) -> &Arc<DeviceSession<C, S>> {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Sets the state to unknown and starts polling right away.
    ///
    /// A refresh still in flight from an earlier initialization finishes but
    /// neither publishes nor changes the new state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.cancel();
        }
        self.session.reset();
        let session = self.session.clone();
        let interval = session.config().polling_interval;
        log::info!(
            "Polling heat pump at '{}' every {interval:?}",
            session.config().address()
        );
        self.scheduler = Some(PollingScheduler::start(interval, move || {
            let session = session.clone();
            async move {
                // Failures are already recovered into the session state.
                let _ = session.refresh().await;
            }
        }));
    }

    /// Dispatches a command addressed by channel id.
    ///
    /// Channels that are not writable on the heat pump are ignored.
    pub async fn handle_command(&self, channel: &str, command: &Command) -> Result<()> {
        match CommandTarget::from_channel(channel) {
            Some(target) => self.session.send_command(target, command).await,
            None => {
                log::trace!("Ignoring command for read-only channel '{channel}'");
                Ok(())
            }
        }
    }

    /// Cancels polling. A refresh in flight may finish but publishes nothing.
    pub fn dispose(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.cancel();
        }
        self.session.dispose();
    }

    /// Like [`Self::dispose`], but waits for a refresh in flight to finish.
    pub async fn shutdown(&mut self) {
        self.session.dispose();
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
        }
    }
}
