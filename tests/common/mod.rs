#![allow(dead_code)]

use luxtronik_lib::{
    config::HeatpumpConfig,
    connector::{Connect, Connector},
    protocol::{ParameterIndex, ParameterSnapshot, ValueSnapshot, MIN_PARAMETERS_LEN, MIN_VALUES_LEN},
    session::{SessionState, StatusSink},
    Error, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock device misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Resolve,
    Refused,
    ReadTimeout,
    WriteRejected,
}

#[derive(Debug)]
struct Device {
    values: Mutex<Vec<i32>>,
    parameters: Mutex<Vec<i32>>,
    writes: Mutex<Vec<(ParameterIndex, i32)>>,
    failure: Mutex<Failure>,
    exchange_time: Mutex<Duration>,
    open: AtomicUsize,
    max_open: AtomicUsize,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// An in-memory heat pump that records every session opened against it.
#[derive(Debug, Clone)]
pub struct MockDevice(Arc<Device>);

impl Default for MockDevice {
    fn default() -> Self {
        Self::new(vec![0; MIN_VALUES_LEN], vec![0; MIN_PARAMETERS_LEN])
    }
}

impl MockDevice {
    pub fn new(values: Vec<i32>, parameters: Vec<i32>) -> Self {
        Self(Arc::new(Device {
            values: Mutex::new(values),
            parameters: Mutex::new(parameters),
            writes: Mutex::new(Vec::new()),
            failure: Mutex::new(Failure::None),
            exchange_time: Mutex::new(Duration::ZERO),
            open: AtomicUsize::new(0),
            max_open: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }))
    }

    pub fn set_failure(&self, failure: Failure) {
        *self.0.failure.lock().unwrap() = failure;
    }

    pub fn set_exchange_time(&self, duration: Duration) {
        *self.0.exchange_time.lock().unwrap() = duration;
    }

    pub fn set_value(&self, index: usize, raw: i32) {
        self.0.values.lock().unwrap()[index] = raw;
    }

    pub fn set_values(&self, values: Vec<i32>) {
        *self.0.values.lock().unwrap() = values;
    }

    pub fn set_parameter(&self, index: usize, raw: i32) {
        self.0.parameters.lock().unwrap()[index] = raw;
    }

    pub fn writes(&self) -> Vec<(ParameterIndex, i32)> {
        self.0.writes.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.0.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.0.closes.load(Ordering::SeqCst)
    }

    pub fn open_sessions(&self) -> usize {
        self.0.open.load(Ordering::SeqCst)
    }

    /// The highest number of sessions that were open at the same time.
    pub fn max_open_sessions(&self) -> usize {
        self.0.max_open.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Failure {
        *self.0.failure.lock().unwrap()
    }

    async fn exchange(&self) {
        let duration = *self.0.exchange_time.lock().unwrap();
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

impl Connect for MockDevice {
    type Connector = MockConnector;

    async fn connect(&self, config: &HeatpumpConfig) -> Result<MockConnector> {
        match self.failure() {
            Failure::Resolve => {
                return Err(Error::AddressResolution {
                    address: config.address(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "unknown host"),
                })
            }
            Failure::Refused => {
                return Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into())
            }
            _ => {}
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        let open = self.0.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(MockConnector {
            device: self.clone(),
            timeout: config.connection_timeout,
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct MockConnector {
    device: MockDevice,
    timeout: Duration,
    closed: bool,
}

impl Connector for MockConnector {
    async fn read_values(&mut self) -> Result<Vec<i32>> {
        self.device.exchange().await;
        if self.device.failure() == Failure::ReadTimeout {
            return Err(Error::Timeout(self.timeout));
        }
        Ok(self.device.0.values.lock().unwrap().clone())
    }

    async fn read_parameters(&mut self) -> Result<Vec<i32>> {
        self.device.exchange().await;
        Ok(self.device.0.parameters.lock().unwrap().clone())
    }

    async fn write_parameter(&mut self, index: ParameterIndex, value: i32) -> Result<()> {
        self.device.exchange().await;
        if self.device.failure() == Failure::WriteRejected {
            return Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset).into());
        }
        self.device.0.writes.lock().unwrap().push((index, value));
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.device.0.closes.fetch_add(1, Ordering::SeqCst);
            self.device.0.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockConnector {
    fn drop(&mut self) {
        self.close();
    }
}

/// Records everything a session publishes.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub published: Mutex<Vec<(ValueSnapshot, ParameterSnapshot)>>,
    pub states: Mutex<Vec<SessionState>>,
}

impl RecordingSink {
    pub fn publications(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn last_published(&self) -> Option<(ValueSnapshot, ParameterSnapshot)> {
        self.published.lock().unwrap().last().cloned()
    }

    pub fn states(&self) -> Vec<SessionState> {
        self.states.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, values: &ValueSnapshot, parameters: &ParameterSnapshot) {
        self.published
            .lock()
            .unwrap()
            .push((values.clone(), parameters.clone()));
    }

    fn status_changed(&self, state: &SessionState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

pub fn config() -> HeatpumpConfig {
    HeatpumpConfig::new("heatpump.test")
        .with_connection_timeout(Duration::from_secs(2))
        .with_polling_interval(Duration::from_secs(30))
}
