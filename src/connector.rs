//! Transport to the heat pump controller.
//!
//! A [`Connector`] is one open session to the device, created fresh for every
//! refresh or command cycle by a [`Connect`] factory. [`TcpConnect`] speaks the
//! controller's binary TCP protocol: every word is a signed 32-bit big-endian
//! integer, and each request is answered by an echo of the request code.
//!
//! # Example
//!
//! ```no_run
//! use luxtronik_lib::{
//!     config::HeatpumpConfig,
//!     connector::{Connect, Connector, TcpConnect},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HeatpumpConfig::new("192.168.1.20");
//!     let mut connector = TcpConnect.connect(&config).await?;
//!     let values = connector.read_values().await;
//!     connector.close();
//!     println!("Read {} value registers", values?.len());
//!     Ok(())
//! }
//! ```
use crate::{config::HeatpumpConfig, protocol::ParameterIndex, Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

pub const CMD_WRITE_PARAMETER: i32 = 3002;
pub const CMD_READ_PARAMETERS: i32 = 3003;
pub const CMD_READ_VALUES: i32 = 3004;

/// Arrays announced longer than this are treated as garbage.
pub const MAX_ARRAY_LEN: usize = 65_535;

/// One open session to the heat pump.
///
/// Implementations must bound every call by the configured connection timeout.
pub trait Connector: Send {
    /// Reads the complete value array.
    fn read_values(&mut self) -> impl Future<Output = Result<Vec<i32>>> + Send;

    /// Reads the complete parameter array.
    fn read_parameters(&mut self) -> impl Future<Output = Result<Vec<i32>>> + Send;

    /// Writes a single parameter register and waits for the acknowledgement.
    fn write_parameter(
        &mut self,
        index: ParameterIndex,
        value: i32,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Releases the session. Never fails and may be called repeatedly.
    fn close(&mut self);
}

/// Opens a fresh [`Connector`] for one cycle.
pub trait Connect: Send + Sync {
    type Connector: Connector;

    fn connect(
        &self,
        config: &HeatpumpConfig,
    ) -> impl Future<Output = Result<Self::Connector>> + Send;
}

/// Opens TCP sessions to a Luxtronik controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnect;

impl Connect for TcpConnect {
    type Connector = TcpConnector;

    async fn connect(&self, config: &HeatpumpConfig) -> Result<TcpConnector> {
        let address = config.address();
        let timeout = config.connection_timeout;
        let stream = with_timeout(timeout, open_stream(&address, address.as_str())).await?;
        Ok(TcpConnector::new(stream, timeout))
    }
}

/// Resolves `target` and connects to the first address that accepts.
///
/// Unbounded on its own; the caller puts a single timeout around the whole
/// sequence.
async fn open_stream(address: &str, target: impl ToSocketAddrs) -> Result<TcpStream> {
    let resolved = tokio::net::lookup_host(target)
        .await
        .map_err(|source| Error::AddressResolution {
            address: address.to_string(),
            source,
        })?;
    let mut last_error = None;
    for socket_addr in resolved {
        log::trace!("Connecting to heat pump at {socket_addr}");
        match TcpStream::connect(socket_addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(Error::from(error)),
        }
    }
    Err(last_error.unwrap_or_else(|| Error::AddressResolution {
        address: address.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no address found"),
    }))
}

/// An open TCP session to a Luxtronik controller.
#[derive(Debug)]
pub struct TcpConnector<S = TcpStream> {
    stream: Option<S>,
    timeout: Duration,
}

impl<S> TcpConnector<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an already connected stream.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream: Some(stream),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn stream(&mut self) -> Result<&mut S> {
        self.stream.as_mut().ok_or_else(|| {
            Error::Transport(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "connection already closed",
            ))
        })
    }
}

impl<S> Connector for TcpConnector<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_values(&mut self) -> Result<Vec<i32>> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        with_timeout(timeout, request_array(stream, CMD_READ_VALUES, true)).await
    }

    async fn read_parameters(&mut self) -> Result<Vec<i32>> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        with_timeout(timeout, request_array(stream, CMD_READ_PARAMETERS, false)).await
    }

    async fn write_parameter(&mut self, index: ParameterIndex, value: i32) -> Result<()> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        with_timeout(timeout, request_write(stream, index.encode(), value)).await
    }

    fn close(&mut self) {
        // Dropping the stream closes the socket.
        self.stream.take();
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

fn invalid_data(message: String) -> Error {
    Error::Transport(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    ))
}

async fn send<S: AsyncWrite + Unpin>(stream: &mut S, words: &[i32]) -> Result<()> {
    let frame: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

async fn expect_echo<S: AsyncRead + Unpin>(stream: &mut S, command: i32) -> Result<()> {
    let echo = stream.read_i32().await?;
    if echo != command {
        return Err(invalid_data(format!(
            "Expected echo of command {command}, got {echo}"
        )));
    }
    Ok(())
}

async fn request_array<S>(stream: &mut S, command: i32, with_status: bool) -> Result<Vec<i32>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send(stream, &[command, 0]).await?;
    expect_echo(stream, command).await?;
    if with_status {
        let status = stream.read_i32().await?;
        log::trace!("Command {command} status {status}");
    }
    let announced = stream.read_i32().await?;
    let len = usize::try_from(announced)
        .ok()
        .filter(|len| *len <= MAX_ARRAY_LEN)
        .ok_or_else(|| invalid_data(format!("Invalid array length {announced}")))?;

    let mut registers = Vec::with_capacity(len);
    for _ in 0..len {
        registers.push(stream.read_i32().await?);
    }
    log::trace!("Command {command} returned {len} registers");
    Ok(registers)
}

async fn request_write<S>(stream: &mut S, index: i32, value: i32) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send(stream, &[CMD_WRITE_PARAMETER, index, value]).await?;
    expect_echo(stream, CMD_WRITE_PARAMETER).await?;
    let acknowledged = stream.read_i32().await?;
    if acknowledged != index {
        return Err(invalid_data(format!(
            "Write of parameter {index} acknowledged for parameter {acknowledged}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::io::{duplex, DuplexStream};

    fn words(words: &[i32]) -> Vec<u8> {
        words.iter().flat_map(|word| word.to_be_bytes()).collect()
    }

    async fn read_words(device: &mut DuplexStream, n: usize) -> Vec<i32> {
        let mut request = Vec::new();
        for _ in 0..n {
            request.push(device.read_i32().await.unwrap());
        }
        request
    }

    #[tokio::test]
    async fn read_values_with_status_word() {
        let (client, mut device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));

        let server = tokio::spawn(async move {
            assert_eq!(read_words(&mut device, 2).await, vec![3004, 0]);
            device
                .write_all(&words(&[3004, 0, 3, 215, -12, 7]))
                .await
                .unwrap();
            device
        });

        assert_eq!(connector.read_values().await.unwrap(), vec![215, -12, 7]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn read_parameters_without_status_word() {
        let (client, mut device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));

        let server = tokio::spawn(async move {
            assert_eq!(read_words(&mut device, 2).await, vec![3003, 0]);
            device.write_all(&words(&[3003, 2, 10, 20])).await.unwrap();
            device
        });

        assert_eq!(connector.read_parameters().await.unwrap(), vec![10, 20]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn write_parameter_is_acknowledged() {
        let (client, mut device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));

        let server = tokio::spawn(async move {
            assert_eq!(read_words(&mut device, 3).await, vec![3002, 3, 4]);
            device.write_all(&words(&[3002, 3])).await.unwrap();
            device
        });

        connector
            .write_parameter(ParameterIndex::HEATING_OPERATION_MODE, 4)
            .await
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn wrong_echo_is_invalid_data() {
        let (client, mut device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));
        device.write_all(&words(&[3003, 0, 0])).await.unwrap();

        assert_matches!(
            connector.read_values().await,
            Err(Error::Transport(err)) if err.kind() == std::io::ErrorKind::InvalidData
        );
    }

    #[tokio::test]
    async fn negative_length_is_invalid_data() {
        let (client, mut device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));
        device.write_all(&words(&[3003, -1])).await.unwrap();

        assert_matches!(
            connector.read_parameters().await,
            Err(Error::Transport(err)) if err.kind() == std::io::ErrorKind::InvalidData
        );
    }

    #[tokio::test(start_paused = true)]
    async fn silent_device_times_out() {
        let (client, _device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(3));

        assert_matches!(
            connector.read_values().await,
            Err(Error::Timeout(timeout)) if timeout == Duration::from_secs(3)
        );
    }

    #[tokio::test]
    async fn closed_device_is_transport_error() {
        let (client, device) = duplex(1024);
        drop(device);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));
        assert_matches!(connector.read_values().await, Err(Error::Transport(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (client, _device) = duplex(1024);
        let mut connector = TcpConnector::new(client, Duration::from_secs(1));
        connector.close();
        connector.close();
        assert_matches!(
            connector.read_parameters().await,
            Err(Error::Transport(err)) if err.kind() == std::io::ErrorKind::NotConnected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn every_address_shares_one_timeout() {
        let timeout = Duration::from_secs(2);
        // Non-routable, so connects either hang or fail at once.
        let silent: Vec<std::net::SocketAddr> = (1..=3)
            .map(|host| std::net::SocketAddr::from(([10, 255, 255, host], 8889)))
            .collect();

        let start = tokio::time::Instant::now();
        let result = with_timeout(timeout, open_stream("silent", &silent[..])).await;

        assert_matches!(result, Err(error) if error.is_connectivity());
        assert!(start.elapsed() <= timeout);
    }

    #[tokio::test]
    async fn unresolvable_target_is_address_resolution() {
        let none: Vec<std::net::SocketAddr> = Vec::new();
        assert_matches!(
            open_stream("nowhere:8889", &none[..]).await,
            Err(Error::AddressResolution { address, .. }) if address == "nowhere:8889"
        );
    }
}
