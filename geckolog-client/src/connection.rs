//! Connection management.

use crate::classic::ClassicLink;
use crate::error::ClientError;
use crate::link::{MemoryLink, Variant};
use crate::text::TextLink;
use bytes::Bytes;
use geckolog_protocol::ProtocolError;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;

/// Default connect and request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Console address.
    pub ip: IpAddr,
    /// Port override; the variant's default port when `None`.
    pub port: Option<u16>,
    /// Wire variant spoken by the stub.
    pub variant: Variant,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout for one request/response exchange.
    pub request_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(ip: IpAddr, variant: Variant) -> Self {
        Self {
            ip,
            port: None,
            variant,
            connect_timeout: DEFAULT_TIMEOUT,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the socket address to connect to.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port.unwrap_or(self.variant.default_port()))
    }
}

/// Opens the TCP connection with the configured timeout.
pub(crate) async fn open_stream(config: &ConnectionConfig) -> Result<TcpStream, ClientError> {
    let addr = config.addr();
    tracing::debug!("Connecting to {} ({})...", addr, config.variant);

    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| {
            tracing::debug!("Connection timeout");
            ClientError::Timeout
        })?
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;

    // Requests are tiny and strictly sequential.
    stream.set_nodelay(true).ok();

    tracing::debug!("TCP connected to {}", addr);
    Ok(stream)
}

/// Bounds one exchange by the request timeout.
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    exchange: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::time::timeout(timeout, exchange).await.map_err(|_| {
        tracing::debug!("Request timed out after {:?}", timeout);
        ClientError::Timeout
    })?
}

/// Fills `buf` completely, reporting EOF as a closed connection.
pub(crate) async fn read_exact<S>(stream: &mut S, buf: &mut [u8]) -> Result<(), ClientError>
where
    S: AsyncRead + Unpin,
{
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(ClientError::ConnectionClosed),
        Err(e) => Err(ClientError::Io(e)),
    }
}

/// Offsets `address` into its slot, rejecting wrap-around.
pub(crate) fn slot_address(address: u32, offset: u32, length: u32) -> Result<u32, ClientError> {
    address
        .checked_add(offset)
        .ok_or_else(|| ProtocolError::OutOfRange { address, length }.into())
}

/// A link of either variant, chosen once when connecting.
pub enum AnyLink {
    Classic(ClassicLink<TcpStream>),
    Text(TextLink<TcpStream>),
}

/// Connects to the stub and returns the link matching `config.variant`.
pub async fn connect(config: &ConnectionConfig) -> Result<AnyLink, ClientError> {
    match config.variant {
        Variant::Classic => Ok(AnyLink::Classic(ClassicLink::connect(config).await?)),
        Variant::Text => Ok(AnyLink::Text(TextLink::connect(config).await?)),
    }
}

impl MemoryLink for AnyLink {
    fn variant(&self) -> Variant {
        match self {
            AnyLink::Classic(link) => link.variant(),
            AnyLink::Text(link) => link.variant(),
        }
    }

    async fn read_bytes(&mut self, address: u32, length: u32) -> Result<Bytes, ClientError> {
        match self {
            AnyLink::Classic(link) => link.read_bytes(address, length).await,
            AnyLink::Text(link) => link.read_bytes(address, length).await,
        }
    }

    async fn peek8(&mut self, address: u32) -> Result<u8, ClientError> {
        match self {
            AnyLink::Classic(link) => link.peek8(address).await,
            AnyLink::Text(link) => link.peek8(address).await,
        }
    }

    async fn peek16(&mut self, address: u32) -> Result<u16, ClientError> {
        match self {
            AnyLink::Classic(link) => link.peek16(address).await,
            AnyLink::Text(link) => link.peek16(address).await,
        }
    }

    async fn peek32(&mut self, address: u32) -> Result<u32, ClientError> {
        match self {
            AnyLink::Classic(link) => link.peek32(address).await,
            AnyLink::Text(link) => link.peek32(address).await,
        }
    }

    async fn peek_float(&mut self, address: u32) -> Result<f32, ClientError> {
        match self {
            AnyLink::Classic(link) => link.peek_float(address).await,
            AnyLink::Text(link) => link.peek_float(address).await,
        }
    }
}
