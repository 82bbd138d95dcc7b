//! TCP connection lifecycle for the Modbus master.
//!
//! A [`Connection`] owns one TCP stream, the per-connection transaction-id
//! counter and the [`ConnectionState`] machine. Connect, send and receive are
//! all bounded by the configured timeouts, and every lifecycle or error
//! transition is reported on the diagnostic event channel handed out by
//! [`Connection::open`].
//!
//! A connection is a single-writer resource: one request in flight at a time,
//! enforced by `&mut self` on every operation. After a read or write error
//! the caller must `close` and `connect` again; nothing reconnects on its own.

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

static NEXT_CONNECTION_ID: AtomicU32 = AtomicU32::new(1);

/// The state a connection is in; exactly one value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    ConnectionError,
    ReadError,
    WriteError,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connected => f.write_str("connected"),
            Self::ConnectionError => f.write_str("connection error"),
            Self::ReadError => f.write_str("read error"),
            Self::WriteError => f.write_str("write error"),
        }
    }
}

/// Diagnostic notification emitted on connect, close and error transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub connection_id: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub connect_timeout: Duration,
    pub send_timeout: Duration,
    pub receive_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(1000),
            send_timeout: Duration::from_millis(5000),
            receive_timeout: Duration::from_millis(5000),
        }
    }
}

impl ConnectionConfig {
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn with_receive_timeout(mut self, receive_timeout: Duration) -> Self {
        self.receive_timeout = receive_timeout;
        self
    }
}

#[derive(Debug, Error)]
pub enum NetError {
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),
    #[error("connect timed out")]
    ConnectTimeout,
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("write timed out")]
    WriteTimeout,
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("read timed out")]
    ReadTimeout,
    #[error("connection closed by peer")]
    ConnectionClosed,
}

/// One TCP session towards a Modbus server device.
#[derive(Debug)]
pub struct Connection {
    stream: Option<TcpStream>,
    state: ConnectionState,
    transaction_id: u16,
    connection_id: u32,
    config: ConnectionConfig,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Connection {
    /// Create a closed connection and the receiving end of its diagnostic
    /// event channel.
    pub fn open(config: ConnectionConfig) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            stream: None,
            state: ConnectionState::Disconnected,
            transaction_id: 0,
            connection_id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            config,
            events,
        };
        (connection, receiver)
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Pre-increment transaction-id counter, wrapping 65535 -> 0.
    pub fn next_transaction_id(&mut self) -> u16 {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }

    fn emit(&self, message: String) {
        let _ = self.events.send(ConnectionEvent {
            connection_id: self.connection_id,
            message,
        });
    }

    /// Bounded-time TCP connect. A held stream (any state but
    /// `Disconnected`/`ConnectionError`) must be closed first.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), NetError> {
        if self.stream.is_some() {
            return Err(NetError::AlreadyConnected);
        }

        match timeout(self.config.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                debug!(
                    connection_id = self.connection_id,
                    host, port, "connection established"
                );
                self.emit(format!("connect({host}:{port}): connection established"));
                Ok(())
            }
            Ok(Err(err)) => {
                self.state = ConnectionState::ConnectionError;
                warn!(
                    connection_id = self.connection_id,
                    host, port, error = %err, "connect failed"
                );
                self.emit(format!("connect({host}:{port}): connection failed: {err}"));
                Err(NetError::ConnectFailed(err))
            }
            Err(_) => {
                self.state = ConnectionState::ConnectionError;
                warn!(
                    connection_id = self.connection_id,
                    host, port, "connect timed out"
                );
                self.emit(format!("connect({host}:{port}): connect timed out"));
                Err(NetError::ConnectTimeout)
            }
        }
    }

    /// Idempotent close. From `Disconnected`/`ConnectionError` this only
    /// normalizes the state; otherwise the stream is dropped and an event
    /// emitted.
    pub fn close(&mut self) {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::ConnectionError => {
                self.state = ConnectionState::Disconnected;
            }
            _ => {
                self.stream = None;
                self.state = ConnectionState::Disconnected;
                debug!(connection_id = self.connection_id, "connection closed");
                self.emit("close(): connection closed".to_string());
            }
        }
    }

    /// Write the exact byte sequence, bounded by the send timeout.
    pub async fn write_frame(&mut self, bytes: &[u8]) -> Result<(), NetError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(NetError::NotConnected);
        };

        match timeout(self.config.send_timeout, stream.write_all(bytes)).await {
            Ok(Ok(())) => {
                trace!(
                    connection_id = self.connection_id,
                    len = bytes.len(),
                    "frame written"
                );
                Ok(())
            }
            Ok(Err(err)) => {
                self.state = ConnectionState::WriteError;
                self.emit(format!("write: {err}"));
                Err(NetError::Write(err))
            }
            Err(_) => {
                self.state = ConnectionState::WriteError;
                self.emit("write: send timed out".to_string());
                Err(NetError::WriteTimeout)
            }
        }
    }

    /// Read until `buf` is completely filled or the receive timeout fires.
    /// A short read is never returned: EOF mid-fill is an error.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), NetError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(NetError::NotConnected);
        };

        match timeout(self.config.receive_timeout, stream.read_exact(buf)).await {
            Ok(Ok(_)) => {
                trace!(
                    connection_id = self.connection_id,
                    len = buf.len(),
                    "frame bytes read"
                );
                Ok(())
            }
            Ok(Err(err)) => {
                self.state = ConnectionState::ReadError;
                if err.kind() == std::io::ErrorKind::UnexpectedEof {
                    self.emit("read: connection closed by peer".to_string());
                    Err(NetError::ConnectionClosed)
                } else {
                    self.emit(format!("read: {err}"));
                    Err(NetError::Read(err))
                }
            }
            Err(_) => {
                self.state = ConnectionState::ReadError;
                self.emit("read: receive timed out".to_string());
                Err(NetError::ReadTimeout)
            }
        }
    }

    /// Record a read failure detected above the socket layer, e.g. a header
    /// that arrived complete but decoded as garbage.
    pub fn mark_read_error(&mut self, context: &str) {
        self.state = ConnectionState::ReadError;
        warn!(
            connection_id = self.connection_id,
            context, "malformed response"
        );
        self.emit(format!("read: {context}"));
    }
}
