//! Socket writer for remote collectors
//!
//! Sends each rendered record, newline-terminated, over a TCP stream or a
//! connected UDP socket. The connection is opened lazily on the first record
//! and reopened immediately after a failed send; the failed record itself is
//! not retried.

use crate::core::{
    LogWriter, LoggerError, Pattern, Record, Result, Sink, Worker, WriterMetrics,
    DEFAULT_BUFFER_LENGTH,
};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport used by a [`ConnectionWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" | "" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(LoggerError::config(
                "protocol",
                format!("unsupported protocol '{}', expected tcp or udp", other),
            )),
        }
    }
}

enum Conn {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Conn {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Conn::Tcp(stream) => stream.write_all(bytes),
            Conn::Udp(socket) => {
                let sent = socket.send(bytes)?;
                if sent < bytes.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("datagram truncated: {} of {} bytes", sent, bytes.len()),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Socket state shared by the worker and `send_raw` callers
struct ConnState {
    protocol: Protocol,
    addr: String,
    conn: Option<Conn>,
    reconnect_on_msg: bool,
    reconnect_requested: bool,
    metrics: Arc<WriterMetrics>,
}

impl ConnState {
    /// One-shot reconnect flag first, then a missing connection, then policy.
    fn needs_connect(&mut self) -> bool {
        if self.reconnect_requested {
            self.reconnect_requested = false;
            return true;
        }
        self.conn.is_none() || self.reconnect_on_msg
    }

    fn connect(&mut self) -> Result<()> {
        self.conn = None;
        self.metrics.record_connect_attempt();

        let targets: Vec<SocketAddr> = self
            .addr
            .to_socket_addrs()
            .map_err(|e| self.error(format!("cannot resolve: {}", e)))?
            .collect();

        let mut last_error = None;
        for target in targets {
            match self.open(target) {
                Ok(conn) => {
                    self.conn = Some(conn);
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(self.error(match last_error {
            Some(e) => format!("connect failed: {}", e),
            None => "address resolved to nothing".to_string(),
        }))
    }

    fn open(&self, target: SocketAddr) -> io::Result<Conn> {
        match self.protocol {
            Protocol::Tcp => {
                let stream = TcpStream::connect_timeout(&target, IO_TIMEOUT)?;
                stream.set_write_timeout(Some(IO_TIMEOUT))?;
                stream.set_nodelay(true)?;
                socket2::SockRef::from(&stream).set_keepalive(true)?;
                Ok(Conn::Tcp(stream))
            }
            Protocol::Udp => {
                let local = if target.is_ipv4() {
                    "0.0.0.0:0"
                } else {
                    "[::]:0"
                };
                let socket = UdpSocket::bind(local)?;
                socket.connect(target)?;
                Ok(Conn::Udp(socket))
            }
        }
    }

    /// Send one payload. A failed send drops the socket and reconnects at once.
    fn deliver(&mut self, bytes: &[u8]) -> Result<()> {
        if self.needs_connect() {
            self.connect()?;
        }

        let Some(conn) = self.conn.as_mut() else {
            return Err(self.error("not connected"));
        };

        match conn.send(bytes) {
            Ok(()) => {
                self.metrics.record_written(bytes.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.conn = None;
                self.metrics.record_reconnect();
                if let Err(reconnect_err) = self.connect() {
                    eprintln!("[LOGGER WARNING] {}", reconnect_err);
                }
                Err(self.error(format!("send failed: {}", e)))
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> LoggerError {
        LoggerError::connection(self.protocol.as_str(), self.addr.clone(), message)
    }
}

struct ConnSink {
    name: String,
    state: Arc<Mutex<ConnState>>,
    pattern: Pattern,
    metrics: Arc<WriterMetrics>,
}

impl Sink for ConnSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        let mut line = self.pattern.render(record);
        line.push('\n');

        // Socket failures are absorbed here; the worker keeps going
        if let Err(e) = self.state.lock().deliver(line.as_bytes()) {
            self.metrics.record_failed();
            eprintln!("[LOGGER ERROR] {}", e);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(Conn::Tcp(stream)) = self.state.lock().conn.as_mut() {
            if let Err(e) = stream.flush() {
                eprintln!("[LOGGER WARNING] Failed to flush {}: {}", self.name, e);
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().conn = None;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Writer that forwards records to a TCP or UDP collector
///
/// # Examples
///
/// ```no_run
/// use category_logger::writers::{ConnectionWriter, Protocol};
///
/// let writer = ConnectionWriter::builder("logs.internal:5140")
///     .protocol(Protocol::Udp)
///     .pattern("%L %C %M")
///     .build()
///     .unwrap();
///
/// // Bypass the queue for pre-rendered payloads
/// writer.send_raw(b"hello collector\n").unwrap();
/// ```
pub struct ConnectionWriter {
    worker: Worker,
    state: Arc<Mutex<ConnState>>,
}

impl ConnectionWriter {
    /// TCP writer with the default pattern
    ///
    /// # Errors
    ///
    /// Returns error if the worker thread cannot be started
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        Self::builder(addr).build()
    }

    #[must_use]
    pub fn builder(addr: impl Into<String>) -> ConnectionWriterBuilder {
        ConnectionWriterBuilder::new(addr)
    }

    /// Send bytes directly from the calling thread.
    ///
    /// Shares the worker's socket and lock, so it never interleaves with a
    /// record being sent.
    ///
    /// # Errors
    ///
    /// Returns error if no connection could be made or the send failed
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        let result = self.state.lock().deliver(bytes);
        if result.is_err() {
            self.worker.metrics().record_failed();
        }
        result
    }

    /// Force a fresh connection before the next send.
    pub fn request_reconnect(&self) {
        self.state.lock().reconnect_requested = true;
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().conn.is_some()
    }

    pub fn protocol(&self) -> Protocol {
        self.state.lock().protocol
    }
}

impl LogWriter for ConnectionWriter {
    fn log_write(&self, record: Arc<Record>) {
        self.worker.push(record);
    }

    fn close(&self) {
        self.worker.close();
    }

    fn name(&self) -> &str {
        self.worker.name()
    }

    fn metrics(&self) -> &WriterMetrics {
        self.worker.metrics()
    }
}

pub struct ConnectionWriterBuilder {
    addr: String,
    protocol: Protocol,
    pattern: Pattern,
    reconnect_on_msg: bool,
    capacity: usize,
}

impl ConnectionWriterBuilder {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            protocol: Protocol::Tcp,
            pattern: Pattern::default(),
            reconnect_on_msg: false,
            capacity: DEFAULT_BUFFER_LENGTH,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Open a new connection for every record
    #[must_use = "builder methods return a new value"]
    pub fn reconnect_on_msg(mut self, reconnect_on_msg: bool) -> Self {
        self.reconnect_on_msg = reconnect_on_msg;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Start the worker. No connection is attempted until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the address is empty or the worker cannot be started
    pub fn build(self) -> Result<ConnectionWriter> {
        if self.addr.trim().is_empty() {
            return Err(LoggerError::config("socket", "address is empty"));
        }

        let metrics = Arc::new(WriterMetrics::new());
        let state = Arc::new(Mutex::new(ConnState {
            protocol: self.protocol,
            addr: self.addr.clone(),
            conn: None,
            reconnect_on_msg: self.reconnect_on_msg,
            reconnect_requested: false,
            metrics: Arc::clone(&metrics),
        }));
        let sink = ConnSink {
            name: format!("{}:{}", self.protocol, self.addr),
            state: Arc::clone(&state),
            pattern: self.pattern,
            metrics: Arc::clone(&metrics),
        };

        Ok(ConnectionWriter {
            worker: Worker::spawn(sink, self.capacity, metrics)?,
            state,
        })
    }
}
