//! Syslog-style network writer
//!
//! Each record is framed as `<PRI>tag: message` and sent over UDP (one
//! datagram per record) or TCP (newline-delimited).

use super::Writer;
use crate::core::error::{LoggerError, Result};
use crate::core::level::Level;
use parking_lot::Mutex;
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(5);
/// syslog facility `user`
const FACILITY_USER: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

enum Connection {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// Sends records to a remote syslog collector
///
/// # Example
///
/// ```no_run
/// use logz::writers::{NetworkWriter, Writer};
///
/// let writer = NetworkWriter::new("udp://127.0.0.1:514").unwrap();
/// writer.write(b"service started\n").unwrap();
/// ```
pub struct NetworkWriter {
    name: String,
    address: SocketAddr,
    transport: Transport,
    tag: String,
    reconnect_on_error: bool,
    connection: Mutex<Option<Connection>>,
}

impl NetworkWriter {
    /// Connect to `udp://host:port`, `tcp://host:port` or `host:port` (UDP)
    pub fn new(address: &str) -> Result<Self> {
        let (transport, host) = parse_address(address)?;
        let address = host
            .to_socket_addrs()
            .map_err(|e| {
                LoggerError::io_operation("resolve syslog address", format!("'{}'", host), e)
            })?
            .next()
            .ok_or_else(|| LoggerError::config("output_syslog", format!("'{}' did not resolve", host)))?;

        let writer = Self {
            name: format!("syslog({})", address),
            address,
            transport,
            tag: "logz".to_string(),
            reconnect_on_error: true,
            connection: Mutex::new(None),
        };
        *writer.connection.lock() = Some(writer.connect()?);
        Ok(writer)
    }

    /// Program name placed in front of each message
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    fn connect(&self) -> Result<Connection> {
        let io = |e: std::io::Error| LoggerError::io_operation("connect to syslog", self.name.clone(), e);
        match self.transport {
            Transport::Udp => {
                let bind: SocketAddr = if self.address.is_ipv4() {
                    SocketAddr::from(([0, 0, 0, 0], 0))
                } else {
                    SocketAddr::from(([0u16; 8], 0))
                };
                let socket = UdpSocket::bind(bind).map_err(io)?;
                socket.connect(self.address).map_err(io)?;
                socket.set_write_timeout(Some(IO_TIMEOUT)).map_err(io)?;
                Ok(Connection::Udp(socket))
            }
            Transport::Tcp => {
                let stream = TcpStream::connect_timeout(&self.address, IO_TIMEOUT).map_err(io)?;
                stream.set_write_timeout(Some(IO_TIMEOUT)).map_err(io)?;
                stream.set_read_timeout(Some(IO_TIMEOUT)).map_err(io)?;
                stream.set_nodelay(true).map_err(io)?;
                Ok(Connection::Tcp(stream))
            }
        }
    }

    fn frame(&self, level: Level, buf: &[u8]) -> Vec<u8> {
        let pri = FACILITY_USER * 8 + syslog_severity(level);
        let message = trim_newline(buf);
        let mut frame = format!("<{}>{}: ", pri, self.tag).into_bytes();
        frame.extend_from_slice(message);
        if self.transport == Transport::Tcp {
            frame.push(b'\n');
        }
        frame
    }

    fn send(connection: &mut Connection, frame: &[u8]) -> std::io::Result<()> {
        match connection {
            Connection::Udp(socket) => socket.send(frame).map(|_| ()),
            Connection::Tcp(stream) => stream.write_all(frame),
        }
    }
}

impl Writer for NetworkWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        self.write_at(Level::Info, buf)
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        let frame = self.frame(level, buf);
        let mut connection = self.connection.lock();

        let first = match connection.as_mut() {
            Some(conn) => Self::send(conn, &frame),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "not connected",
            )),
        };
        let error = match first {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        *connection = None;
        if !self.reconnect_on_error {
            return Err(LoggerError::write_failed(&self.name, error.to_string()));
        }

        let mut fresh = self.connect().map_err(|reconnect| {
            LoggerError::write_failed(
                &self.name,
                format!("{} (reconnect failed: {})", error, reconnect),
            )
        })?;
        Self::send(&mut fresh, &frame)
            .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))?;
        *connection = Some(fresh);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(Connection::Tcp(stream)) = self.connection.lock().as_mut() {
            stream
                .flush()
                .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let result = self.flush();
        *self.connection.lock() = None;
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn parse_address(address: &str) -> Result<(Transport, &str)> {
    let address = address.trim();
    let (transport, host) = match address.split_once("://") {
        Some(("udp", host)) => (Transport::Udp, host),
        Some(("tcp", host)) => (Transport::Tcp, host),
        Some((scheme, _)) => {
            return Err(LoggerError::config(
                "output_syslog",
                format!("unsupported scheme '{}'", scheme),
            ))
        }
        None => (Transport::Udp, address),
    };
    if host.is_empty() {
        return Err(LoggerError::config("output_syslog", "missing host"));
    }
    Ok((transport, host))
}

fn syslog_severity(level: Level) -> u8 {
    match level {
        Level::Panic => 0,
        Level::Fatal | Level::Bug => 1,
        Level::Critical => 2,
        Level::Error => 3,
        Level::Alert | Level::Warn => 4,
        Level::Notice | Level::Success => 5,
        Level::Info | Level::Answer | Level::Silent => 6,
        Level::Debug | Level::Trace => 7,
    }
}

fn trim_newline(buf: &[u8]) -> &[u8] {
    let mut end = buf.len();
    while end > 0 && matches!(buf[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &buf[..end]
}
