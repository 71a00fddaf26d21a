//! Sink for the host's syslog daemon.
//!
//! The connection is dialled on the first write, not at construction, so a
//! sink can be built on hosts where the daemon comes up later. Only useful on
//! platforms that actually run a daemon.

use std::io::Write as _;
use std::net::UdpSocket;
use std::os::unix::net::{UnixDatagram, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::syslog::message::SyslogMessage;
use crate::syslog::writer::Writer;

/// Well-known local socket paths, in order of preference.
const SOCKET_PATHS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];

const DEFAULT_UDP_ADDRESS: &str = "localhost:514";

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyslogAddress {
    /// A local socket; datagram sockets are preferred, stream sockets work too.
    Unix(PathBuf),
    /// `host:port` of a daemon listening for UDP.
    Udp(String),
}

impl SyslogAddress {
    /// The first well-known local socket that exists, else UDP on localhost.
    pub fn local() -> Self {
        SOCKET_PATHS
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(|path| SyslogAddress::Unix(path.to_path_buf()))
            .unwrap_or_else(|| SyslogAddress::Udp(DEFAULT_UDP_ADDRESS.to_string()))
    }
}

enum Connection {
    Datagram(UnixDatagram),
    Stream(UnixStream),
    Udp(UdpSocket),
}

impl Connection {
    fn dial(address: &SyslogAddress) -> Result<Self> {
        match address {
            SyslogAddress::Unix(path) => {
                let socket = UnixDatagram::unbound()?;
                match socket.connect(path) {
                    Ok(()) => Ok(Connection::Datagram(socket)),
                    // Some daemons only expose a stream socket.
                    Err(_) => Ok(Connection::Stream(UnixStream::connect(path)?)),
                }
            }
            SyslogAddress::Udp(addr) => {
                let socket = UdpSocket::bind("0.0.0.0:0")?;
                socket.connect(addr.as_str())?;
                Ok(Connection::Udp(socket))
            }
        }
    }

    fn send(&mut self, line: &str) -> Result<()> {
        match self {
            Connection::Datagram(socket) => {
                socket.send(line.as_bytes())?;
            }
            Connection::Udp(socket) => {
                socket.send(line.as_bytes())?;
            }
            Connection::Stream(stream) => {
                stream.write_all(line.as_bytes())?;
                stream.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

/// Writes the RFC 5424 text form of each record to the syslog daemon.
pub struct SyslogdWriter {
    address: SyslogAddress,
    connection: Mutex<Option<Connection>>,
}

impl SyslogdWriter {
    /// Sink for the local daemon, see [`SyslogAddress::local`].
    pub fn new() -> Self {
        Self::with_address(SyslogAddress::local())
    }

    pub fn with_address(address: SyslogAddress) -> Self {
        Self {
            address,
            connection: Mutex::new(None),
        }
    }

    pub fn address(&self) -> &SyslogAddress {
        &self.address
    }

    fn connection(&self) -> MutexGuard<'_, Option<Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SyslogdWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for SyslogdWriter {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        let line = message.to_string();

        let mut guard = self.connection();
        let connection = match guard.take() {
            Some(connection) => connection,
            None => {
                debug!(address = ?self.address, "dialling syslog daemon");
                Connection::dial(&self.address)?
            }
        };
        let sent = guard.insert(connection).send(&line);
        if sent.is_err() {
            // Redial on the next write, the daemon may have restarted.
            *guard = None;
        }
        sent
    }

    fn close(&self) -> Result<()> {
        self.connection().take();
        Ok(())
    }
}
