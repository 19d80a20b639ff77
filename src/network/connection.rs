//! Connection Handler
//!
//! A duplex byte stream to the server, owned by exactly one worker.

use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{HammerError, Result};
use crate::protocol::{read_response, write_request, encode_request, RequestFrame, ResponseFrame};

/// Opens connections to the server
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Connection>;
}

/// Connects over TCP to a fixed address
#[derive(Debug, Clone)]
pub struct TcpConnector {
    protocol: String,
    address: String,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl TcpConnector {
    /// `protocol` is one of `tcp`, `tcp4`, `tcp6`
    pub fn new(protocol: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            address: address.into(),
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Build a connector from the target section of a config
    pub fn from_config(config: &Config) -> Self {
        Self {
            protocol: config.protocol.clone(),
            address: config.address.clone(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }

    /// Resolve the address, keeping only the requested address family
    fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let connect_err = |source| HammerError::Connect {
            address: self.address.clone(),
            source,
        };

        let addrs = self.address.to_socket_addrs().map_err(connect_err)?;
        let addrs: Vec<SocketAddr> = match self.protocol.as_str() {
            "tcp" => addrs.collect(),
            "tcp4" => addrs.filter(SocketAddr::is_ipv4).collect(),
            "tcp6" => addrs.filter(SocketAddr::is_ipv6).collect(),
            other => {
                return Err(HammerError::Config(format!("Unsupported protocol: {:?}", other)))
            }
        };

        if addrs.is_empty() {
            return Err(connect_err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no {} address", self.protocol),
            )));
        }
        Ok(addrs)
    }
}

impl Connector for TcpConnector {
    fn connect(&self) -> Result<Connection> {
        let mut last_err = None;
        for addr in self.resolve()? {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    let mut connection = Connection::new(stream)?;
                    connection.set_timeouts(self.read_timeout, self.write_timeout)?;
                    return Ok(connection);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(HammerError::Connect {
            address: self.address.clone(),
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotConnected, "no address connected")
            }),
        })
    }
}

/// A connection to the server
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Wrap a connected stream
    ///
    /// Sets up buffered I/O and disables Nagle's algorithm
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr,
        })
    }

    /// Configure connection timeouts (`None` blocks indefinitely)
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Write a request and flush it
    pub fn send(&mut self, request: &RequestFrame) -> Result<()> {
        write_request(&mut self.writer, request)
    }

    /// Buffer a request without flushing
    pub fn queue(&mut self, request: &RequestFrame) -> Result<()> {
        self.writer.write_all(&encode_request(request))?;
        Ok(())
    }

    /// Flush buffered requests
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Block for the next response
    pub fn recv(&mut self) -> Result<ResponseFrame> {
        read_response(&mut self.reader)
    }

    /// Send a request and wait for its response
    pub fn exchange(&mut self, request: &RequestFrame) -> Result<ResponseFrame> {
        self.send(request)?;
        self.recv()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
