use std::{
    fmt::Display,
    io::{self, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use serialport::{DataBits, Parity, StopBits};
use tracing::{debug, instrument, trace};

use crate::internals::core::ports::DriverError;

/// Read and write timeout of the controller link.
pub const LINK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Every request and reply is terminated by a carriage return.
const TERMINATOR: u8 = b'\r';

/// Longest reply the controller sends. Anything longer is line noise.
const MAX_REPLY_LEN: usize = 128;

/// Byte stream to the controller, either a serial port or a socket.
pub trait LinkStream: Read + Write + Send {}

impl<T: Read + Write + Send> LinkStream for T {}

/// How to reach the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Serial { port: String, baud_rate: u32 },
    Net { host: String, port: u16 },
}

impl Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial { port, baud_rate } => write!(f, "serial {} @ {} baud", port, baud_rate),
            Self::Net { host, port } => write!(f, "tcp {}:{}", host, port),
        }
    }
}

/// A parsed controller reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `=Vnnn a;b;c` answer to a query.
    Values { object: String, fields: Vec<String> },
    /// `*Xnnn k` acknowledgement (k = 0) or error code.
    Status { object: String, code: u8 },
}

/// Request/reply transport for the nEXT ASCII protocol.
pub struct NextLinkService {
    stream: Box<dyn LinkStream>,
}

impl NextLinkService {
    /// Open the transport described by `connection`.
    #[instrument(skip_all)]
    pub fn open(connection: &Connection) -> Result<Self, DriverError> {
        debug!("Opening link to pump controller: {}", connection);
        let stream: Box<dyn LinkStream> = match connection {
            Connection::Serial { port, baud_rate } => Box::new(
                serialport::new(port, *baud_rate)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::None)
                    .stop_bits(StopBits::One)
                    .timeout(LINK_TIMEOUT)
                    .open()?,
            ),
            Connection::Net { host, port } => Box::new(open_socket(host, *port)?),
        };
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: Box<dyn LinkStream>) -> Self {
        Self { stream }
    }

    /// Send one request and wait for its reply.
    #[instrument(skip(self))]
    pub fn transact(&mut self, request: &str) -> Result<Reply, DriverError> {
        self.stream.write_all(request.as_bytes())?;
        self.stream.write_all(&[TERMINATOR])?;
        self.stream.flush()?;

        let line = self.read_line(request)?;
        trace!("Controller replied '{}'.", line);
        parse_reply(request, &line)
    }

    pub fn flush(&mut self) -> Result<(), DriverError> {
        Ok(self.stream.flush()?)
    }

    fn read_line(&mut self, request: &str) -> Result<String, DriverError> {
        let mut line: Vec<u8> = Vec::with_capacity(32);
        let mut byte = [0u8; 1];
        loop {
            if self.stream.read(&mut byte)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "controller closed the link",
                )
                .into());
            }
            match byte[0] {
                TERMINATOR => break,
                b'\n' => continue,
                other => line.push(other),
            }
            if line.len() > MAX_REPLY_LEN {
                return Err(DriverError::Malformed {
                    command: request.to_string(),
                    reply: String::from_utf8_lossy(&line).into_owned(),
                });
            }
        }
        String::from_utf8(line).map_err(|e| DriverError::Malformed {
            command: request.to_string(),
            reply: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

fn open_socket(host: &str, port: u16) -> Result<TcpStream, DriverError> {
    let mut last_error = io::Error::new(
        io::ErrorKind::NotFound,
        format!("no address found for {}", host),
    );
    for address in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&address, LINK_TIMEOUT) {
            Ok(stream) => {
                stream.set_read_timeout(Some(LINK_TIMEOUT))?;
                stream.set_write_timeout(Some(LINK_TIMEOUT))?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => last_error = e,
        }
    }
    Err(last_error.into())
}

/// Object identifier a request refers to, e.g. `V852` for `?V852`.
fn object_of(request: &str) -> &str {
    request
        .get(1..)
        .unwrap_or_default()
        .split_whitespace()
        .next()
        .unwrap_or_default()
}

/// Parse a reply line and check it answers `request`.
pub fn parse_reply(request: &str, line: &str) -> Result<Reply, DriverError> {
    let malformed = || DriverError::Malformed {
        command: request.to_string(),
        reply: line.to_string(),
    };

    let line = line.trim();
    let mut chars = line.chars();
    let kind = chars.next().ok_or_else(malformed)?;
    let (object, payload) = chars.as_str().split_once(' ').ok_or_else(malformed)?;

    // Object ids differ only in their type letter between request and reply.
    if object.get(1..) != object_of(request).get(1..) {
        return Err(malformed());
    }

    match kind {
        '=' => Ok(Reply::Values {
            object: object.to_string(),
            fields: payload.split(';').map(|f| f.trim().to_string()).collect(),
        }),
        '*' => Ok(Reply::Status {
            object: object.to_string(),
            code: payload.trim().parse().map_err(|_| malformed())?,
        }),
        _ => Err(malformed()),
    }
}
