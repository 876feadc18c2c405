use {
    crate::error::{ProbeError, Result},
    std::{
        io::{self, Read, Write},
        net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
        time::Duration,
    },
    tracing::debug,
};

/// A connected byte stream the probe can write to, read from and half-close.
pub trait ProbeStream: Read + Write {
    fn shutdown_write(&self) -> io::Result<()>;
}

impl ProbeStream for TcpStream {
    fn shutdown_write(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Write)
    }
}

/// Opens the stream for one resolved address.
pub trait Connect {
    type Stream: ProbeStream;

    fn connect(&self, address: SocketAddr, timeout: Option<Duration>) -> io::Result<Self::Stream>;
}

/// Blocking `std::net` connector.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connect for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, address: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&address, timeout)?,
            None => TcpStream::connect(address)?,
        };

        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        Ok(stream)
    }
}

/// Resolves `host` (an IP literal or a name) in resolver order.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addresses = (host, port)
        .to_socket_addrs()
        .map_err(|source| ProbeError::Resolve {
            host: host.to_owned(),
            source,
        })?
        .collect::<Vec<_>>();

    if addresses.is_empty() {
        Err(ProbeError::NoAddresses {
            host: host.to_owned(),
        })
    } else {
        Ok(addresses)
    }
}

/// Tries `addresses` in order and returns the first stream that connects.
///
/// When every address fails, the error from the last one is returned.
pub fn connect_any<C: Connect>(
    connector: &C,
    host: &str,
    addresses: impl IntoIterator<Item = SocketAddr>,
    timeout: Option<Duration>,
) -> Result<(C::Stream, SocketAddr)> {
    let mut last_error = None;

    for address in addresses {
        debug!(%address, "connecting");
        match connector.connect(address, timeout) {
            Ok(stream) => return Ok((stream, address)),
            Err(source) => {
                debug!(%address, error = %source, "connect attempt failed");
                last_error = Some(ProbeError::from_connect(address, source));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ProbeError::NoAddresses {
        host: host.to_owned(),
    }))
}
