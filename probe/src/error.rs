use {
    std::{io, net::SocketAddr},
    thiserror::Error,
};

/// Everything that can stop a probe short of receiving a reply.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid probe configuration: {0}")]
    Config(String),

    #[error("unable to resolve {host:?}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to resolve {host:?}: no addresses returned")]
    NoAddresses { host: String },

    #[error("connection to {addr} refused")]
    Refused { addr: SocketAddr },

    #[error("connection to {addr} timed out")]
    ConnectTimeout { addr: SocketAddr },

    #[error("unable to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send payload to {peer} after {sent} bytes: {source}")]
    Send {
        peer: SocketAddr,
        sent: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to receive from {peer}: {source}")]
    Receive {
        peer: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of a [`ProbeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Resolution,
    ConnectionRefused,
    ConnectionTimeout,
    Io,
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Resolve { .. } | Self::NoAddresses { .. } => ErrorKind::Resolution,
            Self::Refused { .. } => ErrorKind::ConnectionRefused,
            Self::ConnectTimeout { .. } => ErrorKind::ConnectionTimeout,
            Self::Connect { .. } | Self::Send { .. } | Self::Receive { .. } => ErrorKind::Io,
        }
    }

    /// Maps a failed connect to the refused/timed-out variants where the OS tells us which.
    pub(crate) fn from_connect(addr: SocketAddr, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused { addr },
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::ConnectTimeout { addr },
            _ => Self::Connect { addr, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::net::{Ipv4Addr, SocketAddrV4},
    };

    fn addr() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9))
    }

    #[test]
    fn connect_errors_are_classified_by_io_kind() {
        let refused = ProbeError::from_connect(addr(), io::ErrorKind::ConnectionRefused.into());
        assert_eq!(refused.kind(), ErrorKind::ConnectionRefused);
        assert!(refused.to_string().contains("refused"));

        let timeout = ProbeError::from_connect(addr(), io::ErrorKind::TimedOut.into());
        assert_eq!(timeout.kind(), ErrorKind::ConnectionTimeout);
        assert!(timeout.to_string().contains("timed out"));

        let other = ProbeError::from_connect(addr(), io::ErrorKind::PermissionDenied.into());
        assert_eq!(other.kind(), ErrorKind::Io);
        assert!(other.to_string().starts_with("unable to connect to 127.0.0.1:9"));
    }

    #[test]
    fn resolution_messages_mention_resolve() {
        let error = ProbeError::NoAddresses {
            host: "example".to_owned(),
        };
        assert_eq!(error.kind(), ErrorKind::Resolution);
        assert!(error.to_string().contains("resolve"));
    }
}
