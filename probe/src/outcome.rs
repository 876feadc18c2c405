use {
    crate::error::{ErrorKind, ProbeError},
    std::{fmt, net::SocketAddr},
};

/// Where a probe is in its single connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeState {
    Idle,
    Connecting,
    Connected,
    Failed,
    Closed,
}

impl ProbeState {
    /// `Failed` and `Closed` are terminal for the connection; nothing re-enters `Connecting`.
    pub fn can_transition_to(self, next: ProbeState) -> bool {
        use ProbeState::*;

        matches!(
            (self, next),
            (Idle, Connecting)
                | (Idle, Failed)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Failed)
                | (Connected, Closed)
                | (Failed, Closed)
        )
    }
}

/// What a probe run produced.
#[derive(Debug)]
pub enum Outcome {
    /// Connected, sent the whole payload and completed one receive. `bytes` may be empty.
    Received { peer: SocketAddr, bytes: Vec<u8> },
    /// `stage` is the state the probe was in when `error` happened. `peer` is set once the
    /// handshake succeeded.
    Failed {
        stage: ProbeState,
        peer: Option<SocketAddr>,
        error: ProbeError,
    },
}

impl Outcome {
    pub fn connected(&self) -> bool {
        matches!(self, Self::Received { .. })
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        match self {
            Self::Received { peer, .. } => Some(*peer),
            Self::Failed { peer, .. } => *peer,
        }
    }

    pub fn bytes_received(&self) -> Option<&[u8]> {
        match self {
            Self::Received { bytes, .. } => Some(bytes),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match self {
            Self::Received { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(ProbeError::kind)
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// The sequence of states this outcome implies, from `Idle` through `Closed`.
    pub fn path(&self) -> Vec<ProbeState> {
        use ProbeState::*;

        match self {
            Self::Received { .. } => vec![Idle, Connecting, Connected, Closed],
            Self::Failed { stage: Idle, .. } => vec![Idle, Failed, Closed],
            Self::Failed { stage: Connected, .. } => {
                vec![Idle, Connecting, Connected, Failed, Closed]
            }
            Self::Failed { .. } => vec![Idle, Connecting, Failed, Closed],
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received { bytes, .. } => write!(f, "Received: {}", escape_bytes(bytes)),
            Self::Failed { error, .. } => write!(f, "Error: {error}"),
        }
    }
}

/// Renders bytes as a `b"..."` literal, escaping anything outside printable ASCII.
pub fn escape_bytes(bytes: &[u8]) -> String {
    format!("b\"{}\"", bytes.escape_ascii())
}

#[cfg(test)]
mod tests {
    use {super::*, std::io};

    #[test]
    fn terminal_states_never_reconnect() {
        for state in [ProbeState::Failed, ProbeState::Closed] {
            assert!(!state.can_transition_to(ProbeState::Connecting));
            assert!(!state.can_transition_to(ProbeState::Connected));
        }
        assert!(!ProbeState::Closed.can_transition_to(ProbeState::Failed));
        assert!(!ProbeState::Idle.can_transition_to(ProbeState::Closed));
    }

    #[test]
    fn paths_follow_valid_transitions() {
        let peer = SocketAddr::from(([127, 0, 0, 1], 8000));
        let outcomes = [
            Outcome::Received {
                peer,
                bytes: b"Hello".to_vec(),
            },
            Outcome::Failed {
                stage: ProbeState::Idle,
                peer: None,
                error: ProbeError::Config("bad".to_owned()),
            },
            Outcome::Failed {
                stage: ProbeState::Connecting,
                peer: None,
                error: ProbeError::Refused { addr: peer },
            },
            Outcome::Failed {
                stage: ProbeState::Connected,
                peer: Some(peer),
                error: ProbeError::Receive {
                    peer,
                    source: io::ErrorKind::ConnectionReset.into(),
                },
            },
        ];

        for outcome in outcomes {
            let path = outcome.path();
            assert_eq!(path.first(), Some(&ProbeState::Idle));
            assert_eq!(path.last(), Some(&ProbeState::Closed));
            assert!(path.windows(2).all(|w| w[0].can_transition_to(w[1])));
        }
    }

    #[test]
    fn display_matches_the_printed_report() {
        let peer = SocketAddr::from(([127, 0, 0, 1], 8000));
        let received = Outcome::Received {
            peer,
            bytes: b"Hi\n\"\xff".to_vec(),
        };
        assert_eq!(received.to_string(), r#"Received: b"Hi\n\"\xff""#);

        let failed = Outcome::Failed {
            stage: ProbeState::Connecting,
            peer: None,
            error: ProbeError::Refused { addr: peer },
        };
        assert_eq!(failed.to_string(), "Error: connection to 127.0.0.1:8000 refused");
        assert!(!failed.connected());
        assert_eq!(failed.peer(), None);
        assert_eq!(failed.error_kind(), Some(ErrorKind::ConnectionRefused));
    }

    #[test]
    fn failure_after_handshake_keeps_the_peer() {
        let peer = SocketAddr::from(([127, 0, 0, 1], 8000));
        let failed = Outcome::Failed {
            stage: ProbeState::Connected,
            peer: Some(peer),
            error: ProbeError::Receive {
                peer,
                source: io::ErrorKind::WouldBlock.into(),
            },
        };

        assert!(!failed.connected());
        assert_eq!(failed.peer(), Some(peer));
        assert_eq!(failed.error_kind(), Some(ErrorKind::Io));
    }

    #[test]
    fn empty_reply_renders_as_empty_literal() {
        assert_eq!(escape_bytes(b""), r#"b"""#);
    }
}
