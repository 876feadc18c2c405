use {
    crate::{
        config::ProbeConfig,
        connect::{connect_any, resolve, Connect, ProbeStream, TcpConnector},
        error::{ProbeError, Result},
        outcome::{Outcome, ProbeState},
    },
    std::{io, net::SocketAddr},
    tracing::{debug, info, warn},
};

/// One connect, send, receive, close cycle against a configured endpoint.
///
/// `run` consumes the probe, so a connection is never reused once closed.
#[derive(Debug)]
pub struct Probe<C = TcpConnector> {
    config: ProbeConfig,
    connector: C,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connect> Probe<C> {
    pub fn with_connector(config: ProbeConfig, connector: C) -> Self {
        Self { config, connector }
    }

    /// Runs the probe to completion. Every failure is folded into the returned [`Outcome`].
    pub fn run(self) -> Outcome {
        self.run_with(|_| {})
    }

    /// Like [`Probe::run`], calling `on_connect` with the peer as soon as the handshake
    /// succeeds, before anything is sent.
    pub fn run_with(self, on_connect: impl FnOnce(SocketAddr)) -> Outcome {
        let (outcome, path) = self.execute(on_connect);
        debug_assert_eq!(path, outcome.path());
        outcome
    }

    fn execute(self, on_connect: impl FnOnce(SocketAddr)) -> (Outcome, Vec<ProbeState>) {
        let mut lifecycle = Lifecycle::new();
        let outcome = self.drive(&mut lifecycle, on_connect);
        lifecycle.close();

        if let Outcome::Failed { error, .. } = &outcome {
            warn!(host = %self.config.host, port = self.config.port, %error, "probe failed");
        }

        (outcome, lifecycle.into_path())
    }

    fn drive(&self, lifecycle: &mut Lifecycle, on_connect: impl FnOnce(SocketAddr)) -> Outcome {
        if let Err(error) = self.config.validate() {
            lifecycle.enter(ProbeState::Failed);
            return Outcome::Failed {
                stage: ProbeState::Idle,
                peer: None,
                error,
            };
        }

        lifecycle.enter(ProbeState::Connecting);
        let (stream, peer) = match self.connect() {
            Ok(connected) => connected,
            Err(error) => {
                lifecycle.enter(ProbeState::Failed);
                return Outcome::Failed {
                    stage: ProbeState::Connecting,
                    peer: None,
                    error,
                };
            }
        };

        lifecycle.enter(ProbeState::Connected);
        info!(%peer, "connected");
        on_connect(peer);

        let mut connection = Connection {
            stream,
            peer,
            lifecycle,
        };

        let outcome = match connection.exchange(&self.config) {
            Ok(bytes) => Outcome::Received { peer, bytes },
            Err(error) => {
                connection.lifecycle.enter(ProbeState::Failed);
                Outcome::Failed {
                    stage: ProbeState::Connected,
                    peer: Some(peer),
                    error,
                }
            }
        };

        drop(connection);
        outcome
    }

    fn connect(&self) -> Result<(C::Stream, SocketAddr)> {
        let host = &self.config.host;
        let addresses = resolve(host, self.config.port)?;
        connect_any(&self.connector, host, addresses, self.config.timeout)
    }
}

/// Runs a probe with the default connector and no timeout.
pub fn run(host: &str, port: u16, payload: &[u8], buffer_size: usize) -> Outcome {
    Probe::new(
        ProbeConfig::new(host, port)
            .with_payload(payload)
            .with_buffer_size(buffer_size),
    )
    .run()
}

/// Records and checks state transitions for a single probe.
#[derive(Debug)]
struct Lifecycle {
    path: Vec<ProbeState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            path: vec![ProbeState::Idle],
        }
    }

    fn state(&self) -> ProbeState {
        self.path.last().copied().unwrap_or(ProbeState::Idle)
    }

    fn enter(&mut self, next: ProbeState) {
        let current = self.state();
        debug_assert!(
            current.can_transition_to(next),
            "invalid probe transition {current:?} -> {next:?}"
        );
        debug!(from = ?current, to = ?next, "probe state");
        self.path.push(next);
    }

    fn close(&mut self) {
        if self.state() != ProbeState::Closed {
            self.enter(ProbeState::Closed);
        }
    }

    fn into_path(self) -> Vec<ProbeState> {
        self.path
    }
}

/// Owns the connected stream. Dropping it releases the socket and closes the lifecycle.
struct Connection<'a, S: ProbeStream> {
    stream: S,
    peer: SocketAddr,
    lifecycle: &'a mut Lifecycle,
}

impl<S: ProbeStream> Connection<'_, S> {
    fn exchange(&mut self, config: &ProbeConfig) -> Result<Vec<u8>> {
        self.send(&config.payload)?;

        if config.shutdown_write {
            self.stream
                .shutdown_write()
                .map_err(|source| ProbeError::Send {
                    peer: self.peer,
                    sent: config.payload.len(),
                    source,
                })?;
        }

        self.receive(config.buffer_size)
    }

    /// Writes the whole payload, resubmitting the remainder after short writes.
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let mut sent = 0;

        while sent < payload.len() {
            match self.stream.write(&payload[sent..]) {
                Ok(0) => {
                    return Err(ProbeError::Send {
                        peer: self.peer,
                        sent,
                        source: io::Error::new(
                            io::ErrorKind::WriteZero,
                            "peer accepted no bytes",
                        ),
                    })
                }
                Ok(count) => sent += count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(ProbeError::Send {
                        peer: self.peer,
                        sent,
                        source,
                    })
                }
            }
        }

        self.stream.flush().map_err(|source| ProbeError::Send {
            peer: self.peer,
            sent,
            source,
        })?;

        debug!(peer = %self.peer, bytes = sent, "payload sent");
        Ok(())
    }

    /// A single receive of at most `buffer_size` bytes.
    fn receive(&mut self, buffer_size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0; buffer_size];

        let count = loop {
            match self.stream.read(&mut buffer) {
                Ok(count) => break count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(ProbeError::Receive {
                        peer: self.peer,
                        source,
                    })
                }
            }
        };

        buffer.truncate(count);
        debug!(peer = %self.peer, bytes = count, "received");
        Ok(buffer)
    }
}

impl<S: ProbeStream> Drop for Connection<'_, S> {
    fn drop(&mut self) {
        self.lifecycle.enter(ProbeState::Closed);
        debug!(peer = %self.peer, "connection closed");
    }
}
