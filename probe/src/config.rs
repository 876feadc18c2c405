use {
    crate::error::{ProbeError, Result},
    std::time::Duration,
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PAYLOAD: &[u8] = b"Hello";
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Target and knobs for a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub payload: Vec<u8>,
    /// Upper bound on the bytes accepted by the single receive.
    pub buffer_size: usize,
    /// Bounds connect, send and receive. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    /// Half-close the connection once the payload is out.
    pub shutdown_write: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            payload: DEFAULT_PAYLOAD.to_vec(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            timeout: None,
            shutdown_write: false,
        }
    }
}

impl ProbeConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_shutdown_write(mut self, shutdown_write: bool) -> Self {
        self.shutdown_write = shutdown_write;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ProbeError::Config("host must not be empty".to_owned()));
        }
        if self.port == 0 {
            return Err(ProbeError::Config(
                "port must be between 1 and 65535".to_owned(),
            ));
        }
        if self.payload.is_empty() {
            return Err(ProbeError::Config("payload must not be empty".to_owned()));
        }
        if self.buffer_size == 0 {
            return Err(ProbeError::Config(
                "buffer size must be at least one byte".to_owned(),
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            // std rejects zero socket timeouts
            return Err(ProbeError::Config("timeout must be non-zero".to_owned()));
        }
        Ok(())
    }
}
