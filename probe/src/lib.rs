#![deny(warnings)]

//! Single-shot TCP connectivity probe: connect, send a payload, receive once, close.

mod config;
mod connect;
mod error;
mod outcome;
mod probe;

pub use {
    config::{ProbeConfig, DEFAULT_BUFFER_SIZE, DEFAULT_HOST, DEFAULT_PAYLOAD, DEFAULT_PORT},
    connect::{connect_any, resolve, Connect, ProbeStream, TcpConnector},
    error::{ErrorKind, ProbeError, Result},
    outcome::{escape_bytes, Outcome, ProbeState},
    probe::{run, Probe},
};
