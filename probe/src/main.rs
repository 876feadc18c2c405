#![deny(warnings)]

use {
    anyhow::{anyhow, Context, Result},
    clap::Parser,
    sockets_probe::{
        Outcome, Probe, ProbeConfig, DEFAULT_BUFFER_SIZE, DEFAULT_HOST, DEFAULT_PORT,
    },
    std::{
        io::{self, Write},
        net::SocketAddr,
        process::ExitCode,
        str::FromStr,
        time::Duration,
    },
    tracing_subscriber::EnvFilter,
};

#[derive(Debug, Parser)]
#[command(name = "sockets-probe")]
#[command(about = "Open one TCP connection, send a payload and print whatever comes back")]
struct Args {
    /// Target as <host>:<port>, overriding --host and --port
    address: Option<String>,

    /// Host to connect to
    #[arg(long, short = 'H', env = "PROBE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to connect to
    #[arg(
        long,
        short,
        env = "PROBE_PORT",
        default_value_t = DEFAULT_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    port: u16,

    /// Bytes to send
    #[arg(long, env = "PROBE_PAYLOAD", default_value = "Hello")]
    payload: String,

    /// Maximum number of bytes accepted by the single receive
    #[arg(long, short, env = "PROBE_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Connect/send/receive timeout in milliseconds (blocks indefinitely when unset)
    #[arg(
        long,
        short,
        env = "PROBE_TIMEOUT_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_ms: Option<u64>,

    /// Half-close the connection after sending
    #[arg(long)]
    shutdown_write: bool,
}

impl Args {
    fn config(&self) -> Result<ProbeConfig> {
        let (host, port) = match &self.address {
            Some(address) => split_address(address)?,
            None => (self.host.clone(), self.port),
        };

        Ok(ProbeConfig::new(host, port)
            .with_payload(self.payload.as_bytes())
            .with_buffer_size(self.buffer_size)
            .with_timeout(self.timeout_ms.map(Duration::from_millis))
            .with_shutdown_write(self.shutdown_write))
    }
}

/// Accepts `1.2.3.4:80`, `[::1]:80` and `<hostname>:<port>`.
fn split_address(address: &str) -> Result<(String, u16)> {
    if let Ok(address) = SocketAddr::from_str(address) {
        return Ok((address.ip().to_string(), address.port()));
    }

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected <host>:<port>, got {address:?}"))?;

    let port = port
        .parse::<u16>()
        .with_context(|| format!("invalid port in {address:?}"))?;

    Ok((host.trim_matches(&['[', ']'][..]).to_owned(), port))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 0 when the probe connected and completed its receive, 1 otherwise.
fn exit_code(outcome: &Outcome) -> u8 {
    if outcome.connected() {
        0
    } else {
        1
    }
}

/// Runs the probe, writing `Connected to <peer>` as soon as the handshake succeeds and the
/// received bytes or the error once it finishes.
fn probe_and_report(config: ProbeConfig, out: &mut impl Write) -> io::Result<u8> {
    let mut announced = Ok(());
    let outcome = Probe::new(config).run_with(|peer| {
        announced = writeln!(out, "Connected to {peer}").and_then(|()| out.flush());
    });
    announced?;

    report(&outcome, out)
}

fn report(outcome: &Outcome, out: &mut impl Write) -> io::Result<u8> {
    writeln!(out, "{outcome}")?;
    out.flush()?;
    Ok(exit_code(outcome))
}

fn main() -> Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    let code = probe_and_report(args.config()?, &mut io::stdout().lock())?;

    Ok(ExitCode::from(code))
}
