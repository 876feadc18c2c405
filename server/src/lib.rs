#![deny(warnings)]

//! Throwaway TCP listeners for exercising `sockets-probe` against real sockets.

use {
    anyhow::{Context, Result},
    futures::FutureExt,
    std::{future::Future, net::SocketAddr},
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task,
    },
    tracing::log,
};

/// Echoes everything it reads until the peer closes.
pub async fn serve_echo(
    address: SocketAddr,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)> {
    serve(address, echo).await
}

/// Reads whatever the peer sends first, then hangs up without replying.
pub async fn serve_hangup(
    address: SocketAddr,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)> {
    serve(address, hangup).await
}

/// Drains the connection and never writes, holding it open until the peer closes.
pub async fn serve_mute(
    address: SocketAddr,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)> {
    serve(address, mute).await
}

/// Replies with everything it read, but only after the peer shuts down its write side.
pub async fn serve_reply_on_eof(
    address: SocketAddr,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)> {
    serve(address, reply_on_eof).await
}

async fn serve<F, Fut>(
    address: SocketAddr,
    handle: F,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)>
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Unable to listen on {address}"))?;

    let address = listener.local_addr()?;

    Ok((
        async move {
            loop {
                let (stream, _) = listener.accept().await?;

                task::spawn(handle(stream).map(|result| {
                    if let Err(e) = result {
                        log::warn!("error handling connection: {e:?}");
                    }
                }));
            }
        }
        .boxed(),
        address,
    ))
}

async fn echo(mut stream: TcpStream) -> Result<()> {
    let mut buffer = vec![0; 1024];
    loop {
        let count = stream.read(&mut buffer).await?;
        if count == 0 {
            break Ok(());
        }

        stream.write_all(&buffer[..count]).await?;
    }
}

async fn hangup(mut stream: TcpStream) -> Result<()> {
    let mut buffer = vec![0; 1024];
    stream.read(&mut buffer).await?;
    Ok(())
}

async fn mute(mut stream: TcpStream) -> Result<()> {
    let mut buffer = vec![0; 1024];
    while stream.read(&mut buffer).await? != 0 {}
    Ok(())
}

async fn reply_on_eof(mut stream: TcpStream) -> Result<()> {
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).await?;
    stream.write_all(&buffer).await?;
    stream.shutdown().await?;
    Ok(())
}
