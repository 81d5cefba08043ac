use anyhow::{Context, Result};
use tokio::net::TcpStream;
use tracing::info;

/// Opens the chat server connection.
pub async fn connect(addr: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("connect to {addr} failed, is the server running?"))?;
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;
    info!(%addr, "connected to chat server");
    Ok(stream)
}
