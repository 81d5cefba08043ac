use anyhow::Result;
use fbchat_bridge::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_writer(std::io::stderr)
        .init();

    info!("=== fbchat starting ===");
    fbchat_bridge::run(config).await?;
    info!("fbchat stopped");
    Ok(())
}
