//! One-shot sync against the configured source; prints every state.
//! `--refresh` forces a network fetch even when the cache is fresh.

use futures::StreamExt;
use headline_sync::SyncState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let force = std::env::args().any(|a| a == "--refresh");
    let feed = headline_sync::feed_from_env()?;
    let cfg = feed.config().clone();

    let mut states = feed.sync().sync(&cfg.source_id, &cfg.api_key, force);
    while let Some(state) = states.next().await {
        match &state {
            SyncState::Loading { snapshot } => {
                println!("loading (cached: {})", snapshot.as_ref().map_or(0, Vec::len));
            }
            SyncState::Success { data } => {
                println!("{} headlines from {}", data.len(), cfg.source_name);
                for a in data {
                    println!("  {}  {}", a.published_at.format("%Y-%m-%d %H:%M"), a.title);
                }
            }
            SyncState::Failure { reason, snapshot } => {
                println!("failed: {reason}");
                for a in snapshot.iter().flatten() {
                    println!("  (cached) {}", a.title);
                }
            }
        }
    }
    Ok(())
}
