mod config;
mod main_lib;
mod scheduler;

use config::Config;
use ledgerly_core::clock::shutdown_channel;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_format);
    let state = build_state(&config).await?;

    let (trigger, shutdown) = shutdown_channel();
    let workers = scheduler::start_workers(&state, &config.settings, shutdown)?;

    scheduler::wait_for_shutdown_signal().await;
    tracing::info!("Shutdown requested; waiting for {} workers", workers.len());
    trigger.trigger();

    for handle in workers {
        if let Err(e) = handle.await {
            tracing::error!("Worker task ended abnormally: {}", e);
        }
    }
    tracing::info!("All workers stopped");
    Ok(())
}
