//! Daily scheduling

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::Pipeline;

/// Run the pipeline on `cron` until Ctrl-C
pub async fn run_scheduled(pipeline: Arc<Pipeline>, cron: &str) -> Result<()> {
    let mut scheduler = JobScheduler::new()
        .await
        .context("Failed to create scheduler")?;

    let job = Job::new_async(cron, move |_id, _scheduler| {
        let pipeline = Arc::clone(&pipeline);
        Box::pin(async move {
            info!("Scheduled run starting");
            if let Err(e) = pipeline.run().await {
                error!("Scheduled run failed: {}", e);
            }
        })
    })
    .with_context(|| format!("Invalid schedule: {}", cron))?;

    scheduler.add(job).await.context("Failed to add job")?;
    scheduler.start().await.context("Failed to start scheduler")?;
    info!("Scheduled with `{}`; press Ctrl-C to stop", cron);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down scheduler...");
    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;

    Ok(())
}
