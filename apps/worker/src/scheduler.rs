//! Spawns one background worker per scheduled job and waits for the
//! process to be asked to stop.

use std::sync::Arc;

use ledgerly_core::clock::ShutdownSignal;
use ledgerly_core::scheduler::{
    InvoiceClosureJob, PriceRefreshJob, RecurrenceJob, ScheduleSpec, ScheduledJob,
    ScheduledWorker, WorkerSettings,
};
use ledgerly_core::Result;
use tokio::task::JoinHandle;
use tracing::info;

use crate::main_lib::AppState;

fn jobs(state: &AppState, settings: &WorkerSettings) -> Vec<(Arc<dyn ScheduledJob>, ScheduleSpec)> {
    let mut jobs: Vec<(Arc<dyn ScheduledJob>, ScheduleSpec)> = vec![
        (
            Arc::new(RecurrenceJob::new(
                state.recurrence_service.clone(),
                state.invoice_service.clone(),
                settings.time_zone,
            )),
            settings.recurrence_schedule(),
        ),
        (
            Arc::new(InvoiceClosureJob::new(
                state.invoice_service.clone(),
                settings.time_zone,
            )),
            settings.invoice_schedule(),
        ),
    ];

    match settings.price_refresh_schedule() {
        Some(schedule) => jobs.push((
            Arc::new(PriceRefreshJob::new(
                state.investment_service.clone(),
                state.asset_repository.clone(),
            )),
            schedule,
        )),
        None => info!("Price refresh disabled"),
    }
    jobs
}

/// Starts every worker loop. Each stops on its own once `shutdown` fires.
pub fn start_workers(
    state: &Arc<AppState>,
    settings: &WorkerSettings,
    shutdown: ShutdownSignal,
) -> Result<Vec<JoinHandle<()>>> {
    settings.validate()?;
    let mut handles = Vec::new();

    for (job, schedule) in jobs(state, settings) {
        schedule.validate()?;
        let worker = ScheduledWorker::new(
            job,
            schedule,
            state.scheduler_state_repository.clone(),
            state.clock.clone(),
            settings.poll_interval,
            settings.run_timeout,
        );
        info!(
            "Starting worker {} ({}) on {}",
            worker.job_name(),
            schedule,
            state.db_path
        );
        let signal = shutdown.clone();
        handles.push(tokio::spawn(async move { worker.run(signal).await }));
    }
    Ok(handles)
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
