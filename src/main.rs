/*!
 * Process Trigger Demo
 *
 * Runs a triggerable process driven by an interval trigger until Ctrl-C.
 * The guarded operation simulates a periodic sync pass.
 */

use process_trigger::{
    init_tracing, CancellationToken, IntervalTrigger, OperationError, ProcessConfig, Trigger,
    TriggerableProcess,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let process = TriggerableProcess::with_config(
        ProcessConfig::from_env("demo-sync"),
        Arc::new(|cancel: CancellationToken| async move {
            info!("Sync pass started");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(1500)) => {
                    info!("Sync pass finished");
                    Ok(())
                }
                _ = cancel.cancelled() => Err(OperationError::Cancelled),
            }
        }),
    );

    let ticker: Arc<dyn Trigger> = Arc::new(IntervalTrigger::new("ticker", Duration::from_secs(1)));
    process.register_trigger(ticker);

    process.start_async().await?;
    // Run once right away instead of waiting for the first tick
    process.trigger_execution();

    info!("Demo running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    process.terminate_async().await?;
    info!(
        executions = process.execution_count(),
        absorbed = process.absorbed_count(),
        "Demo stopped"
    );
    Ok(())
}
