// Demo binary: composes a few timer-backed tasks and shows cancellation.
//
// Run with RUST_LOG=trace to watch the signal flow through each operator.

use anyhow::Result;
use kodegen_task::{Task, after, rejected_after, resolved};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Three arguments resolving at different times; the join waits for all of them.
    let sum: Task<u64, String> = resolved(|a: u64| move |b: u64| move |c: u64| a + b + c)
        .and_map(after(Duration::from_millis(30), 1))
        .and_map(after(Duration::from_millis(20), 2))
        .and_map(after(Duration::from_millis(10), 3));

    let started = Instant::now();
    let total = sum.into_async()?.await?.map_err(anyhow::Error::msg)?;
    info!("sum = {total} after {:?}", started.elapsed());

    // Recover a failure with a fallback task.
    let recovered: Task<u64, String> = rejected_after(Duration::from_millis(5), "offline".to_string())
        .flat_map_error(|reason| {
            info!("primary failed ({reason}), using fallback");
            after(Duration::from_millis(5), 42)
        });
    let value = recovered.into_async()?.await?.map_err(anyhow::Error::msg)?;
    info!("recovered value = {value}");

    // Cancel a slow task before its timer fires.
    let delivered = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&delivered);
    let slow: Task<u64, String> = after(Duration::from_millis(100), 7);
    let handle = slow.fork(
        |error| info!("slow task failed: {error}"),
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    )?;
    handle.cancel();
    tokio::time::sleep(Duration::from_millis(150)).await;
    info!(
        "slow task cancelled={}, outcomes delivered={}",
        handle.is_cancelled(),
        delivered.load(Ordering::SeqCst)
    );

    Ok(())
}
