use std::sync::Arc;
use std::time::Instant;

use exhibitor_scheduler_core::{Driver, Scheduler};
use owo_colors::OwoColorize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Serves the control-plane API, plus the merged health/metrics routes (see
/// SPEC_FULL.md §6a), until `shutdown` fires. Mirrors the teacher's
/// listener-bind-serve-shutdown shape.
pub async fn run_control_api<D: Driver + 'static>(
    scheduler: Arc<Scheduler<D>>,
    bind: String,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = exhibitor_control_api::router(scheduler);
    let listener = TcpListener::bind(&bind).await?;
    println!(
        "{}{}",
        "🛰️  Starting control-plane API • bind=".green(),
        bind.green().dimmed(),
    );
    let started = Instant::now();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    println!(
        "{} {}",
        "🛑 Control-plane API stopped gracefully • uptime was".red(),
        format!("{:.2?}", started.elapsed()).red().dimmed()
    );
    Ok(())
}
