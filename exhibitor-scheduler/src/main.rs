use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use exhibitor_common::args::Args;
use exhibitor_scheduler_core::{LoggingDriver, Scheduler};
use exhibitor_types::matcher::ArtifactUris;
use owo_colors::OwoColorize;

mod server;

#[tokio::main]
async fn main() -> Result<()> {
    exhibitor_common::init();

    let args = Args::parse();

    let artifacts = ArtifactUris {
        framework_jar: format!("{}/jar/exhibitor-framework.jar", args.artifact_base_url),
        exhibitor_dist: format!("{}/exhibitor/exhibitor.tar.gz", args.artifact_base_url),
        zookeeper_dist: format!("{}/zookeeper/zookeeper.tar.gz", args.artifact_base_url),
        jdk: format!("{}/jdk/jdk.tar.gz", args.artifact_base_url),
    };

    println!(
        "{}{} {}{} {}{}",
        "🐘 Starting exhibitor-scheduler • cluster_manager_master=".green(),
        args.cluster_manager_master.green().dimmed(),
        "principal=".green(),
        args.framework_principal.green().dimmed(),
        "role=".green(),
        args.framework_role.green().dimmed(),
    );

    let scheduler = Arc::new(Scheduler::new(Arc::new(LoggingDriver), artifacts));
    // No persisted framework id across restarts (spec.md Non-goals); a fresh
    // process always re-registers from scratch and reconciles immediately.
    scheduler.registered(format!("{}-{}", args.framework_principal, uuid::Uuid::new_v4()));

    exhibitor_common::signal_ready();

    let shutdown = exhibitor_common::shutdown::watch();
    server::run_control_api(scheduler.clone(), args.control_api_bind.clone(), shutdown).await?;

    println!("{}", "👋 exhibitor-scheduler exited cleanly".green());
    Ok(())
}
