use exhibitor_types::{OfferId, TaskId, TaskInfo, TaskStatus};
use owo_colors::OwoColorize;

/// The Rust-native counterpart of a two-level resource-offer cluster
/// manager's driver handle — the seam named in SPEC_FULL.md §6 ("Cluster-
/// manager calls emitted"). Wiring a concrete cluster-manager SDK behind
/// this trait is the binary crate's job (out of scope for the core, per
/// spec.md §1).
pub trait Driver: Send + Sync {
    fn launch(&self, offer_id: OfferId, tasks: Vec<TaskInfo>);
    fn decline(&self, offer_id: OfferId);
    fn kill(&self, task_id: TaskId);
    fn reconcile(&self, statuses: Vec<TaskStatus>);
}

/// A driver that only logs the calls it would have made. Lets the process
/// run end-to-end without a live cluster manager attached.
pub struct LoggingDriver;

impl Driver for LoggingDriver {
    fn launch(&self, offer_id: OfferId, tasks: Vec<TaskInfo>) {
        for task in &tasks {
            println!(
                "{} task {} on offer {} (executor {})",
                "🚀 would launch".green(),
                task.task_id.green().dimmed(),
                offer_id.green().dimmed(),
                task.executor.executor_id.green().dimmed(),
            );
        }
    }

    fn decline(&self, offer_id: OfferId) {
        println!("{} offer {}", "🙅 would decline".yellow(), offer_id.yellow().dimmed());
    }

    fn kill(&self, task_id: TaskId) {
        println!("{} task {}", "🔪 would kill".red(), task_id.red().dimmed());
    }

    fn reconcile(&self, statuses: Vec<TaskStatus>) {
        println!(
            "{} {} task(s)",
            "🔁 would reconcile".cyan(),
            statuses.len().to_string().cyan().dimmed()
        );
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Records every call for test assertions, grounded on the teacher's
    /// `ContextData.last_action` in-memory recorder pattern.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Launch(OfferId, Vec<TaskId>),
        Decline(OfferId),
        Kill(TaskId),
        Reconcile(Vec<TaskId>),
    }

    #[derive(Default)]
    pub struct RecordingDriver {
        pub calls: Mutex<Vec<Call>>,
    }

    impl Driver for RecordingDriver {
        fn launch(&self, offer_id: OfferId, tasks: Vec<TaskInfo>) {
            let ids = tasks.into_iter().map(|t| t.task_id).collect();
            self.calls.lock().unwrap().push(Call::Launch(offer_id, ids));
        }

        fn decline(&self, offer_id: OfferId) {
            self.calls.lock().unwrap().push(Call::Decline(offer_id));
        }

        fn kill(&self, task_id: TaskId) {
            self.calls.lock().unwrap().push(Call::Kill(task_id));
        }

        fn reconcile(&self, statuses: Vec<TaskStatus>) {
            let ids = statuses.into_iter().map(|s| s.task_id).collect();
            self.calls.lock().unwrap().push(Call::Reconcile(ids));
        }
    }
}
