pub mod cluster;
pub mod config;
pub mod constraint;
pub mod error;
pub mod matcher;
pub mod offer;
pub mod range;
pub mod server;

pub use cluster::Cluster;
pub use config::{ServerConfig, RECOGNIZED_EXHIBITOR_OPTIONS, RECOGNIZED_SHARED_OVERRIDE};
pub use constraint::Constraint;
pub use error::Error;
pub use offer::{
    ExecutorInfo, Offer, OfferId, SlaveId, TaskId, TaskInfo, TaskResources, TaskState, TaskStatus,
};
pub use range::Range;
pub use server::{next_task_id, task_id_to_server_id, Server, State, Task};
