pub mod driver;
pub mod error;
pub mod scheduler;

pub use driver::{Driver, LoggingDriver};
pub use error::Error;
pub use scheduler::Scheduler;

#[cfg(any(test, feature = "test-util"))]
pub use driver::recording;

