#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod task;

pub use error::TodoError;
pub use task::model::{Priority, Status, Task};
pub use task::stats::Statistics;
pub use task::storage::{Backend, JsonFileBackend, MemoryBackend};
pub use task::store::{TaskEdit, TaskStore};
