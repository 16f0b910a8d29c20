//! SQLite storage implementation for the worker's per-job slot markers.

mod model;
mod repository;

pub use model::SchedulerStateDB;
pub use repository::SchedulerStateRepository;
