//! SQLite storage implementation for recurring transaction templates.

mod model;
mod repository;

pub use model::RecurringTemplateDB;
pub use repository::RecurringTemplateRepository;
