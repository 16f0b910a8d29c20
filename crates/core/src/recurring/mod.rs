//! Recurring module - templates, their date rules and materialization.

pub mod recurrence;
mod recurring_model;
mod recurring_service;
mod recurring_traits;


pub use recurring_model::{
    Frequency, NewRecurringTemplate, RecurrenceRunSummary, RecurringTemplateUpdate,
    RecurringTransactionTemplate, Step,
};
pub use recurring_service::RecurrenceService;
pub use recurring_traits::{RecurrenceServiceTrait, RecurringTemplateRepositoryTrait};
