//! SQLite storage implementation for credit card invoices.

mod model;
mod repository;

pub use model::CreditCardInvoiceDB;
pub use repository::InvoiceRepository;
