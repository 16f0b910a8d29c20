//! Invoices module - credit card billing periods and the invoice lifecycle.

pub mod billing_period;
mod invoices_model;
mod invoices_service;
mod invoices_traits;


pub use billing_period::BillingPeriod;
pub use invoices_model::{
    CreditCardInvoice, InvoiceClosureSummary, InvoicePayment, InvoiceStatus, NewCreditCardInvoice,
};
pub use invoices_service::InvoiceService;
pub use invoices_traits::{InvoiceRepositoryTrait, InvoiceServiceTrait};
