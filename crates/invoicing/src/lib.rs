//! `clinerp-invoicing` — invoices, payments, refunds.

pub mod invoice;
pub mod payment;
pub mod status;

pub use invoice::{Invoice, InvoiceId, InvoiceItem, InvoiceNumber, InvoiceSource, InvoiceStatus};
pub use payment::{Payment, PaymentId, PaymentMethod, PaymentRefund};
pub use status::{derive_status, net_paid, remaining};
