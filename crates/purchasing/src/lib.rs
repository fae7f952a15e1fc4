//! `clinerp-purchasing` — purchase orders and supplier payments.

pub mod order;

pub use order::{
    PurchaseLine, PurchaseOrder, PurchaseOrderId, PurchaseOrderStatus, SupplierPayment,
    SupplierPaymentId,
};
