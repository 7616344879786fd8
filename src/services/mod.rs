pub mod ares;
pub mod invoice_sync;
pub mod numbering;
pub mod pdf;
pub mod qr_payment;
