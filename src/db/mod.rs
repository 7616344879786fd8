//! Repository functions over SQLite. Every tenant-owned query is scoped by
//! `user_id`; reference data is shared.

pub mod clients;
pub mod invoices;
pub mod permissions;
pub mod products;
pub mod reference;
pub mod suppliers;
pub mod tokens;
pub mod users;
