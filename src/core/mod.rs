//! Core data model, business rules, and static lookup tables.
//!
//! Everything here is pure and I/O-free: the record/row/sheet types, the
//! validation rules applied to extracted invoices, the Spanish month tables,
//! and the ClaveProdServ expense catalog.

pub mod catalog;
mod config;
mod error;
pub mod months;
mod types;
mod validation;

pub use catalog::map_product_code;
pub use config::*;
pub use error::*;
pub use types::*;
pub use validation::*;
