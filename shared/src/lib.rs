//! Shared types and models for inventory analytics
//!
//! This crate holds the I/O-free part of the system: result records,
//! classification rules, descriptive statistics and the forecasting
//! methods. The backend feeds it records fetched from the ERP.

pub mod forecasting;
pub mod models;
pub mod statistics;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
