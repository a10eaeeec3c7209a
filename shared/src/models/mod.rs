//! Domain models for inventory analytics

mod classification;
mod forecast;
mod stock;
mod turnover;

pub use classification::*;
pub use forecast::*;
pub use stock::*;
pub use turnover::*;
