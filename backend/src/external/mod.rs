//! External API integrations

pub mod domain;
pub mod odoo;
pub mod records;

pub use domain::{Domain, Op, Term};
pub use odoo::{OdooClient, OdooGateway, Query};
