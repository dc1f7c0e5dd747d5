#![doc = "The `ess_portal` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, the Odoo client, persistence and routing"]
#![doc = "for the ESS Portal backend. The binary (`main.rs`) wires them into an"]
#![doc = "Actix server; integration tests build the same app from these pieces."]

pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod integration;
pub mod mailer;
pub mod models;
pub mod odoo;
pub mod rate_limit;
pub mod routes;
pub mod upload;

pub use crate::error::AppError;
