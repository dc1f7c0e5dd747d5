//! HTTP plumbing towards the Odoo ESS connector installed in each tenant's
//! Odoo instance.

pub mod client;
pub mod gateway;

pub use client::{OdooClient, OdooConnection, OdooDownload, OdooFile, OdooForm};
pub use gateway::{employee_id, tenant_connection};
