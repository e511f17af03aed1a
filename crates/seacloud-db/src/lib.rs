//! SeaCloud Database Layer
//!
//! Connection setup and the file repository the thumbnail worker writes to.
//! Schema migrations are owned by the API service, not by this crate.

pub mod db;

pub use db::{ping, setup_database, FileRepository};
pub use sqlx::PgPool;
