//! Cloud provider management CLI

pub mod client;
pub mod models;

pub use client::{is_conflict, GcloudCli};
pub use models::{SqlOperation, SqlOperationStatus};
