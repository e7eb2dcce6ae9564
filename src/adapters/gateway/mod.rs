//! Remote gateway abstraction layer
//!
//! The export engine only ever talks to a [`RemoteGateway`]; which tools sit
//! behind it is decided by the factory.

pub mod cloudsql;
pub mod factory;
pub mod traits;

pub use cloudsql::CloudSqlGateway;
pub use factory::{create_gateway, create_gateway_with_runner};
pub use traits::{ExportRequest, InitiateResponse, OperationStatus, RemoteGateway};
