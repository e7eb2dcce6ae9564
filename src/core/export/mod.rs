//! Export orchestration
//!
//! This module provides the export engine:
//! - [`ExportStateMachine`] drives one database export through initiation,
//!   conflict retry and status polling
//! - [`InstanceWorker`] exports one instance's databases sequentially
//! - [`ExportCoordinator`] runs the workers under a fixed concurrency budget
//! - [`RunReport`] aggregates the outcomes

pub mod coordinator;
pub mod machine;
pub mod policy;
pub mod summary;
pub mod worker;

pub use coordinator::{ExportCoordinator, LogRetention};
pub use machine::ExportStateMachine;
pub use policy::ExportPolicy;
pub use summary::{ExportRecord, InstanceReport, InstanceStatus, RunReport};
pub use worker::{export_failure_subject, instance_failure_subject, InstanceWorker};
