//! Storage orchestration for Castellan.
//!
//! The [`Storage`] facade owns the declared schema groups and drives the
//! external client: guarded CREATE fan-out, conditional drops, per-group
//! atomic batch writes, existence checks and drift verification. The
//! client itself — connection, authentication, retries — lives behind the
//! [`StoreClient`] trait and is somebody else's problem.

pub mod client;
pub mod drift;
pub mod storage;

pub use client::{StoreClient, StoreError};
pub use drift::{DriftDetector, DriftError};
pub use storage::{Storage, COMMAND_GROUP, COMMAND_UPDATES_GROUP, NOTIFICATION_GROUP};
