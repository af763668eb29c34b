//! The capability contract the external driver integration implements.

use async_trait::async_trait;
use castellan_cql::Statement;
use castellan_schema::{TableMetadata, UdtMetadata};

/// A failure reported by the external client. Castellan neither retries
/// nor interprets these beyond propagating them; timeouts, connection
/// loss and write conflicts are the driver's concern.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("statement execution failed: {message}")]
    Execution { message: String },

    #[error("batch execution failed: {message}")]
    Batch { message: String },

    #[error("metadata fetch failed: {message}")]
    Metadata { message: String },
}

/// Asynchronous handle to the live store.
///
/// Metadata fetches return `None` when the entity does not exist in the
/// keyspace — absence is not an error.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Executes one statement.
    async fn execute(&self, statement: &str) -> Result<(), StoreError>;

    /// Executes a batch of statements atomically, best-effort per the
    /// store's batch semantics.
    async fn execute_batch(&self, statements: &[Statement]) -> Result<(), StoreError>;

    /// Fetches the live schema of one table.
    async fn table_metadata(
        &self,
        keyspace: &str,
        table: &str,
    ) -> Result<Option<TableMetadata>, StoreError>;

    /// Fetches the live definition of one user-defined type.
    async fn udt_metadata(
        &self,
        keyspace: &str,
        name: &str,
    ) -> Result<Option<UdtMetadata>, StoreError>;
}
