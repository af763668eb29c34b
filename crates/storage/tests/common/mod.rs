//! A scripted in-memory client standing in for the real driver.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use castellan_cql::Statement;
use castellan_schema::{TableMetadata, UdtMetadata};
use castellan_storage::{StoreClient, StoreError};

#[derive(Default)]
pub struct MockClient {
    pub executed: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<Vec<Statement>>>,
    pub tables: Mutex<HashMap<String, TableMetadata>>,
    pub udts: Mutex<HashMap<String, UdtMetadata>>,
    pub fail_fetches: bool,
}

impl MockClient {
    pub fn new() -> Self {
        MockClient::default()
    }

    pub fn with_table(self, metadata: TableMetadata) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(metadata.name.clone(), metadata);
        self
    }

    pub fn with_udt(self, metadata: UdtMetadata) -> Self {
        self.udts
            .lock()
            .unwrap()
            .insert(metadata.name.clone(), metadata);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<Statement>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreClient for MockClient {
    async fn execute(&self, statement: &str) -> Result<(), StoreError> {
        self.executed.lock().unwrap().push(statement.to_owned());
        Ok(())
    }

    async fn execute_batch(&self, statements: &[Statement]) -> Result<(), StoreError> {
        self.batches.lock().unwrap().push(statements.to_vec());
        Ok(())
    }

    async fn table_metadata(
        &self,
        _keyspace: &str,
        table: &str,
    ) -> Result<Option<TableMetadata>, StoreError> {
        if self.fail_fetches {
            return Err(StoreError::Metadata {
                message: "scripted failure".to_owned(),
            });
        }
        Ok(self.tables.lock().unwrap().get(table).cloned())
    }

    async fn udt_metadata(
        &self,
        _keyspace: &str,
        name: &str,
    ) -> Result<Option<UdtMetadata>, StoreError> {
        if self.fail_fetches {
            return Err(StoreError::Metadata {
                message: "scripted failure".to_owned(),
            });
        }
        Ok(self.udts.lock().unwrap().get(name).cloned())
    }
}
