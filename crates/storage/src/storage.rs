//! The storage facade.

use std::sync::Arc;

use castellan_cql as cql;
use castellan_schema::{validate_schemas, DriftSignal, SchemaDef, UdtCatalog, ValidationError};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;

use crate::client::{StoreClient, StoreError};
use crate::drift::{DriftDetector, DriftError};

/// Tables receiving device commands.
pub const COMMAND_GROUP: &str = "commands";
/// Tables receiving device notifications.
pub const NOTIFICATION_GROUP: &str = "notifications";
/// Tables receiving command status updates.
pub const COMMAND_UPDATES_GROUP: &str = "commandUpdates";

/// Owns the declared schema groups and drives the external client.
///
/// Declarations are set once at startup; custom-type references are
/// resolved whenever either group changes, after which the definitions
/// are only ever read — concurrent statement compilation needs no
/// locking.
pub struct Storage {
    client: Arc<dyn StoreClient>,
    keyspace: String,
    tables: IndexMap<String, SchemaDef>,
    udts: UdtCatalog,
    groups: IndexMap<String, Vec<String>>,
}

impl Storage {
    pub fn new(client: Arc<dyn StoreClient>, keyspace: impl Into<String>) -> Self {
        Storage {
            client,
            keyspace: keyspace.into(),
            tables: IndexMap::new(),
            udts: UdtCatalog::new(),
            groups: IndexMap::new(),
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn table_schemas(&self) -> &IndexMap<String, SchemaDef> {
        &self.tables
    }

    pub fn udt_schemas(&self) -> &UdtCatalog {
        &self.udts
    }

    /// Sets the declared table schemas and resolves their custom-type
    /// references against the current UDT catalog.
    pub fn set_table_schemas(&mut self, schemas: IndexMap<String, SchemaDef>) -> &mut Self {
        self.tables = schemas;
        self.resolve_references();
        self
    }

    /// Sets the declared user-defined types and re-resolves table
    /// references against them.
    pub fn set_udt_schemas(&mut self, schemas: UdtCatalog) -> &mut Self {
        self.udts = schemas;
        self.resolve_references();
        self
    }

    fn resolve_references(&mut self) {
        let udts = &self.udts;
        self.tables
            .values_mut()
            .for_each(|table| table.resolve_custom_types(udts));
    }

    /// Assigns tables to a named group. Later batch writes against the
    /// group touch exactly these tables.
    pub fn assign_tables_to_group<I, S>(&mut self, group: &str, tables: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .insert(group.to_owned(), tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn assign_tables_to_commands<I, S>(&mut self, tables: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assign_tables_to_group(COMMAND_GROUP, tables)
    }

    pub fn assign_tables_to_notifications<I, S>(&mut self, tables: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assign_tables_to_group(NOTIFICATION_GROUP, tables)
    }

    pub fn assign_tables_to_command_updates<I, S>(&mut self, tables: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assign_tables_to_group(COMMAND_UPDATES_GROUP, tables)
    }

    /// Validates the declared table schemas, collecting every offender.
    /// Runs entirely in-process; call it before any statement is issued.
    pub fn validate_declarations(&self) -> Result<(), Vec<ValidationError>> {
        let errors = validate_schemas(&self.tables);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Sets the table schemas and creates each declared table with an
    /// existence guard. Creation fans out concurrently; one failed
    /// statement does not cancel the others, and the first failure is
    /// reported once all have settled.
    pub async fn create_table_schemas(
        &mut self,
        schemas: IndexMap<String, SchemaDef>,
    ) -> Result<(), StoreError> {
        self.set_table_schemas(schemas);
        let statements: Vec<String> = self
            .tables
            .iter()
            .map(|(name, def)| {
                cql::create_table()
                    .with_name(name)
                    .from_schema(def)
                    .if_not_exists()
                    .build()
            })
            .collect();
        log::info!("creating {} table schema(s)", statements.len());
        self.execute_all(&statements).await
    }

    /// Sets the UDT catalog and creates each declared type with an
    /// existence guard.
    pub async fn create_udt_schemas(&mut self, schemas: UdtCatalog) -> Result<(), StoreError> {
        self.set_udt_schemas(schemas);
        let statements: Vec<String> = self
            .udts
            .iter()
            .map(|(name, def)| {
                cql::create_type()
                    .with_name(name)
                    .from_schema(def)
                    .if_not_exists()
                    .build()
            })
            .collect();
        log::info!("creating {} type schema(s)", statements.len());
        self.execute_all(&statements).await
    }

    /// Drops every declared table marked drop-on-init, guarded with
    /// `IF EXISTS`. Meant to run before any create/compare pass.
    pub async fn drop_table_schemas(&self) -> Result<(), StoreError> {
        let statements: Vec<String> = self
            .tables
            .iter()
            .filter(|(_, def)| def.should_drop())
            .map(|(name, _)| cql::drop_table().with_name(name).if_exists().build())
            .collect();
        self.execute_all(&statements).await
    }

    /// Drops every declared user-defined type marked drop-on-init.
    pub async fn drop_udt_schemas(&self) -> Result<(), StoreError> {
        let statements: Vec<String> = self
            .udts
            .iter()
            .filter(|(_, def)| def.should_drop())
            .map(|(name, _)| cql::drop_type().with_name(name).if_exists().build())
            .collect();
        self.execute_all(&statements).await
    }

    /// Inserts one data object into every schema-backed table of a
    /// group, as a single atomic batch. Tables without a declared schema
    /// are skipped. Returns whether anything was submitted.
    pub async fn insert_into_group(&self, group: &str, data: &Value) -> Result<bool, StoreError> {
        let statements: Vec<cql::Statement> = self
            .group_tables(group)
            .filter_map(|table| {
                let schema = self.tables.get(table)?;
                Some(
                    cql::insert_into(table, &self.keyspace)
                        .query_params(data.clone())
                        .with_schema(schema)
                        .build(),
                )
            })
            .collect();
        self.batch_logged(group, statements).await
    }

    /// Updates one data object in every schema-backed table of a group:
    /// key members move into the WHERE clause, the remainder is written.
    pub async fn update_group(&self, group: &str, data: &Value) -> Result<bool, StoreError> {
        let statements: Vec<cql::Statement> = self
            .group_tables(group)
            .filter_map(|table| {
                let schema = self.tables.get(table)?;
                Some(
                    cql::update(table, &self.keyspace)
                        .with_schema(schema)
                        .query_params(data.clone())
                        .build(),
                )
            })
            .collect();
        self.batch_logged(group, statements).await
    }

    pub async fn insert_command(&self, data: &Value) -> Result<bool, StoreError> {
        self.insert_into_group(COMMAND_GROUP, data).await
    }

    pub async fn update_command(&self, data: &Value) -> Result<bool, StoreError> {
        self.update_group(COMMAND_GROUP, data).await
    }

    pub async fn insert_notification(&self, data: &Value) -> Result<bool, StoreError> {
        self.insert_into_group(NOTIFICATION_GROUP, data).await
    }

    pub async fn insert_command_update(&self, data: &Value) -> Result<bool, StoreError> {
        self.insert_into_group(COMMAND_UPDATES_GROUP, data).await
    }

    /// True iff every declared table and type exists in the keyspace.
    /// All metadata fetches are issued concurrently.
    pub async fn check_schemas_exist(&self) -> Result<bool, StoreError> {
        let mut checks: Vec<BoxFuture<'_, Result<bool, StoreError>>> = Vec::new();

        for name in self.tables.keys() {
            checks.push(
                async move {
                    Ok(self
                        .client
                        .table_metadata(&self.keyspace, name)
                        .await?
                        .is_some())
                }
                .boxed(),
            );
        }
        for name in self.udts.keys() {
            checks.push(
                async move {
                    Ok(self
                        .client
                        .udt_metadata(&self.keyspace, name)
                        .await?
                        .is_some())
                }
                .boxed(),
            );
        }

        let mut all_exist = true;
        for result in join_all(checks).await {
            all_exist &= result?;
        }
        Ok(all_exist)
    }

    /// A drift detector over this storage's client and keyspace.
    pub fn drift_detector(&self) -> DriftDetector {
        DriftDetector::new(Arc::clone(&self.client), self.keyspace.clone())
    }

    /// Compares every declared table against the live keyspace.
    pub async fn compare_table_schemas(&self) -> Result<Vec<DriftSignal>, StoreError> {
        self.drift_detector().compare_tables(&self.tables).await
    }

    /// Compares every declared user-defined type against the live
    /// keyspace.
    pub async fn compare_udt_schemas(&self) -> Result<Vec<DriftSignal>, StoreError> {
        self.drift_detector().compare_udts(&self.udts).await
    }

    /// Runs both comparison passes, logs every signal, and raises an
    /// aggregate error when any mismatch was observed. Table divergence
    /// is reported before type divergence.
    pub async fn verify_schemas(&self) -> Result<(), DriftError> {
        let table_signals = self.compare_table_schemas().await?;
        let table_mismatches = log_signals("TABLE", &table_signals);

        let udt_signals = self.compare_udt_schemas().await?;
        let udt_mismatches = log_signals("UDT", &udt_signals);

        if table_mismatches > 0 {
            return Err(DriftError::TableSchemaMismatch {
                mismatches: table_mismatches,
            });
        }
        if udt_mismatches > 0 {
            return Err(DriftError::UdtSchemaMismatch {
                mismatches: udt_mismatches,
            });
        }
        Ok(())
    }

    fn group_tables(&self, group: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
    }

    /// Fans statements out concurrently; every statement is issued even
    /// when a sibling fails, and the first failure is reported after all
    /// have settled.
    async fn execute_all(&self, statements: &[String]) -> Result<(), StoreError> {
        let executions = statements.iter().map(|query| self.execute_logged(query));
        join_all(executions).await.into_iter().collect()
    }

    async fn execute_logged(&self, query: &str) -> Result<(), StoreError> {
        log::debug!("executing `{query}`");
        self.client.execute(query).await.inspect_err(|err| {
            log::error!("statement `{query}` failed: {err}");
        })
    }

    async fn batch_logged(
        &self,
        group: &str,
        statements: Vec<cql::Statement>,
    ) -> Result<bool, StoreError> {
        if statements.is_empty() {
            return Ok(false);
        }
        log::debug!(
            "submitting batch of {} statement(s) for group `{group}`",
            statements.len()
        );
        self.client
            .execute_batch(&statements)
            .await
            .inspect_err(|err| log::error!("batch for group `{group}` failed: {err}"))?;
        Ok(true)
    }
}

fn log_signals(scope: &str, signals: &[DriftSignal]) -> usize {
    let mut mismatches = 0;
    for signal in signals {
        if signal.is_mismatch() {
            mismatches += 1;
            log::warn!("{scope} {signal}");
        } else {
            log::info!("{scope} {signal}");
        }
    }
    mismatches
}
