//! Statement compilation: schema declarations in, CQL text and ordered
//! parameters out.
//!
//! [`ddl`] builds CREATE/DROP statements for tables and user-defined
//! types; [`dml`] builds parameterized INSERT/UPDATE statements filtered
//! through a [`castellan_schema::SchemaDef`]. The entry points below
//! mirror how call sites read: `cql::insert_into("commands", keyspace)`.

pub mod ddl;
pub mod dml;

pub use ddl::SchemaStatementBuilder;
pub use dml::{QueryBuilder, Statement};

/// Starts an INSERT statement for the given table.
pub fn insert_into(table: &str, keyspace: &str) -> QueryBuilder {
    QueryBuilder::new().insert_into(table, keyspace)
}

/// Starts an UPDATE statement for the given table.
pub fn update(table: &str, keyspace: &str) -> QueryBuilder {
    QueryBuilder::new().update(table, keyspace)
}

/// Starts a CREATE TABLE statement.
pub fn create_table() -> SchemaStatementBuilder {
    SchemaStatementBuilder::create_table()
}

/// Starts a CREATE TYPE statement.
pub fn create_type() -> SchemaStatementBuilder {
    SchemaStatementBuilder::create_type()
}

/// Starts a DROP TABLE statement.
pub fn drop_table() -> SchemaStatementBuilder {
    SchemaStatementBuilder::drop_table()
}

/// Starts a DROP TYPE statement.
pub fn drop_type() -> SchemaStatementBuilder {
    SchemaStatementBuilder::drop_type()
}
