//! Parameterized INSERT/UPDATE compilation.

use castellan_schema::{SchemaDef, UdtCatalog};
use itertools::Itertools;
use serde_json::Value;

/// A compiled statement: query text plus its ordered parameter list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statement {
    pub query: String,
    pub params: Vec<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Insert,
    Update,
}

/// Builder for one data statement.
///
/// Parameters are staged with [`query_params`](QueryBuilder::query_params)
/// and consumed by the first [`build`](QueryBuilder::build): a repeat
/// build without re-staging yields an empty parameter list. Call sites
/// treat the first build as authoritative, so this is a documented
/// contract rather than an accident.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    kind: Option<Kind>,
    table: String,
    keyspace: String,
    schema: Option<SchemaDef>,
    staged: Option<Value>,
    wheres: Vec<(String, Value)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder::default()
    }

    /// Makes this an INSERT into the given table.
    pub fn insert_into(mut self, table: &str, keyspace: &str) -> Self {
        self.kind = Some(Kind::Insert);
        self.set_table(table, keyspace);
        self
    }

    /// Makes this an UPDATE of the given table.
    pub fn update(mut self, table: &str, keyspace: &str) -> Self {
        self.kind = Some(Kind::Update);
        self.set_table(table, keyspace);
        self
    }

    /// Retargets the statement. No-op until a verb has been chosen.
    pub fn table(mut self, table: &str, keyspace: &str) -> Self {
        if self.kind.is_some() {
            self.set_table(table, keyspace);
        }
        self
    }

    fn set_table(&mut self, table: &str, keyspace: &str) {
        self.table = table.to_owned();
        self.keyspace = keyspace.to_owned();
    }

    /// Stages the data object the statement will bind.
    pub fn query_params(mut self, data: Value) -> Self {
        self.staged = Some(data);
        self
    }

    /// Attaches the schema used to filter and cast staged data.
    pub fn with_schema(mut self, schema: &SchemaDef) -> Self {
        self.schema = Some(schema.clone());
        self
    }

    /// Resolves custom-type references in the attached schema, so nested
    /// values are filtered recursively. No-op without a schema.
    pub fn with_custom_types(mut self, catalog: &UdtCatalog) -> Self {
        if let Some(schema) = &mut self.schema {
            schema.resolve_custom_types(catalog);
        }
        self
    }

    /// Appends one WHERE term; the predicate must contain a single `?`.
    pub fn where_clause(mut self, predicate: impl Into<String>, value: Value) -> Self {
        self.wheres.push((predicate.into(), value));
        self
    }

    /// Compiles the statement, consuming staged parameters.
    ///
    /// For an UPDATE with an attached schema, key members are pulled out
    /// of the staged data into WHERE predicates (partition keys before
    /// clustering keys, in declared key order) and only the non-key
    /// remainder is written. Parameter order is SET/VALUES first, then
    /// WHERE.
    pub fn build(&mut self) -> Statement {
        let staged = self.staged.take();
        let mut predicates = std::mem::take(&mut self.wheres);

        let Some(kind) = self.kind else {
            return Statement::default();
        };

        let mut data = staged;
        if kind == Kind::Update {
            if let (Some(schema), Some(full)) = (&self.schema, &data) {
                if let Some(keys) = schema.extract_keys(full) {
                    for (column, value) in keys {
                        predicates.push((format!("{column} = ?"), value));
                    }
                }
                data = schema
                    .extract_not_keys(full)
                    .map(|rest| Value::Object(rest.into_iter().collect()));
            }
        }

        let columns: Vec<(String, Value)> = match (&self.schema, &data) {
            (Some(schema), Some(data)) => schema
                .filter_data(data)
                .map(|filtered| filtered.into_iter().collect())
                .unwrap_or_default(),
            (None, Some(Value::Object(map))) => {
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            _ => Vec::new(),
        };

        let target = if self.keyspace.is_empty() {
            self.table.clone()
        } else {
            format!("{}.{}", self.keyspace, self.table)
        };

        match kind {
            Kind::Insert => {
                let cols = columns.iter().map(|(c, _)| c.as_str()).join(", ");
                let placeholders = columns.iter().map(|_| "?").join(", ");
                Statement {
                    query: format!("INSERT INTO {target} ({cols}) VALUES ({placeholders})"),
                    params: columns.into_iter().map(|(_, v)| v).collect(),
                }
            }
            Kind::Update => {
                let sets = columns.iter().map(|(c, _)| format!("{c} = ?")).join(", ");
                let terms = predicates.iter().map(|(p, _)| p.as_str()).join(" AND ");
                let params = columns
                    .into_iter()
                    .map(|(_, v)| v)
                    .chain(predicates.into_iter().map(|(_, v)| v))
                    .collect();
                Statement {
                    query: format!("UPDATE {target} SET {sets} WHERE {terms} IF EXISTS"),
                    params,
                }
            }
        }
    }
}
