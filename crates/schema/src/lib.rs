//! Declarative schema handling for Castellan.
//!
//! A [`SchemaDef`] describes one table or user-defined type the way the
//! operator declares it; the [`metadata`] module wraps what the store
//! actually reports; [`drift`] compares the two, member by member, across
//! member set, member types, primary key, clustering key and clustering
//! order.

pub mod def;
pub mod drift;
pub mod error;
pub mod metadata;
pub mod validate;

pub use def::{MemberType, SchemaDef, SchemaDefBuilder, SortOrder, UdtCatalog};
pub use drift::{compare_entity, DriftSignal};
pub use error::{SchemaError, ValidationError};
pub use metadata::{ColumnType, LiveMetadata, TableMetadata, UdtField, UdtMetadata};
pub use validate::{validate_schema, validate_schemas};
