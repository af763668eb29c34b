//! Adapters over the store's live schema metadata.
//!
//! One [`LiveMetadata`] wraps a single metadata response, fetched fresh per
//! comparison pass and never cached. The variant is chosen by the
//! collaborator that issued the fetch (a table fetch yields `Table`, a
//! type fetch yields `Udt`), so no response-shape sniffing happens here.

use castellan_types::{type_name, TypeName};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::def::SortOrder;

/// Wire-level type description of one live member: the numeric type code,
/// type codes of collection parameters, the referenced custom-type name,
/// and the frozen qualifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(default)]
    pub frozen: bool,
}

impl ColumnType {
    pub fn primitive(code: u16) -> ColumnType {
        ColumnType { code, ..Default::default() }
    }

    pub fn collection(code: u16, nested: impl Into<Vec<u16>>) -> ColumnType {
        ColumnType {
            code,
            nested: nested.into(),
            ..Default::default()
        }
    }

    pub fn custom(name: impl Into<String>) -> ColumnType {
        ColumnType {
            code: castellan_types::UDT,
            custom: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn frozen(mut self) -> ColumnType {
        self.frozen = true;
        self
    }

    /// Reconstructs the full textual type name: `base<inner,...>` for
    /// collections, the referenced name for custom types, the bare
    /// primitive name otherwise; wrapped in `frozen<...>` when flagged.
    /// Codes the store never reports render as `unknown`.
    pub fn full_name(&self) -> String {
        let base = |code| type_name(code).unwrap_or("unknown");

        let name = if !self.nested.is_empty() {
            let inner = self
                .nested
                .iter()
                .map(|&c| base(c))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}<{inner}>", base(self.code))
        } else if let Some(custom) = &self.custom {
            custom.clone()
        } else {
            base(self.code).to_owned()
        };

        if self.frozen {
            format!("frozen<{name}>")
        } else {
            name
        }
    }
}

/// Live snapshot of one table's schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    /// Columns by name, as reported by the store (unquoted identifiers
    /// come back lower-cased).
    pub columns: IndexMap<String, ColumnType>,
    #[serde(default)]
    pub partition_keys: Vec<String>,
    #[serde(default)]
    pub clustering_keys: Vec<String>,
    /// Positional, aligned to `clustering_keys`.
    #[serde(default)]
    pub clustering_order: Vec<SortOrder>,
}

/// Live snapshot of one user-defined type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UdtMetadata {
    pub name: String,
    pub fields: Vec<UdtField>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UdtField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

/// One live entity, tagged by the kind of fetch that produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveMetadata {
    Table(TableMetadata),
    Udt(UdtMetadata),
}

impl LiveMetadata {
    pub fn name(&self) -> &str {
        match self {
            LiveMetadata::Table(t) => &t.name,
            LiveMetadata::Udt(u) => &u.name,
        }
    }

    /// Whether a member with this name exists in the live entity.
    ///
    /// The table variant lower-cases both sides (the store lower-cases
    /// unquoted column identifiers); the UDT variant compares field names
    /// as given.
    pub fn member_exists(&self, member: &str) -> bool {
        match self {
            LiveMetadata::Table(t) => {
                let member = member.to_lowercase();
                t.columns.keys().any(|c| c.to_lowercase() == member)
            }
            LiveMetadata::Udt(u) => u.fields.iter().any(|f| f.name == member),
        }
    }

    pub fn member_count(&self) -> usize {
        match self {
            LiveMetadata::Table(t) => t.columns.len(),
            LiveMetadata::Udt(u) => u.fields.len(),
        }
    }

    fn column_type(&self, member: &str) -> Option<&ColumnType> {
        match self {
            LiveMetadata::Table(t) => {
                let member = member.to_lowercase();
                t.columns
                    .iter()
                    .find(|(name, _)| name.to_lowercase() == member)
                    .map(|(_, ty)| ty)
            }
            LiveMetadata::Udt(u) => u.fields.iter().find(|f| f.name == member).map(|f| &f.ty),
        }
    }

    /// Full reconstructed type name of one live member, comparable (after
    /// normalization) against a declared [`TypeName`].
    pub fn full_type_name(&self, member: &str) -> Option<String> {
        self.column_type(member).map(ColumnType::full_name)
    }

    /// Same, as a [`TypeName`] for alias/whitespace-normalized equality.
    pub fn member_type_name(&self, member: &str) -> Option<TypeName> {
        self.full_type_name(member).map(TypeName::from)
    }

    /// Ordered partition-key member names; empty for the UDT variant.
    pub fn partition_keys(&self) -> &[String] {
        match self {
            LiveMetadata::Table(t) => &t.partition_keys,
            LiveMetadata::Udt(_) => &[],
        }
    }

    /// Ordered clustering-key member names; empty for the UDT variant.
    pub fn clustering_keys(&self) -> &[String] {
        match self {
            LiveMetadata::Table(t) => &t.clustering_keys,
            LiveMetadata::Udt(_) => &[],
        }
    }

    /// Positional clustering order, aligned to [`clustering_keys`](Self::clustering_keys).
    pub fn clustering_order(&self) -> &[SortOrder] {
        match self {
            LiveMetadata::Table(t) => &t.clustering_order,
            LiveMetadata::Udt(_) => &[],
        }
    }
}
