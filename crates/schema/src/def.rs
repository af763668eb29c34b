//! Declared schema definitions.
//!
//! A [`SchemaDef`] is built once from a literal declaration at startup and
//! is immutable afterwards, except for the one-time
//! [`resolve_custom_types`](SchemaDef::resolve_custom_types) pass that
//! rewrites custom-type references into the referenced definition. After
//! that pass instances are safe to share read-only across tasks.
//!
//! The declaration wire format is a plain JSON mapping of member name →
//! type string, with five reserved keys carrying control metadata:
//! `__primaryKey__`, `__clusteredKey__`, `__order__`, `__options__` and
//! `__dropIfExists__`. Internally the control data lives in named fields,
//! so a declared column can never collide with a reserved name.

use std::fmt;

use castellan_types::TypeName;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::de::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SchemaError;

/// Declared custom types, by name. Tables resolve their UDT-typed members
/// against this catalog.
pub type UdtCatalog = IndexMap<String, SchemaDef>;

const PRIMARY_KEY: &str = "__primaryKey__";
const CLUSTERING_KEY: &str = "__clusteredKey__";
const ORDER: &str = "__order__";
const OPTIONS: &str = "__options__";
const DROP_IF_EXISTS: &str = "__dropIfExists__";

const RESERVED_KEYS: [&str; 5] = [PRIMARY_KEY, CLUSTERING_KEY, ORDER, OPTIONS, DROP_IF_EXISTS];

/// Sort direction of one clustering member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `"ASC"`/`"DESC"` case-insensitively.
    pub fn parse(s: &str) -> Option<SortOrder> {
        if s.eq_ignore_ascii_case("ASC") {
            Some(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("DESC") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        SortOrder::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("expected ASC or DESC, got `{s}`")))
    }
}

impl serde::Serialize for SortOrder {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// The declared type of one member.
#[derive(Clone, Debug, PartialEq)]
pub enum MemberType {
    /// A plain type string, exactly as declared.
    Declared(TypeName),
    /// A custom-type reference resolved against the [`UdtCatalog`]. The
    /// declared text is kept verbatim for DDL output; the resolved schema
    /// drives recursive data filtering.
    Udt {
        declared: TypeName,
        schema: Box<SchemaDef>,
    },
}

impl MemberType {
    /// The type string as written in the declaration.
    pub fn declared(&self) -> &TypeName {
        match self {
            MemberType::Declared(ty) => ty,
            MemberType::Udt { declared, .. } => declared,
        }
    }
}

/// One declared table or user-defined type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaDef {
    members: IndexMap<String, MemberType>,
    primary_key: Vec<String>,
    clustering_key: Vec<String>,
    clustering_order: IndexMap<String, SortOrder>,
    options: IndexMap<String, Value>,
    drop_on_init: bool,
}

impl SchemaDef {
    pub fn builder() -> SchemaDefBuilder {
        SchemaDefBuilder::default()
    }

    /// Declared members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberType)> {
        self.members.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, name: &str) -> Option<&MemberType> {
        self.members.get(name)
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn clustering_key(&self) -> &[String] {
        &self.clustering_key
    }

    /// Declared sort order for one clustering member; members absent from
    /// the declaration default to ascending.
    pub fn clustering_order_of(&self, member: &str) -> SortOrder {
        self.clustering_order
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(member))
            .map(|(_, o)| *o)
            .unwrap_or(SortOrder::Asc)
    }

    /// Whether the entity should be dropped (if present) before any
    /// create/compare pass.
    pub fn should_drop(&self) -> bool {
        self.drop_on_init
    }

    fn is_key_member(&self, name: &str) -> bool {
        self.primary_key.iter().any(|k| k == name) || self.clustering_key.iter().any(|k| k == name)
    }

    /// Comma-joined `<name> <type>` fragments for every member, in
    /// declaration order. The declared type text is preserved verbatim.
    pub fn members_definition(&self) -> String {
        self.members
            .iter()
            .map(|(name, member)| format!("{name} {}", member.declared()))
            .join(",")
    }

    /// The `PRIMARY KEY(...)` clause, or an empty string when no primary
    /// key was declared. The partition group is always parenthesized;
    /// clustering members, if any, are appended unparenthesized.
    pub fn keys_clause(&self) -> String {
        if self.primary_key.is_empty() {
            return String::new();
        }

        let mut definition = format!("({})", self.primary_key.iter().join(","));
        if !self.clustering_key.is_empty() {
            definition.push(',');
            definition.push_str(&self.clustering_key.iter().join(","));
        }

        format!("PRIMARY KEY({definition})")
    }

    /// The `WITH ...` clause combining clustering order and storage
    /// options, or an empty string when neither was declared. Option
    /// values are rendered as JSON with string literals single-quoted.
    pub fn table_config_clause(&self) -> String {
        let mut parts = Vec::new();

        if !self.clustering_order.is_empty() {
            let order = self
                .clustering_order
                .iter()
                .map(|(name, order)| format!("{name} {order}"))
                .join(",");
            parts.push(format!("CLUSTERING ORDER BY({order})"));
        }

        if !self.options.is_empty() {
            parts.push(
                self.options
                    .iter()
                    .map(|(name, value)| format!("{name} = {}", render_option_literal(value)))
                    .join(" AND "),
            );
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!("WITH {}", parts.join(" AND "))
        }
    }

    /// Projects a data object onto the declared members.
    ///
    /// Returns `None` for non-object input. The result contains exactly
    /// the keys present in both the declaration and the input, in
    /// declaration order. Values bound for textual members are
    /// stringified; custom-type members recurse into the referenced
    /// definition's own `filter_data`. Filtering an already-filtered
    /// object yields the same object.
    pub fn filter_data(&self, data: &Value) -> Option<IndexMap<String, Value>> {
        let obj = data.as_object()?;
        let mut filtered = IndexMap::new();

        for (name, member) in &self.members {
            let Some(value) = obj.get(name) else { continue };
            let value = match member {
                MemberType::Udt { schema, .. } => match schema.filter_data(value) {
                    Some(nested) => Value::Object(nested.into_iter().collect()),
                    None => Value::Null,
                },
                MemberType::Declared(ty) => cast_text_or_default(ty, value),
            };
            filtered.insert(name.clone(), value);
        }

        Some(filtered)
    }

    /// The subset of a data object belonging to the primary or clustering
    /// key, in key-declaration order with partition-key members first.
    /// Returns `None` for non-object input.
    pub fn extract_keys(&self, data: &Value) -> Option<IndexMap<String, Value>> {
        let obj = data.as_object()?;
        let mut keys = IndexMap::new();

        for name in self.primary_key.iter().chain(&self.clustering_key) {
            if !self.members.contains_key(name) {
                continue;
            }
            if let Some(value) = obj.get(name) {
                keys.insert(name.clone(), value.clone());
            }
        }

        Some(keys)
    }

    /// The complement of [`extract_keys`](Self::extract_keys): declared
    /// non-key members present in the data object, in declaration order.
    pub fn extract_not_keys(&self, data: &Value) -> Option<IndexMap<String, Value>> {
        let obj = data.as_object()?;
        let mut rest = IndexMap::new();

        for name in self.members.keys() {
            if self.is_key_member(name) {
                continue;
            }
            if let Some(value) = obj.get(name) {
                rest.insert(name.clone(), value.clone());
            }
        }

        Some(rest)
    }

    /// Rewrites every member whose declared type (after one `frozen<...>`
    /// unwrap) names a catalog entry into a resolved custom-type member.
    ///
    /// Idempotent; members naming nothing in the catalog are left
    /// untouched.
    pub fn resolve_custom_types(&mut self, catalog: &UdtCatalog) {
        for member in self.members.values_mut() {
            let resolved = match &*member {
                MemberType::Declared(ty) => ty
                    .referenced_custom_type()
                    .and_then(|name| catalog.get(name))
                    .map(|udt| MemberType::Udt {
                        declared: ty.clone(),
                        schema: Box::new(udt.clone()),
                    }),
                MemberType::Udt { .. } => None,
            };
            if let Some(member_type) = resolved {
                *member = member_type;
            }
        }
    }

    fn from_declaration_map(raw: IndexMap<String, Value>) -> Result<SchemaDef, SchemaError> {
        let mut def = SchemaDef::default();

        for (key, value) in raw {
            match key.as_str() {
                PRIMARY_KEY => def.primary_key = string_list(PRIMARY_KEY, &value)?,
                CLUSTERING_KEY => def.clustering_key = string_list(CLUSTERING_KEY, &value)?,
                ORDER => def.clustering_order = order_map(&value)?,
                OPTIONS => def.options = options_map(&value)?,
                DROP_IF_EXISTS => {
                    def.drop_on_init = value.as_bool().ok_or(SchemaError::MalformedControlField {
                        field: DROP_IF_EXISTS,
                        expected: "a boolean",
                    })?
                }
                _ => {
                    let ty = value.as_str().ok_or_else(|| SchemaError::MemberNotAString {
                        member: key.clone(),
                        found: value.to_string(),
                    })?;
                    def.members.insert(key, MemberType::Declared(TypeName::from(ty)));
                }
            }
        }

        Ok(def)
    }
}

impl<'de> Deserialize<'de> for SchemaDef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Value>::deserialize(d)?;
        SchemaDef::from_declaration_map(raw).map_err(serde::de::Error::custom)
    }
}

/// Fluent construction for programmatic declarations.
#[derive(Debug, Default)]
pub struct SchemaDefBuilder {
    def: SchemaDef,
}

impl SchemaDefBuilder {
    /// Declares one member. Reserved control-key names are never members
    /// and are silently skipped.
    pub fn member(mut self, name: impl Into<String>, ty: impl Into<TypeName>) -> Self {
        let name = name.into();
        if !RESERVED_KEYS.contains(&name.as_str()) {
            self.def.members.insert(name, MemberType::Declared(ty.into()));
        }
        self
    }

    pub fn primary_key<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.primary_key = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn clustering_key<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.clustering_key = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn order(mut self, member: impl Into<String>, order: SortOrder) -> Self {
        self.def.clustering_order.insert(member.into(), order);
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.def.options.insert(name.into(), value);
        self
    }

    pub fn drop_on_init(mut self, drop: bool) -> Self {
        self.def.drop_on_init = drop;
        self
    }

    pub fn build(self) -> SchemaDef {
        self.def
    }
}

/// Values bound for `text`/`varchar`/`ascii` members are stringified:
/// composites through their JSON rendering, scalars through plain display
/// conversion. Everything else passes through unchanged.
fn cast_text_or_default(ty: &TypeName, value: &Value) -> Value {
    if !ty.is_text_like() {
        return value.clone();
    }

    match value {
        Value::Null => Value::Null,
        Value::String(_) => value.clone(),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
    }
}

fn render_option_literal(value: &Value) -> String {
    value.to_string().replace('"', "'")
}

fn string_list(field: &'static str, value: &Value) -> Result<Vec<String>, SchemaError> {
    let malformed = || SchemaError::MalformedControlField {
        field,
        expected: "an array of member names",
    };

    value
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|v| v.as_str().map(str::to_owned).ok_or_else(malformed))
        .collect()
}

fn order_map(value: &Value) -> Result<IndexMap<String, SortOrder>, SchemaError> {
    let malformed = || SchemaError::MalformedControlField {
        field: ORDER,
        expected: "a mapping of member name to ASC or DESC",
    };

    value
        .as_object()
        .ok_or_else(malformed)?
        .iter()
        .map(|(name, v)| {
            let order = v.as_str().and_then(SortOrder::parse).ok_or_else(malformed)?;
            Ok((name.clone(), order))
        })
        .collect()
}

fn options_map(value: &Value) -> Result<IndexMap<String, Value>, SchemaError> {
    Ok(value
        .as_object()
        .ok_or(SchemaError::MalformedControlField {
            field: OPTIONS,
            expected: "a mapping of option name to literal value",
        })?
        .iter()
        .map(|(name, v)| (name.clone(), v.clone()))
        .collect())
}
