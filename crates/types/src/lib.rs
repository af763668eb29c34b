//! Type-code catalog for the wide-column store's wire-level type system.
//!
//! The store reports column types as numeric codes plus optional nested
//! type information. This crate owns the code ↔ name mapping, the
//! `varchar`/`text` alias normalization, and the `frozen<...>` qualifier
//! handling that both the DDL compiler and the drift detector rely on.

use std::fmt;

/// Type code of a `list<T>` collection.
pub const LIST: u16 = 32;
/// Type code of a `map<K,V>` collection.
pub const MAP: u16 = 33;
/// Type code of a `set<T>` collection.
pub const SET: u16 = 34;
/// Type code of a user-defined type.
pub const UDT: u16 = 48;
/// Type code of a tuple.
pub const TUPLE: u16 = 49;

/// Names of every primitive type the store reports, in code order (1..=20).
const PRIMITIVE_NAMES: [&str; 20] = [
    "ascii",
    "bigint",
    "blob",
    "boolean",
    "counter",
    "decimal",
    "double",
    "float",
    "int",
    "text",
    "timestamp",
    "uuid",
    "varchar",
    "varint",
    "timeuuid",
    "inet",
    "date",
    "time",
    "smallint",
    "tinyint",
];

/// Returns the textual name of a wire-level type code, or `None` for a code
/// the store never reports.
pub const fn type_name(code: u16) -> Option<&'static str> {
    match code {
        1..=20 => Some(PRIMITIVE_NAMES[code as usize - 1]),
        LIST => Some("list"),
        MAP => Some("map"),
        SET => Some("set"),
        UDT => Some("udt"),
        TUPLE => Some("tuple"),
        _ => None,
    }
}

/// Returns the wire-level code of a textual type name, the inverse of
/// [`type_name`]. The lookup is case-insensitive.
pub fn code_for_name(name: &str) -> Option<u16> {
    if let Some(pos) = PRIMITIVE_NAMES.iter().position(|p| name.eq_ignore_ascii_case(p)) {
        return Some(pos as u16 + 1);
    }
    match name.to_ascii_lowercase().as_str() {
        "list" => Some(LIST),
        "map" => Some(MAP),
        "set" => Some(SET),
        "udt" => Some(UDT),
        "tuple" => Some(TUPLE),
        _ => None,
    }
}

/// True if `name` is one of the store's primitive type names.
///
/// The check is case-insensitive; `varchar` counts as a primitive even
/// though comparisons elsewhere fold it into `text`.
pub fn is_primitive_name(name: &str) -> bool {
    PRIMITIVE_NAMES.iter().any(|p| name.eq_ignore_ascii_case(p))
}

/// Replaces every occurrence of the `varchar` alias with `text`.
///
/// The store treats the two names interchangeably in live metadata, so any
/// comparison between a declaration and a live schema must fold them first.
pub fn normalize_aliases(type_string: &str) -> String {
    type_string.replace("varchar", "text")
}

/// Removes a single `frozen<...>` wrapper, case-insensitively, returning the
/// inner type or referenced custom-type name.
///
/// Only one level is unwrapped and no nested generic structure is parsed:
/// a custom type buried inside a collection (`list<my_type>`) is not
/// recovered. Inputs without the wrapper are returned unchanged.
pub fn strip_frozen(type_string: &str) -> &str {
    let trimmed = type_string.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(stripped) = lower.strip_prefix("frozen<") {
        if stripped.ends_with('>') {
            return &trimmed["frozen<".len()..trimmed.len() - 1];
        }
    }
    trimmed
}

/// A declared member type, as written in a schema declaration.
///
/// `Display` and `as_str` preserve the declared text verbatim (DDL output
/// must not reformat what the user wrote), while equality compares the
/// [`canonical`](TypeName::canonical) form: whitespace stripped and aliases
/// normalized, so `" varchar "` and `"text"` are the same type.
#[derive(Clone, Eq)]
pub struct TypeName {
    raw: Box<str>,
}

impl TypeName {
    pub fn new(raw: impl Into<Box<str>>) -> Self {
        TypeName { raw: raw.into() }
    }

    /// The type string exactly as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whitespace-free, alias-normalized form used for comparisons.
    pub fn canonical(&self) -> String {
        let compact: String = self.raw.chars().filter(|c| !c.is_whitespace()).collect();
        normalize_aliases(&compact)
    }

    /// True for columns whose bound values must be stringified before
    /// insertion (`text`, `varchar`, `ascii`).
    pub fn is_text_like(&self) -> bool {
        matches!(self.canonical().as_str(), "text" | "ascii")
    }

    /// The bare name this type would resolve against a custom-type catalog:
    /// the declared string with one `frozen<...>` wrapper removed.
    ///
    /// Returns `None` when the result is parametrized (`list<...>`) or a
    /// known primitive, since neither can name a custom type.
    pub fn referenced_custom_type(&self) -> Option<&str> {
        let inner = strip_frozen(&self.raw);
        if inner.contains('<') || is_primitive_name(inner) {
            return None;
        }
        Some(inner)
    }
}

impl PartialEq for TypeName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}

impl From<&str> for TypeName {
    fn from(raw: &str) -> Self {
        TypeName::new(raw)
    }
}

impl From<String> for TypeName {
    fn from(raw: String) -> Self {
        TypeName::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn code_table_covers_primitives_and_parametrized_types() {
        assert_eq!(type_name(1), Some("ascii"));
        assert_eq!(type_name(10), Some("text"));
        assert_eq!(type_name(13), Some("varchar"));
        assert_eq!(type_name(20), Some("tinyint"));
        assert_eq!(type_name(LIST), Some("list"));
        assert_eq!(type_name(MAP), Some("map"));
        assert_eq!(type_name(SET), Some("set"));
        assert_eq!(type_name(UDT), Some("udt"));
        assert_eq!(type_name(TUPLE), Some("tuple"));
        assert_eq!(type_name(0), None);
        assert_eq!(type_name(21), None);
        assert_eq!(type_name(50), None);
    }

    #[test]
    fn name_lookup_inverts_code_lookup() {
        for code in (1..=20).chain([LIST, MAP, SET, UDT, TUPLE]) {
            let name = type_name(code).unwrap();
            assert_eq!(code_for_name(name), Some(code));
        }
        assert_eq!(code_for_name("TEXT"), Some(10));
        assert_eq!(code_for_name("no_such_type"), None);
    }

    #[test]
    fn aliases_fold_to_text() {
        assert_eq!(normalize_aliases("varchar"), "text");
        assert_eq!(normalize_aliases("map<varchar,varchar>"), "map<text,text>");
        assert_eq!(normalize_aliases("int"), "int");
    }

    #[test]
    fn frozen_wrapper_is_stripped_once() {
        assert_eq!(strip_frozen("frozen<my_type>"), "my_type");
        assert_eq!(strip_frozen("FROZEN<my_type>"), "my_type");
        assert_eq!(strip_frozen("frozen<map<text,text>>"), "map<text,text>");
        assert_eq!(strip_frozen("int"), "int");
        assert_eq!(strip_frozen(" text "), "text");
    }

    #[test]
    fn type_names_compare_through_alias_and_whitespace_normalization() {
        assert_eq!(TypeName::from("text"), TypeName::from(" text "));
        assert_eq!(TypeName::from("varchar"), TypeName::from("text"));
        assert_eq!(
            TypeName::from("map<text, text>"),
            TypeName::from("map<varchar,varchar>")
        );
        assert_ne!(TypeName::from("int"), TypeName::from("text"));
    }

    #[test]
    fn declared_text_is_preserved_for_output() {
        let ty = TypeName::from("map<text, text>");
        assert_eq!(ty.to_string(), "map<text, text>");
    }

    #[test]
    fn text_like_detection() {
        assert!(TypeName::from("text").is_text_like());
        assert!(TypeName::from("varchar").is_text_like());
        assert!(TypeName::from("ascii").is_text_like());
        assert!(!TypeName::from("int").is_text_like());
        assert!(!TypeName::from("map<text,text>").is_text_like());
    }

    #[test]
    fn custom_type_references() {
        assert_eq!(
            TypeName::from("frozen<device_info>").referenced_custom_type(),
            Some("device_info")
        );
        assert_eq!(
            TypeName::from("device_info").referenced_custom_type(),
            Some("device_info")
        );
        assert_eq!(TypeName::from("int").referenced_custom_type(), None);
        assert_eq!(TypeName::from("frozen<list<int>>").referenced_custom_type(), None);
        assert_eq!(TypeName::from("list<device_info>").referenced_custom_type(), None);
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent(s in "[a-z<>, ]{0,40}") {
            let once = TypeName::from(s.as_str()).canonical();
            let twice = TypeName::from(once.as_str()).canonical();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn strip_frozen_never_panics(s in ".{0,60}") {
            let _ = strip_frozen(&s);
        }
    }
}
