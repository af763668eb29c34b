//! Errors raised while loading or validating schema declarations.

/// A malformed schema declaration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("member `{member}` must be declared as a type string, got {found}")]
    MemberNotAString { member: String, found: String },

    #[error("control field `{field}` is malformed: expected {expected}")]
    MalformedControlField {
        field: &'static str,
        expected: &'static str,
    },
}

/// A declaration that parses but violates a content rule. Raised before
/// any statement is compiled or any network interaction happens.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The `parameters` member admits only shapes the message ingestion
    /// path knows how to bind: a textual type, a `map<text,text>`-shaped
    /// (optionally frozen) map, or a custom-type reference.
    #[error(
        "entity `{entity}`: member `parameters` declared as `{declared}` \
         must be a textual type, a map<text,text>-shaped map, or a custom type reference"
    )]
    UnsupportedParametersType { entity: String, declared: String },
}
