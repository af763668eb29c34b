//! Pre-flight validation of schema declarations.
//!
//! Runs before any statement is compiled or submitted. The only content
//! rule today concerns the `parameters` member, whose values the message
//! ingestion path must be able to bind as text or a string map.

use castellan_types::{strip_frozen, TypeName};
use indexmap::IndexMap;

use crate::def::{MemberType, SchemaDef};
use crate::error::ValidationError;

const PARAMETERS_MEMBER: &str = "parameters";

/// Checks one declared entity, returning its error if the declaration is
/// unsupported.
pub fn validate_schema(entity: &str, def: &SchemaDef) -> Option<ValidationError> {
    let member = def.member(PARAMETERS_MEMBER)?;

    let ok = match member {
        // Already resolved against the custom-type catalog.
        MemberType::Udt { .. } => true,
        MemberType::Declared(ty) => parameters_type_supported(ty),
    };

    if ok {
        None
    } else {
        Some(ValidationError::UnsupportedParametersType {
            entity: entity.to_owned(),
            declared: member.declared().as_str().to_owned(),
        })
    }
}

/// Checks a whole declaration group, collecting every offending entity
/// rather than stopping at the first.
pub fn validate_schemas(group: &IndexMap<String, SchemaDef>) -> Vec<ValidationError> {
    group
        .iter()
        .filter_map(|(name, def)| validate_schema(name, def))
        .collect()
}

/// `parameters` admits textual types, a `map<text,text>`-shaped
/// (optionally frozen) map, or a custom-type reference. Lists, sets,
/// tuples, non-text map components and non-textual primitives are
/// rejected.
fn parameters_type_supported(ty: &TypeName) -> bool {
    if ty.is_text_like() {
        return true;
    }

    let canonical = ty.canonical();
    if TypeName::from(strip_frozen(&canonical)).canonical() == "map<text,text>" {
        return true;
    }

    ty.referenced_custom_type().is_some()
}
