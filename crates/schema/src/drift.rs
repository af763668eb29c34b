//! Member-by-member comparison of a declared schema against live metadata.
//!
//! Comparison here is pure and per-entity; fetching the metadata and
//! fanning out over a whole schema group is the storage layer's job.

use std::fmt;

use crate::def::SchemaDef;
use crate::metadata::LiveMetadata;

/// One comparison observation.
///
/// A pass over an entity group yields interleaved signals per entity and a
/// single closing [`Done`](DriftSignal::Done) once every fetch has
/// settled. A group passes iff no mismatch signal was observed before
/// `Done`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriftSignal {
    /// The live entity is present. Absent entities produce no signal at
    /// all; callers infer "needs creation" from silence.
    Exists { name: String },
    /// Member cardinality or membership differs.
    MembersMismatch { name: String },
    /// A member exists on both sides with diverging types, compared after
    /// alias and whitespace normalization.
    TypeMismatch {
        name: String,
        member: String,
        live: String,
        declared: String,
    },
    PrimaryKeyMismatch { name: String },
    ClusteringKeyMismatch { name: String },
    ClusteringOrderMismatch { name: String },
    /// Every fetch of the group has settled.
    Done,
}

impl DriftSignal {
    /// The entity this signal concerns, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            DriftSignal::Exists { name }
            | DriftSignal::MembersMismatch { name }
            | DriftSignal::TypeMismatch { name, .. }
            | DriftSignal::PrimaryKeyMismatch { name }
            | DriftSignal::ClusteringKeyMismatch { name }
            | DriftSignal::ClusteringOrderMismatch { name } => Some(name),
            DriftSignal::Done => None,
        }
    }

    /// True for every signal that fails a comparison pass.
    pub fn is_mismatch(&self) -> bool {
        !matches!(self, DriftSignal::Exists { .. } | DriftSignal::Done)
    }
}

impl fmt::Display for DriftSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftSignal::Exists { name } => write!(f, "`{name}` exists"),
            DriftSignal::MembersMismatch { name } => write!(f, "`{name}`: mismatched member set"),
            DriftSignal::TypeMismatch {
                name,
                member,
                live,
                declared,
            } => write!(
                f,
                "`{name}`: mismatched `{member}` type, live \"{live}\", declared \"{declared}\""
            ),
            DriftSignal::PrimaryKeyMismatch { name } => write!(f, "`{name}`: mismatched primary key"),
            DriftSignal::ClusteringKeyMismatch { name } => {
                write!(f, "`{name}`: mismatched clustering key")
            }
            DriftSignal::ClusteringOrderMismatch { name } => {
                write!(f, "`{name}`: mismatched clustering order")
            }
            DriftSignal::Done => f.write_str("comparison complete"),
        }
    }
}

/// Compares one declared entity against one live snapshot, yielding its
/// ordered signals: `Exists`, then at most one signal per drift axis
/// (member set, member types, primary key, clustering key, clustering
/// order). Key comparisons apply to the table variant only; clustering
/// order is only compared once the clustering keys themselves match.
pub fn compare_entity(name: &str, def: &SchemaDef, live: &LiveMetadata) -> Vec<DriftSignal> {
    let mut signals = vec![DriftSignal::Exists { name: name.to_owned() }];

    if !same_member_set(def, live) {
        signals.push(DriftSignal::MembersMismatch { name: name.to_owned() });
    }

    for (member, member_type) in def.members() {
        if !live.member_exists(member) {
            continue;
        }
        let declared = member_type.declared();
        if let Some(live_type) = live.member_type_name(member) {
            if &live_type != declared {
                signals.push(DriftSignal::TypeMismatch {
                    name: name.to_owned(),
                    member: member.to_owned(),
                    live: live_type.as_str().to_owned(),
                    declared: declared.as_str().to_owned(),
                });
            }
        }
    }

    if matches!(live, LiveMetadata::Table(_)) {
        if !same_key_set(def.primary_key(), live.partition_keys()) {
            signals.push(DriftSignal::PrimaryKeyMismatch { name: name.to_owned() });
        }

        if !same_key_set(def.clustering_key(), live.clustering_keys()) {
            signals.push(DriftSignal::ClusteringKeyMismatch { name: name.to_owned() });
        } else if !same_clustering_order(def, live) {
            signals.push(DriftSignal::ClusteringOrderMismatch { name: name.to_owned() });
        }
    }

    signals
}

fn same_member_set(def: &SchemaDef, live: &LiveMetadata) -> bool {
    def.member_count() == live.member_count() && def.member_names().all(|m| live.member_exists(m))
}

/// Unordered, case-insensitive set comparison of equal cardinality.
fn same_key_set(declared: &[String], live: &[String]) -> bool {
    declared.len() == live.len()
        && declared
            .iter()
            .all(|d| live.iter().any(|l| l.eq_ignore_ascii_case(d)))
}

fn same_clustering_order(def: &SchemaDef, live: &LiveMetadata) -> bool {
    live.clustering_keys().iter().enumerate().all(|(i, member)| {
        let live_order = live.clustering_order().get(i).copied();
        live_order.is_none_or(|order| order == def.clustering_order_of(member))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{SchemaDef, SortOrder};
    use crate::metadata::{ColumnType, LiveMetadata, TableMetadata, UdtField, UdtMetadata};

    fn table_metadata(columns: &[(&str, ColumnType)]) -> TableMetadata {
        TableMetadata {
            name: "testTable".into(),
            columns: columns
                .iter()
                .map(|(n, t)| ((*n).to_owned(), t.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn matching_table_emits_only_existence() {
        let def = SchemaDef::builder()
            .member("col1", "int")
            .primary_key(["col1"])
            .build();
        let mut live = table_metadata(&[("col1", ColumnType::primitive(9))]);
        live.partition_keys = vec!["col1".into()];

        let signals = compare_entity("testTable", &def, &LiveMetadata::Table(live));

        assert_eq!(signals, [DriftSignal::Exists { name: "testTable".into() }]);
    }

    #[test]
    fn diverging_member_type_emits_one_type_mismatch() {
        let def = SchemaDef::builder()
            .member("col1", "int")
            .member("col2", "int")
            .primary_key(["col1"])
            .build();
        let mut live = table_metadata(&[
            ("col1", ColumnType::primitive(9)),
            ("col2", ColumnType::primitive(10)),
        ]);
        live.partition_keys = vec!["col1".into()];

        let signals = compare_entity("testTable", &def, &LiveMetadata::Table(live));

        assert_eq!(
            signals,
            [
                DriftSignal::Exists { name: "testTable".into() },
                DriftSignal::TypeMismatch {
                    name: "testTable".into(),
                    member: "col2".into(),
                    live: "text".into(),
                    declared: "int".into(),
                },
            ]
        );
    }

    #[test]
    fn alias_and_whitespace_variants_are_not_drift() {
        let def = SchemaDef::builder()
            .member("col1", "varchar")
            .member("col2", " text ")
            .member("col3", "map<text, text>")
            .primary_key(["col1"])
            .build();
        let mut live = table_metadata(&[
            ("col1", ColumnType::primitive(10)),
            ("col2", ColumnType::primitive(13)),
            ("col3", ColumnType::collection(33, [13, 10])),
        ]);
        live.partition_keys = vec!["col1".into()];

        let signals = compare_entity("testTable", &def, &LiveMetadata::Table(live));

        assert_eq!(signals, [DriftSignal::Exists { name: "testTable".into() }]);
    }

    #[test]
    fn member_set_divergence_is_order_independent() {
        let def = SchemaDef::builder()
            .member("col3", "int")
            .member("col1", "int")
            .primary_key(["col1"])
            .build();
        let mut live = table_metadata(&[
            ("col1", ColumnType::primitive(9)),
            ("col2", ColumnType::primitive(10)),
        ]);
        live.partition_keys = vec!["col1".into()];

        let signals = compare_entity("testTable", &def, &LiveMetadata::Table(live));

        assert!(signals.contains(&DriftSignal::MembersMismatch { name: "testTable".into() }));
        assert!(!signals
            .iter()
            .any(|s| matches!(s, DriftSignal::TypeMismatch { .. })));
    }

    #[test]
    fn primary_key_compares_as_unordered_set() {
        let def = SchemaDef::builder()
            .member("a", "int")
            .member("b", "int")
            .primary_key(["b", "a"])
            .build();
        let mut live = table_metadata(&[
            ("a", ColumnType::primitive(9)),
            ("b", ColumnType::primitive(9)),
        ]);
        live.partition_keys = vec!["a".into(), "b".into()];

        let signals = compare_entity("t", &def, &LiveMetadata::Table(live.clone()));
        assert_eq!(signals, [DriftSignal::Exists { name: "t".into() }]);

        live.partition_keys = vec!["a".into()];
        let signals = compare_entity("t", &def, &LiveMetadata::Table(live));
        assert!(signals.contains(&DriftSignal::PrimaryKeyMismatch { name: "t".into() }));
    }

    #[test]
    fn clustering_order_is_checked_only_when_keys_match() {
        let def = SchemaDef::builder()
            .member("a", "int")
            .member("b", "int")
            .primary_key(["a"])
            .clustering_key(["b"])
            .order("b", SortOrder::Desc)
            .build();
        let mut live = table_metadata(&[
            ("a", ColumnType::primitive(9)),
            ("b", ColumnType::primitive(9)),
        ]);
        live.partition_keys = vec!["a".into()];
        live.clustering_keys = vec!["b".into()];
        live.clustering_order = vec![SortOrder::Asc];

        let signals = compare_entity("t", &def, &LiveMetadata::Table(live.clone()));
        assert!(signals.contains(&DriftSignal::ClusteringOrderMismatch { name: "t".into() }));
        assert!(!signals
            .iter()
            .any(|s| matches!(s, DriftSignal::ClusteringKeyMismatch { .. })));

        live.clustering_keys = vec!["c".into()];
        live.columns.insert("c".into(), ColumnType::primitive(9));
        let signals = compare_entity("t", &def, &LiveMetadata::Table(live));
        assert!(signals.contains(&DriftSignal::ClusteringKeyMismatch { name: "t".into() }));
        assert!(!signals
            .iter()
            .any(|s| matches!(s, DriftSignal::ClusteringOrderMismatch { .. })));
    }

    #[test]
    fn udt_fields_compare_without_key_axes() {
        let def = SchemaDef::builder()
            .member("field1", "int")
            .member("field2", "int")
            .build();
        let live = UdtMetadata {
            name: "test_udt".into(),
            fields: vec![
                UdtField { name: "field1".into(), ty: ColumnType::primitive(9) },
                UdtField { name: "field2".into(), ty: ColumnType::primitive(10) },
            ],
        };

        let signals = compare_entity("test_udt", &def, &LiveMetadata::Udt(live));

        assert_eq!(
            signals,
            [
                DriftSignal::Exists { name: "test_udt".into() },
                DriftSignal::TypeMismatch {
                    name: "test_udt".into(),
                    member: "field2".into(),
                    live: "text".into(),
                    declared: "int".into(),
                },
            ]
        );
    }

    #[test]
    fn frozen_custom_types_compare_against_declarations() {
        let def = SchemaDef::builder()
            .member("command", "text")
            .member("params", "frozen<parameters>")
            .primary_key(["command"])
            .build();
        let mut live = table_metadata(&[
            ("command", ColumnType::primitive(10)),
            ("params", ColumnType::custom("parameters").frozen()),
        ]);
        live.partition_keys = vec!["command".into()];

        let signals = compare_entity("commands", &def, &LiveMetadata::Table(live));
        assert_eq!(signals, [DriftSignal::Exists { name: "commands".into() }]);
    }
}
