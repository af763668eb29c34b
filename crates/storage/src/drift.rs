//! Drift detection over a whole schema group.
//!
//! One pass fetches the live metadata of every declared entity
//! concurrently (no entity blocks another, no per-fetch timeout — that is
//! the driver's business) and compares each snapshot as it arrives. The
//! pass ends with a fan-in join over every outstanding fetch, after which
//! a single [`DriftSignal::Done`] is emitted.

use std::sync::Arc;

use castellan_schema::{compare_entity, DriftSignal, LiveMetadata, SchemaDef};
use futures::future::join_all;
use indexmap::IndexMap;
use tokio::sync::mpsc;

use crate::client::{StoreClient, StoreError};

/// Raised by [`Storage::verify_schemas`](crate::Storage::verify_schemas)
/// after a full comparison pass. Individual signals are logged before
/// this aggregate; the error carries only a human-readable summary.
#[derive(thiserror::Error, Debug)]
pub enum DriftError {
    #[error(transparent)]
    Fetch(#[from] StoreError),

    #[error(
        "table schemas diverge from the live keyspace ({mismatches} mismatch signal(s)); \
         check the declared table schemas against the store"
    )]
    TableSchemaMismatch { mismatches: usize },

    #[error(
        "custom type schemas diverge from the live keyspace ({mismatches} mismatch signal(s)); \
         check the declared type schemas against the store"
    )]
    UdtSchemaMismatch { mismatches: usize },
}

#[derive(Clone, Copy, Debug)]
enum EntityKind {
    Table,
    Udt,
}

/// Compares declared schema groups against the live keyspace.
pub struct DriftDetector {
    client: Arc<dyn StoreClient>,
    keyspace: String,
}

impl DriftDetector {
    pub fn new(client: Arc<dyn StoreClient>, keyspace: impl Into<String>) -> Self {
        DriftDetector {
            client,
            keyspace: keyspace.into(),
        }
    }

    /// Compares every declared table, returning the complete signal list
    /// for the group, closed by [`DriftSignal::Done`]. Absent entities
    /// contribute no signals. A fetch failure fails the whole pass.
    pub async fn compare_tables(
        &self,
        group: &IndexMap<String, SchemaDef>,
    ) -> Result<Vec<DriftSignal>, StoreError> {
        self.compare_group(EntityKind::Table, group).await
    }

    /// Compares every declared user-defined type; same contract as
    /// [`compare_tables`](Self::compare_tables).
    pub async fn compare_udts(
        &self,
        group: &IndexMap<String, SchemaDef>,
    ) -> Result<Vec<DriftSignal>, StoreError> {
        self.compare_group(EntityKind::Udt, group).await
    }

    /// Streaming variant of [`compare_tables`](Self::compare_tables):
    /// signals for different entities interleave as their fetches
    /// resolve, and `Done` arrives once every fetch has settled. A fetch
    /// failure is logged and the entity skipped, as if absent.
    pub fn stream_tables(&self, group: &IndexMap<String, SchemaDef>) -> mpsc::Receiver<DriftSignal> {
        self.stream_group(EntityKind::Table, group)
    }

    /// Streaming variant of [`compare_udts`](Self::compare_udts).
    pub fn stream_udts(&self, group: &IndexMap<String, SchemaDef>) -> mpsc::Receiver<DriftSignal> {
        self.stream_group(EntityKind::Udt, group)
    }

    async fn fetch(&self, kind: EntityKind, name: &str) -> Result<Option<LiveMetadata>, StoreError> {
        match kind {
            EntityKind::Table => Ok(self
                .client
                .table_metadata(&self.keyspace, name)
                .await?
                .map(LiveMetadata::Table)),
            EntityKind::Udt => Ok(self
                .client
                .udt_metadata(&self.keyspace, name)
                .await?
                .map(LiveMetadata::Udt)),
        }
    }

    async fn compare_group(
        &self,
        kind: EntityKind,
        group: &IndexMap<String, SchemaDef>,
    ) -> Result<Vec<DriftSignal>, StoreError> {
        let fetches = group.iter().map(|(name, def)| async move {
            let live = self.fetch(kind, name).await?;
            Ok::<_, StoreError>(match live {
                Some(live) => compare_entity(name, def, &live),
                None => Vec::new(),
            })
        });

        let mut signals = Vec::new();
        for result in join_all(fetches).await {
            signals.extend(result?);
        }
        signals.push(DriftSignal::Done);
        Ok(signals)
    }

    fn stream_group(
        &self,
        kind: EntityKind,
        group: &IndexMap<String, SchemaDef>,
    ) -> mpsc::Receiver<DriftSignal> {
        let (tx, rx) = mpsc::channel(64);
        let detector = DriftDetector {
            client: Arc::clone(&self.client),
            keyspace: self.keyspace.clone(),
        };
        let group: Vec<(String, SchemaDef)> =
            group.iter().map(|(n, d)| (n.clone(), d.clone())).collect();

        tokio::spawn(async move {
            let fetches = group.iter().map(|(name, def)| {
                let tx = tx.clone();
                let detector = &detector;
                async move {
                    match detector.fetch(kind, name).await {
                        Ok(Some(live)) => {
                            for signal in compare_entity(name, def, &live) {
                                if tx.send(signal).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Ok(None) => {}
                        Err(err) => log::error!("metadata fetch for `{name}` failed: {err}"),
                    }
                }
            });
            join_all(fetches).await;
            let _ = tx.send(DriftSignal::Done).await;
        });

        rx
    }
}
