//! Shared types used across telemagg crates.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a single upstream entity (a switch, a host, ...).
pub type EntityId = String;

/// Name of a metric column.
pub type MetricName = String;

/// A metric value exactly as it appeared in the upstream payload.
pub type MetricValue = String;

/// All metrics reported for one entity, keyed by column name.
pub type EntityMetrics = BTreeMap<MetricName, MetricValue>;

/// Shared handle to a published snapshot.
pub type SnapshotRef = Arc<Snapshot>;

/// Immutable point-in-time view of every entity's metrics.
///
/// A snapshot is built once by the parser and never mutated afterwards;
/// successors replace it wholesale. Serializes as a plain nested JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entities: BTreeMap<EntityId, EntityMetrics>,
}

impl Snapshot {
    pub fn new(entities: BTreeMap<EntityId, EntityMetrics>) -> Self {
        Self { entities }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: &str) -> Option<&EntityMetrics> {
        self.entities.get(id)
    }

    pub fn metric(&self, id: &str, metric: &str) -> Option<&MetricValue> {
        self.entities.get(id).and_then(|m| m.get(metric))
    }

    /// Metric names reported for an entity, in sorted order.
    pub fn metric_names(&self, id: &str) -> Option<Vec<MetricName>> {
        self.entities.get(id).map(|m| m.keys().cloned().collect())
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, EntityMetrics> {
        &self.entities
    }
}

impl FromIterator<(EntityId, EntityMetrics)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityMetrics)>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

/// Classification of an ingestion failure.
///
/// Only [`ErrorKind::Network`] is worth retrying within a cycle; a malformed
/// payload stays malformed until the upstream produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connect failure, timeout, or non-2xx status.
    Network,
    /// Header is missing the identifier column.
    Schema,
    /// A data row has the wrong number of fields.
    RowShape,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Network)
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Schema => "schema",
            ErrorKind::RowShape => "row_shape",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, &str)]) -> EntityMetrics {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn snapshot_serializes_as_nested_object() {
        let snapshot: Snapshot = [
            ("A".to_string(), metrics(&[("bw", "1.0"), ("lat", "2.0")])),
            ("B".to_string(), metrics(&[("bw", "3.0"), ("lat", "4.0")])),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"A":{"bw":"1.0","lat":"2.0"},"B":{"bw":"3.0","lat":"4.0"}}"#
        );
    }

    #[test]
    fn snapshot_lookups() {
        let snapshot: Snapshot = [("SW-01".to_string(), metrics(&[("lat", "2"), ("bw", "1")]))]
            .into_iter()
            .collect();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.metric("SW-01", "bw").map(String::as_str), Some("1"));
        assert!(snapshot.metric("SW-01", "missing").is_none());
        assert!(snapshot.entity("SW-02").is_none());
        assert_eq!(
            snapshot.metric_names("SW-01"),
            Some(vec!["bw".to_string(), "lat".to_string()])
        );
    }

    #[test]
    fn only_network_errors_retry() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(!ErrorKind::Schema.is_retryable());
        assert!(!ErrorKind::RowShape.is_retryable());
        assert_eq!(ErrorKind::RowShape.to_string(), "row_shape");
    }
}
