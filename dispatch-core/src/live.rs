use crate::geo::LatLon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sensor, helper, or victim position. Some upstream payloads carry a
/// stable id, some do not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl PointRecord {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Keyed merge of poll snapshots and push updates. A push overwrites the
/// entry under its key instead of appending a duplicate marker. Records
/// without an upstream id get a key synthesized from kind and exact
/// coordinates, which collapses re-deliveries of the same payload but
/// cannot track a moving entity (that needs stable ids upstream).
#[derive(Clone, Debug, Default)]
pub struct LiveSet {
    entries: BTreeMap<String, PointRecord>,
}

fn entry_key(record: &PointRecord) -> String {
    if let Some(id) = &record.id {
        return format!("id:{id}");
    }
    format!(
        "{}:{:x}:{:x}",
        record.kind.as_deref().unwrap_or("point"),
        record.lat.to_bits(),
        record.lon.to_bits()
    )
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set from a fresh poll snapshot. Last write wins per
    /// refresh; push entries that arrived before the snapshot are dropped
    /// with it.
    pub fn replace_snapshot(&mut self, records: Vec<PointRecord>) {
        self.entries = records
            .into_iter()
            .map(|r| (entry_key(&r), r))
            .collect();
    }

    pub fn apply_push(&mut self, record: PointRecord) {
        self.entries.insert(entry_key(&record), record);
    }

    pub fn records(&self) -> impl Iterator<Item = &PointRecord> {
        self.entries.values()
    }

    pub fn positions(&self) -> Vec<LatLon> {
        self.entries.values().map(PointRecord::position).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, lat: f64, lon: f64) -> PointRecord {
        PointRecord {
            id: id.map(ToString::to_string),
            kind: Some("sensor".into()),
            lat,
            lon,
        }
    }

    #[test]
    fn push_overwrites_polled_entry_with_same_id() {
        let mut set = LiveSet::new();
        set.replace_snapshot(vec![record(Some("s1"), 50.0, 9.0)]);

        set.apply_push(record(Some("s1"), 50.1, 9.1));

        assert_eq!(set.len(), 1);
        let only = set.records().next().expect("one record");
        assert_eq!(only.lat, 50.1);
    }

    #[test]
    fn identical_anonymous_payloads_collapse() {
        let mut set = LiveSet::new();
        set.apply_push(record(None, 50.0, 9.0));
        set.apply_push(record(None, 50.0, 9.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn distinct_anonymous_positions_are_kept() {
        let mut set = LiveSet::new();
        set.apply_push(record(None, 50.0, 9.0));
        set.apply_push(record(None, 50.0, 9.0001));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn snapshot_reset_drops_earlier_pushes() {
        let mut set = LiveSet::new();
        set.apply_push(record(Some("s1"), 50.1, 9.1));
        set.replace_snapshot(vec![record(Some("s2"), 50.0, 9.0)]);

        assert_eq!(set.len(), 1);
        let only = set.records().next().expect("one record");
        assert_eq!(only.id.as_deref(), Some("s2"));
    }
}
