/// Taxonomy Kernel: Inactive Bin
///
/// Audit records for inactivated nodes. Records are built from the
/// affected-node set that `inactivate_subtree` returns; the bin itself
/// never touches the forest.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Forest, InactiveItem, TaxonomyNode};
use crate::tree::find_node_by_id;

/// Days an inactive item is retained before it is eligible for purge.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Default retention window.
pub fn default_retention() -> Duration {
    Duration::days(DEFAULT_RETENTION_DAYS)
}

/// Build audit records for `affected`, resolving parent names against
/// `before`, the forest as it was prior to inactivation.
pub fn inactive_items_from(
    before: &Forest,
    affected: &[TaxonomyNode],
    actor: &str,
    at: DateTime<Utc>,
) -> Vec<InactiveItem> {
    affected
        .iter()
        .map(|node| InactiveItem {
            id: node.id.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            node_type: node.node_type,
            parent_name: node
                .parent_id
                .as_deref()
                .and_then(|pid| find_node_by_id(before, pid))
                .map(|p| p.name.clone()),
            inactivated_at: at,
            inactivated_by: actor.to_string(),
            usage: node.usage,
        })
        .collect()
}

/// Ordered collection of inactive items, one per node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InactiveBin {
    items: Vec<InactiveItem>,
}

impl InactiveBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<InactiveItem>) -> Self {
        let mut bin = Self::new();
        bin.record(items);
        bin
    }

    /// Add records. An id already in the bin keeps its original record.
    pub fn record(&mut self, items: Vec<InactiveItem>) -> usize {
        let mut added = 0;
        for item in items {
            if !self.contains(&item.id) {
                self.items.push(item);
                added += 1;
            }
        }
        added
    }

    /// Drop the records for `ids` (after a restore). Returns how many went.
    pub fn remove<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let ids: Vec<&str> = ids.into_iter().collect();
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id.as_str()));
        before - self.items.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&InactiveItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[InactiveItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose retention window has elapsed at `now`.
    pub fn expired(&self, now: DateTime<Utc>, retention: Duration) -> Vec<&InactiveItem> {
        self.items
            .iter()
            .filter(|item| is_due(item, now, retention))
            .collect()
    }

    /// Remove expired records from the bin and return them.
    pub fn purge_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> Vec<InactiveItem> {
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| is_due(item, now, retention));
        self.items = kept;
        expired
    }
}

/// When `item` becomes eligible for purge. `None` when the window runs
/// past the representable range; such an item never expires.
pub fn purge_due_at(item: &InactiveItem, retention: Duration) -> Option<DateTime<Utc>> {
    item.inactivated_at.checked_add_signed(retention)
}

fn is_due(item: &InactiveItem, now: DateTime<Utc>, retention: Duration) -> bool {
    purge_due_at(item, retention).is_some_and(|due| due <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeType, UsageCounters};
    use chrono::TimeZone;

    fn item(id: &str, at: DateTime<Utc>) -> InactiveItem {
        InactiveItem {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            node_type: NodeType::Skill,
            parent_name: None,
            inactivated_at: at,
            inactivated_by: "admin".to_string(),
            usage: UsageCounters::default(),
        }
    }

    #[test]
    fn record_keeps_first_entry_per_id() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let mut bin = InactiveBin::new();
        assert_eq!(bin.record(vec![item("S1", t0)]), 1);
        assert_eq!(bin.record(vec![item("S1", t1), item("S2", t1)]), 1);
        assert_eq!(bin.len(), 2);
        assert_eq!(bin.get("S1").unwrap().inactivated_at, t0);
    }

    #[test]
    fn expiry_follows_retention_window() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut bin = InactiveBin::from_items(vec![
            item("old", t0),
            item("new", t0 + Duration::days(20)),
        ]);

        let now = t0 + Duration::days(30);
        let expired: Vec<&str> = bin
            .expired(now, default_retention())
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(expired, vec!["old"]);

        let purged = bin.purge_expired(now, default_retention());
        assert_eq!(purged.len(), 1);
        assert_eq!(bin.len(), 1);
        assert!(bin.contains("new"));
    }

    #[test]
    fn overflowing_window_never_expires() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut bin = InactiveBin::from_items(vec![item("S1", t0)]);
        let huge = Duration::days(1_000_000_000);

        assert_eq!(purge_due_at(&bin.items()[0], huge), None);
        assert_eq!(purge_due_at(&bin.items()[0], default_retention()), Some(t0 + Duration::days(30)));
        assert!(bin.expired(t0 + Duration::days(365), huge).is_empty());
        assert!(bin.purge_expired(t0 + Duration::days(365), huge).is_empty());
        assert_eq!(bin.len(), 1);
    }

    #[test]
    fn remove_drops_restored_ids() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut bin = InactiveBin::from_items(vec![item("a", t0), item("b", t0)]);
        assert_eq!(bin.remove(["a", "zzz"]), 1);
        assert!(!bin.contains("a"));
        assert!(bin.contains("b"));
    }
}
