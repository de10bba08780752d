//! Merge engine reconciling a base snapshot with incremental deltas.

use std::collections::HashMap;

use crate::models::{sort_newest_first, CatalogEntry, ProductId};

/// Combine `existing` with the fetched deltas.
///
/// Entries are keyed by id: `updated_entries` overwrite `existing`, then
/// `new_entries` overwrite both, so an id present in both delta lists ends up
/// with the "new" payload. Nothing is ever removed. The result is ordered
/// newest-first, which makes the merge idempotent.
pub fn merge(
    existing: &[CatalogEntry],
    new_entries: &[CatalogEntry],
    updated_entries: &[CatalogEntry],
) -> Vec<CatalogEntry> {
    let mut by_id: HashMap<ProductId, CatalogEntry> =
        HashMap::with_capacity(existing.len() + new_entries.len());

    for entry in existing.iter().chain(updated_entries).chain(new_entries) {
        by_id.insert(entry.id, entry.clone());
    }

    let mut merged = by_id.into_values().collect::<Vec<_>>();
    sort_newest_first(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::sample_entry;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn renamed(id: ProductId, created: i64, name: &str) -> CatalogEntry {
        let mut entry = sample_entry(id, t(created));
        entry.name = name.to_string();
        entry
    }

    fn existing() -> Vec<CatalogEntry> {
        vec![
            renamed(1, 0, "one"),
            renamed(2, 10, "two"),
            renamed(3, 20, "three"),
        ]
    }

    #[test]
    fn merge_is_idempotent() {
        let new_entries = vec![renamed(4, 30, "four")];
        let updated_entries = vec![renamed(2, 10, "two v2")];

        let once = merge(&existing(), &new_entries, &updated_entries);
        let twice = merge(&once, &new_entries, &updated_entries);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_keeps_every_id() {
        let new_entries = vec![renamed(4, 30, "four"), renamed(5, 40, "five")];
        let updated_entries = vec![renamed(3, 20, "three v2"), renamed(6, 5, "six")];

        let merged = merge(&existing(), &new_entries, &updated_entries);
        let ids = merged.iter().map(|e| e.id).collect::<HashSet<_>>();
        assert_eq!(ids, (1..=6).collect::<HashSet<_>>());
        assert_eq!(merged.len(), 6);
    }

    #[test]
    fn new_payload_wins_over_updated_payload() {
        let new_entries = vec![renamed(2, 10, "from new")];
        let updated_entries = vec![renamed(2, 10, "from updated")];

        let merged = merge(&existing(), &new_entries, &updated_entries);
        let two = merged.iter().find(|e| e.id == 2).unwrap();
        assert_eq!(two.name, "from new");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn updated_payload_replaces_existing() {
        let merged = merge(&existing(), &[], &[renamed(1, 0, "one v2")]);
        assert_eq!(merged.iter().find(|e| e.id == 1).unwrap().name, "one v2");
    }

    #[test]
    fn result_is_newest_first() {
        let merged = merge(&existing(), &[renamed(9, 15, "nine")], &[]);
        let ids = merged.iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 9, 2, 1]);
    }

    #[test]
    fn empty_deltas_leave_snapshot_unchanged() {
        let mut expected = existing();
        sort_newest_first(&mut expected);
        assert_eq!(merge(&existing(), &[], &[]), expected);
    }
}
