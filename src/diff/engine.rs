//! Divergence computation between a local and a remote snapshot.
//!
//! [`compute_divergence`] is pure: no I/O, no shared state, and the same pair
//! of snapshots always yields the same report. Both sides are flattened into
//! an insertion-ordered id index (first encounter fixes the position, the last
//! duplicate wins the value), so the output never depends on hash order.

use crate::diff::model::{DivergenceReport, Group, Item, Rename, Summary};
use std::collections::HashMap;

/// Items of one side keyed by id, in first-encounter order.
struct FlatIndex<'a> {
    order: Vec<&'a Item>,
    by_id: HashMap<&'a str, usize>,
}

impl<'a> FlatIndex<'a> {
    fn build(snapshot: &'a [Group]) -> Self {
        let capacity = snapshot.iter().map(Vec::len).sum();
        let mut order: Vec<&'a Item> = Vec::with_capacity(capacity);
        let mut by_id: HashMap<&'a str, usize> = HashMap::with_capacity(capacity);

        for item in snapshot.iter().flatten() {
            match by_id.get(item.id()) {
                Some(&slot) => order[slot] = item,
                None => {
                    by_id.insert(item.id(), order.len());
                    order.push(item);
                }
            }
        }

        Self { order, by_id }
    }

    fn get(&self, id: &str) -> Option<&'a Item> {
        self.by_id.get(id).map(|&slot| self.order[slot])
    }

    fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Compute the ordered divergence between `local` and `remote`.
///
/// Never fails; empty snapshots produce an empty report and a zero summary.
pub fn compute_divergence(local: &[Group], remote: &[Group]) -> (DivergenceReport, Summary) {
    let local_index = FlatIndex::build(local);
    let remote_index = FlatIndex::build(remote);

    let mut report = DivergenceReport {
        only_in_local: Vec::with_capacity(local_index.len()),
        only_in_remote: Vec::with_capacity(remote_index.len()),
        renamed: Vec::new(),
    };

    for local_item in &local_index.order {
        match remote_index.get(local_item.id()) {
            None => report.only_in_local.push((*local_item).clone()),
            Some(remote_item) if remote_item.title() != local_item.title() => {
                report.renamed.push(Rename {
                    id: local_item.id().to_owned(),
                    old_title: local_item.title().to_owned(),
                    new_title: remote_item.title().to_owned(),
                });
            }
            Some(_) => {}
        }
    }

    for remote_item in &remote_index.order {
        if !local_index.contains(remote_item.id()) {
            report.only_in_remote.push((*remote_item).clone());
        }
    }

    // `sort_by` is stable: equal keys keep encounter order.
    report.only_in_local.sort_by(|a, b| a.title().cmp(b.title()));
    report.only_in_remote.sort_by(|a, b| a.title().cmp(b.title()));
    report.renamed.sort_by(|a, b| a.new_title.cmp(&b.new_title));

    let summary = Summary::of(&report);
    (report, summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn item(id: &str, title: &str) -> Item {
        Item::new(title, id)
    }

    #[test]
    fn empty_snapshots_produce_zero_summary() {
        let (report, summary) = compute_divergence(&[], &[]);
        assert!(report.is_empty());
        assert_eq!(summary.total(), 0);
        assert!(!summary.has_changes());
    }

    #[test]
    fn title_change_is_reported_as_rename() {
        let local = vec![vec![item("A", "X")]];
        let remote = vec![vec![item("A", "Y")]];

        let (report, summary) = compute_divergence(&local, &remote);

        assert!(report.only_in_local().is_empty());
        assert!(report.only_in_remote().is_empty());
        assert_eq!(
            report.renamed(),
            &[Rename {
                id: "A".to_owned(),
                old_title: "X".to_owned(),
                new_title: "Y".to_owned(),
            }]
        );
        assert_eq!(
            (summary.total(), summary.added(), summary.removed(), summary.renamed()),
            (1, 0, 0, 1)
        );
    }

    #[test]
    fn new_remote_item_is_added() {
        let local = vec![vec![item("A", "X")]];
        let remote = vec![vec![item("A", "X"), item("B", "Z")]];

        let (report, summary) = compute_divergence(&local, &remote);

        assert_eq!(report.only_in_remote(), &[item("B", "Z")]);
        assert!(report.only_in_local().is_empty());
        assert!(report.renamed().is_empty());
        assert_eq!(
            (summary.total(), summary.added(), summary.removed(), summary.renamed()),
            (1, 1, 0, 0)
        );
    }

    #[test]
    fn duplicate_ids_resolve_last_write_wins() {
        // Local lists "A" twice; the second title is the one compared.
        let local = vec![vec![item("A", "old")], vec![item("A", "Y")]];
        let remote = vec![vec![item("A", "Y")]];

        let (report, summary) = compute_divergence(&local, &remote);

        assert!(report.is_empty());
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn ids_spread_across_groups_are_matched() {
        let local = vec![vec![item("A", "a")], vec![item("B", "b")]];
        let remote = vec![vec![item("B", "b"), item("A", "a")]];

        let (report, _) = compute_divergence(&local, &remote);
        assert!(report.is_empty());
    }

    #[test]
    fn equal_titles_keep_encounter_order() {
        let local = vec![vec![item("u2", "same"), item("u1", "same"), item("u0", "aaa")]];

        let (report, _) = compute_divergence(&local, &[]);

        let ids: Vec<&str> = report.only_in_local().iter().map(Item::id).collect();
        assert_eq!(ids, vec!["u0", "u2", "u1"]);
    }

    #[test]
    fn renamed_sorted_by_new_title() {
        let local = vec![vec![item("1", "z-old"), item("2", "a-old")]];
        let remote = vec![vec![item("1", "b-new"), item("2", "c-new")]];

        let (report, _) = compute_divergence(&local, &remote);

        let titles: Vec<&str> = report.renamed().iter().map(|r| r.new_title.as_str()).collect();
        assert_eq!(titles, vec!["b-new", "c-new"]);
    }
}
