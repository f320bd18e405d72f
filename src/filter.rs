//! [`LatestPkgsFilter`]: reduces a per-package version stream to the latest
//! live and latest non-live version per slot.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::item::Item;

/// Slot and liveness metadata a backend supplies for a given version item;
/// the filter has no way to derive these from a bare [`Item`] itself.
#[derive(Debug, Clone)]
pub struct PkgAttrs {
    pub slot: String,
    pub live: bool,
}

/// An item yielded by [`LatestPkgsFilter`], flagged when it was not selected
/// as the latest for its `(key, slot)` group.
///
/// Replaces the proxy-object approach of wrapping a package to mark it
/// filtered: the flag travels alongside the item, and whatever feeds it to a
/// check is responsible for marking any resulting report with
/// [`crate::report::Report::set_filtered`].
#[derive(Debug, Clone)]
pub struct FilteredItem {
    pub item: Item,
    pub filtered: bool,
}

/// Wraps a versioned-package iterator, already sorted by `(category,
/// package, version)`, selecting the latest live and latest non-live version
/// per slot within each `(category, package)` group.
///
/// In `partial` mode every item in a group is still emitted, with
/// non-selected ones flagged; in full mode (all of a check's `known_results`
/// are filterable) non-selected items are dropped entirely.
pub struct LatestPkgsFilter<I, F> {
    inner: std::iter::Peekable<I>,
    attrs_of: F,
    partial: bool,
    queue: VecDeque<FilteredItem>,
}

impl<I, F> LatestPkgsFilter<I, F>
where
    I: Iterator<Item = Item>,
    F: Fn(&Item) -> PkgAttrs,
{
    pub fn new(inner: I, partial: bool, attrs_of: F) -> Self {
        Self { inner: inner.peekable(), attrs_of, partial, queue: VecDeque::new() }
    }

    fn fill_queue(&mut self) {
        let mut group = Vec::new();
        let key = match self.inner.peek() {
            Some(item) => item.cpn(),
            None => return,
        };
        while let Some(next_key) = self.inner.peek().and_then(Item::cpn) {
            if Some(&next_key) != key.as_ref() {
                break;
            }
            group.push(self.inner.next().expect("peeked"));
        }

        // selected[slot-or-vcs-slot] = index into `group` of its latest version
        let mut selected: IndexMap<String, usize> = IndexMap::new();
        for (i, item) in group.iter().enumerate() {
            let attrs = (self.attrs_of)(item);
            let slot_key = if attrs.live { format!("vcs-{}", attrs.slot) } else { attrs.slot };
            // `group` arrives in ascending version order, so the last entry
            // seen per slot key is always the latest.
            selected.insert(slot_key, i);
        }
        let selected_indices: std::collections::HashSet<usize> =
            selected.values().copied().collect();

        for (i, item) in group.into_iter().enumerate() {
            let is_selected = selected_indices.contains(&i);
            if is_selected {
                self.queue.push_back(FilteredItem { item, filtered: false });
            } else if self.partial {
                self.queue.push_back(FilteredItem { item, filtered: true });
            }
        }
    }
}

impl<I, F> Iterator for LatestPkgsFilter<I, F>
where
    I: Iterator<Item = Item>,
    F: Fn(&Item) -> PkgAttrs,
{
    type Item = FilteredItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.queue.is_empty() {
            self.fill_queue();
        }
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use pkgcraft::dep::Cpv;

    use super::*;

    fn cpv(s: &str) -> Item {
        Item::Version(Cpv::try_new(s).unwrap())
    }

    fn attrs(slot: &str, live: bool) -> impl Fn(&Item) -> PkgAttrs + '_ {
        move |_item| PkgAttrs { slot: slot.to_string(), live }
    }

    #[test]
    fn full_mode_drops_non_latest() {
        let items = vec![cpv("cat/pkg-1"), cpv("cat/pkg-2"), cpv("cat/pkg-3")];
        let filter = LatestPkgsFilter::new(items.into_iter(), false, attrs("0", false));
        let out: Vec<_> = filter.collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item, cpv("cat/pkg-3"));
        assert!(!out[0].filtered);
    }

    #[test]
    fn partial_mode_flags_non_latest() {
        let items = vec![cpv("cat/pkg-1"), cpv("cat/pkg-2"), cpv("cat/pkg-3")];
        let filter = LatestPkgsFilter::new(items.into_iter(), true, attrs("0", false));
        let out: Vec<_> = filter.collect();
        assert_eq!(out.len(), 3);
        assert!(out[0].filtered);
        assert!(out[1].filtered);
        assert!(!out[2].filtered);
    }

    #[test]
    fn live_and_non_live_slots_selected_independently() {
        let items = vec![cpv("cat/pkg-1"), cpv("cat/pkg-9999")];
        let live_slot = |item: &Item| {
            let live = matches!(item, Item::Version(cpv) if cpv.version().to_string() == "9999");
            PkgAttrs { slot: "0".to_string(), live }
        };
        let filter = LatestPkgsFilter::new(items.into_iter(), true, live_slot);
        let out: Vec<_> = filter.collect();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| !i.filtered));
    }

    #[test]
    fn groups_are_isolated_per_package() {
        let items = vec![cpv("cat/a-1"), cpv("cat/a-2"), cpv("cat/b-1")];
        let filter = LatestPkgsFilter::new(items.into_iter(), false, attrs("0", false));
        let out: Vec<_> = filter.collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item, cpv("cat/a-2"));
        assert_eq!(out[1].item, cpv("cat/b-1"));
    }
}
