//! [`CheckRunner`]: the dispatch/aggregation node the planner assembles at
//! every level of the consumer tree.

use std::collections::HashSet;

use crate::item::{Item, ItemKind};
use crate::report::ReportKind;
use crate::transform::{Consumer, FeedResult};

/// Drives a set of sibling consumers that all accept the same [`ItemKind`],
/// concatenating their results and deduplicating metadata-extraction
/// failures raised by any one of them.
#[derive(Debug)]
pub struct CheckRunner {
    kind: ItemKind,
    children: Vec<Box<dyn Consumer>>,
    seen_failures: HashSet<(Item, String)>,
}

impl CheckRunner {
    pub fn new(kind: ItemKind, children: Vec<Box<dyn Consumer>>) -> Self {
        debug_assert!(
            children.iter().all(|c| c.item_kind() == kind),
            "all children of a CheckRunner must share its item kind",
        );
        Self { kind, children, seen_failures: HashSet::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn run_children<F>(&mut self, mut call: F) -> FeedResult
    where
        F: FnMut(&mut Box<dyn Consumer>) -> FeedResult,
    {
        let mut reports = Vec::new();
        for child in &mut self.children {
            match call(child) {
                Ok(r) => reports.extend(r),
                Err(failure) => {
                    let key = (failure.item.clone(), failure.error.clone());
                    if self.seen_failures.insert(key) {
                        if let Item::Version(cpv) = &failure.item {
                            reports.push(ReportKind::MetadataError.version(
                                cpv.clone(),
                                format!("{}: {}", failure.attr, failure.error),
                            ));
                        }
                    }
                }
            }
        }
        Ok(reports)
    }
}

impl Consumer for CheckRunner {
    fn item_kind(&self) -> ItemKind {
        self.kind
    }

    fn start(&mut self) -> FeedResult {
        self.run_children(|c| c.start())
    }

    fn feed(&mut self, item: &Item) -> FeedResult {
        self.run_children(|c| c.feed(item))
    }

    fn finish(&mut self) -> FeedResult {
        self.run_children(|c| c.finish())
    }
}

#[cfg(test)]
mod tests {
    use pkgcraft::dep::Cpv;

    use super::*;
    use crate::check::test_checks::version_check;
    use crate::report::ReportKind;

    #[test]
    fn concatenates_children_in_order() {
        let a = version_check("a", "src", &[ReportKind::VersionMetadata], |item| {
            match item {
                Item::Version(cpv) => {
                    Ok(vec![ReportKind::VersionMetadata.version(cpv.clone(), "a")])
                }
                _ => Ok(vec![]),
            }
        });
        let b = version_check("b", "src", &[ReportKind::VersionMetadata], |item| {
            match item {
                Item::Version(cpv) => {
                    Ok(vec![ReportKind::VersionMetadata.version(cpv.clone(), "b")])
                }
                _ => Ok(vec![]),
            }
        });
        let mut runner = CheckRunner::new(ItemKind::Version, vec![Box::new(a), Box::new(b)]);
        let item = Item::Version(Cpv::try_new("cat/pkg-1").unwrap());
        let reports = runner.feed(&item).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].message(), "a");
        assert_eq!(reports[1].message(), "b");
    }

    #[test]
    fn dedups_repeated_metadata_failures_on_same_item() {
        let flaky = version_check("flaky", "src", &[], |item| {
            Err(crate::check::metadata_failure(item, "eapi", "broken"))
        });
        let mut runner = CheckRunner::new(ItemKind::Version, vec![Box::new(flaky)]);
        let item = Item::Version(Cpv::try_new("cat/pkg-1").unwrap());
        let first = runner.feed(&item).unwrap();
        let second = runner.feed(&item).unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }
}
