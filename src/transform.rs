//! Transforms: cost-bearing adapters converting a stream of one item kind
//! into a stream of another, and the [`Consumer`] trait every pipeline node
//! (check, transform, or runner) implements.

use std::fmt;

use crate::item::{Item, ItemKind};
use crate::report::Report;
use crate::scope::Scope;

/// A metadata-extraction failure raised while feeding `item`.
///
/// Surfaced as an `Err` from [`Consumer::feed`] rather than a panic so the
/// nearest enclosing [`crate::runner::CheckRunner`] can deduplicate it per
/// `(item, error)` pair and reify it as a synthetic report.
#[derive(Debug, Clone)]
pub struct MetadataFailure {
    pub item: Item,
    pub attr: String,
    pub error: String,
}

pub type FeedResult = Result<Vec<Report>, MetadataFailure>;

/// A node in the consumer tree the planner assembles: something that accepts
/// items of one kind through `start`/`feed`/`finish` and yields reports.
pub trait Consumer: fmt::Debug {
    /// The kind of item this consumer accepts via [`Consumer::feed`].
    fn item_kind(&self) -> ItemKind;

    fn start(&mut self) -> FeedResult {
        Ok(Vec::new())
    }

    fn feed(&mut self, item: &Item) -> FeedResult;

    fn finish(&mut self) -> FeedResult {
        Ok(Vec::new())
    }
}

/// Converts a stream of `source_kind` items into a stream of `dest_kind`
/// items at a declared `cost`, valid for scans of `scope` or finer.
///
/// The actual per-item expansion (e.g. "enumerate the packages in this
/// category") is supplied by `expand`; concrete repository backends provide
/// it, since it requires backend access this crate does not specify.
#[derive(Clone, Copy)]
pub struct Transform {
    pub name: &'static str,
    pub source_kind: ItemKind,
    pub dest_kind: ItemKind,
    pub scope: Scope,
    pub cost: u32,
    pub expand: fn(&Item) -> Vec<Item>,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("source_kind", &self.source_kind)
            .field("dest_kind", &self.dest_kind)
            .field("scope", &self.scope)
            .field("cost", &self.cost)
            .finish()
    }
}

impl Transform {
    /// Wrap `child` (a consumer of `dest_kind` items) with this transform,
    /// producing a new consumer of `source_kind` items.
    pub fn wrap(&self, child: Box<dyn Consumer>) -> Box<dyn Consumer> {
        Box::new(TransformNode { transform: *self, child })
    }
}

#[derive(Debug)]
struct TransformNode {
    transform: Transform,
    child: Box<dyn Consumer>,
}

impl Consumer for TransformNode {
    fn item_kind(&self) -> ItemKind {
        self.transform.source_kind
    }

    fn start(&mut self) -> FeedResult {
        self.child.start()
    }

    fn feed(&mut self, item: &Item) -> FeedResult {
        let mut reports = Vec::new();
        for sub in (self.transform.expand)(item) {
            reports.extend(self.child.feed(&sub)?);
        }
        Ok(reports)
    }

    fn finish(&mut self) -> FeedResult {
        self.child.finish()
    }
}
