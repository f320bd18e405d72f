//! Data sources: descriptors the planner reasons about, and the trait
//! concrete repository backends implement to supply items.
//!
//! Restriction-filtered repository traversal (the ebuild tree, a git log,
//! etc.) is supplied by external collaborators; this module only specifies
//! the contract those backends fulfill and the declared cost/scope metadata
//! the planner needs.

use std::fmt;

use crate::item::{Item, ItemKind};
use crate::scope::Scope;

/// A lazy, ordered producer of [`Item`]s of one declared [`ItemKind`].
///
/// Implementations must yield items in the canonical order defined by
/// [`Item`]'s [`Ord`] -- the planner and interleaver both depend on that
/// invariant holding for every source.
pub trait Source: fmt::Debug {
    /// The kind of item this source emits.
    fn kind(&self) -> ItemKind;

    /// The minimum scope at which this source is meaningful.
    ///
    /// A source declaring [`Scope::Category`], for example, is unusable for a
    /// scan restricted to a single package: the planner filters it out via
    /// [`Scope::in_scope_of`].
    fn scope(&self) -> Scope;

    /// Relative traversal cost, used by the planner to prefer cheaper pipelines.
    fn cost(&self) -> u32;

    /// Produce a fresh, ordered iterator over this source's items.
    fn iter(&self) -> Box<dyn Iterator<Item = Item> + '_>;
}

/// Opaque identifier grouping sinks that should share a source: sinks
/// registered under the same tag are driven by the same pipeline.
pub type SourceTag = &'static str;

#[cfg(any(test, feature = "test"))]
pub(crate) mod memory {
    use super::*;

    /// An in-memory [`Source`] backed by a fixed, pre-sorted [`Vec`].
    ///
    /// Used to exercise the planner and runtime without a real repository
    /// backend; production backends implement [`Source`] directly against
    /// the ebuild tree or a git log.
    #[derive(Debug, Clone)]
    pub struct VecSource {
        kind: ItemKind,
        scope: Scope,
        cost: u32,
        items: Vec<Item>,
    }

    impl VecSource {
        pub fn new(kind: ItemKind, scope: Scope, cost: u32, items: Vec<Item>) -> Self {
            let mut items = items;
            items.sort();
            Self { kind, scope, cost, items }
        }
    }

    impl Source for VecSource {
        fn kind(&self) -> ItemKind {
            self.kind
        }

        fn scope(&self) -> Scope {
            self.scope
        }

        fn cost(&self) -> u32 {
            self.cost
        }

        fn iter(&self) -> Box<dyn Iterator<Item = Item> + '_> {
            Box::new(self.items.iter().cloned())
        }
    }
}

#[cfg(any(test, feature = "test"))]
pub use memory::VecSource;
