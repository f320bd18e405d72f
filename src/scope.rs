use std::cmp::Ordering;

use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

/// Repository granularity at which a source, transform, or check operates.
///
/// Variants are declared coarsest-first so the derived [`Ord`] implementation
/// matches the scan scope's natural total order: `Commit < Repo < Category <
/// Package < Version`.
#[derive(
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Scope {
    Commit,
    #[default]
    Repo,
    Category,
    Package,
    Version,
}

impl Scope {
    /// Return true if `self` is coarse enough to be meaningful within `scan_scope`.
    ///
    /// A source, transform, or check is "in scope" for a given scan iff its
    /// declared scope is no finer than the scan's scope.
    pub fn in_scope_of(&self, scan_scope: Scope) -> bool {
        *self <= scan_scope
    }
}

/// Ordering key shared by item kinds and report thresholds: category, then
/// package, then version, using [`pkgcraft`]'s ebuild version comparison.
///
/// `None` sorts before `Some`: an absent field means the item/report sits at
/// a coarser level than anything that has it (e.g. a bare category has no
/// package, so it sorts before any package in that category).
pub(crate) fn cmp_opt<T: ?Sized + Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Like [`cmp_opt`], but for the commit field specifically: commit is the
/// *coarsest* kind in the total order (`commit < repo < category < ...`), so
/// a present commit id must sort before an absent one -- the opposite of
/// every other optional field in the chain.
pub(crate) fn cmp_commit_opt(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Scope::Commit < Scope::Repo);
        assert!(Scope::Repo < Scope::Category);
        assert!(Scope::Category < Scope::Package);
        assert!(Scope::Package < Scope::Version);
    }

    #[test]
    fn in_scope_of() {
        assert!(Scope::Category.in_scope_of(Scope::Version));
        assert!(Scope::Version.in_scope_of(Scope::Version));
        assert!(!Scope::Version.in_scope_of(Scope::Category));
    }
}
