//! Typed stream elements and their canonical ordering.
//!
//! Every [`Source`](crate::source::Source) emits a stream of [`Item`]s of one
//! declared [`ItemKind`]. Items compare by their `(category, package,
//! version)` prefix regardless of kind, so streams of different kinds can be
//! merged by [`crate::interleave::InterleavedSources`] into a single globally
//! sorted stream.

use std::cmp::Ordering;

use pkgcraft::dep::{Cpn, Cpv, Version};
use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

use crate::scope::{cmp_commit_opt, cmp_opt};

/// The shape of a stream element a [`Source`](crate::source::Source) emits or
/// a [`Check`](crate::check::Check) consumes.
#[derive(
    AsRefStr, Display, EnumIter, EnumString, VariantNames, Debug, Copy, Clone, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ItemKind {
    Commit,
    Repo,
    Category,
    Pkg,
    Version,
    EbuildText,
}

/// A single stream element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    /// A single commit, identified by its hash. Only ever produced by a
    /// dedicated commit-log source and fed through
    /// [`crate::pipeline::GitPipeline`], which never interleaves commits
    /// with other item kinds.
    Commit(String),
    /// The repository as a whole, used by checks that examine repo-wide metadata.
    Repo,
    /// A single category name.
    Category(String),
    /// An unversioned `category/package` identity.
    Pkg(Cpn<String>),
    /// A versioned `category/package-version` package.
    Version(Cpv<String>),
    /// A versioned package along with its raw ebuild source text.
    EbuildText(Cpv<String>, String),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Commit(_) => ItemKind::Commit,
            Self::Repo => ItemKind::Repo,
            Self::Category(_) => ItemKind::Category,
            Self::Pkg(_) => ItemKind::Pkg,
            Self::Version(_) => ItemKind::Version,
            Self::EbuildText(..) => ItemKind::EbuildText,
        }
    }

    fn commit(&self) -> Option<&str> {
        match self {
            Self::Commit(id) => Some(id),
            _ => None,
        }
    }

    fn category(&self) -> Option<&str> {
        match self {
            Self::Commit(_) | Self::Repo => None,
            Self::Category(c) => Some(c),
            Self::Pkg(cpn) => Some(cpn.category()),
            Self::Version(cpv) | Self::EbuildText(cpv, _) => Some(cpv.category()),
        }
    }

    fn package(&self) -> Option<&str> {
        match self {
            Self::Commit(_) | Self::Repo | Self::Category(_) => None,
            Self::Pkg(cpn) => Some(cpn.package()),
            Self::Version(cpv) | Self::EbuildText(cpv, _) => Some(cpv.package()),
        }
    }

    fn version(&self) -> Option<&Version<String>> {
        match self {
            Self::Version(cpv) | Self::EbuildText(cpv, _) => Some(cpv.version()),
            _ => None,
        }
    }

    /// The `category/package` identity of this item, if it has one.
    pub fn cpn(&self) -> Option<Cpn<String>> {
        match self {
            Self::Pkg(cpn) => Some(cpn.clone()),
            Self::Version(cpv) | Self::EbuildText(cpv, _) => Some(cpv.cpn().clone()),
            _ => None,
        }
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_commit_opt(self.commit(), other.commit())
            .then_with(|| cmp_opt(self.category(), other.category()))
            .then_with(|| cmp_opt(self.package(), other.package()))
            .then_with(|| cmp_opt(self.version(), other.version()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpv(s: &str) -> Cpv<String> {
        Cpv::try_new(s).unwrap()
    }

    #[test]
    fn ordering_by_category_then_package_then_version() {
        let a = Item::Version(cpv("cat/pkg-1"));
        let b = Item::Version(cpv("cat/pkg-2"));
        let c = Item::Version(cpv("cat/other-1"));
        assert!(a < b);
        assert!(c < a);
    }

    #[test]
    fn commit_sorts_before_repo() {
        assert!(Item::Commit("abc123".to_string()) < Item::Repo);
    }

    #[test]
    fn commit_sorts_before_everything_else() {
        assert!(Item::Commit("abc123".to_string()) < Item::Version(cpv("cat/pkg-1")));
    }

    #[test]
    fn repo_sorts_before_any_category() {
        assert!(Item::Repo < Item::Category("cat".to_string()));
    }

    #[test]
    fn category_sorts_before_its_packages() {
        let cat = Item::Category("cat".to_string());
        let pkg = Item::Pkg(Cpn::try_new("cat/pkg").unwrap());
        assert!(cat < pkg);
    }
}
