//! The result taxonomy: severity, threshold hierarchy, ordering, and the
//! JSON-line replay format used to persist a scan's output.

use std::cmp::Ordering;
use std::io::BufRead;

use pkgcraft::dep::{Cpn, Cpv};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

use crate::scope::{cmp_commit_opt, cmp_opt, Scope};
use crate::{Error, Result};

/// Severity bucket a [`ReportKind`] belongs to.
#[derive(
    AsRefStr, Display, EnumIter, EnumString, VariantNames, Debug, Copy, Clone, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// The subject a [`Report`] identifies: commit, category, package, or version.
///
/// This mirrors the `Scope` values below `Repo` -- a scan never emits a
/// repo-wide report, only reports scoped to something inside the repo.
pub type Threshold = Scope;

/// The closed set of result variants the engine can emit.
///
/// This is deliberately a small, illustrative set spanning every threshold in
/// the taxonomy rather than a full catalog of concrete lint rules -- the
/// individual checks that would populate a real catalog are supplied
/// externally (see the crate's module-level docs).
#[derive(
    AsRefStr, Display, EnumIter, EnumString, VariantNames, Debug, Copy, Clone, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ReportKind {
    /// A metadata-extraction failure surfaced by a [`crate::runner::CheckRunner`],
    /// deduplicated per `(item, error)` pair.
    MetadataError,
    /// Illustrative commit-threshold report.
    CommitSummary,
    /// Illustrative category-threshold report.
    CategoryMetadata,
    /// Illustrative package-threshold report.
    PackageMetadata,
    /// Illustrative version-threshold report that is never filtered.
    VersionMetadata,
    /// Illustrative version-threshold report eligible for latest-package filtering.
    UnstableOnly,
}

impl ReportKind {
    pub fn threshold(&self) -> Threshold {
        match self {
            Self::MetadataError => Threshold::Version,
            Self::CommitSummary => Threshold::Commit,
            Self::CategoryMetadata => Threshold::Category,
            Self::PackageMetadata => Threshold::Package,
            Self::VersionMetadata => Threshold::Version,
            Self::UnstableOnly => Threshold::Version,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MetadataError => Severity::Error,
            Self::CommitSummary => Severity::Info,
            Self::CategoryMetadata => Severity::Warning,
            Self::PackageMetadata => Severity::Warning,
            Self::VersionMetadata => Severity::Warning,
            Self::UnstableOnly => Severity::Warning,
        }
    }

    /// Whether this kind is a `FilteredVersionResult`: eligible to be
    /// suppressed by [`crate::filter::LatestPkgsFilter`] at low verbosity.
    pub fn filterable(&self) -> bool {
        matches!(self, Self::UnstableOnly)
    }

    pub fn commit<S: Into<String>>(&self, id: S, message: impl Into<String>) -> Report {
        Report {
            kind: *self,
            scope: ReportScope::Commit(id.into()),
            message: message.into(),
            filtered: false,
        }
    }

    pub fn category<S: Into<String>>(&self, category: S, message: impl Into<String>) -> Report {
        Report {
            kind: *self,
            scope: ReportScope::Category(category.into()),
            message: message.into(),
            filtered: false,
        }
    }

    pub fn package(&self, cpn: Cpn<String>, message: impl Into<String>) -> Report {
        Report {
            kind: *self,
            scope: ReportScope::Package(cpn),
            message: message.into(),
            filtered: false,
        }
    }

    pub fn version(&self, cpv: Cpv<String>, message: impl Into<String>) -> Report {
        Report {
            kind: *self,
            scope: ReportScope::Version(cpv),
            message: message.into(),
            filtered: false,
        }
    }
}

/// The subject of a [`Report`], carrying just enough identity to reconstruct
/// its threshold fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportScope {
    Commit(String),
    Category(String),
    Package(Cpn<String>),
    Version(Cpv<String>),
}

impl ReportScope {
    fn commit(&self) -> Option<&str> {
        match self {
            Self::Commit(id) => Some(id),
            _ => None,
        }
    }

    fn category(&self) -> Option<&str> {
        match self {
            Self::Commit(_) => None,
            Self::Category(c) => Some(c),
            Self::Package(cpn) => Some(cpn.category()),
            Self::Version(cpv) => Some(cpv.category()),
        }
    }

    fn package(&self) -> Option<&str> {
        match self {
            Self::Commit(_) | Self::Category(_) => None,
            Self::Package(cpn) => Some(cpn.package()),
            Self::Version(cpv) => Some(cpv.package()),
        }
    }

    fn version(&self) -> Option<&pkgcraft::dep::Version<String>> {
        match self {
            Self::Version(cpv) => Some(cpv.version()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit(id) => write!(f, "{id}"),
            Self::Category(c) => write!(f, "{c}"),
            Self::Package(cpn) => write!(f, "{cpn}"),
            Self::Version(cpv) => write!(f, "{cpv}"),
        }
    }
}

/// A single structured finding produced by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    kind: ReportKind,
    scope: ReportScope,
    message: String,
    /// Set when this report was produced against a version that
    /// [`crate::filter::LatestPkgsFilter`] did not select as latest; consumers
    /// at low verbosity suppress reports with this flag set.
    filtered: bool,
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn scope(&self) -> &ReportScope {
        &self.scope
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn filtered(&self) -> bool {
        self.filtered
    }

    /// Mark this report as produced against a non-latest version.
    pub fn set_filtered(&mut self) {
        self.filtered = true;
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("report serialization never fails")
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::InvalidValue(format!("invalid report: {e}")))
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.scope, self.kind, self.message)
    }
}

impl PartialOrd for Report {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Report {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_commit_opt(self.scope.commit(), other.scope.commit())
            .then_with(|| cmp_opt(self.scope.category(), other.scope.category()))
            .then_with(|| cmp_opt(self.scope.package(), other.scope.package()))
            .then_with(|| cmp_opt(self.scope.version(), other.scope.version()))
            .then_with(|| self.kind.as_ref().cmp(other.kind.as_ref()))
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Streams [`Report`]s back out of a JSON-lines replay file, skipping
/// malformed lines rather than aborting the whole stream.
pub struct Iter<R> {
    lines: std::io::Lines<R>,
    enabled: Option<Vec<ReportKind>>,
}

impl<R: BufRead> Iter<R> {
    pub fn new(reader: R, enabled: Option<Vec<ReportKind>>) -> Self {
        Self { lines: reader.lines(), enabled }
    }

    fn accept(&self, report: &Report) -> bool {
        self.enabled
            .as_ref()
            .map(|kinds| kinds.contains(&report.kind))
            .unwrap_or(true)
    }
}

impl Iter<std::io::BufReader<std::fs::File>> {
    pub fn try_from_file<P: AsRef<camino::Utf8Path>>(
        path: P,
        enabled: Option<Vec<ReportKind>>,
    ) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(Self::new(std::io::BufReader::new(file), enabled))
    }
}

impl<R: BufRead> Iterator for Iter<R> {
    type Item = Result<Report>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            return match Report::from_json(&line) {
                Ok(report) if self.accept(&report) => Some(Ok(report)),
                Ok(_) => continue,
                Err(e) => Some(Err(e)),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpv(s: &str) -> Cpv<String> {
        Cpv::try_new(s).unwrap()
    }

    fn cpn(s: &str) -> Cpn<String> {
        Cpn::try_new(s).unwrap()
    }

    #[test]
    fn json_round_trip() {
        let report = ReportKind::VersionMetadata.version(cpv("cat/pkg-1"), "test");
        let s = report.to_json();
        let parsed = Report::from_json(&s).unwrap();
        assert_eq!(report, parsed);
    }

    #[test]
    fn commit_sorts_before_category() {
        let commit = ReportKind::CommitSummary.commit("abc123", "m");
        let cat = ReportKind::CategoryMetadata.category("cat", "m");
        assert!(commit < cat);
    }

    #[test]
    fn ordering_category_before_package_before_version() {
        let cat = ReportKind::CategoryMetadata.category("cat", "m");
        let pkg = ReportKind::PackageMetadata.package(cpn("cat/pkg"), "m");
        let ver = ReportKind::VersionMetadata.version(cpv("cat/pkg-1"), "m");
        assert!(cat < pkg);
        assert!(pkg < ver);
    }

    #[test]
    fn filtered_flag_defaults_false() {
        let mut report = ReportKind::UnstableOnly.version(cpv("cat/pkg-1"), "m");
        assert!(!report.filtered());
        report.set_filtered();
        assert!(report.filtered());
    }

    #[test]
    fn iter_skips_malformed_lines() {
        let data = format!(
            "not json\n{}\n\n{}\n",
            ReportKind::VersionMetadata.version(cpv("cat/pkg-1"), "a").to_json(),
            ReportKind::VersionMetadata.version(cpv("cat/pkg-2"), "b").to_json(),
        );
        let reader = std::io::BufReader::new(data.as_bytes());
        let iter = Iter::new(reader, None);
        let results: Vec<_> = iter.collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
        assert!(results[2].is_ok());
    }

    #[test]
    fn iter_filters_by_enabled_kinds() {
        let data = format!(
            "{}\n{}\n",
            ReportKind::VersionMetadata.version(cpv("cat/pkg-1"), "a").to_json(),
            ReportKind::UnstableOnly.version(cpv("cat/pkg-2"), "b").to_json(),
        );
        let reader = std::io::BufReader::new(data.as_bytes());
        let iter = Iter::new(reader, Some(vec![ReportKind::UnstableOnly]));
        let results: Vec<_> = iter.map(|r| r.unwrap()).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), ReportKind::UnstableOnly);
    }
}
