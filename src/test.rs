//! Test-support helpers exported for downstream crates that build a CLI or
//! service on top of this one, gated behind the `test` feature so the
//! `assert_cmd`/`glob` dependencies never reach a non-test build.

use assert_cmd::Command;
use glob::glob;

use crate::report::{Iter, Report};

/// Collects a [`Command`]'s stdout as parsed reports, or its stderr as an
/// error string if the command did not exit successfully.
pub trait ToReports {
    fn to_reports(&mut self) -> Result<Vec<Report>, String>;
}

impl ToReports for Command {
    fn to_reports(&mut self) -> Result<Vec<Report>, String> {
        let output = self.output().map_err(|e| e.to_string())?;
        if output.status.success() {
            let data = String::from_utf8(output.stdout).map_err(|e| e.to_string())?;
            data.lines()
                .map(|line| Report::from_json(line).map_err(|e| e.to_string()))
                .collect()
        } else {
            let err = String::from_utf8_lossy(&output.stderr).into_owned();
            Err(format!("command failed: {err}"))
        }
    }
}

/// An iterator of reports read from every JSON-lines replay file matching a
/// glob pattern, in glob match order.
pub fn glob_reports_iter<P: AsRef<str>>(
    pattern: P,
) -> impl Iterator<Item = crate::Result<Report>> {
    glob(pattern.as_ref()).expect("invalid glob pattern").flat_map(|path| {
        let path = path.expect("unreadable glob entry");
        let path = camino::Utf8PathBuf::from_path_buf(path).expect("non-utf8 path");
        Iter::try_from_file(path, None).expect("unreadable replay file")
    })
}

/// Collects every report matching one or more glob patterns into a `Vec`,
/// asserting the result is non-empty so a typo'd pattern fails loudly.
#[macro_export]
macro_rules! glob_reports {
    ($($pattern:expr,)+) => {{
        let mut reports = vec![];
        $(
            let found = $crate::test::glob_reports_iter(format!($pattern))
                .collect::<$crate::Result<Vec<_>>>()
                .unwrap();
            reports.extend(found);
        )+
        assert!(!reports.is_empty());
        reports
    }};

    ($($pattern:expr),+) => {{
        glob_reports!($($pattern,)+)
    }};
}
pub use glob_reports;

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::report::ReportKind;

    #[test]
    fn glob_reports_iter_reads_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "{}",
            ReportKind::CategoryMetadata.category("cat", "hit").to_json()
        )
        .unwrap();

        let pattern = format!("{}/*.json", dir.path().display());
        let reports: Vec<_> = glob_reports_iter(pattern).map(|r| r.unwrap()).collect();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn glob_reports_macro_collects_and_asserts_nonempty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "{}",
            ReportKind::VersionMetadata
                .version(pkgcraft::dep::Cpv::try_new("cat/pkg-1").unwrap(), "hit")
                .to_json()
        )
        .unwrap();

        let reports = glob_reports!("{}/*.json", dir.path().display());
        assert_eq!(reports.len(), 1);
    }
}
