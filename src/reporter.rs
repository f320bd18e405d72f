//! Turning a [`Report`] stream into output.
//!
//! The original implementation drives this with a coroutine-style generator;
//! here it is a plain function over `&mut dyn Write`, matching the other
//! reporter variants the same taxonomy supports elsewhere in this ecosystem.
//! Only the two output shapes the core scan loop needs are implemented here --
//! a human-oriented default and a machine-readable replay format -- since
//! terminal-coloring and user-supplied format strings belong to an outer CLI
//! surface, not this crate.

use std::io::Write;

use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

use crate::report::Report;
use crate::Result;

#[derive(AsRefStr, Display, EnumIter, EnumString, VariantNames, Debug, Clone)]
#[strum(serialize_all = "kebab-case")]
pub enum Reporter {
    Simple(SimpleReporter),
    Json(JsonReporter),
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter::Simple(Default::default())
    }
}

impl Reporter {
    /// Write one report through this reporter.
    pub fn report(&mut self, report: &Report, output: &mut dyn Write) -> Result<()> {
        match self {
            Self::Simple(r) => r.report(report, output),
            Self::Json(r) => r.report(report, output),
        }
    }
}

/// `scope: kind: message`, one line per report.
#[derive(Debug, Default, Clone)]
pub struct SimpleReporter;

impl From<SimpleReporter> for Reporter {
    fn from(value: SimpleReporter) -> Self {
        Self::Simple(value)
    }
}

impl SimpleReporter {
    fn report(&mut self, report: &Report, output: &mut dyn Write) -> Result<()> {
        writeln!(output, "{report}")?;
        Ok(())
    }
}

/// One JSON object per line, round-trippable via [`Report::from_json`] and
/// [`crate::report::Iter`].
#[derive(Debug, Default, Clone)]
pub struct JsonReporter;

impl From<JsonReporter> for Reporter {
    fn from(value: JsonReporter) -> Self {
        Self::Json(value)
    }
}

impl JsonReporter {
    fn report(&self, report: &Report, output: &mut dyn Write) -> Result<()> {
        writeln!(output, "{}", report.to_json())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pkgcraft::dep::Cpv;

    use super::*;
    use crate::report::ReportKind;

    fn reports() -> Vec<Report> {
        vec![
            ReportKind::PackageMetadata.package(pkgcraft::dep::Cpn::try_new("cat/pkg").unwrap(), "arch"),
            ReportKind::UnstableOnly.version(Cpv::try_new("cat/pkg-1-r2").unwrap(), "unstable keyword"),
        ]
    }

    fn render<R: Into<Reporter>>(reporter: R) -> String {
        let mut reporter = reporter.into();
        let mut output = Vec::new();
        for report in &reports() {
            reporter.report(report, &mut output).unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn simple_is_one_line_per_report() {
        let output = render(SimpleReporter);
        let expected = indoc::indoc! {"
            cat/pkg: package-metadata: arch
            cat/pkg-1-r2: unstable-only: unstable keyword
        "};
        assert_eq!(output, expected);
    }

    #[test]
    fn json_round_trips_through_report_iter() {
        let output = render(JsonReporter);
        let reader = std::io::BufReader::new(output.as_bytes());
        let parsed: Vec<_> = crate::report::Iter::new(reader, None)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(parsed, reports());
    }

    #[test]
    fn default_reporter_is_simple() {
        assert!(matches!(Reporter::default(), Reporter::Simple(_)));
    }
}
