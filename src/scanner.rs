//! The ambient, per-invocation entry point: owns enabled checks/reports/exit
//! selection and fans a scan out across worker threads, one
//! [`crate::pipeline::Pipeline`] per scan unit.
//!
//! Expanding a caller's restriction into the ordered sequence of scan units,
//! and building the sinks/sources/transforms a unit's pipeline needs, are
//! both external-collaborator concerns (see the crate's module-level docs);
//! [`Scanner`] only needs a closure that turns one unit into its reports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::report::{Report, ReportKind};

/// A per-unit pipeline factory: given one scan unit, run its pipeline to
/// completion and return the reports it produced (unsorted is fine --
/// [`ReportFilter::process`] sorts each batch before it leaves the worker).
pub type PipelineFn<U> = dyn Fn(&U) -> Vec<Report> + Send + Sync;

fn resolve_jobs(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}

pub struct Scanner<U> {
    jobs: usize,
    verbosity: i32,
    reports: IndexSet<ReportKind>,
    exit: IndexSet<ReportKind>,
    failed: Arc<AtomicBool>,
    run_unit: Arc<PipelineFn<U>>,
}

impl<U> Scanner<U>
where
    U: Send + Sync + 'static,
{
    /// Create a scanner driving `run_unit` for each scan unit, with every
    /// report kind enabled and no exit-triggering kinds.
    pub fn new(run_unit: impl Fn(&U) -> Vec<Report> + Send + Sync + 'static) -> Self {
        use strum::IntoEnumIterator;
        Self {
            jobs: resolve_jobs(0),
            verbosity: 0,
            reports: ReportKind::iter().collect(),
            exit: IndexSet::new(),
            failed: Arc::new(AtomicBool::new(false)),
            run_unit: Arc::new(run_unit),
        }
    }

    /// Set the number of parallel worker threads; `0` auto-detects from
    /// available parallelism.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = resolve_jobs(jobs);
        self
    }

    /// Set output verbosity. Below `1`, reports carrying the `filtered` flag
    /// (non-latest versions under [`crate::filter::LatestPkgsFilter`]) are
    /// suppressed; at `1` or above they pass through.
    pub fn verbosity(mut self, verbosity: i32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Restrict the set of report kinds that reach the output.
    pub fn reports<I: IntoIterator<Item = ReportKind>>(mut self, values: I) -> Self {
        self.reports = values.into_iter().collect();
        self
    }

    /// Report kinds that flip [`Scanner::failed`] when emitted.
    pub fn exit<I: IntoIterator<Item = ReportKind>>(mut self, values: I) -> Self {
        self.exit = values.into_iter().collect();
        self
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    /// Run the scan over `units`, returning a lazy iterator of reports.
    ///
    /// Batch arrival order across units is not globally ordered when more
    /// than one worker is used; pass `jobs(1)` for a fully deterministic
    /// stream (e.g. for golden-file tests).
    pub fn run<I>(&self, units: I) -> Iter
    where
        I: IntoIterator<Item = U> + Send + 'static,
        I::IntoIter: Send,
    {
        let (unit_tx, unit_rx) = bounded(self.jobs);
        let (reports_tx, reports_rx) = bounded(self.jobs);
        let filter = Arc::new(self.reports.clone());
        let exit = Arc::new(self.exit.clone());
        let verbosity = self.verbosity;

        let producer = thread::spawn(move || {
            for unit in units {
                if unit_tx.send(unit).is_err() {
                    break;
                }
            }
        });

        let workers = (0..self.jobs)
            .map(|_| {
                worker(
                    self.run_unit.clone(),
                    filter.clone(),
                    exit.clone(),
                    verbosity,
                    self.failed.clone(),
                    unit_rx.clone(),
                    reports_tx.clone(),
                )
            })
            .collect();

        Iter { reports_rx, _producer: producer, _workers: workers, reports: VecDeque::new() }
    }
}

/// Per-worker sink: drops disabled report kinds, flips `failed` for
/// exit-triggering kinds, and sorts each unit's batch before sending it on.
pub(crate) struct ReportFilter {
    reports: Vec<Report>,
    filter: Arc<IndexSet<ReportKind>>,
    exit: Arc<IndexSet<ReportKind>>,
    verbosity: i32,
    failed: Arc<AtomicBool>,
    tx: Sender<Vec<Report>>,
}

impl ReportFilter {
    pub(crate) fn report(&mut self, report: Report) {
        if report.filtered() && self.verbosity < 1 {
            debug!(kind = %report.kind(), "suppressing filtered report");
            return;
        }
        if !self.filter.contains(&report.kind()) {
            return;
        }
        if self.exit.contains(&report.kind()) {
            self.failed.store(true, Ordering::Relaxed);
        }
        self.reports.push(report);
    }

    fn process(&mut self) {
        let mut reports = std::mem::take(&mut self.reports);
        reports.sort();
        if self.tx.send(reports).is_err() {
            warn!("report receiver dropped before worker finished");
        }
    }
}

fn worker<U>(
    run_unit: Arc<PipelineFn<U>>,
    filter: Arc<IndexSet<ReportKind>>,
    exit: Arc<IndexSet<ReportKind>>,
    verbosity: i32,
    failed: Arc<AtomicBool>,
    rx: Receiver<U>,
    tx: Sender<Vec<Report>>,
) -> thread::JoinHandle<()>
where
    U: Send + 'static,
{
    thread::spawn(move || {
        let mut filter = ReportFilter { reports: Vec::new(), filter, exit, verbosity, failed, tx };
        for unit in rx {
            for report in run_unit(&unit) {
                filter.report(report);
            }
            filter.process();
        }
    })
}

pub struct Iter {
    reports_rx: Receiver<Vec<Report>>,
    _producer: thread::JoinHandle<()>,
    _workers: Vec<thread::JoinHandle<()>>,
    reports: VecDeque<Report>,
}

impl Iterator for Iter {
    type Item = Report;

    fn next(&mut self) -> Option<Report> {
        if let Some(report) = self.reports.pop_front() {
            return Some(report);
        }
        let batch = self.reports_rx.recv().ok()?;
        self.reports.extend(batch);
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_reports(n: &u32) -> Vec<Report> {
        vec![ReportKind::VersionMetadata.category(format!("unit-{n}"), "hit")]
    }

    #[test]
    fn runs_one_unit_per_item_in_order_with_one_job() {
        let scanner = Scanner::new(unit_reports).jobs(1);
        let reports: Vec<_> = scanner.run(vec![1u32, 2, 3]).collect();
        assert_eq!(reports.len(), 3);
    }

    #[test]
    fn reports_filter_restricts_output() {
        let scanner = Scanner::new(unit_reports).jobs(1).reports([]);
        let reports: Vec<_> = scanner.run(vec![1u32]).collect();
        assert!(reports.is_empty());
    }

    #[test]
    fn exit_kinds_flip_failed() {
        let scanner = Scanner::new(unit_reports).jobs(1).exit([ReportKind::VersionMetadata]);
        assert!(!scanner.failed());
        scanner.run(vec![1u32]).count();
        assert!(scanner.failed());
    }

    #[test]
    fn empty_units_yield_no_reports() {
        let scanner = Scanner::new(unit_reports).jobs(1);
        let reports: Vec<_> = scanner.run(Vec::<u32>::new()).collect();
        assert!(reports.is_empty());
    }

    fn filtered_unit_reports(_n: &u32) -> Vec<Report> {
        let mut report = ReportKind::UnstableOnly
            .version(pkgcraft::dep::Cpv::try_new("cat/pkg-1").unwrap(), "hit");
        report.set_filtered();
        vec![report]
    }

    #[test]
    fn filtered_reports_suppressed_below_verbosity_one() {
        let scanner = Scanner::new(filtered_unit_reports).jobs(1);
        let reports: Vec<_> = scanner.run(vec![1u32]).collect();
        assert!(reports.is_empty());
    }

    #[test]
    fn filtered_reports_pass_through_at_verbosity_one() {
        let scanner = Scanner::new(filtered_unit_reports).jobs(1).verbosity(1);
        let reports: Vec<_> = scanner.run(vec![1u32]).collect();
        assert_eq!(reports.len(), 1);
    }
}
