//! Check descriptors: the sinks the planner wires up.
//!
//! The concrete lint rules a real deployment registers are supplied
//! externally; this module specifies the descriptor shape and the
//! `start`/`feed`/`finish` contract every check's logic implements.

use std::fmt;

use crate::item::{Item, ItemKind};
use crate::report::Report;
use crate::scope::Scope;
use crate::source::SourceTag;
use crate::transform::{Consumer, FeedResult, MetadataFailure};

/// Per-item-kind logic a check supplies. Kept separate from [`Check`] so the
/// descriptor (name, scope, priority, `known_results`) stays plain data.
pub trait CheckLogic: fmt::Debug {
    fn start(&mut self) -> FeedResult {
        Ok(Vec::new())
    }

    fn feed(&mut self, item: &Item) -> FeedResult;

    fn finish(&mut self) -> FeedResult {
        Ok(Vec::new())
    }
}

/// A check: a named, prioritized, scoped consumer of one item kind.
#[derive(Debug)]
pub struct Check {
    pub name: &'static str,
    pub kind: ItemKind,
    pub scope: Scope,
    pub priority: i64,
    pub source: SourceTag,
    pub known_results: &'static [crate::report::ReportKind],
    pub logic: Box<dyn CheckLogic>,
}

impl Consumer for Check {
    fn item_kind(&self) -> ItemKind {
        self.kind
    }

    fn start(&mut self) -> FeedResult {
        let reports = self.logic.start()?;
        self.assert_known(&reports);
        Ok(reports)
    }

    fn feed(&mut self, item: &Item) -> FeedResult {
        let reports = self.logic.feed(item)?;
        self.assert_known(&reports);
        Ok(reports)
    }

    fn finish(&mut self) -> FeedResult {
        let reports = self.logic.finish()?;
        self.assert_known(&reports);
        Ok(reports)
    }
}

impl Check {
    fn assert_known(&self, reports: &[Report]) {
        for report in reports {
            debug_assert!(
                self.known_results.contains(&report.kind()),
                "check {} emitted undeclared report kind {}",
                self.name,
                report.kind(),
            );
        }
    }
}

#[allow(dead_code)]
pub(crate) fn metadata_failure(item: &Item, attr: &str, error: impl fmt::Display) -> MetadataFailure {
    MetadataFailure { item: item.clone(), attr: attr.to_string(), error: error.to_string() }
}

/// A single `check_whitelist`/`check_blacklist` selection pattern: a glob
/// (containing `*` or `+`) compiles to a regex, anything else matches as a
/// plain substring of the check's dotted identifier.
#[derive(Debug, Clone)]
enum Pattern {
    Substr(String),
    Regex(regex::Regex),
}

impl Pattern {
    fn new(s: &str) -> crate::Result<Self> {
        if s.contains('*') || s.contains('+') {
            let re = regex::Regex::new(s)
                .map_err(|e| crate::Error::InvalidValue(format!("invalid check pattern: {e}")))?;
            Ok(Self::Regex(re))
        } else {
            Ok(Self::Substr(s.to_string()))
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Substr(s) => name.contains(s.as_str()),
            Self::Regex(re) => re.is_match(name),
        }
    }
}

/// Whether `name` (a check's dotted identifier, e.g. `"category.metadata"`)
/// is selected: it must match the whitelist (if any is given) and must not
/// match the blacklist.
pub fn selected(name: &str, whitelist: &[&str], blacklist: &[&str]) -> crate::Result<bool> {
    let allowed = if whitelist.is_empty() {
        true
    } else {
        let mut matched = false;
        for pattern in whitelist {
            if Pattern::new(pattern)?.matches(name) {
                matched = true;
                break;
            }
        }
        matched
    };
    if !allowed {
        return Ok(false);
    }
    for pattern in blacklist {
        if Pattern::new(pattern)?.matches(name) {
            return Ok(false);
        }
    }
    Ok(true)
}
