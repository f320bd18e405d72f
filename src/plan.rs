//! `plug`: the pipeline planner.
//!
//! Given sinks (checks), transforms, and a mapping from source tag to
//! source, produce the minimum-cost set of pipelines that feeds every
//! reachable sink, reporting sinks that could not be plumbed.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::check::Check;
use crate::item::ItemKind;
use crate::runner::CheckRunner;
use crate::scope::Scope;
use crate::source::{Source, SourceTag};
use crate::transform::{Consumer, Transform};

type VisitedSet = BTreeSet<ItemKind>;

#[derive(Debug, Clone)]
struct Candidate {
    visited: VisitedSet,
    transforms: Vec<Transform>,
    cost: u32,
}

/// Explore every distinct reachable `visited_kinds` set from `source`,
/// keeping only the minimum-cost path to each (the planner's pruning rule:
/// drop a candidate once a cheaper path to the same set is known).
fn search(source: &dyn Source, transforms: &[Transform], scan_scope: Scope) -> Vec<Candidate> {
    let start_visited: VisitedSet = [source.kind()].into_iter().collect();
    let mut best: HashMap<VisitedSet, Candidate> = HashMap::new();
    best.insert(
        start_visited.clone(),
        Candidate { visited: start_visited.clone(), transforms: Vec::new(), cost: source.cost() },
    );
    let mut frontier = vec![start_visited];

    while let Some(visited) = frontier.pop() {
        let current = best[&visited].clone();
        for t in transforms {
            let usable = t.scope.in_scope_of(scan_scope)
                && t.scope <= source.scope()
                && current.visited.contains(&t.source_kind)
                && !current.visited.contains(&t.dest_kind);
            if !usable {
                continue;
            }
            let mut next_visited = current.visited.clone();
            next_visited.insert(t.dest_kind);
            let next_cost = current.cost + t.cost;
            let improves = best.get(&next_visited).map(|c| next_cost < c.cost).unwrap_or(true);
            if improves {
                let mut next_transforms = current.transforms.clone();
                next_transforms.push(*t);
                best.insert(
                    next_visited.clone(),
                    Candidate { visited: next_visited.clone(), transforms: next_transforms, cost: next_cost },
                );
                frontier.push(next_visited);
            }
        }
    }

    best.into_values().collect()
}

/// The full transitive closure of kinds reachable from `source`, ignoring
/// cost -- used only to classify sinks as reachable/unreachable.
fn reachable_kinds(source: &dyn Source, transforms: &[Transform], scan_scope: Scope) -> VisitedSet {
    let mut visited: VisitedSet = [source.kind()].into_iter().collect();
    loop {
        let mut added = false;
        for t in transforms {
            if t.scope.in_scope_of(scan_scope)
                && t.scope <= source.scope()
                && visited.contains(&t.source_kind)
                && !visited.contains(&t.dest_kind)
            {
                visited.insert(t.dest_kind);
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    visited
}

/// Recursively assemble the consumer tree for `kind`, attaching every sink
/// whose kind matches at this level and recursing into every transform whose
/// `source_kind` matches, consuming `sinks` destructively so each sink
/// attaches at exactly one level. Returns `None` for an empty branch so the
/// caller omits it rather than wiring in an inert `CheckRunner`.
fn assemble(
    kind: ItemKind,
    transforms: &[Transform],
    sinks: &mut Vec<Check>,
) -> Option<Box<dyn Consumer>> {
    let mut children: Vec<Box<dyn Consumer>> = Vec::new();

    let mut i = 0;
    while i < sinks.len() {
        if sinks[i].kind == kind {
            let sink = sinks.remove(i);
            children.push(Box::new(sink));
        } else {
            i += 1;
        }
    }

    for t in transforms.iter().filter(|t| t.source_kind == kind) {
        if let Some(child) = assemble(t.dest_kind, transforms, sinks) {
            children.push(t.wrap(child));
        }
    }

    if children.is_empty() {
        None
    } else {
        Some(Box::new(CheckRunner::new(kind, children)))
    }
}

/// Plan pipelines for `sinks` against `sources`/`transforms` at `scan_scope`.
///
/// Returns the sinks that could not be plumbed (unreachable, or out of
/// scope) alongside the assembled `(source_tag, pipeline_root)` pairs, one
/// per source tag that ended up with at least one reachable sink.
pub fn plug(
    sinks: Vec<Check>,
    transforms: &[Transform],
    sources: &IndexMap<SourceTag, Box<dyn Source>>,
    scan_scope: Scope,
) -> (Vec<Check>, Vec<(SourceTag, Box<dyn Consumer>)>) {
    let mut by_source: IndexMap<SourceTag, Vec<Check>> = IndexMap::new();
    for sink in sinks {
        by_source.entry(sink.source).or_default().push(sink);
    }

    let mut unreachable = Vec::new();
    let mut pipelines = Vec::new();

    for (tag, mut group) in by_source {
        let Some(source) = sources.get(tag) else {
            unreachable.extend(group);
            continue;
        };

        let reachable = reachable_kinds(source.as_ref(), transforms, scan_scope);
        let (mut good, bad): (Vec<Check>, Vec<Check>) = group.drain(..).partition(|sink| {
            sink.scope.in_scope_of(scan_scope) && reachable.contains(&sink.kind)
        });
        unreachable.extend(bad);

        if good.is_empty() {
            continue;
        }

        // sort sinks by priority so they attach, and later run, in the right order
        good = good.into_iter().sorted_by_key(|s| s.priority).collect();
        let needed: VisitedSet = good.iter().map(|s| s.kind).collect();

        let candidates = search(source.as_ref(), transforms, scan_scope);
        let chosen = candidates
            .into_iter()
            .filter(|c| needed.is_subset(&c.visited))
            .min_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.transforms.len().cmp(&b.transforms.len())))
            .expect("sink kinds were proven reachable by reachable_kinds");

        let root = assemble(source.kind(), &chosen.transforms, &mut good)
            .expect("at least one good sink exists for this group");
        debug_assert!(good.is_empty(), "every reachable sink must attach to exactly one level");

        pipelines.push((tag, root));
    }

    (unreachable, pipelines)
}
