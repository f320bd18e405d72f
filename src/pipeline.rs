//! Pipeline execution: drives the assembled consumer trees over an
//! interleaved item stream, in `start → feed* → finish` order.

use std::collections::VecDeque;

use crate::interleave::InterleavedSources;
use crate::item::Item;
use crate::report::Report;
use crate::transform::Consumer;

#[derive(Clone, Copy)]
enum State {
    Start(usize),
    Feed,
    Finish(usize),
    Done,
}

/// One pipeline per source tag, driven together so their items interleave
/// into a single globally-sorted feed order.
pub struct Pipeline<'a> {
    consumers: Vec<Box<dyn Consumer>>,
    interleaver: InterleavedSources<'a>,
}

impl<'a> Pipeline<'a> {
    /// Build a pipeline from `(item_iterator, consumer)` pairs -- typically
    /// one per source tag returned by [`crate::plan::plug`], with the
    /// iterator coming from that tag's [`crate::source::Source`].
    pub fn new(pipes: Vec<(Box<dyn Iterator<Item = Item> + 'a>, Box<dyn Consumer>)>) -> Self {
        let mut consumers = Vec::with_capacity(pipes.len());
        let mut sources = Vec::with_capacity(pipes.len());
        for (i, (iter, consumer)) in pipes.into_iter().enumerate() {
            sources.push((iter, i));
            consumers.push(consumer);
        }
        Self { consumers, interleaver: InterleavedSources::new(sources) }
    }

    /// Run the pipeline to completion, yielding reports in `start`-then-feed
    /// (interleaved, item order)-then-`finish` order.
    pub fn run(self) -> Run<'a> {
        Run { pipeline: self, state: State::Start(0), buffer: VecDeque::new() }
    }
}

/// The lazy result stream a [`Pipeline`] yields.
pub struct Run<'a> {
    pipeline: Pipeline<'a>,
    state: State,
    buffer: VecDeque<Report>,
}

const INVARIANT: &str = "a CheckRunner never returns Err; metadata failures are caught and \
                          reified as reports before they escape it";

impl<'a> Iterator for Run<'a> {
    type Item = Report;

    fn next(&mut self) -> Option<Report> {
        loop {
            if let Some(report) = self.buffer.pop_front() {
                return Some(report);
            }
            match self.state {
                State::Start(i) => {
                    if i >= self.pipeline.consumers.len() {
                        self.state = State::Feed;
                        continue;
                    }
                    let reports = self.pipeline.consumers[i].start().expect(INVARIANT);
                    self.state = State::Start(i + 1);
                    self.buffer.extend(reports);
                }
                State::Feed => match self.pipeline.interleaver.next() {
                    Some((item, pipe)) => {
                        let reports =
                            self.pipeline.consumers[pipe].feed(&item).expect(INVARIANT);
                        self.buffer.extend(reports);
                    }
                    None => self.state = State::Finish(0),
                },
                State::Finish(i) => {
                    if i >= self.pipeline.consumers.len() {
                        self.state = State::Done;
                        continue;
                    }
                    let reports = self.pipeline.consumers[i].finish().expect(INVARIANT);
                    self.state = State::Finish(i + 1);
                    self.buffer.extend(reports);
                }
                State::Done => return None,
            }
        }
    }
}

/// Drives a single commit-log source through one consumer; commits are never
/// interleaved with other item kinds, so no [`InterleavedSources`] is needed.
pub struct GitPipeline<'a> {
    items: Box<dyn Iterator<Item = Item> + 'a>,
    consumer: Box<dyn Consumer>,
}

impl<'a> GitPipeline<'a> {
    pub fn new(items: Box<dyn Iterator<Item = Item> + 'a>, consumer: Box<dyn Consumer>) -> Self {
        Self { items, consumer }
    }

    pub fn run(mut self) -> Vec<Report> {
        let mut reports = self.consumer.start().expect(INVARIANT);
        for item in self.items.by_ref() {
            reports.extend(self.consumer.feed(&item).expect(INVARIANT));
        }
        reports.extend(self.consumer.finish().expect(INVARIANT));
        reports
    }
}
