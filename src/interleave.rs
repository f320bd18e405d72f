//! [`InterleavedSources`]: merges multiple sorted item iterators into a
//! single globally-sorted stream, tagging each item with its originating
//! pipe index.

use std::collections::HashMap;

use crate::item::Item;

/// Merges `(iterator, pipe_index)` pairs -- each already yielding [`Item`]s in
/// canonical order -- into one stream of `(item, pipe_index)` in the merged
/// order. Exhausted iterators drop out silently.
pub struct InterleavedSources<'a> {
    sources: Vec<(Box<dyn Iterator<Item = Item> + 'a>, usize)>,
    cache: HashMap<usize, Item>,
}

impl<'a> InterleavedSources<'a> {
    pub fn new(sources: Vec<(Box<dyn Iterator<Item = Item> + 'a>, usize)>) -> Self {
        Self { sources, cache: HashMap::new() }
    }
}

impl<'a> Iterator for InterleavedSources<'a> {
    type Item = (Item, usize);

    fn next(&mut self) -> Option<Self::Item> {
        // refill the lookahead cache for any live iterator that doesn't have one
        self.sources.retain_mut(|(iter, pipe)| {
            if self.cache.contains_key(pipe) {
                return true;
            }
            match iter.next() {
                Some(item) => {
                    self.cache.insert(*pipe, item);
                    true
                }
                None => false,
            }
        });

        // pick the minimum cached item, preferring the lowest pipe index on ties
        let min_pipe = self
            .cache
            .iter()
            .min_by(|(p1, i1), (p2, i2)| i1.cmp(i2).then_with(|| p1.cmp(p2)))
            .map(|(pipe, _)| *pipe)?;

        let item = self.cache.remove(&min_pipe).expect("min_pipe came from cache");
        Some((item, min_pipe))
    }
}
