//! Memoized layouts keyed by structure kind, size and shape fingerprint

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::{Layout, LayoutKey};

/// Bounded layout memo. The oldest entry is evicted first once `capacity` is
/// reached.
#[derive(Debug)]
pub struct LayoutCache {
    entries: HashMap<LayoutKey, Arc<Layout>>,
    order: VecDeque<LayoutKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LAYOUT_CACHE_CAPACITY)
    }
}

impl LayoutCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached layout for `key`, computing and storing it on a miss
    pub fn get_or_compute<F>(&mut self, key: LayoutKey, compute: F) -> Arc<Layout>
    where
        F: FnOnce() -> Layout,
    {
        if let Some(layout) = self.entries.get(&key) {
            self.hits += 1;
            tracing::trace!(
                "Layout cache hit for {} ({} elements, {:016x})",
                key.kind,
                key.size,
                key.fingerprint
            );
            return Arc::clone(layout);
        }

        self.misses += 1;
        tracing::debug!(
            "Layout cache miss for {} ({} elements, {:016x})",
            key.kind,
            key.size,
            key.fingerprint
        );
        let layout = Arc::new(compute());

        // A zero-capacity cache still computes, it just keeps nothing
        if self.capacity == 0 {
            return layout;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.entries.insert(key, Arc::clone(&layout));
        self.order.push_back(key);
        layout
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
