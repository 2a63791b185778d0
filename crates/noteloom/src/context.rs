use crate::window::normalize;
use std::collections::VecDeque;

/// Fixed-capacity window of the most recent vocabulary indices.
///
/// Always holds exactly `capacity` entries: it is created full and every
/// [`push`](Self::push) evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingContext {
    buf: VecDeque<usize>,
}

impl RollingContext {
    /// Create from an initial window. Returns `None` for an empty window.
    pub fn new(initial: impl IntoIterator<Item = usize>) -> Option<Self> {
        let buf: VecDeque<usize> = initial.into_iter().collect();
        (!buf.is_empty()).then_some(Self { buf })
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Never true; a context is created full and stays full.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Append `index` and return the evicted oldest entry.
    pub fn push(&mut self, index: usize) -> usize {
        let evicted = self.buf.pop_front().unwrap_or(index);
        self.buf.push_back(index);
        evicted
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.buf.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// The window scaled by `size`, as fed to a predictor.
    pub fn normalized(&self, size: usize) -> Vec<f32> {
        normalize(self.iter(), size)
    }
}
