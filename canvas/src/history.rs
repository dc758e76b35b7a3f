//! The committed-stroke log: the authoritative drawing history of a session.
//!
//! Append order is draw order is z-order. The log is the only source of
//! truth for committed ink; renderers read [`CanvasLog::paths`] and never
//! mutate it.
//!
//! Undo and clear are local mutations here. The peer that performs them is
//! responsible for broadcasting the resulting full log so that other peers
//! apply [`CanvasLog::replace_all`] instead of recomputing the undo against a
//! history that may differ from ours.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::path::VectorPath;

/// Ordered, append-only sequence of committed vector paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasLog {
    paths: Vec<VectorPath>,
}

impl CanvasLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Append one committed stroke on top of the drawing.
    pub fn append(&mut self, path: VectorPath) {
        self.paths.push(path);
    }

    /// Remove the most recent stroke. Returns whether anything was removed.
    pub fn undo_last(&mut self) -> bool {
        self.paths.pop().is_some()
    }

    /// Remove every stroke.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Replace the whole history with a snapshot received from a peer.
    pub fn replace_all(&mut self, paths: Vec<VectorPath>) {
        self.paths = paths;
    }

    /// All strokes in draw order.
    #[must_use]
    pub fn paths(&self) -> &[VectorPath] {
        &self.paths
    }

    /// Strokes from index `from` onwards; empty when `from` is past the end.
    #[must_use]
    pub fn paths_from(&self, from: usize) -> &[VectorPath] {
        self.paths.get(from..).unwrap_or(&[])
    }

    /// Number of committed strokes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if nothing has been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
