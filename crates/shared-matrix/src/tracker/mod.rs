//! Position tracker: maps row/column indices to stable handles.
//!
//! Each axis is a [`PermutationVector`]: an arena of structural slots keyed by
//! [`Handle`] plus the order in which those slots appear. Removed slots stay in
//! the order as tombstones, and every slot remembers which operation inserted
//! it and which operations removed it. That is enough to reconstruct the
//! matrix as any client saw it at any reference sequence number still inside
//! the collaboration window (see [`Perspective`]).
//!
//! Placement of concurrent inserts follows one rule everywhere: a new run goes
//! immediately after the last slot its author could see, ahead of anything
//! the author could not see. On the receiving side, runs still pending on the
//! local client are skipped first, because they will be sequenced later and
//! therefore belong to the left of the incoming run.

pub mod vector;

use crate::clock::Handle;
use crate::error::TrackerError;
use crate::operations::Axis;

pub use vector::PermutationVector;

/// When a slot was inserted or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Applied by the sequenced operation with this sequence number.
    Acked(u64),
    /// Applied optimistically by the local pending operation with this local sequence.
    Local(u64),
}

/// A point of view from which indices are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    /// The local client's own view. With `before: Some(k)`, local pending
    /// effects from local sequence `k` onward are hidden, which is what the
    /// rest of the session will see when the pending op `k` gets sequenced.
    Local { before: Option<u64> },
    /// The view `client_id` had when authoring an op against `ref_seq`:
    /// everything sequenced up to `ref_seq` plus that client's own later
    /// sequenced ops.
    Remote { ref_seq: u64, client_id: u64 },
}

impl Perspective {
    pub const LOCAL: Perspective = Perspective::Local { before: None };

    pub fn remote(ref_seq: u64, client_id: u64) -> Self {
        Perspective::Remote { ref_seq, client_id }
    }

    pub fn before(local_seq: u64) -> Self {
        Perspective::Local {
            before: Some(local_seq),
        }
    }

    /// Whether an effect stamped `stamp` by `author` is part of this view.
    pub(crate) fn sees(&self, stamp: Stamp, author: u64) -> bool {
        match (*self, stamp) {
            (Perspective::Local { .. }, Stamp::Acked(_)) => true,
            (Perspective::Local { before }, Stamp::Local(l)) => before.map_or(true, |b| l < b),
            (Perspective::Remote { ref_seq, client_id }, Stamp::Acked(s)) => {
                s <= ref_seq || author == client_id
            }
            (Perspective::Remote { .. }, Stamp::Local(_)) => false,
        }
    }
}

/// Result of resolving a handle against the local view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Index(usize),
    Removed,
}

/// Row and column permutation vectors of one matrix.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    rows: PermutationVector,
    cols: PermutationVector,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self {
            rows: PermutationVector::new(Axis::Rows),
            cols: PermutationVector::new(Axis::Cols),
        }
    }

    pub(crate) fn from_vectors(rows: PermutationVector, cols: PermutationVector) -> Self {
        Self { rows, cols }
    }

    pub fn vector(&self, axis: Axis) -> &PermutationVector {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Cols => &self.cols,
        }
    }

    pub fn vector_mut(&mut self, axis: Axis) -> &mut PermutationVector {
        match axis {
            Axis::Rows => &mut self.rows,
            Axis::Cols => &mut self.cols,
        }
    }

    /// Number of visible entries on `axis` in the local view.
    pub fn len(&self, axis: Axis) -> usize {
        self.vector(axis).len()
    }

    /// Inserts a locally authored run of `count` handles starting at `first`.
    pub fn insert(
        &mut self,
        axis: Axis,
        index: usize,
        first: Handle,
        count: usize,
        client_id: u64,
        local_seq: u64,
    ) -> Result<Vec<Handle>, TrackerError> {
        self.vector_mut(axis)
            .insert_local(index, first, count, client_id, local_seq)
    }

    /// Removes `count` locally visible entries starting at `index`.
    pub fn remove(
        &mut self,
        axis: Axis,
        index: usize,
        count: usize,
        client_id: u64,
        local_seq: u64,
    ) -> Result<Vec<Handle>, TrackerError> {
        self.vector_mut(axis)
            .remove_local(index, count, client_id, local_seq)
    }

    pub fn resolve(&self, axis: Axis, handle: Handle) -> Resolved {
        self.vector(axis).resolve(handle)
    }

    pub fn translate(
        &self,
        axis: Axis,
        index: usize,
        perspective: &Perspective,
    ) -> Result<Handle, TrackerError> {
        self.vector(axis).translate(index, perspective)
    }

    /// Drops history no reference sequence number at or above `min_seq` can
    /// observe. Returns the dropped row and column handles.
    pub fn compact(&mut self, min_seq: u64) -> (Vec<Handle>, Vec<Handle>) {
        (self.rows.compact(min_seq), self.cols.compact(min_seq))
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_perspective_hides_later_pending_effects() {
        let p = Perspective::before(5);
        assert!(p.sees(Stamp::Acked(100), 1));
        assert!(p.sees(Stamp::Local(4), 1));
        assert!(!p.sees(Stamp::Local(5), 1));
        assert!(Perspective::LOCAL.sees(Stamp::Local(5), 1));
    }

    #[test]
    fn remote_perspective_sees_own_sequenced_ops() {
        let p = Perspective::remote(10, 7);
        assert!(p.sees(Stamp::Acked(10), 3));
        assert!(!p.sees(Stamp::Acked(11), 3));
        assert!(p.sees(Stamp::Acked(11), 7));
        assert!(!p.sees(Stamp::Local(1), 7));
    }

    #[test]
    fn axes_are_independent() {
        let mut tracker = PositionTracker::new();
        tracker
            .insert(Axis::Rows, 0, Handle::new(70_000, 0), 2, 70_000, 1)
            .unwrap();
        assert_eq!(tracker.len(Axis::Rows), 2);
        assert_eq!(tracker.len(Axis::Cols), 0);
        assert_eq!(
            tracker.resolve(Axis::Rows, Handle::new(70_000, 1)),
            Resolved::Index(1)
        );
        assert_eq!(
            tracker.resolve(Axis::Cols, Handle::new(70_000, 1)),
            Resolved::Removed
        );
    }
}
