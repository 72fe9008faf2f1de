//! Permutation vector for one axis.
//!
//! Uses a flat `Vec<Handle>` for the order plus a `HashMap` arena for slot
//! metadata. Index lookups are O(n) linear scans, which keeps the structure
//! simple and is adequate for matrices of spreadsheet scale.

use std::collections::{HashMap, HashSet};

use super::{Perspective, Resolved, Stamp};
use crate::clock::{self, Handle};
use crate::error::TrackerError;
use crate::operations::Axis;

// ── Slot ──────────────────────────────────────────────────────────────────

/// One removal applied to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Removal {
    pub client_id: u64,
    pub stamp: Stamp,
}

/// Metadata of one row or column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub inserted: Stamp,
    /// Author of the insertion.
    pub client_id: u64,
    /// Every removal applied so far; concurrent removals each leave an entry
    /// so that every remover's perspective treats the slot as gone.
    pub removals: Vec<Removal>,
}

impl Slot {
    pub(crate) fn new(inserted: Stamp, client_id: u64) -> Self {
        Self {
            inserted,
            client_id,
            removals: Vec::new(),
        }
    }

    fn visible(&self, perspective: &Perspective) -> bool {
        perspective.sees(self.inserted, self.client_id)
            && !self
                .removals
                .iter()
                .any(|r| perspective.sees(r.stamp, r.client_id))
    }

    fn is_pending_insert(&self) -> bool {
        matches!(self.inserted, Stamp::Local(_))
    }

    fn is_later_pending(&self, local_seq: u64) -> bool {
        matches!(self.inserted, Stamp::Local(l) if l > local_seq)
    }

    fn is_removed_acked(&self) -> bool {
        self.removals
            .iter()
            .any(|r| matches!(r.stamp, Stamp::Acked(_)))
    }

    fn has_local_removal(&self) -> bool {
        self.removals
            .iter()
            .any(|r| matches!(r.stamp, Stamp::Local(_)))
    }

    /// A tombstone every reference point at or above `min_seq` sees as removed.
    fn is_collectable(&self, min_seq: u64) -> bool {
        matches!(self.inserted, Stamp::Acked(_))
            && !self.has_local_removal()
            && self
                .removals
                .iter()
                .any(|r| matches!(r.stamp, Stamp::Acked(s) if s <= min_seq))
    }
}

// ── PermutationVector ─────────────────────────────────────────────────────

/// Ordered handles of one axis, including tombstones inside the
/// collaboration window.
#[derive(Debug, Clone)]
pub struct PermutationVector {
    axis: Axis,
    order: Vec<Handle>,
    slots: HashMap<Handle, Slot>,
    /// Reference sequence numbers below this may no longer be translated.
    floor: u64,
}

impl PermutationVector {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            order: Vec::new(),
            slots: HashMap::new(),
            floor: 0,
        }
    }

    /// Rebuilds a vector from acknowledged slots in order.
    pub(crate) fn from_slots(
        axis: Axis,
        slots: Vec<(Handle, Slot)>,
        floor: u64,
    ) -> Result<Self, TrackerError> {
        let mut vector = Self::new(axis);
        vector.floor = floor;
        for (handle, slot) in slots {
            if vector.slots.insert(handle, slot).is_some() {
                return Err(TrackerError::DuplicateHandle(handle));
            }
            vector.order.push(handle);
        }
        Ok(vector)
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn floor(&self) -> u64 {
        self.floor
    }

    /// Number of entries in the local view.
    pub fn len(&self) -> usize {
        self.visible_count(&Perspective::LOCAL)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots including tombstones.
    pub fn slot_count(&self) -> usize {
        self.order.len()
    }

    /// Handles of the local view, in order.
    pub fn handles(&self) -> Vec<Handle> {
        self.order
            .iter()
            .filter(|h| self.slot(h).visible(&Perspective::LOCAL))
            .copied()
            .collect()
    }

    pub fn handle_at(&self, index: usize) -> Option<Handle> {
        self.translate(index, &Perspective::LOCAL).ok()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slots.contains_key(&handle)
    }

    /// Current local index of `handle`, or [`Resolved::Removed`].
    pub fn resolve(&self, handle: Handle) -> Resolved {
        match self.visible_index(handle, &Perspective::LOCAL) {
            Some(index) => Resolved::Index(index),
            None => Resolved::Removed,
        }
    }

    /// Whether a sequenced operation has removed `handle` (or it was compacted away).
    pub fn is_removed_acked(&self, handle: Handle) -> bool {
        self.slots
            .get(&handle)
            .map_or(true, |slot| slot.is_removed_acked())
    }

    /// Index of `handle` in `perspective`, or `None` if it is not visible there.
    pub fn visible_index(&self, handle: Handle, perspective: &Perspective) -> Option<usize> {
        let slot = self.slots.get(&handle)?;
        if !slot.visible(perspective) {
            return None;
        }
        let pos = self.position_of(handle)?;
        Some(self.visible_before(pos, perspective))
    }

    /// Number of entries visible in `perspective` that precede `handle`,
    /// whether or not `handle` itself is visible there.
    pub fn rank(&self, handle: Handle, perspective: &Perspective) -> Option<usize> {
        let pos = self.position_of(handle)?;
        Some(self.visible_before(pos, perspective))
    }

    /// Resolves `index` in `perspective` to the handle it denoted there.
    pub fn translate(&self, index: usize, perspective: &Perspective) -> Result<Handle, TrackerError> {
        self.check_history(perspective)?;
        let mut seen = 0;
        for handle in &self.order {
            if self.slot(handle).visible(perspective) {
                if seen == index {
                    return Ok(*handle);
                }
                seen += 1;
            }
        }
        Err(TrackerError::OutOfRange {
            axis: self.axis,
            index,
            count: 1,
            len: seen,
        })
    }

    /// Like [`translate`](Self::translate), but fails with
    /// [`TrackerError::StaleHandle`] if the handle has since been removed by a
    /// sequenced operation.
    pub fn translate_live(
        &self,
        index: usize,
        perspective: &Perspective,
    ) -> Result<Handle, TrackerError> {
        let handle = self.translate(index, perspective)?;
        if self.is_removed_acked(handle) {
            return Err(TrackerError::StaleHandle(handle));
        }
        Ok(handle)
    }

    // ── Insertion ────────────────────────────────────────────────────────

    /// Inserts a locally authored run right after the `index`-th visible entry.
    pub fn insert_local(
        &mut self,
        index: usize,
        first: Handle,
        count: usize,
        client_id: u64,
        local_seq: u64,
    ) -> Result<Vec<Handle>, TrackerError> {
        if count == 0 {
            return Err(TrackerError::EmptyRange { axis: self.axis });
        }
        let len = self.len();
        if index > len {
            return Err(TrackerError::OutOfRange {
                axis: self.axis,
                index,
                count,
                len,
            });
        }
        let pos = self.position_after(index, &Perspective::LOCAL)?;
        self.insert_run(pos, first, count, client_id, Stamp::Local(local_seq))
    }

    /// Inserts a sequenced run authored in `perspective`.
    pub fn insert_remote(
        &mut self,
        index: usize,
        first: Handle,
        count: usize,
        client_id: u64,
        seq: u64,
        perspective: &Perspective,
    ) -> Result<Vec<Handle>, TrackerError> {
        self.check_history(perspective)?;
        if count == 0 {
            return Err(TrackerError::EmptyRange { axis: self.axis });
        }
        let mut pos = self.position_after(index, perspective)?;
        // Local pending runs will be sequenced after this one.
        while pos < self.order.len() && self.slot(&self.order[pos]).is_pending_insert() {
            pos += 1;
        }
        self.insert_run(pos, first, count, client_id, Stamp::Acked(seq))
    }

    fn insert_run(
        &mut self,
        pos: usize,
        first: Handle,
        count: usize,
        client_id: u64,
        stamp: Stamp,
    ) -> Result<Vec<Handle>, TrackerError> {
        let handles = clock::run(first, count);
        if let Some(dup) = handles.iter().find(|h| self.slots.contains_key(*h)) {
            return Err(TrackerError::DuplicateHandle(*dup));
        }
        for handle in &handles {
            self.slots.insert(*handle, Slot::new(stamp, client_id));
        }
        self.order.splice(pos..pos, handles.iter().copied());
        Ok(handles)
    }

    // ── Removal ──────────────────────────────────────────────────────────

    /// Removes `count` locally visible entries starting at `index`.
    pub fn remove_local(
        &mut self,
        index: usize,
        count: usize,
        client_id: u64,
        local_seq: u64,
    ) -> Result<Vec<Handle>, TrackerError> {
        if count == 0 {
            return Err(TrackerError::EmptyRange { axis: self.axis });
        }
        let len = self.len();
        if index + count > len {
            return Err(TrackerError::OutOfRange {
                axis: self.axis,
                index,
                count,
                len,
            });
        }
        let handles = self.visible_range(index, count, &Perspective::LOCAL);
        self.mark_removed(&handles, client_id, Stamp::Local(local_seq));
        Ok(handles)
    }

    /// Removes specific handles as a local pending op. Handles that are
    /// already gone from the local view are skipped; the ones actually
    /// removed are returned.
    pub fn remove_handles_local(
        &mut self,
        handles: &[Handle],
        client_id: u64,
        local_seq: u64,
    ) -> Vec<Handle> {
        let live: Vec<Handle> = handles
            .iter()
            .filter(|h| {
                self.slots
                    .get(*h)
                    .map_or(false, |slot| slot.visible(&Perspective::LOCAL))
            })
            .copied()
            .collect();
        self.mark_removed(&live, client_id, Stamp::Local(local_seq));
        live
    }

    /// Removes a sequenced range authored in `perspective`. Entries past the
    /// end of that view are ignored.
    pub fn remove_remote(
        &mut self,
        index: usize,
        count: usize,
        client_id: u64,
        seq: u64,
        perspective: &Perspective,
    ) -> Result<Vec<Handle>, TrackerError> {
        self.check_history(perspective)?;
        let handles = self.visible_range(index, count, perspective);
        if handles.len() < count {
            tracing::debug!(
                axis = %self.axis,
                index,
                count,
                removed = handles.len(),
                seq,
                "remote removal extends past the end of its view"
            );
        }
        self.mark_removed(&handles, client_id, Stamp::Acked(seq));
        Ok(handles)
    }

    fn mark_removed(&mut self, handles: &[Handle], client_id: u64, stamp: Stamp) {
        for handle in handles {
            if let Some(slot) = self.slots.get_mut(handle) {
                slot.removals.push(Removal { client_id, stamp });
            }
        }
    }

    // ── Acknowledgment ───────────────────────────────────────────────────

    pub fn ack_insert(&mut self, handles: &[Handle], seq: u64) {
        for handle in handles {
            if let Some(slot) = self.slots.get_mut(handle) {
                slot.inserted = Stamp::Acked(seq);
            }
        }
    }

    pub fn ack_removal(&mut self, handles: &[Handle], client_id: u64, local_seq: u64, seq: u64) {
        for handle in handles {
            if let Some(slot) = self.slots.get_mut(handle) {
                for removal in &mut slot.removals {
                    if removal.client_id == client_id && removal.stamp == Stamp::Local(local_seq) {
                        removal.stamp = Stamp::Acked(seq);
                    }
                }
            }
        }
    }

    /// Forgets a local pending removal that will never be submitted.
    pub fn discard_removal(&mut self, handles: &[Handle], client_id: u64, local_seq: u64) {
        for handle in handles {
            if let Some(slot) = self.slots.get_mut(handle) {
                slot.removals
                    .retain(|r| !(r.client_id == client_id && r.stamp == Stamp::Local(local_seq)));
            }
        }
    }

    /// Forgets a local pending insertion that will never be submitted.
    pub fn discard_insert(&mut self, handles: &[Handle]) {
        let gone: HashSet<Handle> = handles
            .iter()
            .filter(|h| self.slots.get(*h).map_or(false, |s| s.is_pending_insert()))
            .copied()
            .collect();
        self.order.retain(|h| !gone.contains(h));
        self.slots.retain(|h, _| !gone.contains(h));
    }

    // ── Resubmission ─────────────────────────────────────────────────────

    /// Prepares the pending run `handles` (local sequence `local_seq`) for
    /// submission at the current reference point and returns its index there.
    ///
    /// Receivers place the run immediately after the `index`-th entry they
    /// can see. If anything other than later pending runs now separates the
    /// run from that entry locally (typically the run's original neighbour,
    /// removed since), the run is moved so that both sides agree.
    pub fn relocate_run(&mut self, handles: &[Handle], local_seq: u64) -> Result<usize, TrackerError> {
        let perspective = Perspective::before(local_seq);
        let first = *handles
            .first()
            .ok_or(TrackerError::EmptyRange { axis: self.axis })?;
        let pos = self
            .position_of(first)
            .ok_or(TrackerError::UnknownHandle(first))?;
        let index = self.visible_before(pos, &perspective);
        let anchor_end = self.position_after(index, &perspective)?;
        let blocked = self.order[anchor_end..pos]
            .iter()
            .any(|h| !self.slot(h).is_later_pending(local_seq));
        if blocked {
            // Later local inserts may sit inside the run; they move with it.
            let last = handles[handles.len() - 1];
            let end = self
                .position_of(last)
                .ok_or(TrackerError::UnknownHandle(last))?;
            let block: Vec<Handle> = self.order.drain(pos..=end).collect();
            let target = self.position_after(index, &perspective)?;
            self.order.splice(target..target, block);
            tracing::debug!(
                axis = %self.axis,
                first = %first,
                index,
                "moved pending run next to its anchor before resubmission"
            );
        }
        Ok(index)
    }

    // ── Compaction ───────────────────────────────────────────────────────

    /// Drops tombstones that every reference point at or above `min_seq`
    /// already sees as removed, and raises the translation floor.
    pub fn compact(&mut self, min_seq: u64) -> Vec<Handle> {
        if min_seq <= self.floor {
            return Vec::new();
        }
        self.floor = min_seq;
        let dropped: Vec<Handle> = self
            .order
            .iter()
            .filter(|h| self.slot(h).is_collectable(min_seq))
            .copied()
            .collect();
        if !dropped.is_empty() {
            let gone: HashSet<Handle> = dropped.iter().copied().collect();
            self.order.retain(|h| !gone.contains(h));
            self.slots.retain(|h, _| !gone.contains(h));
            tracing::debug!(axis = %self.axis, min_seq, dropped = dropped.len(), "compacted tombstones");
        }
        dropped
    }

    // ── Snapshot support ─────────────────────────────────────────────────

    /// Sequenced slots in order, with local pending effects stripped.
    pub(crate) fn acked_slots(&self) -> Vec<(Handle, Slot)> {
        self.order
            .iter()
            .filter_map(|handle| {
                let slot = self.slot(handle);
                let Stamp::Acked(_) = slot.inserted else {
                    return None;
                };
                let mut slot = slot.clone();
                slot.removals.retain(|r| matches!(r.stamp, Stamp::Acked(_)));
                Some((*handle, slot))
            })
            .collect()
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn slot(&self, handle: &Handle) -> &Slot {
        &self.slots[handle]
    }

    fn position_of(&self, handle: Handle) -> Option<usize> {
        self.order.iter().position(|h| *h == handle)
    }

    fn check_history(&self, perspective: &Perspective) -> Result<(), TrackerError> {
        if let Perspective::Remote { ref_seq, .. } = *perspective {
            if ref_seq < self.floor {
                return Err(TrackerError::HistoryUnavailable {
                    ref_seq,
                    floor: self.floor,
                });
            }
        }
        Ok(())
    }

    fn visible_count(&self, perspective: &Perspective) -> usize {
        self.visible_before(self.order.len(), perspective)
    }

    fn visible_before(&self, pos: usize, perspective: &Perspective) -> usize {
        self.order[..pos]
            .iter()
            .filter(|h| self.slot(h).visible(perspective))
            .count()
    }

    /// Position in `order` right after the `index`-th visible entry.
    fn position_after(&self, index: usize, perspective: &Perspective) -> Result<usize, TrackerError> {
        if index == 0 {
            return Ok(0);
        }
        let mut seen = 0;
        for (pos, handle) in self.order.iter().enumerate() {
            if self.slot(handle).visible(perspective) {
                seen += 1;
                if seen == index {
                    return Ok(pos + 1);
                }
            }
        }
        Err(TrackerError::OutOfRange {
            axis: self.axis,
            index,
            count: 0,
            len: seen,
        })
    }

    fn visible_range(&self, index: usize, count: usize, perspective: &Perspective) -> Vec<Handle> {
        self.order
            .iter()
            .filter(|h| self.slot(h).visible(perspective))
            .skip(index)
            .take(count)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::handle;

    const ME: u64 = 100_000;
    const A: u64 = 200_000;
    const B: u64 = 300_000;

    /// A vector holding `n` sequenced rows authored by `A` at seq 1.
    fn acked(n: usize) -> PermutationVector {
        let mut v = PermutationVector::new(Axis::Rows);
        v.insert_remote(0, handle(A, 0), n, A, 1, &Perspective::remote(0, A))
            .unwrap();
        v
    }

    #[test]
    fn local_insert_shifts_later_indices() {
        let mut v = acked(2);
        let new = v.insert_local(1, handle(ME, 0), 2, ME, 1).unwrap();
        assert_eq!(new, vec![handle(ME, 0), handle(ME, 1)]);
        assert_eq!(
            v.handles(),
            vec![handle(A, 0), handle(ME, 0), handle(ME, 1), handle(A, 1)]
        );
        assert_eq!(v.resolve(handle(A, 1)), Resolved::Index(3));
    }

    #[test]
    fn local_bounds_are_checked_at_call_time() {
        let mut v = acked(2);
        assert!(matches!(
            v.insert_local(3, handle(ME, 0), 1, ME, 1),
            Err(TrackerError::OutOfRange { len: 2, .. })
        ));
        assert!(matches!(
            v.remove_local(1, 2, ME, 1),
            Err(TrackerError::OutOfRange { .. })
        ));
        assert!(matches!(
            v.remove_local(0, 0, ME, 1),
            Err(TrackerError::EmptyRange { .. })
        ));
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn later_sequenced_concurrent_insert_goes_left() {
        let mut v = PermutationVector::new(Axis::Rows);
        v.insert_remote(0, handle(A, 0), 1, A, 1, &Perspective::remote(0, A))
            .unwrap();
        v.insert_remote(0, handle(B, 0), 1, B, 2, &Perspective::remote(0, B))
            .unwrap();
        assert_eq!(v.handles(), vec![handle(B, 0), handle(A, 0)]);
    }

    #[test]
    fn remote_insert_lands_after_local_pending_run() {
        let mut v = acked(1);
        v.insert_local(1, handle(ME, 0), 1, ME, 1).unwrap();
        v.insert_remote(1, handle(B, 0), 1, B, 2, &Perspective::remote(1, B))
            .unwrap();
        assert_eq!(v.handles(), vec![handle(A, 0), handle(ME, 0), handle(B, 0)]);
    }

    #[test]
    fn translate_uses_the_authors_view() {
        let mut v = acked(2);
        v.remove_remote(0, 1, B, 2, &Perspective::remote(1, B)).unwrap();
        assert_eq!(v.handles(), vec![handle(A, 1)]);

        // An op authored before the removal still sees both rows.
        let stale = Perspective::remote(1, A);
        assert_eq!(v.translate(0, &stale).unwrap(), handle(A, 0));
        assert_eq!(v.translate(1, &stale).unwrap(), handle(A, 1));
        assert_eq!(
            v.translate_live(0, &stale),
            Err(TrackerError::StaleHandle(handle(A, 0)))
        );
        // The remover sees its own removal even with an old reference point.
        assert_eq!(v.translate(0, &Perspective::remote(1, B)).unwrap(), handle(A, 1));
    }

    #[test]
    fn concurrent_removals_are_both_recorded() {
        let mut v = acked(3);
        v.remove_remote(1, 1, A, 2, &Perspective::remote(1, A)).unwrap();
        v.remove_remote(1, 1, B, 3, &Perspective::remote(1, B)).unwrap();
        assert_eq!(v.len(), 2);
        // B's later op still authored against seq 1 must not see the row it removed.
        assert_eq!(v.translate(1, &Perspective::remote(1, B)).unwrap(), handle(A, 2));
    }

    #[test]
    fn remote_removal_past_the_end_is_clamped() {
        let mut v = acked(2);
        let removed = v
            .remove_remote(1, 5, B, 2, &Perspective::remote(1, B))
            .unwrap();
        assert_eq!(removed, vec![handle(A, 1)]);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn acknowledgment_converts_local_stamps() {
        let mut v = acked(1);
        let rows = v.insert_local(0, handle(ME, 0), 1, ME, 1).unwrap();
        v.ack_insert(&rows, 2);
        let removed = v.remove_local(0, 1, ME, 2).unwrap();
        assert_eq!(removed, rows);
        assert!(!v.is_removed_acked(rows[0]));
        v.ack_removal(&removed, ME, 2, 3);
        assert!(v.is_removed_acked(rows[0]));
        assert_eq!(v.translate(0, &Perspective::remote(2, B)).unwrap(), rows[0]);
        assert_eq!(v.translate(0, &Perspective::remote(3, B)).unwrap(), handle(A, 0));
    }

    #[test]
    fn relocation_is_a_no_op_for_an_undisturbed_run() {
        let mut v = acked(1);
        let y = v.insert_local(1, handle(ME, 0), 1, ME, 1).unwrap();
        let w = v.insert_local(1, handle(ME, 1), 1, ME, 2).unwrap();
        assert_eq!(v.handles(), vec![handle(A, 0), w[0], y[0]]);
        assert_eq!(v.relocate_run(&y, 1).unwrap(), 1);
        assert_eq!(v.relocate_run(&w, 2).unwrap(), 1);
        assert_eq!(v.handles(), vec![handle(A, 0), w[0], y[0]]);
    }

    #[test]
    fn relocation_moves_run_ahead_of_removed_anchor() {
        let mut v = acked(2);
        let y = v.insert_local(2, handle(ME, 0), 1, ME, 1).unwrap();
        v.remove_remote(1, 1, B, 2, &Perspective::remote(1, B)).unwrap();
        assert_eq!(v.relocate_run(&y, 1).unwrap(), 1);
        assert_eq!(v.order, vec![handle(A, 0), y[0], handle(A, 1)]);
    }

    #[test]
    fn compaction_drops_old_tombstones_and_raises_floor() {
        let mut v = acked(3);
        v.remove_remote(0, 1, B, 2, &Perspective::remote(1, B)).unwrap();
        v.remove_remote(0, 1, B, 5, &Perspective::remote(4, B)).unwrap();
        let dropped = v.compact(3);
        assert_eq!(dropped, vec![handle(A, 0)]);
        assert_eq!(v.slot_count(), 2);
        assert_eq!(v.floor(), 3);
        assert!(matches!(
            v.translate(0, &Perspective::remote(2, A)),
            Err(TrackerError::HistoryUnavailable { ref_seq: 2, floor: 3 })
        ));
        assert!(v.compact(3).is_empty());
    }

    #[test]
    fn pending_local_removal_blocks_compaction() {
        let mut v = acked(1);
        v.remove_local(0, 1, ME, 1).unwrap();
        v.remove_remote(0, 1, B, 2, &Perspective::remote(1, B)).unwrap();
        assert!(v.compact(2).is_empty());
        v.ack_removal(&[handle(A, 0)], ME, 1, 3);
        assert_eq!(v.compact(3), vec![handle(A, 0)]);
    }

    #[test]
    fn acked_slots_strip_local_effects() {
        let mut v = acked(2);
        v.insert_local(0, handle(ME, 0), 1, ME, 1).unwrap();
        v.remove_local(1, 1, ME, 2).unwrap();
        let slots = v.acked_slots();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|(_, s)| s.removals.is_empty()));
    }

    #[test]
    fn discarding_an_insert_forgets_the_run() {
        let mut v = acked(1);
        let rows = v.insert_local(0, handle(ME, 0), 2, ME, 1).unwrap();
        v.discard_insert(&rows);
        assert_eq!(v.handles(), vec![handle(A, 0)]);
        assert!(!v.contains(rows[0]));
    }
}
