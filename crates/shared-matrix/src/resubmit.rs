//! Regeneration of pending operations for (re)submission, and interpretation
//! of stashed operations.
//!
//! A pending entry with local sequence `k` is always rendered in the
//! perspective [`Perspective::before(k)`]: everything sequenced so far plus the
//! client's own earlier pending edits. Those earlier edits are submitted first,
//! so by the time `k` is sequenced every other client sees exactly that view.

use serde_json::Value;

use crate::cells::CellStore;
use crate::clock::Handle;
use crate::error::{MatrixError, TrackerError};
use crate::operations::{Axis, MatrixOp, OpContent, StashedOp};
use crate::pending::{PendingEntry, PendingOp};
use crate::session::SessionContext;
use crate::tracker::{PermutationVector, Perspective, PositionTracker};

// ── Rendering ─────────────────────────────────────────────────────────────

/// Contiguous runs of the still-visible `handles`, rightmost first, so that
/// applying them in order never shifts a later run's index.
fn removal_runs(
    vector: &PermutationVector,
    handles: &[Handle],
    perspective: &Perspective,
) -> Vec<(usize, Vec<Handle>)> {
    let mut visible: Vec<(usize, Handle)> = handles
        .iter()
        .filter_map(|h| vector.visible_index(*h, perspective).map(|i| (i, *h)))
        .collect();
    visible.sort_by_key(|(i, _)| *i);
    let mut runs: Vec<(usize, Vec<Handle>)> = Vec::new();
    for (index, handle) in visible {
        if let Some((start, run)) = runs.last_mut() {
            if *start + run.len() == index {
                run.push(handle);
                continue;
            }
        }
        runs.push((index, vec![handle]));
    }
    runs.reverse();
    runs
}

fn cell_target(
    tracker: &PositionTracker,
    row: Handle,
    col: Handle,
    perspective: &Perspective,
) -> Option<(usize, usize)> {
    let r = tracker.vector(Axis::Rows).visible_index(row, perspective)?;
    let c = tracker.vector(Axis::Cols).visible_index(col, perspective)?;
    Some((r, c))
}

/// Wire content `entry` would be submitted with right now, without touching
/// any state. Used to export stashed operations.
pub fn plan(tracker: &PositionTracker, entry: &PendingEntry) -> Vec<OpContent> {
    let perspective = Perspective::before(entry.local_seq);
    match &entry.op {
        PendingOp::Insert { axis, first, count } => tracker
            .vector(*axis)
            .rank(*first, &perspective)
            .map(|index| OpContent::insert(*axis, index, *count, *first))
            .into_iter()
            .collect(),
        PendingOp::Remove { axis, handles } => {
            removal_runs(tracker.vector(*axis), handles, &perspective)
                .into_iter()
                .map(|(index, run)| OpContent::remove(*axis, index, run.len()))
                .collect()
        }
        PendingOp::SetCell { row, col, value } => cell_target(tracker, *row, *col, &perspective)
            .map(|(row, col)| OpContent::SetCell {
                row,
                col,
                value: value.clone(),
            })
            .into_iter()
            .collect(),
    }
}

/// Renders a never-submitted `entry` for submission at the current reference
/// point.
///
/// Returns the entries to put back into the queue, each carrying the wire op
/// to submit. A removal whose targets are now split by concurrent edits yields
/// one entry per contiguous run; an entry with nothing left to do yields none
/// and its local effects are rolled back.
pub fn regenerate(
    ctx: &mut SessionContext,
    tracker: &mut PositionTracker,
    cells: &mut CellStore,
    entry: PendingEntry,
) -> Result<Vec<PendingEntry>, MatrixError> {
    let perspective = Perspective::before(entry.local_seq);
    let ref_seq = ctx.last_seq.max(entry.ref_seq);
    match &entry.op {
        PendingOp::Insert { axis, first, count } => {
            let handles = entry.op.inserted();
            let index = tracker
                .vector_mut(*axis)
                .relocate_run(&handles, entry.local_seq)?;
            let content = OpContent::insert(*axis, index, *count, *first);
            Ok(vec![submitted(entry, ref_seq, content)])
        }
        PendingOp::Remove { axis, handles } => {
            let axis = *axis;
            let vector = tracker.vector_mut(axis);
            let runs = removal_runs(vector, handles, &perspective);
            let kept: Vec<Handle> = runs.iter().flat_map(|(_, run)| run.iter().copied()).collect();
            let gone: Vec<Handle> = handles.iter().filter(|h| !kept.contains(h)).copied().collect();
            if !gone.is_empty() {
                vector.discard_removal(&gone, ctx.client_id, entry.local_seq);
            }
            if runs.is_empty() {
                tracing::warn!(
                    client_id = ctx.client_id,
                    op_id = %entry.op_id,
                    %axis,
                    "discarding pending removal: all targets already removed"
                );
                return Ok(Vec::new());
            }
            let mut out = Vec::with_capacity(runs.len());
            for (i, (index, run)) in runs.into_iter().enumerate() {
                let op_id = if i == 0 { entry.op_id } else { ctx.next_op_id() };
                let content = OpContent::remove(axis, index, run.len());
                out.push(submitted(
                    PendingEntry {
                        op_id,
                        local_seq: entry.local_seq,
                        ref_seq,
                        op: PendingOp::Remove { axis, handles: run },
                        sent: None,
                    },
                    ref_seq,
                    content,
                ));
            }
            Ok(out)
        }
        PendingOp::SetCell { row, col, value } => {
            match cell_target(tracker, *row, *col, &perspective) {
                Some((r, c)) => {
                    let content = OpContent::SetCell {
                        row: r,
                        col: c,
                        value: value.clone(),
                    };
                    Ok(vec![submitted(entry, ref_seq, content)])
                }
                None => {
                    tracing::warn!(
                        client_id = ctx.client_id,
                        op_id = %entry.op_id,
                        row = %row,
                        col = %col,
                        "discarding pending cell write: row or column removed"
                    );
                    cells.abandon_local(*row, *col, entry.local_seq);
                    Ok(Vec::new())
                }
            }
        }
    }
}

fn submitted(entry: PendingEntry, ref_seq: u64, content: OpContent) -> PendingEntry {
    let op = MatrixOp {
        id: entry.op_id,
        ref_seq,
        content,
    };
    PendingEntry {
        ref_seq,
        sent: Some(op),
        ..entry
    }
}

// ── Stash ─────────────────────────────────────────────────────────────────

/// A stashed operation re-expressed against the local view.
#[derive(Debug, Clone, PartialEq)]
pub enum StashEdit {
    Insert {
        axis: Axis,
        index: usize,
        count: usize,
    },
    Remove {
        axis: Axis,
        handles: Vec<Handle>,
    },
    SetCell {
        row: Handle,
        col: Handle,
        value: Value,
    },
}

/// Interprets `stashed` in its author's perspective.
///
/// If the author had seen exactly what this client has, its indices are taken
/// as local indices and bounds-checked like a fresh edit. If it had seen less,
/// they are translated through the author's view at its reference point, so
/// sequenced edits the author never saw do not retarget it. A stash authored
/// past this client's last sequence number is refused until the client has
/// caught up to it.
pub fn interpret_stash(
    ctx: &SessionContext,
    tracker: &PositionTracker,
    stashed: &StashedOp,
) -> Result<StashEdit, MatrixError> {
    let ref_seq = stashed.op.ref_seq;
    if ref_seq > ctx.last_seq {
        return Err(MatrixError::StashAhead {
            ref_seq,
            last_seq: ctx.last_seq,
        });
    }
    if ref_seq == ctx.last_seq {
        return Ok(direct(tracker, &stashed.op.content)?);
    }
    let perspective = Perspective::remote(ref_seq, stashed.client_id);
    tracing::debug!(
        client_id = ctx.client_id,
        author = stashed.client_id,
        ref_seq,
        last_seq = ctx.last_seq,
        "translating stashed op through its author's view"
    );
    let edit = match &stashed.op.content {
        OpContent::InsertRows { index, count, .. } => StashEdit::Insert {
            axis: Axis::Rows,
            index: local_insert_index(tracker.vector(Axis::Rows), *index, &perspective)?,
            count: *count,
        },
        OpContent::InsertCols { index, count, .. } => StashEdit::Insert {
            axis: Axis::Cols,
            index: local_insert_index(tracker.vector(Axis::Cols), *index, &perspective)?,
            count: *count,
        },
        OpContent::RemoveRows { index, count } => StashEdit::Remove {
            axis: Axis::Rows,
            handles: translate_range(tracker.vector(Axis::Rows), *index, *count, &perspective)?,
        },
        OpContent::RemoveCols { index, count } => StashEdit::Remove {
            axis: Axis::Cols,
            handles: translate_range(tracker.vector(Axis::Cols), *index, *count, &perspective)?,
        },
        OpContent::SetCell { row, col, value } => StashEdit::SetCell {
            row: tracker.vector(Axis::Rows).translate(*row, &perspective)?,
            col: tracker.vector(Axis::Cols).translate(*col, &perspective)?,
            value: value.clone(),
        },
    };
    Ok(edit)
}

fn direct(tracker: &PositionTracker, content: &OpContent) -> Result<StashEdit, TrackerError> {
    Ok(match content {
        OpContent::InsertRows { index, count, .. } => StashEdit::Insert {
            axis: Axis::Rows,
            index: *index,
            count: *count,
        },
        OpContent::InsertCols { index, count, .. } => StashEdit::Insert {
            axis: Axis::Cols,
            index: *index,
            count: *count,
        },
        OpContent::RemoveRows { index, count } => StashEdit::Remove {
            axis: Axis::Rows,
            handles: local_range(tracker.vector(Axis::Rows), *index, *count)?,
        },
        OpContent::RemoveCols { index, count } => StashEdit::Remove {
            axis: Axis::Cols,
            handles: local_range(tracker.vector(Axis::Cols), *index, *count)?,
        },
        OpContent::SetCell { row, col, value } => StashEdit::SetCell {
            row: tracker.translate(Axis::Rows, *row, &Perspective::LOCAL)?,
            col: tracker.translate(Axis::Cols, *col, &Perspective::LOCAL)?,
            value: value.clone(),
        },
    })
}

fn local_range(vector: &PermutationVector, index: usize, count: usize) -> Result<Vec<Handle>, TrackerError> {
    if count == 0 {
        return Err(TrackerError::EmptyRange { axis: vector.axis() });
    }
    let len = vector.len();
    if index + count > len {
        return Err(TrackerError::OutOfRange {
            axis: vector.axis(),
            index,
            count,
            len,
        });
    }
    (index..index + count)
        .map(|i| vector.translate(i, &Perspective::LOCAL))
        .collect()
}

/// Handles `[index, index + count)` in `perspective`; the range is clamped to
/// that view like a sequenced removal would be.
fn translate_range(
    vector: &PermutationVector,
    index: usize,
    count: usize,
    perspective: &Perspective,
) -> Result<Vec<Handle>, TrackerError> {
    if count == 0 {
        return Err(TrackerError::EmptyRange { axis: vector.axis() });
    }
    let mut handles = Vec::with_capacity(count);
    for i in index..index + count {
        match vector.translate(i, perspective) {
            Ok(handle) => handles.push(handle),
            Err(TrackerError::OutOfRange { .. }) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(handles)
}

/// Local index at which an insert authored at `index` in `perspective` lands:
/// right after the entry the author saw at `index - 1`.
fn local_insert_index(
    vector: &PermutationVector,
    index: usize,
    perspective: &Perspective,
) -> Result<usize, TrackerError> {
    if index == 0 {
        return Ok(0);
    }
    let anchor = vector.translate(index - 1, perspective)?;
    let local = &Perspective::LOCAL;
    match vector.visible_index(anchor, local) {
        Some(i) => Ok(i + 1),
        None => vector.rank(anchor, local).ok_or(TrackerError::UnknownHandle(anchor)),
    }
}
