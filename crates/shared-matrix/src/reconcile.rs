//! Application of sequenced operations.
//!
//! Remote operations are interpreted in their author's perspective (its
//! reference sequence number plus its own sequenced ops) and applied to the
//! tracker and cell store. Echoes of local operations are matched against the
//! pending queue by [`OpId`](crate::OpId) and only flip local stamps to
//! sequenced ones. A [`DeliveryLog`] makes sure a resent copy of an operation
//! takes effect once.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::cells::CellStore;
use crate::error::{MatrixError, TrackerError};
use crate::operations::{Axis, OpContent, OpId, SequencedMessage};
use crate::pending::{PendingEntry, PendingOp};
use crate::session::SessionContext;
use crate::snapshot::DeliveryRecord;
use crate::tracker::{Perspective, PositionTracker};

/// Checks that `message` is the next message of the sequenced stream.
pub fn check_sequence(ctx: &SessionContext, message: &SequencedMessage) -> Result<(), MatrixError> {
    let expected = ctx.last_seq + 1;
    let actual = message.sequence_number;
    if actual != expected {
        tracing::error!(
            client_id = ctx.client_id,
            expected,
            actual,
            "sequenced message out of order"
        );
        return Err(MatrixError::ProtocolOrderingViolation { expected, actual });
    }
    Ok(())
}

/// Applies an operation sequenced from another client.
pub fn apply_remote(
    tracker: &mut PositionTracker,
    cells: &mut CellStore,
    message: &SequencedMessage,
) -> Result<(), MatrixError> {
    let seq = message.sequence_number;
    let author = message.client_id;
    let perspective = Perspective::remote(message.contents.ref_seq, author);
    tracing::trace!(
        seq,
        author,
        ref_seq = message.contents.ref_seq,
        kind = message.contents.content.kind(),
        "applying remote op"
    );
    match &message.contents.content {
        OpContent::InsertRows { index, count, id } => {
            tracker
                .vector_mut(Axis::Rows)
                .insert_remote(*index, *id, *count, author, seq, &perspective)?;
        }
        OpContent::InsertCols { index, count, id } => {
            tracker
                .vector_mut(Axis::Cols)
                .insert_remote(*index, *id, *count, author, seq, &perspective)?;
        }
        OpContent::RemoveRows { index, count } => {
            tracker
                .vector_mut(Axis::Rows)
                .remove_remote(*index, *count, author, seq, &perspective)?;
        }
        OpContent::RemoveCols { index, count } => {
            tracker
                .vector_mut(Axis::Cols)
                .remove_remote(*index, *count, author, seq, &perspective)?;
        }
        OpContent::SetCell { row, col, value } => {
            let target = tracker
                .vector(Axis::Rows)
                .translate_live(*row, &perspective)
                .and_then(|r| {
                    let c = tracker.vector(Axis::Cols).translate_live(*col, &perspective)?;
                    Ok((r, c))
                });
            match target {
                Ok((r, c)) => cells.set_remote(r, c, value.clone(), seq),
                Err(TrackerError::StaleHandle(gone)) => {
                    tracing::warn!(seq, author, row, col, handle = %gone, "dropping write to removed cell");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

// ── Delivery log ──────────────────────────────────────────────────────────

/// Operations sequenced so far, keyed by author and [`OpId`], with the
/// reference sequence number each was submitted at.
///
/// A client that loses its connection resends its in-flight operations
/// unchanged, so the sequencer may order two identical copies. Every replica
/// applies the first copy and skips the others. A record is dropped once the
/// minimum sequence number passes its reference point, after which no copy
/// can be sequenced.
#[derive(Debug, Clone, Default)]
pub struct DeliveryLog {
    seen: BTreeMap<(u64, OpId), u64>,
}

impl DeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message`; `false` if a copy of it was sequenced before.
    pub fn record(&mut self, message: &SequencedMessage) -> bool {
        match self.seen.entry((message.client_id, message.contents.id)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(message.contents.ref_seq);
                true
            }
        }
    }

    /// Forgets operations submitted below `min_seq`.
    pub fn prune(&mut self, min_seq: u64) {
        self.seen.retain(|_, ref_seq| *ref_seq >= min_seq);
    }

    /// Highest op id recorded for `client_id`.
    pub fn last_op_id(&self, client_id: u64) -> Option<OpId> {
        self.seen
            .range((client_id, OpId(0))..=(client_id, OpId(u64::MAX)))
            .next_back()
            .map(|((_, id), _)| *id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.seen
            .iter()
            .map(|(&(client_id, id), &ref_seq)| DeliveryRecord {
                client_id,
                id,
                ref_seq,
            })
            .collect()
    }

    pub fn from_records(records: &[DeliveryRecord]) -> Self {
        Self {
            seen: records
                .iter()
                .map(|r| ((r.client_id, r.id), r.ref_seq))
                .collect(),
        }
    }
}

/// Settles a pending entry whose echo arrived with sequence number `seq`.
pub fn acknowledge(
    ctx: &SessionContext,
    tracker: &mut PositionTracker,
    cells: &mut CellStore,
    entry: &PendingEntry,
    seq: u64,
) {
    tracing::debug!(
        client_id = ctx.client_id,
        op_id = %entry.op_id,
        seq,
        kind = entry.op.kind(),
        "local op acknowledged"
    );
    match &entry.op {
        PendingOp::Insert { axis, .. } => {
            tracker.vector_mut(*axis).ack_insert(&entry.op.inserted(), seq);
        }
        PendingOp::Remove { axis, handles } => {
            tracker
                .vector_mut(*axis)
                .ack_removal(handles, ctx.client_id, entry.local_seq, seq);
        }
        PendingOp::SetCell { row, col, .. } => {
            let live = !tracker.vector(Axis::Rows).is_removed_acked(*row)
                && !tracker.vector(Axis::Cols).is_removed_acked(*col);
            cells.ack_local(*row, *col, entry.local_seq, seq, live);
        }
    }
}
