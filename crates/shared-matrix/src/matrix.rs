//! The collaborative matrix client.

use serde_json::Value;

use crate::cells::CellStore;
use crate::config::MatrixOptions;
use crate::error::MatrixError;
use crate::is_valid_session_id;
use crate::operations::{Axis, MatrixOp, OpId, SequencedMessage, StashedOp};
use crate::pending::{PendingEntry, PendingOp, PendingQueue};
use crate::reconcile::{self, DeliveryLog};
use crate::resubmit::{self, StashEdit};
use crate::session::{ConnectionState, SessionContext};
use crate::snapshot::Snapshot;
use crate::tracker::{Perspective, PositionTracker, Resolved};
use crate::Handle;

/// Outbound side of the connection to the sequencer.
///
/// Submission is fire-and-forget: the operation comes back, sequenced,
/// through [`SharedMatrix::process`] with `metadata` as its local metadata.
pub trait Transport {
    fn submit(&mut self, op: &MatrixOp, metadata: OpId);
}

/// Records submissions in memory.
impl Transport for Vec<(MatrixOp, OpId)> {
    fn submit(&mut self, op: &MatrixOp, metadata: OpId) {
        self.push((op.clone(), metadata));
    }
}

/// One client's replica of a shared matrix.
#[derive(Debug)]
pub struct SharedMatrix<T: Transport> {
    options: MatrixOptions,
    ctx: SessionContext,
    tracker: PositionTracker,
    cells: CellStore,
    pending: PendingQueue,
    delivered: DeliveryLog,
    transport: T,
}

impl<T: Transport> SharedMatrix<T> {
    /// Creates an empty, disconnected client.
    pub fn new(options: MatrixOptions, transport: T) -> Result<Self, MatrixError> {
        if !is_valid_session_id(options.session_id) {
            return Err(MatrixError::InvalidSessionId(options.session_id));
        }
        Ok(Self {
            ctx: SessionContext::new(options.session_id),
            options,
            tracker: PositionTracker::new(),
            cells: CellStore::new(),
            pending: PendingQueue::new(),
            delivered: DeliveryLog::new(),
            transport,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn client_id(&self) -> u64 {
        self.ctx.client_id
    }

    pub fn state(&self) -> ConnectionState {
        self.ctx.state
    }

    pub fn options(&self) -> &MatrixOptions {
        &self.options
    }

    /// Sequence number of the last processed message.
    pub fn last_sequence_number(&self) -> u64 {
        self.ctx.last_seq
    }

    pub fn minimum_sequence_number(&self) -> u64 {
        self.ctx.min_seq
    }

    /// Number of local operations not yet acknowledged.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Lowest reference sequence number this client may still submit with:
    /// that of its oldest in-flight operation, else the last processed
    /// sequence number. The minimum sequence number must not pass it.
    pub fn reference_floor(&self) -> u64 {
        self.pending
            .iter()
            .filter_map(|entry| entry.sent.as_ref())
            .map(|op| op.ref_seq)
            .fold(self.ctx.last_seq, u64::min)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn row_count(&self) -> usize {
        self.tracker.len(Axis::Rows)
    }

    pub fn col_count(&self) -> usize {
        self.tracker.len(Axis::Cols)
    }

    /// Value at `(row, col)` in the local view; `None` for empty cells and
    /// indices out of range.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Value> {
        let r = self.row_handle(row)?;
        let c = self.col_handle(col)?;
        self.cells.get(r, c)
    }

    pub fn row_handle(&self, index: usize) -> Option<Handle> {
        self.tracker.vector(Axis::Rows).handle_at(index)
    }

    pub fn col_handle(&self, index: usize) -> Option<Handle> {
        self.tracker.vector(Axis::Cols).handle_at(index)
    }

    pub fn resolve(&self, axis: Axis, handle: Handle) -> Resolved {
        self.tracker.resolve(axis, handle)
    }

    /// The local view as an array of rows; empty cells are `null`.
    pub fn to_json(&self) -> Value {
        let rows = self.tracker.vector(Axis::Rows).handles();
        let cols = self.tracker.vector(Axis::Cols).handles();
        Value::Array(
            rows.iter()
                .map(|r| {
                    Value::Array(
                        cols.iter()
                            .map(|c| self.cells.get(*r, *c).cloned().unwrap_or(Value::Null))
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    // ── Local edits ──────────────────────────────────────────────────────

    pub fn insert_rows(&mut self, index: usize, count: usize) -> Result<Vec<Handle>, MatrixError> {
        self.insert(Axis::Rows, index, count).map(|(_, handles)| handles)
    }

    pub fn insert_cols(&mut self, index: usize, count: usize) -> Result<Vec<Handle>, MatrixError> {
        self.insert(Axis::Cols, index, count).map(|(_, handles)| handles)
    }

    pub fn remove_rows(&mut self, index: usize, count: usize) -> Result<Vec<Handle>, MatrixError> {
        self.remove(Axis::Rows, index, count)
    }

    pub fn remove_cols(&mut self, index: usize, count: usize) -> Result<Vec<Handle>, MatrixError> {
        self.remove(Axis::Cols, index, count)
    }

    /// Writes `value` to `(row, col)`. `Value::Null` clears the cell.
    pub fn set_cell(&mut self, row: usize, col: usize, value: Value) -> Result<OpId, MatrixError> {
        let r = self.tracker.translate(Axis::Rows, row, &Perspective::LOCAL)?;
        let c = self.tracker.translate(Axis::Cols, col, &Perspective::LOCAL)?;
        self.set_cell_at(r, c, value)
    }

    fn insert(&mut self, axis: Axis, index: usize, count: usize) -> Result<(OpId, Vec<Handle>), MatrixError> {
        let first = self.ctx.clock.now();
        let local_seq = self.ctx.next_local_seq();
        let handles = self
            .tracker
            .insert(axis, index, first, count, self.ctx.client_id, local_seq)?;
        self.ctx.allocate(count);
        let op_id = self.enqueue(local_seq, PendingOp::Insert { axis, first, count })?;
        Ok((op_id, handles))
    }

    fn remove(&mut self, axis: Axis, index: usize, count: usize) -> Result<Vec<Handle>, MatrixError> {
        let local_seq = self.ctx.next_local_seq();
        let handles = self
            .tracker
            .remove(axis, index, count, self.ctx.client_id, local_seq)?;
        self.enqueue(
            local_seq,
            PendingOp::Remove {
                axis,
                handles: handles.clone(),
            },
        )?;
        Ok(handles)
    }

    fn remove_handles(&mut self, axis: Axis, handles: &[Handle]) -> Result<OpId, MatrixError> {
        let local_seq = self.ctx.next_local_seq();
        let handles = self
            .tracker
            .vector_mut(axis)
            .remove_handles_local(handles, self.ctx.client_id, local_seq);
        self.enqueue(local_seq, PendingOp::Remove { axis, handles })
    }

    fn set_cell_at(&mut self, row: Handle, col: Handle, value: Value) -> Result<OpId, MatrixError> {
        let local_seq = self.ctx.next_local_seq();
        self.cells.set_local(row, col, value.clone(), local_seq);
        self.enqueue(local_seq, PendingOp::SetCell { row, col, value })
    }

    fn enqueue(&mut self, local_seq: u64, op: PendingOp) -> Result<OpId, MatrixError> {
        let op_id = self.ctx.next_op_id();
        let entry = PendingEntry {
            op_id,
            local_seq,
            ref_seq: self.ctx.last_seq,
            op,
            sent: None,
        };
        self.dispatch(entry)?;
        Ok(op_id)
    }

    /// Queues `entry`, submitting it right away when connected.
    fn dispatch(&mut self, entry: PendingEntry) -> Result<(), MatrixError> {
        self.ctx.initialized = true;
        if self.ctx.is_connected() {
            self.submit(entry)
        } else {
            self.pending.push(entry);
            Ok(())
        }
    }

    fn submit(&mut self, entry: PendingEntry) -> Result<(), MatrixError> {
        let entries = if entry.is_submitted() {
            // The earlier submission may still be sequenced; resend it as is.
            tracing::debug!(
                client_id = self.ctx.client_id,
                op_id = %entry.op_id,
                ref_seq = entry.ref_seq,
                "resending in-flight op"
            );
            vec![entry]
        } else {
            resubmit::regenerate(&mut self.ctx, &mut self.tracker, &mut self.cells, entry)?
        };
        for entry in entries {
            if let Some(op) = &entry.sent {
                self.transport.submit(op, entry.op_id);
            }
            self.pending.push(entry);
        }
        Ok(())
    }

    /// Abandons the most recent local edit, which must not have been submitted yet.
    pub fn abandon_last(&mut self) -> Result<OpId, MatrixError> {
        let entry = self.pending.pop_last_unsubmitted()?;
        let client_id = self.ctx.client_id;
        match &entry.op {
            PendingOp::Insert { axis, .. } => {
                self.tracker.vector_mut(*axis).discard_insert(&entry.op.inserted());
            }
            PendingOp::Remove { axis, handles } => {
                self.tracker
                    .vector_mut(*axis)
                    .discard_removal(handles, client_id, entry.local_seq);
            }
            PendingOp::SetCell { row, col, .. } => {
                self.cells.abandon_local(*row, *col, entry.local_seq);
            }
        }
        tracing::debug!(client_id, op_id = %entry.op_id, kind = entry.op.kind(), "abandoned local op");
        Ok(entry.op_id)
    }

    // ── Sequenced stream ─────────────────────────────────────────────────

    /// Processes the next sequenced message.
    ///
    /// `local` marks an echo of this client's own submission, in which case
    /// `metadata` must carry the [`OpId`] it was submitted with. A resent copy
    /// of an operation that was already sequenced only advances the sequence
    /// number.
    pub fn process(
        &mut self,
        message: &SequencedMessage,
        local: bool,
        metadata: Option<OpId>,
    ) -> Result<(), MatrixError> {
        reconcile::check_sequence(&self.ctx, message)?;
        let seq = message.sequence_number;
        let local_id = if local {
            Some(metadata.ok_or(MatrixError::MissingLocalMetadata(seq))?)
        } else {
            None
        };
        if !self.delivered.record(message) {
            tracing::debug!(
                client_id = self.ctx.client_id,
                author = message.client_id,
                op_id = %message.contents.id,
                seq,
                "skipping copy of an already sequenced op"
            );
        } else if let Some(op_id) = local_id {
            match self.pending.acknowledge(op_id) {
                Ok(entry) => {
                    reconcile::acknowledge(&self.ctx, &mut self.tracker, &mut self.cells, &entry, seq)
                }
                Err(MatrixError::DuplicateAcknowledgment(op_id)) => {
                    tracing::debug!(client_id = self.ctx.client_id, %op_id, seq, "ignoring echo with no pending entry");
                }
                Err(err) => return Err(err),
            }
        } else {
            reconcile::apply_remote(&mut self.tracker, &mut self.cells, message)?;
        }
        self.ctx.advance(seq, message.minimum_sequence_number);
        self.ctx.initialized = true;
        self.delivered.prune(self.ctx.min_seq);
        if self.options.compact_on_sequence {
            self.compact();
        }
        Ok(())
    }

    /// Drops history below the minimum sequence number.
    pub fn compact(&mut self) {
        let (rows, cols) = self.tracker.compact(self.ctx.min_seq);
        let purged = self.cells.purge(&rows, &cols);
        if purged > 0 {
            tracing::debug!(client_id = self.ctx.client_id, purged, "purged cells of compacted slots");
        }
    }

    // ── Connection ───────────────────────────────────────────────────────

    /// Enters the connected state and submits every pending operation in
    /// order.
    ///
    /// Operations still in flight from an earlier connection are resent
    /// exactly as first submitted: whichever copy is sequenced first takes
    /// effect on every replica and later copies are skipped. Operations
    /// authored while disconnected are rendered against the current reference
    /// point. Processing the messages sequenced in the meantime first avoids
    /// resending operations that already made it. Does nothing when already
    /// connected.
    pub fn connect(&mut self) -> Result<(), MatrixError> {
        if self.ctx.is_connected() {
            tracing::debug!(client_id = self.ctx.client_id, "already connected");
            return Ok(());
        }
        self.ctx.transition(ConnectionState::Resubmitting);
        let entries = self.pending.take_all();
        tracing::debug!(
            client_id = self.ctx.client_id,
            pending = entries.len(),
            ref_seq = self.ctx.last_seq,
            "resubmitting pending ops"
        );
        let mut remaining = entries.into_iter();
        while let Some(entry) = remaining.next() {
            let held = entry.clone();
            if let Err(err) = self.submit(entry) {
                self.pending.push(held);
                remaining.for_each(|e| self.pending.push(e));
                self.ctx.transition(ConnectionState::Disconnected);
                return Err(err);
            }
        }
        self.ctx.transition(ConnectionState::Connected);
        Ok(())
    }

    /// Stops submitting. Local edits keep queueing until the next [`connect`](Self::connect).
    pub fn disconnect(&mut self) {
        self.ctx.transition(ConnectionState::Disconnected);
    }

    // ── Snapshots and stash ──────────────────────────────────────────────

    /// Captures the sequenced state. Pending local edits are not included.
    pub fn summarize(&self) -> (Snapshot, u64) {
        let mut snapshot = Snapshot::capture(self.ctx.last_seq, self.ctx.min_seq, &self.tracker, &self.cells);
        snapshot.delivered = self.delivered.records();
        (snapshot, self.ctx.last_seq)
    }

    /// Initializes this client from a snapshot. Only allowed before any edit
    /// or processed message, and only once.
    pub fn load(&mut self, snapshot: &Snapshot) -> Result<(), MatrixError> {
        if self.ctx.initialized {
            return Err(MatrixError::AlreadyLoaded);
        }
        let (tracker, cells) = snapshot.restore()?;
        for record in snapshot.rows.iter().chain(&snapshot.cols) {
            self.ctx.clock.observe(record.id, 1);
        }
        let delivered = DeliveryLog::from_records(&snapshot.delivered);
        if let Some(op_id) = delivered.last_op_id(self.ctx.client_id) {
            self.ctx.observe_op_id(op_id);
        }
        self.tracker = tracker;
        self.cells = cells;
        self.delivered = delivered;
        self.ctx.last_seq = snapshot.sequence_number;
        self.ctx.min_seq = snapshot.minimum_sequence_number;
        self.ctx.initialized = true;
        tracing::debug!(
            client_id = self.ctx.client_id,
            seq = snapshot.sequence_number,
            rows = snapshot.rows.len(),
            cols = snapshot.cols.len(),
            cells = snapshot.cells.len(),
            "loaded snapshot"
        );
        Ok(())
    }

    /// Decodes a binary snapshot, bounded by [`MatrixOptions::max_snapshot_size`], and loads it.
    pub fn load_binary(&mut self, data: &[u8]) -> Result<(), MatrixError> {
        let snapshot = Snapshot::from_binary(data, self.options.max_snapshot_size)?;
        self.load(&snapshot)
    }

    /// Re-enters an operation from an earlier session that never reached the
    /// sequencer, as if it had just been authored here.
    pub fn apply_stashed_op(&mut self, stashed: &StashedOp) -> Result<OpId, MatrixError> {
        if self.ctx.stash_applied {
            return Err(MatrixError::StashAlreadyApplied);
        }
        let edit = resubmit::interpret_stash(&self.ctx, &self.tracker, stashed)?;
        let op_id = match edit {
            StashEdit::Insert { axis, index, count } => self.insert(axis, index, count)?.0,
            StashEdit::Remove { axis, handles } => self.remove_handles(axis, &handles)?,
            StashEdit::SetCell { row, col, value } => self.set_cell_at(row, col, value)?,
        };
        self.ctx.stash_applied = true;
        tracing::debug!(
            client_id = self.ctx.client_id,
            author = stashed.client_id,
            %op_id,
            kind = stashed.op.content.kind(),
            "applied stashed op"
        );
        Ok(op_id)
    }

    /// Pending operations that were never submitted, in the form another
    /// session can pass to [`apply_stashed_op`](Self::apply_stashed_op).
    pub fn stashed_ops(&self) -> Vec<StashedOp> {
        self.pending
            .iter()
            .filter(|entry| !entry.is_submitted())
            .flat_map(|entry| {
                resubmit::plan(&self.tracker, entry)
                    .into_iter()
                    .map(move |content| (entry.op_id, content))
            })
            .map(|(id, content)| StashedOp {
                client_id: self.ctx.client_id,
                op: MatrixOp {
                    id,
                    ref_seq: self.ctx.last_seq,
                    content,
                },
            })
            .collect()
    }
}
