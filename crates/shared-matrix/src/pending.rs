//! Queue of local operations awaiting acknowledgment.
//!
//! Entries hold resolved handles, never indices, so their wire content can be
//! regenerated against whatever the matrix looks like when they are
//! (re)submitted.

use std::collections::VecDeque;

use serde_json::Value;

use crate::clock::{self, Handle};
use crate::error::MatrixError;
use crate::operations::{Axis, MatrixOp, OpId};

/// What a pending operation does, in terms of handles.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    Insert {
        axis: Axis,
        first: Handle,
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

impl PendingOp {
    pub fn kind(&self) -> &'static str {
        match self {
            PendingOp::Insert { axis: Axis::Rows, .. } => "insert_rows",
            PendingOp::Insert { axis: Axis::Cols, .. } => "insert_cols",
            PendingOp::Remove { axis: Axis::Rows, .. } => "remove_rows",
            PendingOp::Remove { axis: Axis::Cols, .. } => "remove_cols",
            PendingOp::SetCell { .. } => "set_cell",
        }
    }

    /// Handles of an inserted run.
    pub fn inserted(&self) -> Vec<Handle> {
        match self {
            PendingOp::Insert { first, count, .. } => clock::run(*first, *count),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub op_id: OpId,
    /// Position of the edit among this client's local edits. Entries split
    /// from one edit during resubmission share it.
    pub local_seq: u64,
    /// Reference sequence number of the latest submission, or of authoring
    /// time if never submitted.
    pub ref_seq: u64,
    pub op: PendingOp,
    /// Wire form of the latest submission. Until the echo arrives that
    /// submission may still be sequenced, so any resend repeats it exactly.
    pub sent: Option<MatrixOp>,
}

impl PendingEntry {
    pub fn is_submitted(&self) -> bool {
        self.sent.is_some()
    }
}

/// Local operations in authoring order.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    entries: VecDeque<PendingEntry>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PendingEntry) {
        self.entries.push_back(entry);
    }

    /// Removes the entry for a sequenced echo.
    pub fn acknowledge(&mut self, op_id: OpId) -> Result<PendingEntry, MatrixError> {
        let at = self
            .entries
            .iter()
            .position(|e| e.op_id == op_id)
            .ok_or(MatrixError::DuplicateAcknowledgment(op_id))?;
        if at != 0 {
            tracing::debug!(%op_id, position = at, "acknowledgment skipped older pending entries");
        }
        self.entries
            .remove(at)
            .ok_or(MatrixError::DuplicateAcknowledgment(op_id))
    }

    /// Drains the whole queue in order.
    pub fn take_all(&mut self) -> Vec<PendingEntry> {
        self.entries.drain(..).collect()
    }

    /// Removes the most recent entry, provided it was never submitted.
    pub fn pop_last_unsubmitted(&mut self) -> Result<PendingEntry, MatrixError> {
        match self.entries.back() {
            None => Err(MatrixError::NothingToAbandon),
            Some(entry) if entry.is_submitted() => Err(MatrixError::AlreadySubmitted(entry.op_id)),
            Some(_) => self.entries.pop_back().ok_or(MatrixError::NothingToAbandon),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
