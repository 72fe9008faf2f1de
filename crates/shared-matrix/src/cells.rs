//! Cell storage keyed by `(row handle, column handle)`.
//!
//! Sequenced writes follow last-sequence-wins. Local pending writes shadow the
//! sequenced value until they are acknowledged, since they will be sequenced
//! after anything already received.

use indexmap::IndexMap;
use serde_json::Value;

use crate::clock::Handle;

/// One cell: the sequenced value plus local writes awaiting acknowledgment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    acked: Option<(Value, u64)>,
    pending: Vec<(u64, Value)>,
}

impl Cell {
    /// Value in the local view. `Null` means the cell is empty.
    pub fn value(&self) -> Option<&Value> {
        let value = match self.pending.last() {
            Some((_, value)) => value,
            None => &self.acked.as_ref()?.0,
        };
        (!value.is_null()).then_some(value)
    }

    /// Sequenced value and the sequence number that wrote it.
    pub fn acked(&self) -> Option<(&Value, u64)> {
        self.acked.as_ref().map(|(v, s)| (v, *s))
    }

    fn is_vacant(&self) -> bool {
        self.acked.is_none() && self.pending.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: IndexMap<(Handle, Handle), Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: Handle, col: Handle) -> Option<&Value> {
        self.cells.get(&(row, col)).and_then(Cell::value)
    }

    pub fn cell(&self, row: Handle, col: Handle) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Number of stored cell entries, including emptied ones still carrying history.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn set_local(&mut self, row: Handle, col: Handle, value: Value, local_seq: u64) {
        self.cells
            .entry((row, col))
            .or_default()
            .pending
            .push((local_seq, value));
    }

    pub fn set_remote(&mut self, row: Handle, col: Handle, value: Value, seq: u64) {
        self.cells.entry((row, col)).or_default().acked = Some((value, seq));
    }

    /// Moves a local write to the sequenced state. With `keep == false` the
    /// write is only dropped from the pending list (its row or column was
    /// removed before it got sequenced).
    pub fn ack_local(&mut self, row: Handle, col: Handle, local_seq: u64, seq: u64, keep: bool) {
        let Some(cell) = self.cells.get_mut(&(row, col)) else {
            return;
        };
        let Some(at) = cell.pending.iter().position(|(l, _)| *l == local_seq) else {
            return;
        };
        let (_, value) = cell.pending.remove(at);
        if keep {
            cell.acked = Some((value, seq));
        }
        if cell.is_vacant() {
            self.cells.shift_remove(&(row, col));
        }
    }

    /// Forgets a local write that will never be submitted.
    pub fn abandon_local(&mut self, row: Handle, col: Handle, local_seq: u64) {
        let Some(cell) = self.cells.get_mut(&(row, col)) else {
            return;
        };
        cell.pending.retain(|(l, _)| *l != local_seq);
        if cell.is_vacant() {
            self.cells.shift_remove(&(row, col));
        }
    }

    /// Drops every cell on one of the given rows or columns.
    pub fn purge(&mut self, rows: &[Handle], cols: &[Handle]) -> usize {
        if rows.is_empty() && cols.is_empty() {
            return 0;
        }
        let before = self.cells.len();
        self.cells
            .retain(|(row, col), _| !rows.contains(row) && !cols.contains(col));
        before - self.cells.len()
    }

    /// Sequenced, non-empty values.
    pub fn acked_values(&self) -> impl Iterator<Item = (Handle, Handle, &Value, u64)> + '_ {
        self.cells.iter().filter_map(|((row, col), cell)| {
            let (value, seq) = cell.acked()?;
            (!value.is_null()).then_some((*row, *col, value, seq))
        })
    }
}
