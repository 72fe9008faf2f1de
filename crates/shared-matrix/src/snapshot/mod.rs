//! Snapshots of the sequenced matrix state for late joiners.
//!
//! A snapshot holds every row and column slot still inside the collaboration
//! window (tombstones included, with their insertion and removal metadata),
//! every non-empty sequenced cell on a live row and column, the operations
//! whose resent copies may still be sequenced, and the sequence numbers it was
//! taken at. Local pending edits are never part of it.

mod codec;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cells::CellStore;
use crate::clock::Handle;
use crate::error::SnapshotError;
use crate::operations::{Axis, OpId};
use crate::tracker::vector::{Removal, Slot};
use crate::tracker::{PermutationVector, PositionTracker, Stamp};

pub use codec::SNAPSHOT_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalRecord {
    pub client_id: u64,
    pub seq: u64,
}

/// One row or column slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub id: Handle,
    /// Author of the insertion.
    pub client_id: u64,
    /// Sequence number of the insertion.
    pub seq: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<RemovalRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row: Handle,
    pub col: Handle,
    pub seq: u64,
    pub value: Value,
}

/// A sequenced operation, identified by author and op id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub client_id: u64,
    pub id: OpId,
    pub ref_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence_number: u64,
    pub minimum_sequence_number: u64,
    pub rows: Vec<SlotRecord>,
    pub cols: Vec<SlotRecord>,
    /// Ordered by row, then column.
    pub cells: Vec<CellRecord>,
    /// Operations submitted at or above the minimum sequence number.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivered: Vec<DeliveryRecord>,
}

impl Snapshot {
    pub(crate) fn capture(
        sequence_number: u64,
        minimum_sequence_number: u64,
        tracker: &PositionTracker,
        cells: &CellStore,
    ) -> Self {
        let rows = records(tracker.vector(Axis::Rows));
        let cols = records(tracker.vector(Axis::Cols));
        let live = |records: &[SlotRecord]| -> HashMap<Handle, usize> {
            records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.removed.is_empty())
                .map(|(i, r)| (r.id, i))
                .collect()
        };
        let row_pos = live(&rows);
        let col_pos = live(&cols);
        let mut kept: Vec<(usize, usize, CellRecord)> = cells
            .acked_values()
            .filter_map(|(row, col, value, seq)| {
                let r = *row_pos.get(&row)?;
                let c = *col_pos.get(&col)?;
                Some((
                    r,
                    c,
                    CellRecord {
                        row,
                        col,
                        seq,
                        value: value.clone(),
                    },
                ))
            })
            .collect();
        kept.sort_by_key(|(r, c, _)| (*r, *c));
        Self {
            sequence_number,
            minimum_sequence_number,
            rows,
            cols,
            cells: kept.into_iter().map(|(_, _, cell)| cell).collect(),
            delivered: Vec::new(),
        }
    }

    /// Rebuilds the tracker and cell store this snapshot describes.
    pub(crate) fn restore(&self) -> Result<(PositionTracker, CellStore), SnapshotError> {
        if self.minimum_sequence_number > self.sequence_number {
            return Err(SnapshotError::InvalidSequence {
                sequence: self.sequence_number,
                minimum: self.minimum_sequence_number,
            });
        }
        let floor = self.minimum_sequence_number;
        let rows = PermutationVector::from_slots(Axis::Rows, slots(&self.rows), floor)?;
        let cols = PermutationVector::from_slots(Axis::Cols, slots(&self.cols), floor)?;
        let mut cells = CellStore::new();
        for cell in &self.cells {
            if !rows.contains(cell.row) || !cols.contains(cell.col) {
                return Err(SnapshotError::OrphanCell {
                    row: cell.row,
                    col: cell.col,
                });
            }
            cells.set_remote(cell.row, cell.col, cell.value.clone(), cell.seq);
        }
        Ok((PositionTracker::from_vectors(rows, cols), cells))
    }

    /// Number of live rows.
    pub fn row_count(&self) -> usize {
        self.rows.iter().filter(|r| r.removed.is_empty()).count()
    }

    /// Number of live columns.
    pub fn col_count(&self) -> usize {
        self.cols.iter().filter(|c| c.removed.is_empty()).count()
    }
}

fn records(vector: &PermutationVector) -> Vec<SlotRecord> {
    vector
        .acked_slots()
        .into_iter()
        .filter_map(|(id, slot)| {
            let Stamp::Acked(seq) = slot.inserted else {
                return None;
            };
            let removed = slot
                .removals
                .iter()
                .filter_map(|r| match r.stamp {
                    Stamp::Acked(seq) => Some(RemovalRecord {
                        client_id: r.client_id,
                        seq,
                    }),
                    Stamp::Local(_) => None,
                })
                .collect();
            Some(SlotRecord {
                id,
                client_id: slot.client_id,
                seq,
                removed,
            })
        })
        .collect()
}

fn slots(records: &[SlotRecord]) -> Vec<(Handle, Slot)> {
    records
        .iter()
        .map(|r| {
            let mut slot = Slot::new(Stamp::Acked(r.seq), r.client_id);
            slot.removals = r
                .removed
                .iter()
                .map(|rm| Removal {
                    client_id: rm.client_id,
                    stamp: Stamp::Acked(rm.seq),
                })
                .collect();
            (r.id, slot)
        })
        .collect()
}
