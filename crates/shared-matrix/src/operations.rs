//! Operation content as it travels between clients and the sequencer.
//!
//! A [`MatrixOp`] is what a client submits: the operation content, the
//! author's [`OpId`] for it and the reference sequence number it was authored
//! against. The sequencer wraps it
//! in a [`SequencedMessage`] envelope. Index-based targets are always
//! interpreted in the author's perspective at that reference point.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::clock::Handle;

/// Row or column dimension of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Rows,
    Cols,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Rows => f.write_str("rows"),
            Axis::Cols => f.write_str("cols"),
        }
    }
}

/// Client-local identifier of a pending operation. Sequenced echoes are
/// matched against the pending queue by this value, never by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// The content of a matrix operation.
///
/// Insertions carry the first [`Handle`] of the run they create; every other
/// target is an index in the author's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpContent {
    InsertRows { index: usize, count: usize, id: Handle },
    InsertCols { index: usize, count: usize, id: Handle },
    RemoveRows { index: usize, count: usize },
    RemoveCols { index: usize, count: usize },
    SetCell { row: usize, col: usize, value: Value },
}

impl OpContent {
    pub fn insert(axis: Axis, index: usize, count: usize, id: Handle) -> Self {
        match axis {
            Axis::Rows => OpContent::InsertRows { index, count, id },
            Axis::Cols => OpContent::InsertCols { index, count, id },
        }
    }

    pub fn remove(axis: Axis, index: usize, count: usize) -> Self {
        match axis {
            Axis::Rows => OpContent::RemoveRows { index, count },
            Axis::Cols => OpContent::RemoveCols { index, count },
        }
    }

    /// The axis a structural operation targets; `None` for cell writes.
    pub fn axis(&self) -> Option<Axis> {
        match self {
            OpContent::InsertRows { .. } | OpContent::RemoveRows { .. } => Some(Axis::Rows),
            OpContent::InsertCols { .. } | OpContent::RemoveCols { .. } => Some(Axis::Cols),
            OpContent::SetCell { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OpContent::InsertRows { .. } => "insert_rows",
            OpContent::InsertCols { .. } => "insert_cols",
            OpContent::RemoveRows { .. } => "remove_rows",
            OpContent::RemoveCols { .. } => "remove_cols",
            OpContent::SetCell { .. } => "set_cell",
        }
    }
}

/// An operation as submitted by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixOp {
    /// The author's id for this submission. A copy resent after a lost
    /// connection carries the same id, and receivers apply only the first
    /// copy that gets sequenced.
    pub id: OpId,
    /// Last sequence number the author had observed when producing `content`.
    pub ref_seq: u64,
    pub content: OpContent,
}

/// A sequenced operation as broadcast by the sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedMessage {
    pub sequence_number: u64,
    pub minimum_sequence_number: u64,
    /// Session ID of the author.
    pub client_id: u64,
    pub contents: MatrixOp,
}

/// An operation authored in an earlier session that never reached the
/// sequencer, recovered so a new session can submit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashedOp {
    /// Session ID of the original author.
    pub client_id: u64,
    pub op: MatrixOp,
}
