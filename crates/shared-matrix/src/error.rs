//! Error types.

use thiserror::Error;

use crate::clock::Handle;
use crate::operations::{Axis, OpId};

/// Failures of the position tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{axis} range {index}+{count} is out of bounds (length {len})")]
    OutOfRange {
        axis: Axis,
        index: usize,
        count: usize,
        len: usize,
    },
    #[error("{axis} operation must cover at least one entry")]
    EmptyRange { axis: Axis },
    #[error("reference sequence number {ref_seq} predates retained history (floor {floor})")]
    HistoryUnavailable { ref_seq: u64, floor: u64 },
    #[error("handle {0} has been removed")]
    StaleHandle(Handle),
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),
    #[error("duplicate handle {0}")]
    DuplicateHandle(Handle),
}

/// Failures of the wire codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty payload")]
    Empty,
    #[error("unsupported wire version: {0}")]
    UnsupportedVersion(u8),
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),
    #[error("CBOR decode failed: {0}")]
    CborDecode(String),
    #[error("JSON codec failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the snapshot loader/writer.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("empty snapshot")]
    Empty,
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),
    #[error("snapshot too large: {actual} bytes (max {max})")]
    TooLarge { actual: usize, max: usize },
    #[error("snapshot encode failed: {0}")]
    Encode(String),
    #[error("snapshot decode failed: {0}")]
    Decode(String),
    #[error("snapshot JSON failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("minimum sequence number {minimum} exceeds sequence number {sequence}")]
    InvalidSequence { sequence: u64, minimum: u64 },
    #[error("invalid structure: {0}")]
    Structure(#[from] TrackerError),
    #[error("cell ({row}, {col}) references an unknown row or column")]
    OrphanCell { row: Handle, col: Handle },
}

/// Top-level error of a [`SharedMatrix`](crate::SharedMatrix) client.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("protocol ordering violation: expected sequence number {expected}, got {actual}")]
    ProtocolOrderingViolation { expected: u64, actual: u64 },
    #[error("no pending operation matches {0}")]
    DuplicateAcknowledgment(OpId),
    #[error("local echo of sequence number {0} carries no local metadata")]
    MissingLocalMetadata(u64),
    #[error("invalid session id: {0}")]
    InvalidSessionId(u64),
    #[error("matrix state is already initialized; snapshots can only be loaded first")]
    AlreadyLoaded,
    #[error("a stashed operation has already been applied")]
    StashAlreadyApplied,
    #[error("stashed operation references sequence number {ref_seq}, ahead of {last_seq}")]
    StashAhead { ref_seq: u64, last_seq: u64 },
    #[error("{0} has already been submitted and cannot be abandoned")]
    AlreadySubmitted(OpId),
    #[error("no pending operation to abandon")]
    NothingToAbandon,
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl MatrixError {
    /// Returns `true` for errors after which the session cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MatrixError::ProtocolOrderingViolation { .. }
                | MatrixError::MissingLocalMetadata(_)
                | MatrixError::Tracker(TrackerError::HistoryUnavailable { .. })
        )
    }
}
