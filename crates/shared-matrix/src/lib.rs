//! Client-side synchronization core for a collaboratively edited matrix.
//!
//! Clients insert and remove rows and columns and write cells concurrently.
//! Every operation goes through a central sequencer; the total order it
//! assigns is the only source of cross-client consistency. Rows and columns
//! are addressed internally by stable [`Handle`]s so that operations authored
//! against stale indices can be retargeted after concurrent structural edits.
//!
//! The crate is organised leaf-first:
//! - [`clock`]: handles and the logical clock that allocates them
//! - [`tracker`]: the position tracker (index ⇄ handle per axis)
//! - [`cells`]: cell values with last-sequence-wins and local shadowing
//! - [`pending`]: the queue of unacknowledged local operations
//! - [`reconcile`]: application of sequenced operations
//! - [`session`] / [`resubmit`]: connection state machine, resubmission, stash replay
//! - [`snapshot`]: summaries for late joiners
//! - [`matrix`]: the [`SharedMatrix`] client tying it all together

pub mod cells;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod fuzzer;
pub mod matrix;
pub mod operations;
pub mod pending;
pub mod reconcile;
pub mod resubmit;
pub mod session;
pub mod snapshot;
pub mod tracker;

pub use clock::Handle;
pub use config::MatrixOptions;
pub use error::{CodecError, MatrixError, SnapshotError, TrackerError};
pub use matrix::{SharedMatrix, Transport};
pub use operations::{Axis, MatrixOp, OpContent, OpId, SequencedMessage, StashedOp};
pub use session::ConnectionState;
pub use snapshot::Snapshot;
pub use tracker::{Perspective, Resolved};

use rand::Rng;

/// Minimum valid session id.
pub const MIN_SESSION_ID: u64 = 65_536;

/// Returns `true` when the provided session id is valid.
pub fn is_valid_session_id(sid: u64) -> bool {
    sid >= MIN_SESSION_ID
}

/// Generates a random session id.
pub fn generate_session_id() -> u64 {
    let mut rng = rand::thread_rng();
    rng.gen_range(MIN_SESSION_ID..=i64::MAX as u64)
}
