//! Client configuration.

use crate::generate_session_id;

/// Largest snapshot blob accepted by the binary decoder.
pub const MAX_SNAPSHOT_SIZE: usize = 10 * 1024 * 1024;

/// Options for a [`SharedMatrix`](crate::SharedMatrix) client.
#[derive(Debug, Clone)]
pub struct MatrixOptions {
    /// Session ID of this client. Also the `sid` of every handle it creates.
    pub session_id: u64,
    /// Upper bound for binary snapshots passed to [`Snapshot::from_binary`](crate::Snapshot::from_binary).
    pub max_snapshot_size: usize,
    /// Drop tombstones as soon as the minimum sequence number passes them.
    pub compact_on_sequence: bool,
}

impl MatrixOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: u64) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_max_snapshot_size(mut self, max: usize) -> Self {
        self.max_snapshot_size = max;
        self
    }

    pub fn with_compaction(mut self, enabled: bool) -> Self {
        self.compact_on_sequence = enabled;
        self
    }
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            session_id: generate_session_id(),
            max_snapshot_size: MAX_SNAPSHOT_SIZE,
            compact_on_sequence: true,
        }
    }
}
