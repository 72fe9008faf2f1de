//! Structural handles and the logical clock that allocates them.
//!
//! Every row and column is identified by a [`Handle`]: the session ID of the
//! client that created it plus a logical time from that client's clock. A run
//! of `count` rows inserted by one operation receives consecutive times, so
//! the whole run is described by its first handle.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Handle ─────────────────────────────────────────────────────────────────

/// A stable, globally unique row or column identifier: `(session_id, time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    pub sid: u64,
    pub time: u64,
}

impl Handle {
    pub const fn new(sid: u64, time: u64) -> Self {
        Self { sid, time }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_handle(*self))
    }
}

// ── Factory functions ──────────────────────────────────────────────────────

/// Create a handle.
#[inline]
pub fn handle(sid: u64, time: u64) -> Handle {
    Handle::new(sid, time)
}

/// Advance a handle by `cycles`, returning the new handle.
#[inline]
pub fn tick(stamp: Handle, cycles: u64) -> Handle {
    Handle::new(stamp.sid, stamp.time + cycles)
}

/// Expands the first handle of a run into all `count` handles of the run.
pub fn run(first: Handle, count: usize) -> Vec<Handle> {
    (0..count as u64).map(|i| tick(first, i)).collect()
}

/// Human-readable representation of a handle.
///
/// Long session IDs are shortened to their last four digits.
pub fn print_handle(id: Handle) -> String {
    let s = id.sid.to_string();
    let session = if s.len() > 4 {
        format!("..{}", &s[s.len() - 4..])
    } else {
        s
    };
    format!("{}.{}", session, id.time)
}

// ── LogicalClock ───────────────────────────────────────────────────────────

/// A mutable logical clock that hands out handle runs for one session.
#[derive(Debug, Clone)]
pub struct LogicalClock {
    pub sid: u64,
    pub time: u64,
}

impl LogicalClock {
    pub fn new(sid: u64, time: u64) -> Self {
        Self { sid, time }
    }

    /// Returns the current handle and advances the clock by `cycles`.
    pub fn tick(&mut self, cycles: u64) -> Handle {
        let stamp = Handle::new(self.sid, self.time);
        self.time += cycles;
        stamp
    }

    pub fn now(&self) -> Handle {
        Handle::new(self.sid, self.time)
    }

    /// Moves the clock past a run of this session's handles seen elsewhere,
    /// e.g. in a snapshot written by an earlier process with the same session.
    /// Runs from other sessions are ignored.
    pub fn observe(&mut self, id: Handle, span: u64) {
        if id.sid != self.sid || span == 0 {
            return;
        }
        let edge = id.time + span - 1;
        if edge >= self.time {
            self.time = edge + 1;
        }
    }
}
