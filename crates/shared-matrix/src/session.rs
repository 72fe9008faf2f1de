//! Per-client session state and the connection state machine.

use std::fmt;

use crate::clock::{Handle, LogicalClock};
use crate::operations::OpId;

/// Connection state of a client.
///
/// `Disconnected → Resubmitting → Connected`, and back to `Disconnected` on
/// [`disconnect`](crate::SharedMatrix::disconnect). Only `Connected` clients
/// hand new edits to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Resubmitting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Resubmitting => f.write_str("resubmitting"),
            ConnectionState::Connected => f.write_str("connected"),
        }
    }
}

/// Everything a client knows about its place in the sequenced stream.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub client_id: u64,
    pub state: ConnectionState,
    /// Sequence number of the last processed message.
    pub last_seq: u64,
    /// Latest minimum sequence number seen.
    pub min_seq: u64,
    pub clock: LogicalClock,
    next_local_seq: u64,
    next_op_id: u64,
    /// Set by the first snapshot load, local edit or processed message.
    pub initialized: bool,
    pub stash_applied: bool,
}

impl SessionContext {
    pub fn new(client_id: u64) -> Self {
        Self {
            client_id,
            state: ConnectionState::Disconnected,
            last_seq: 0,
            min_seq: 0,
            clock: LogicalClock::new(client_id, 0),
            next_local_seq: 1,
            next_op_id: 1,
            initialized: false,
            stash_applied: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn next_local_seq(&mut self) -> u64 {
        let seq = self.next_local_seq;
        self.next_local_seq += 1;
        seq
    }

    pub fn next_op_id(&mut self) -> OpId {
        let id = OpId(self.next_op_id);
        self.next_op_id += 1;
        id
    }

    /// Keeps future op ids past `id`, issued by an earlier session of this client.
    pub fn observe_op_id(&mut self, id: OpId) {
        self.next_op_id = self.next_op_id.max(id.0 + 1);
    }

    /// Allocates the first handle of a run of `count`.
    pub fn allocate(&mut self, count: usize) -> Handle {
        self.clock.tick(count as u64)
    }

    /// Advances the sequence counters after processing `seq`.
    pub fn advance(&mut self, seq: u64, min_seq: u64) {
        self.last_seq = seq;
        self.min_seq = self.min_seq.max(min_seq);
    }

    pub fn transition(&mut self, to: ConnectionState) {
        if self.state != to {
            tracing::debug!(client_id = self.client_id, from = %self.state, %to, "connection state change");
            self.state = to;
        }
    }
}
