#![allow(dead_code)]

//! In-memory sequencer and transport double shared by the integration tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use shared_matrix::codec::{decode_message, decode_op, encode_message, encode_op};
use shared_matrix::{
    ConnectionState, MatrixOp, MatrixOptions, OpId, SequencedMessage, SharedMatrix, Snapshot,
    Transport,
};

pub const A: u64 = 100_001;
pub const B: u64 = 100_002;
pub const C: u64 = 100_003;

pub type Sequencer = Rc<RefCell<MockSequencer>>;

struct Outstanding {
    client_id: u64,
    op: Vec<u8>,
    metadata: OpId,
}

struct Sequenced {
    message: Vec<u8>,
    metadata: OpId,
}

/// Assigns sequence numbers in submission order and keeps the full log.
///
/// Operations and messages are stored in their binary wire form.
#[derive(Default)]
pub struct MockSequencer {
    outbox: Vec<Outstanding>,
    log: Vec<Sequenced>,
    /// Reference floor each registered client reported on its last catch-up.
    cursors: BTreeMap<u64, u64>,
    min_seq: u64,
}

impl MockSequencer {
    pub fn new() -> Sequencer {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn register(&mut self, client_id: u64, cursor: u64) {
        self.cursors.insert(client_id, cursor);
    }

    pub fn unregister(&mut self, client_id: u64) {
        self.cursors.remove(&client_id);
        self.drop_outstanding(client_id);
    }

    pub fn set_cursor(&mut self, client_id: u64, cursor: u64) {
        if let Some(c) = self.cursors.get_mut(&client_id) {
            *c = cursor;
        }
    }

    /// Forgets submissions of `client_id` that were not sequenced yet, as a
    /// lost connection does.
    pub fn drop_outstanding(&mut self, client_id: u64) {
        self.outbox.retain(|o| o.client_id != client_id);
    }

    pub fn submit(&mut self, client_id: u64, op: &MatrixOp, metadata: OpId) {
        let op = encode_op(op).unwrap();
        self.outbox.push(Outstanding {
            client_id,
            op,
            metadata,
        });
    }

    pub fn outstanding(&self) -> usize {
        self.outbox.len()
    }

    pub fn last_seq(&self) -> u64 {
        self.log.len() as u64
    }

    pub fn min_seq(&self) -> u64 {
        self.min_seq
    }

    /// Sequences every outstanding submission.
    pub fn sequence_all(&mut self) {
        let outbox = std::mem::take(&mut self.outbox);
        let mut refs: Vec<u64> = outbox
            .iter()
            .map(|o| decode_op(&o.op).unwrap().ref_seq)
            .collect();
        for (i, out) in outbox.into_iter().enumerate() {
            let contents = decode_op(&out.op).unwrap();
            let seq = self.last_seq() + 1;
            refs[i] = u64::MAX;
            let floor = self
                .cursors
                .values()
                .copied()
                .chain(refs.iter().copied())
                .min()
                .unwrap_or(seq)
                .min(seq);
            self.min_seq = self.min_seq.max(floor);
            let message = SequencedMessage {
                sequence_number: seq,
                minimum_sequence_number: self.min_seq,
                client_id: out.client_id,
                contents,
            };
            self.log.push(Sequenced {
                message: encode_message(&message).unwrap(),
                metadata: out.metadata,
            });
        }
    }

    /// Messages after `cursor`, each with the local metadata of its submission.
    pub fn messages_after(&self, cursor: u64) -> Vec<(SequencedMessage, OpId)> {
        self.log
            .iter()
            .skip(cursor as usize)
            .map(|s| (decode_message(&s.message).unwrap(), s.metadata))
            .collect()
    }
}

pub struct MockTransport {
    sequencer: Sequencer,
    client_id: u64,
    pub submitted: Vec<MatrixOp>,
}

impl Transport for MockTransport {
    fn submit(&mut self, op: &MatrixOp, metadata: OpId) {
        self.submitted.push(op.clone());
        self.sequencer.borrow_mut().submit(self.client_id, op, metadata);
    }
}

pub struct TestClient {
    pub matrix: SharedMatrix<MockTransport>,
    sequencer: Sequencer,
}

impl TestClient {
    /// A fresh, disconnected client that will catch up from the start of the log.
    pub fn new(sequencer: &Sequencer, client_id: u64) -> Self {
        Self::with_options(sequencer, MatrixOptions::new().with_session_id(client_id))
    }

    pub fn with_options(sequencer: &Sequencer, options: MatrixOptions) -> Self {
        let client_id = options.session_id;
        let transport = MockTransport {
            sequencer: Rc::clone(sequencer),
            client_id,
            submitted: Vec::new(),
        };
        sequencer.borrow_mut().register(client_id, 0);
        Self {
            matrix: SharedMatrix::new(options, transport).unwrap(),
            sequencer: Rc::clone(sequencer),
        }
    }

    /// A disconnected client initialized from `snapshot`.
    pub fn from_snapshot(sequencer: &Sequencer, client_id: u64, snapshot: &Snapshot) -> Self {
        let mut client = Self::new(sequencer, client_id);
        client.matrix.load(snapshot).unwrap();
        sequencer
            .borrow_mut()
            .set_cursor(client_id, snapshot.sequence_number);
        client
    }

    pub fn id(&self) -> u64 {
        self.matrix.client_id()
    }

    pub fn is_connected(&self) -> bool {
        self.matrix.state() == ConnectionState::Connected
    }

    /// Processes every sequenced message this client has not seen yet and
    /// reports its reference floor to the sequencer.
    pub fn catch_up(&mut self) {
        let messages = self
            .sequencer
            .borrow()
            .messages_after(self.matrix.last_sequence_number());
        let id = self.id();
        for (message, metadata) in messages {
            let local = message.client_id == id;
            self.matrix
                .process(&message, local, local.then_some(metadata))
                .unwrap();
        }
        let cursor = self.matrix.reference_floor();
        self.sequencer.borrow_mut().set_cursor(id, cursor);
    }

    pub fn connect(&mut self) {
        self.catch_up();
        self.matrix.connect().unwrap();
    }

    /// Disconnects, losing submissions the sequencer has not ordered yet.
    pub fn disconnect(&mut self) {
        self.matrix.disconnect();
        self.sequencer.borrow_mut().drop_outstanding(self.id());
    }

    pub fn grid(&self) -> Value {
        self.matrix.to_json()
    }
}

/// Sequences everything outstanding and delivers it to the connected clients.
pub fn sync(sequencer: &Sequencer, clients: &mut [&mut TestClient]) {
    sequencer.borrow_mut().sequence_all();
    for client in clients.iter_mut() {
        if client.is_connected() {
            client.catch_up();
        }
    }
}

pub fn assert_converged(clients: &[&TestClient]) {
    let first = clients[0].grid();
    for client in &clients[1..] {
        assert_eq!(
            client.grid(),
            first,
            "client {} diverged from client {}",
            client.id(),
            clients[0].id()
        );
    }
}
