mod common;

use common::{assert_converged, sync, MockSequencer, TestClient, A, B, C};
use serde_json::json;
use shared_matrix::{Axis, MatrixError, MatrixOp, OpContent, OpId, StashedOp};

#[test]
fn rehydrated_client_with_stashed_cell_write_converges() {
    let seq = MockSequencer::new();
    let mut a = TestClient::new(&seq, A);
    let mut b = TestClient::new(&seq, B);
    a.connect();
    b.connect();

    a.matrix.insert_rows(0, 2).unwrap();
    b.matrix.insert_cols(0, 2).unwrap();
    sync(&seq, &mut [&mut a, &mut b]);
    assert_converged(&[&a, &b]);
    let (snapshot, snapshot_seq) = b.matrix.summarize();
    assert_eq!(snapshot_seq, 2);

    // A goes offline, edits, and its session ends with the edit unsent.
    a.disconnect();
    a.matrix.set_cell(0, 0, json!("x")).unwrap();
    let stash = a.matrix.stashed_ops();
    assert_eq!(stash.len(), 1);
    seq.borrow_mut().unregister(A);

    b.matrix.set_cell(1, 0, json!("y")).unwrap();
    sync(&seq, &mut [&mut b]);

    let mut c = TestClient::from_snapshot(&seq, C, &snapshot);
    c.matrix.apply_stashed_op(&stash[0]).unwrap();
    c.catch_up();
    c.matrix.set_cell(0, 1, json!("z")).unwrap();
    c.connect();
    sync(&seq, &mut [&mut b, &mut c]);

    let expected = json!([["x", "z"], ["y", null]]);
    assert_eq!(b.grid(), expected);
    assert_eq!(c.grid(), expected);
    assert_eq!(c.matrix.pending_len(), 0);
}

#[test]
fn stash_authored_before_concurrent_structure_change_is_retargeted() {
    let seq = MockSequencer::new();
    let mut a = TestClient::new(&seq, A);
    let mut b = TestClient::new(&seq, B);
    a.connect();
    b.connect();
    a.matrix.insert_rows(0, 2).unwrap();
    a.matrix.insert_cols(0, 1).unwrap();
    sync(&seq, &mut [&mut a, &mut b]);
    let (snapshot, _) = b.matrix.summarize();

    a.disconnect();
    a.matrix.set_cell(1, 0, json!("a")).unwrap();
    let stash = a.matrix.stashed_ops();
    seq.borrow_mut().unregister(A);

    // C joins from the snapshot, then sees B insert a row at the top.
    let mut c = TestClient::from_snapshot(&seq, C, &snapshot);
    c.connect();
    b.matrix.insert_rows(0, 1).unwrap();
    sync(&seq, &mut [&mut b, &mut c]);

    c.matrix.apply_stashed_op(&stash[0]).unwrap();
    sync(&seq, &mut [&mut b, &mut c]);

    let expected = json!([[null], [null], ["a"]]);
    assert_eq!(b.grid(), expected);
    assert_eq!(c.grid(), expected);
}

#[test]
fn stashed_insert_is_reauthored_with_fresh_handles() {
    let seq = MockSequencer::new();
    let mut b = TestClient::new(&seq, B);
    b.connect();
    b.matrix.insert_rows(0, 1).unwrap();
    sync(&seq, &mut [&mut b]);
    let (snapshot, snapshot_seq) = b.matrix.summarize();

    let stash = StashedOp {
        client_id: A,
        op: MatrixOp {
            id: OpId(1),
            ref_seq: snapshot_seq,
            content: OpContent::insert(Axis::Rows, 1, 2, shared_matrix::Handle::new(A, 7)),
        },
    };
    let mut c = TestClient::from_snapshot(&seq, C, &snapshot);
    c.matrix.apply_stashed_op(&stash).unwrap();
    assert_eq!(c.matrix.row_count(), 3);
    assert_eq!(c.matrix.row_handle(1).unwrap().sid, C);

    c.connect();
    sync(&seq, &mut [&mut b, &mut c]);
    assert_converged(&[&b, &c]);
    assert_eq!(b.matrix.row_count(), 3);
}

#[test]
fn only_one_stash_per_session() {
    let seq = MockSequencer::new();
    let mut c = TestClient::new(&seq, C);
    c.matrix.insert_rows(0, 1).unwrap();
    c.matrix.insert_cols(0, 1).unwrap();
    let stash = StashedOp {
        client_id: A,
        op: MatrixOp {
            id: OpId(1),
            ref_seq: 0,
            content: OpContent::SetCell { row: 0, col: 0, value: json!(1) },
        },
    };
    c.matrix.apply_stashed_op(&stash).unwrap();
    assert!(matches!(
        c.matrix.apply_stashed_op(&stash),
        Err(MatrixError::StashAlreadyApplied)
    ));
}

#[test]
fn stash_from_a_newer_view_waits_for_catch_up() {
    let seq = MockSequencer::new();
    let mut a = TestClient::new(&seq, A);
    let mut b = TestClient::new(&seq, B);
    a.connect();
    b.connect();
    b.matrix.insert_rows(0, 2).unwrap();
    b.matrix.insert_cols(0, 1).unwrap();
    sync(&seq, &mut [&mut a, &mut b]);
    let (snapshot, snapshot_seq) = b.matrix.summarize();
    assert_eq!(snapshot_seq, 2);

    // Seq 3: a new top row, seen by A before it writes to B's first row.
    b.matrix.insert_rows(0, 1).unwrap();
    sync(&seq, &mut [&mut a, &mut b]);
    a.disconnect();
    a.matrix.set_cell(1, 0, json!("x")).unwrap();
    let stash = a.matrix.stashed_ops();
    assert_eq!(stash[0].op.ref_seq, 3);
    seq.borrow_mut().unregister(A);

    let mut c = TestClient::from_snapshot(&seq, C, &snapshot);
    assert!(matches!(
        c.matrix.apply_stashed_op(&stash[0]),
        Err(MatrixError::StashAhead { ref_seq: 3, last_seq: 2 })
    ));
    assert_eq!(c.matrix.pending_len(), 0);

    c.catch_up();
    c.matrix.apply_stashed_op(&stash[0]).unwrap();
    c.connect();
    sync(&seq, &mut [&mut b, &mut c]);

    let expected = json!([[null], ["x"], [null]]);
    assert_eq!(b.grid(), expected);
    assert_eq!(c.grid(), expected);
}
