//! Seeded generator of random local edits, for convergence testing.

use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde_json::{json, Value};

use crate::error::MatrixError;
use crate::matrix::{SharedMatrix, Transport};
use crate::operations::OpId;

/// One local edit, in local indices.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEdit {
    InsertRows { index: usize, count: usize },
    InsertCols { index: usize, count: usize },
    RemoveRows { index: usize, count: usize },
    RemoveCols { index: usize, count: usize },
    SetCell { row: usize, col: usize, value: Value },
}

impl LocalEdit {
    pub fn apply_to<T: Transport>(&self, client: &mut SharedMatrix<T>) -> Result<Option<OpId>, MatrixError> {
        match self {
            LocalEdit::InsertRows { index, count } => client.insert_rows(*index, *count).map(|_| None),
            LocalEdit::InsertCols { index, count } => client.insert_cols(*index, *count).map(|_| None),
            LocalEdit::RemoveRows { index, count } => client.remove_rows(*index, *count).map(|_| None),
            LocalEdit::RemoveCols { index, count } => client.remove_cols(*index, *count).map(|_| None),
            LocalEdit::SetCell { row, col, value } => client.set_cell(*row, *col, value.clone()).map(Some),
        }
    }
}

/// Random edit source. The same seed always yields the same edits for the
/// same sequence of matrix shapes.
pub struct MatrixFuzzer {
    /// The seed used to initialize the PRNG.
    pub seed: [u8; 32],
    rng: Xoshiro256StarStar,
    /// Upper bound for the `count` of structural edits.
    pub max_run: usize,
}

impl MatrixFuzzer {
    /// Creates a fuzzer; without a seed one is drawn from `OsRng`.
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });
        Self {
            seed,
            rng: Xoshiro256StarStar::from_seed(seed),
            max_run: 3,
        }
    }

    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self::new(Some(bytes))
    }

    /// Picks an edit that is valid for a matrix of `rows` x `cols`.
    pub fn next_edit(&mut self, rows: usize, cols: usize) -> LocalEdit {
        if rows == 0 {
            return LocalEdit::InsertRows {
                index: 0,
                count: self.run(),
            };
        }
        if cols == 0 {
            return LocalEdit::InsertCols {
                index: 0,
                count: self.run(),
            };
        }
        match self.rng.gen_range(0..10) {
            0 | 1 => LocalEdit::InsertRows {
                index: self.rng.gen_range(0..=rows),
                count: self.run(),
            },
            2 | 3 => LocalEdit::InsertCols {
                index: self.rng.gen_range(0..=cols),
                count: self.run(),
            },
            4 => {
                let (index, count) = self.range(rows);
                LocalEdit::RemoveRows { index, count }
            }
            5 => {
                let (index, count) = self.range(cols);
                LocalEdit::RemoveCols { index, count }
            }
            _ => LocalEdit::SetCell {
                row: self.rng.gen_range(0..rows),
                col: self.rng.gen_range(0..cols),
                value: self.value(),
            },
        }
    }

    /// Generates an edit for `client`'s current shape and applies it.
    pub fn step<T: Transport>(&mut self, client: &mut SharedMatrix<T>) -> Result<LocalEdit, MatrixError> {
        let edit = self.next_edit(client.row_count(), client.col_count());
        edit.apply_to(client)?;
        Ok(edit)
    }

    pub fn random_bool(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability)
    }

    fn run(&mut self) -> usize {
        self.rng.gen_range(1..=self.max_run.max(1))
    }

    fn range(&mut self, len: usize) -> (usize, usize) {
        let index = self.rng.gen_range(0..len);
        let count = self.rng.gen_range(1..=(len - index).min(self.max_run.max(1)));
        (index, count)
    }

    fn value(&mut self) -> Value {
        match self.rng.gen_range(0..4) {
            0 => Value::Null,
            1 => json!(self.rng.gen_range(-100i64..100)),
            2 => json!(self.rng.gen_bool(0.5)),
            _ => {
                let len = self.rng.gen_range(1..6);
                let s: String = (0..len)
                    .map(|_| char::from(b'a' + self.rng.gen_range(0..26u8)))
                    .collect();
                json!(s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_edits() {
        let mut a = MatrixFuzzer::from_u64(7);
        let mut b = MatrixFuzzer::from_u64(7);
        for _ in 0..50 {
            assert_eq!(a.next_edit(4, 3), b.next_edit(4, 3));
        }
    }

    #[test]
    fn edits_fit_the_shape() {
        let mut f = MatrixFuzzer::from_u64(11);
        assert!(matches!(f.next_edit(0, 5), LocalEdit::InsertRows { index: 0, .. }));
        assert!(matches!(f.next_edit(2, 0), LocalEdit::InsertCols { index: 0, .. }));
        for _ in 0..200 {
            match f.next_edit(3, 2) {
                LocalEdit::InsertRows { index, count } => assert!(index <= 3 && count >= 1),
                LocalEdit::InsertCols { index, count } => assert!(index <= 2 && count >= 1),
                LocalEdit::RemoveRows { index, count } => assert!(count >= 1 && index + count <= 3),
                LocalEdit::RemoveCols { index, count } => assert!(count >= 1 && index + count <= 2),
                LocalEdit::SetCell { row, col, .. } => assert!(row < 3 && col < 2),
            }
        }
    }
}
