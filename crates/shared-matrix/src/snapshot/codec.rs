use super::Snapshot;
use crate::error::SnapshotError;

pub const SNAPSHOT_VERSION: u8 = 1;

impl Snapshot {
    /// Binary form: one version byte followed by a CBOR body.
    pub fn to_binary(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut out = vec![SNAPSHOT_VERSION];
        ciborium::ser::into_writer(self, &mut out).map_err(|e| SnapshotError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Decodes [`to_binary`](Self::to_binary) output, refusing blobs over `max_size` bytes.
    pub fn from_binary(data: &[u8], max_size: usize) -> Result<Self, SnapshotError> {
        if data.len() > max_size {
            return Err(SnapshotError::TooLarge {
                actual: data.len(),
                max: max_size,
            });
        }
        let (&version, body) = data.split_first().ok_or(SnapshotError::Empty)?;
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
        ciborium::de::from_reader(body).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    pub fn to_json(&self) -> Result<serde_json::Value, SnapshotError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, SnapshotError> {
        Ok(serde::Deserialize::deserialize(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::handle;
    use crate::config::MAX_SNAPSHOT_SIZE;
    use crate::operations::OpId;
    use crate::snapshot::{CellRecord, DeliveryRecord, RemovalRecord, SlotRecord};
    use serde_json::json;

    fn sample() -> Snapshot {
        Snapshot {
            sequence_number: 7,
            minimum_sequence_number: 5,
            rows: vec![
                SlotRecord {
                    id: handle(70_000, 0),
                    client_id: 70_000,
                    seq: 1,
                    removed: vec![RemovalRecord { client_id: 80_000, seq: 6 }],
                },
                SlotRecord {
                    id: handle(70_000, 1),
                    client_id: 70_000,
                    seq: 1,
                    removed: Vec::new(),
                },
            ],
            cols: vec![SlotRecord {
                id: handle(80_000, 0),
                client_id: 80_000,
                seq: 2,
                removed: Vec::new(),
            }],
            cells: vec![CellRecord {
                row: handle(70_000, 1),
                col: handle(80_000, 0),
                seq: 3,
                value: json!({"n": 1}),
            }],
            delivered: vec![DeliveryRecord {
                client_id: 80_000,
                id: OpId(4),
                ref_seq: 5,
            }],
        }
    }

    #[test]
    fn binary_form_is_versioned() {
        let bytes = sample().to_binary().unwrap();
        assert_eq!(bytes[0], SNAPSHOT_VERSION);
        assert_eq!(Snapshot::from_binary(&bytes, MAX_SNAPSHOT_SIZE).unwrap(), sample());
    }

    #[test]
    fn binary_decoder_guards_its_input() {
        let bytes = sample().to_binary().unwrap();
        assert!(matches!(
            Snapshot::from_binary(&bytes, 4),
            Err(SnapshotError::TooLarge { max: 4, .. })
        ));
        assert!(matches!(Snapshot::from_binary(&[], 16), Err(SnapshotError::Empty)));
        let mut wrong = bytes.clone();
        wrong[0] = 9;
        assert!(matches!(
            Snapshot::from_binary(&wrong, MAX_SNAPSHOT_SIZE),
            Err(SnapshotError::UnsupportedVersion(9))
        ));
        assert!(matches!(
            Snapshot::from_binary(&bytes[..bytes.len() / 2], MAX_SNAPSHOT_SIZE),
            Err(SnapshotError::Decode(_))
        ));
    }

    #[test]
    fn json_form_omits_empty_removals() {
        let value = sample().to_json().unwrap();
        assert!(value["rows"][1].get("removed").is_none());
        assert_eq!(value["rows"][0]["removed"][0]["seq"], json!(6));
        assert_eq!(Snapshot::from_json(&value).unwrap(), sample());
        assert_eq!(value["delivered"][0]["id"], json!(4));
        assert!(matches!(
            Snapshot::from_json(&json!({"sequence_number": "x"})),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn delivery_records_are_optional() {
        let mut value = sample().to_json().unwrap();
        value.as_object_mut().unwrap().remove("delivered");
        let snapshot = Snapshot::from_json(&value).unwrap();
        assert!(snapshot.delivered.is_empty());
        assert!(snapshot.to_json().unwrap().get("delivered").is_none());
    }
}
