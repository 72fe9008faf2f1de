use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::operations::{MatrixOp, SequencedMessage};

pub const WIRE_VERSION: u8 = 1;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![WIRE_VERSION];
    ciborium::ser::into_writer(value, &mut out).map_err(|e| CodecError::CborEncode(e.to_string()))?;
    Ok(out)
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let (&version, body) = data.split_first().ok_or(CodecError::Empty)?;
    if version != WIRE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    ciborium::de::from_reader(body).map_err(|e| CodecError::CborDecode(e.to_string()))
}

pub fn encode_op(op: &MatrixOp) -> Result<Vec<u8>, CodecError> {
    encode(op)
}

pub fn decode_op(data: &[u8]) -> Result<MatrixOp, CodecError> {
    decode(data)
}

pub fn encode_message(message: &SequencedMessage) -> Result<Vec<u8>, CodecError> {
    encode(message)
}

pub fn decode_message(data: &[u8]) -> Result<SequencedMessage, CodecError> {
    decode(data)
}
