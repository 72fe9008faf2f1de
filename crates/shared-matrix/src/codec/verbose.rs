use serde::Deserialize;
use serde_json::Value;

use crate::error::CodecError;
use crate::operations::{MatrixOp, SequencedMessage};

pub fn op_to_json(op: &MatrixOp) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(op)?)
}

pub fn op_from_json(value: &Value) -> Result<MatrixOp, CodecError> {
    Ok(MatrixOp::deserialize(value)?)
}

pub fn message_to_json(message: &SequencedMessage) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(message)?)
}

pub fn message_from_json(value: &Value) -> Result<SequencedMessage, CodecError> {
    Ok(SequencedMessage::deserialize(value)?)
}
