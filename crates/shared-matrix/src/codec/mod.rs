//! Wire codecs for submitted operations and sequenced messages.
//!
//! - [`binary`]: one version byte followed by a CBOR body.
//! - [`verbose`]: plain JSON, for logs and debugging tools.

pub mod binary;
pub mod verbose;

pub use binary::{decode_message, decode_op, encode_message, encode_op, WIRE_VERSION};
