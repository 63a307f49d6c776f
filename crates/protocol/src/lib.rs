//! Wire protocol for the streaming places service (spec §6): message
//! shapes plus the length-delimited codecs that frame them.

mod codec;
mod error;
mod messages;

pub use codec::{decode_payload, encode_payload, ClientCodec, ServerCodec, MAX_FRAME_SIZE};
pub use error::ProtocolError;
pub use messages::{ClientMessage, ServerMessage, WirePlace};
