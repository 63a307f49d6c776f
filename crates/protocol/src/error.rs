use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("frame size {size} exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    /// Required so `ServerCodec`/`ClientCodec` can implement
    /// `tokio_util::codec::{Decoder, Encoder}`, whose `Error` associated
    /// type must convert from `std::io::Error` (the underlying socket read
    /// can always fail independently of framing).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
