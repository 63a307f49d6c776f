//! Length-delimited framing over `ClientMessage`/`ServerMessage`, grounded
//! on the teacher's `RpcServerCodec`/`RpcClientCodec` pair: a one-byte tag,
//! a big-endian `u32` payload length, then a bincode-encoded payload.

use crate::error::ProtocolError;
use crate::messages::{ClientMessage, ServerMessage};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Matches the teacher's 10 MiB ceiling; a places batch is small, so this
/// is purely a guard against a corrupt or hostile length prefix.
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

const HEADER_LEN: usize = 5;

/// Bincode-only payload encode, for transports that already provide their
/// own message framing (e.g. a websocket binary frame) and so have no use
/// for the tag+length header the stream-oriented codecs below add.
pub fn encode_payload<T: serde::Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    bincode::serialize(message).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Counterpart to `encode_payload`.
pub fn decode_payload<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    bincode::deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

fn decode_frame(src: &mut BytesMut) -> Result<Option<(u8, BytesMut)>, ProtocolError> {
    if src.len() < HEADER_LEN {
        return Ok(None);
    }

    let mut header = std::io::Cursor::new(&src[..HEADER_LEN]);
    let tag = header.get_u8();
    let len = header.get_u32() as usize;

    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    if src.len() < HEADER_LEN + len {
        return Ok(None);
    }

    src.advance(HEADER_LEN);
    let payload = src.split_to(len);
    Ok(Some((tag, payload)))
}

fn encode_frame(tag: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(HEADER_LEN + payload.len());
    dst.put_u8(tag);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
}

/// Server side of the wire: decodes what the client sends, encodes what
/// the server sends.
#[derive(Debug, Default)]
pub struct ServerCodec;

impl Decoder for ServerCodec {
    type Item = ClientMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((_tag, payload)) = decode_frame(src)? else {
            return Ok(None);
        };
        let message = bincode::deserialize(&payload)
            .map_err(|e| ProtocolError::Decode(e.to_string()))?;
        Ok(Some(message))
    }
}

impl Encoder<ServerMessage> for ServerCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: ServerMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload =
            bincode::serialize(&item).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        encode_frame(0x00, &payload, dst);
        Ok(())
    }
}

/// Client side of the wire: decodes what the server sends, encodes what
/// the client sends.
#[derive(Debug, Default)]
pub struct ClientCodec;

impl Decoder for ClientCodec {
    type Item = ServerMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some((_tag, payload)) = decode_frame(src)? else {
            return Ok(None);
        };
        let message = bincode::deserialize(&payload)
            .map_err(|e| ProtocolError::Decode(e.to_string()))?;
        Ok(Some(message))
    }
}

impl Encoder<ClientMessage> for ClientCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: ClientMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload =
            bincode::serialize(&item).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        encode_frame(0x00, &payload, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_round_trips_through_both_codecs() {
        let mut buf = BytesMut::new();
        let mut client = ClientCodec;
        client
            .encode(
                ClientMessage::LocationUpdate {
                    lat: Some(38.9),
                    lon: Some(-77.3),
                    radius: Some(300.0),
                },
                &mut buf,
            )
            .unwrap();

        let mut server = ServerCodec;
        let decoded = server.decode(&mut buf).unwrap().unwrap();
        match decoded {
            ClientMessage::LocationUpdate { lat, lon, radius } => {
                assert_eq!(lat, Some(38.9));
                assert_eq!(lon, Some(-77.3));
                assert_eq!(radius, Some(300.0));
            }
        }
    }

    #[test]
    fn server_message_round_trips_through_both_codecs() {
        let mut buf = BytesMut::new();
        let mut server = ServerCodec;
        server
            .encode(ServerMessage::PlacesComplete { total: 7 }, &mut buf)
            .unwrap();

        let mut client = ClientCodec;
        let decoded = client.decode(&mut buf).unwrap().unwrap();
        match decoded {
            ServerMessage::PlacesComplete { total } => assert_eq!(total, 7),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn partial_frame_decodes_to_none() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0x00, 0x00, 0x00]);
        let mut codec = ServerCodec;
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0x00]);
        buf.extend_from_slice(&((MAX_FRAME_SIZE as u32) + 1).to_be_bytes());
        let mut codec = ServerCodec;
        assert!(codec.decode(&mut buf).is_err());
    }
}
