//! Codec trait and implementations for serializing envelopes.
//!
//! The rest of the stack doesn't care how envelopes become bytes, only
//! that something implementing [`Codec`] can do it both ways. The wire
//! format today is text JSON, which is what browser clients speak and
//! what makes captures readable; a binary codec could be added behind a
//! feature without touching any other crate.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every connection handler task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or do not match the expected shape (including an
    /// unknown envelope `type`).
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Output is always valid UTF-8, so the transport can frame it as
/// WebSocket text.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::ClientMessage;

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let msg = ClientMessage::Attack { row: 4, col: 2 };

        let bytes = codec.encode(&msg).unwrap();
        let back: ClientMessage = codec.decode(&bytes).unwrap();

        assert_eq!(msg, back);
    }

    #[test]
    fn test_json_codec_output_is_utf8() {
        let codec = JsonCodec;
        let bytes = codec
            .encode(&ClientMessage::Chat {
                text: "labdien, kapteini".into(),
            })
            .unwrap();
        assert!(std::str::from_utf8(&bytes).is_ok());
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> =
            codec.decode(b"not json at all");
        assert!(result.is_err());
    }
}
