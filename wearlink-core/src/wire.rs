//! Envelope codec: deterministic JSON bytes, object at the top level.

use crate::protocol::Envelope;
use crate::value::Value;

/// Largest payload the transport accepts for one message (100 KiB).
pub const MAX_PAYLOAD_LEN: usize = 100 * 1024;

/// Encode an envelope as JSON. Keys come out sorted, so equal envelopes give equal bytes.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, EncodeError> {
    let bytes = serde_json::to_vec(envelope.body()).map_err(EncodeError::Json)?;
    if bytes.len() > MAX_PAYLOAD_LEN {
        return Err(EncodeError::TooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Error encoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("encode error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("payload too large: {0} bytes")]
    TooLarge(usize),
}

/// Decode a payload into an envelope. The top-level value must be an object.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Json)?;
    match value {
        Value::Object(map) => Ok(Envelope::from_map(map)),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Error decoding a payload. The message is dropped; the listener keeps running.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    Utf8,
    #[error("decode error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MESSAGE_TYPE_KEY, TARGET_KEY};
    use crate::value::Map;

    fn nested() -> Envelope {
        let mut inner = Map::new();
        inner.insert("id".into(), Value::from("node-a"));
        Envelope::new()
            .with(TARGET_KEY, Value::Object(inner))
            .with(MESSAGE_TYPE_KEY, "data")
            .with("zero", 0i64)
            .with("neg", -42i64)
            .with("big", u64::MAX)
            .with("pi", 3.25)
            .with("tiny", -1.0e-9)
            .with("flag", false)
            .with("nothing", Value::Null)
            .with(
                "list",
                Value::array(vec![
                    Value::from(1i64),
                    Value::Null,
                    Value::array(vec![Value::from("deep")]),
                    Value::object(Map::new()),
                ]),
            )
    }

    #[test]
    fn roundtrip_nested_tree() {
        let env = nested();
        let bytes = encode_envelope(&env).unwrap();
        let decoded = decode_envelope(&bytes).unwrap();
        assert_eq!(decoded, env);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = Envelope::new().with("b", 1i64).with("a", 2i64);
        let b = Envelope::new().with("a", 2i64).with("b", 1i64);
        let bytes = encode_envelope(&a).unwrap();
        assert_eq!(bytes, encode_envelope(&b).unwrap());
        assert_eq!(bytes, br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn unknown_fields_pass_through() {
        let bytes = br#"{"futureField":{"x":[1,2]},"messageType":"event"}"#;
        let env = decode_envelope(bytes).unwrap();
        assert_eq!(encode_envelope(&env).unwrap(), bytes.to_vec());
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(decode_envelope(b"{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_envelope(&[0xff, 0xfe]), Err(DecodeError::Utf8)));
        assert!(matches!(decode_envelope(b"[1,2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode_envelope(b""), Err(DecodeError::Json(_))));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let env = Envelope::new().with("blob", "x".repeat(MAX_PAYLOAD_LEN));
        assert!(matches!(encode_envelope(&env), Err(EncodeError::TooLarge(_))));
    }
}
