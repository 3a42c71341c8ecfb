use crate::bridge::{RpcMessage, decode, encode};
use crate::error::bridge::BridgeError;
use crate::transport::WireMessage;

use serde_json::{Value, json};

/// **VALUE**: Verifies that a text frame holding a JSON object decodes field for field.
///
/// **WHY THIS MATTERS**: Every RPC result and callback reaches the engine through this decode.
///
/// **BUG THIS CATCHES**: Would catch the bridge rewriting or dropping fields.
#[test]
fn given_json_object_text_when_decoded_then_returns_message_with_same_fields() {
    // GIVEN: A text wire message
    let wire = WireMessage::Text(String::from(r#"{"type":"result","id":"7","result":[1,2]}"#));

    // WHEN: Decoding
    let message = decode(&wire).unwrap();

    // THEN: Fields are untouched
    assert_eq!(message.get("type"), Some(&json!("result")));
    assert_eq!(message.get("id"), Some(&json!("7")));
    assert_eq!(message.get("result"), Some(&json!([1, 2])));
    assert_eq!(message.fields().len(), 3);
}

/// **VALUE**: Verifies that structurally invalid payloads fail with a decode error.
///
/// **WHY THIS MATTERS**: The engine expects objects. Passing it arrays, scalars or garbage would
/// push the failure deep into request matching where it is much harder to diagnose.
///
/// **BUG THIS CATCHES**: Would catch the decode accepting any JSON value.
#[test]
fn given_non_object_payloads_when_decoded_then_returns_decode_error() {
    let cases = [
        WireMessage::Text(String::from("not json")),
        WireMessage::Text(String::from("[1,2,3]")),
        WireMessage::Text(String::from("42")),
        WireMessage::Text(String::from("null")),
        WireMessage::Binary(vec![0x7b, 0x7d]),
    ];

    for wire in cases {
        let result = decode(&wire);
        assert!(
            matches!(result, Err(BridgeError::Decode { .. })),
            "Expected decode error for {wire:?}"
        );
    }
}

/// **VALUE**: Verifies that encoding writes the object as compact JSON text.
#[test]
fn given_message_when_encoded_then_writes_json_object() {
    // GIVEN: A message built from a JSON object
    let message = RpcMessage::try_from(json!({"type": "param", "id": "1", "param": "userStorage"}))
        .unwrap();

    // WHEN: Encoding
    let text = encode(&message).unwrap();

    // THEN: The text parses back to the same object
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({"type": "param", "id": "1", "param": "userStorage"}));
    assert!(!text.contains('\n'));
}

/// **VALUE**: Verifies that building a message from a non-object value fails.
#[test]
fn given_array_value_when_converted_then_returns_decode_error() {
    let result = RpcMessage::try_from(json!(["type", "param"]));

    match result {
        Err(BridgeError::Decode { message, .. }) => assert!(message.contains("array")),
        other => panic!("Expected decode error, got {other:?}"),
    }
}
