use crate::RedactedSecret;

/// **VALUE**: Verifies that Debug and Display never print the secret.
///
/// **WHY THIS MATTERS**: Options and credentials are logged at debug level while a connection
/// is being set up. A password or session cookie in a log file is a credential leak.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug impl replacing the manual one.
#[test]
fn given_secret_when_formatted_then_value_is_hidden() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2");

    // WHEN: Formatting with Debug and Display
    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    // THEN: Neither contains the value
    assert!(!debug.contains("hunter2"));
    assert!(!display.contains("hunter2"));
    assert_eq!(secret.expose(), "hunter2");
    assert_eq!(secret.len(), 7);
}

/// **VALUE**: Verifies that serde refuses to serialize a secret.
///
/// **WHY THIS MATTERS**: The login body is built with serde_json. Accidentally embedding the
/// wrapper instead of `expose()` must fail loudly rather than emit a placeholder.
///
/// **BUG THIS CATCHES**: Would catch a Serialize impl that silently writes the value.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2");

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&secret);

    // THEN: Serialization fails
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Not Serializable"));
}
