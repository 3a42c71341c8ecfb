use crate::error::options::OptionsError;
use crate::options::{ConnectionOptions, TlsPolicy};
use crate::{DEFAULT_CLIENT_NAME, DEFAULT_ROOT_LOCATION};

/// **VALUE**: Verifies the endpoint and transport paths derived from the plugin id.
///
/// **WHY THIS MATTERS**: The server routes each plugin's Engine.IO endpoint by path. A wrong
/// path means a 404 on upgrade and the connection can never be made.
///
/// **BUG THIS CATCHES**: Would catch a missing or doubled slash between the segments.
#[test]
fn given_core_plugin_when_paths_derived_then_match_endpoint_layout() {
    // GIVEN: Options for the "core" plugin
    let options = ConnectionOptions::builder()
        .with_plugin_id("core")
        .build()
        .unwrap();

    // WHEN/THEN: Paths follow /endpoint/{id}/engine.io/api/
    assert_eq!(options.endpoint_path(), "/endpoint/core");
    assert_eq!(options.transport_path(), "/endpoint/core/engine.io/api/");
}

/// **VALUE**: Verifies defaults when only a plugin id is given.
///
/// **BUG THIS CATCHES**: Would catch the root location or client name defaults being dropped,
/// or the TLS policy silently defaulting to accepting any certificate.
#[test]
fn given_plugin_id_only_when_built_then_uses_defaults() {
    // GIVEN/WHEN: Minimal options
    let options = ConnectionOptions::builder()
        .with_plugin_id("@scrypted/core")
        .build()
        .unwrap();

    // THEN: Defaults apply
    assert_eq!(
        options.root_location().as_str().trim_end_matches('/'),
        DEFAULT_ROOT_LOCATION
    );
    assert_eq!(options.client_name(), DEFAULT_CLIENT_NAME);
    assert_eq!(options.tls_policy(), TlsPolicy::Verify);
    assert!(options.credentials().is_none());
}

/// **VALUE**: Verifies that a lone username or password is treated as no credentials.
///
/// **WHY THIS MATTERS**: Half a credential pair would otherwise send a login with an empty
/// field, which the server rejects, failing a connection that would have worked anonymously.
///
/// **BUG THIS CATCHES**: Would catch the builder producing `Credentials` from a partial pair.
#[test]
fn given_partial_credentials_when_built_then_credentials_absent() {
    let username_only = ConnectionOptions::builder()
        .with_plugin_id("core")
        .with_username("admin")
        .build()
        .unwrap();
    let password_only = ConnectionOptions::builder()
        .with_plugin_id("core")
        .with_password("secret")
        .build()
        .unwrap();
    let empty_password = ConnectionOptions::builder()
        .with_plugin_id("core")
        .with_credentials("admin", "")
        .build()
        .unwrap();

    assert!(username_only.credentials().is_none());
    assert!(password_only.credentials().is_none());
    assert!(empty_password.credentials().is_none());
}

/// **VALUE**: Verifies that a complete pair is kept and the password stays redacted.
#[test]
fn given_full_credentials_when_built_then_kept_and_redacted() {
    let options = ConnectionOptions::builder()
        .with_plugin_id("core")
        .with_credentials("admin", "hunter2")
        .build()
        .unwrap();

    let credentials = options.credentials().expect("credentials should be present");
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password.expose(), "hunter2");
    assert!(!format!("{options:?}").contains("hunter2"));
}

/// **VALUE**: Verifies that the plugin id is required and non-empty.
///
/// **BUG THIS CATCHES**: Would catch a connection to `/endpoint//engine.io/api/`.
#[test]
fn given_missing_or_blank_plugin_id_when_built_then_returns_validation_error() {
    let missing = ConnectionOptions::builder().build();
    let blank = ConnectionOptions::builder().with_plugin_id("  ").build();

    match missing.unwrap_err() {
        OptionsError::Validation { message, .. } => assert_eq!(message, "Plugin ID is required"),
    }
    match blank.unwrap_err() {
        OptionsError::Validation { message, .. } => {
            assert_eq!(message, "Plugin ID cannot be empty")
        }
    }
}

/// **VALUE**: Verifies that only http and https base URLs are accepted.
///
/// **BUG THIS CATCHES**: Would catch an unparseable or `ftp://` base URL reaching the login.
#[test]
fn given_invalid_base_url_when_built_then_returns_validation_error() {
    let unparseable = ConnectionOptions::builder()
        .with_plugin_id("core")
        .with_base_url("not a url")
        .build();
    let wrong_scheme = ConnectionOptions::builder()
        .with_plugin_id("core")
        .with_base_url("ftp://example.com")
        .build();

    assert!(unparseable.is_err());
    assert!(wrong_scheme.is_err());
}
