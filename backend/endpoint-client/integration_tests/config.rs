use endpoint_client::TlsPolicy;
use endpoint_client::config::{
    BASE_URL_ENV, ClientConfig, PASSWORD_ENV, PLUGIN_ID_ENV, USERNAME_ENV, load_dotenv,
};
use endpoint_client::error::ConfigError;

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

const ALL_VARS: [&str; 4] = [BASE_URL_ENV, PLUGIN_ID_ENV, USERNAME_ENV, PASSWORD_ENV];

/// Sets variables for one test and clears every client variable on drop.
struct EnvGuard;

impl EnvGuard {
    fn set(pairs: &[(&str, &str)]) -> Self {
        clear_all();
        for (key, value) in pairs {
            // SAFETY: tests touching the environment are `#[serial]`.
            unsafe { std::env::set_var(key, value) };
        }
        EnvGuard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        clear_all();
    }
}

fn clear_all() {
    for key in ALL_VARS {
        // SAFETY: tests touching the environment are `#[serial]`.
        unsafe { std::env::remove_var(key) };
    }
}

/// Points the working directory and `XDG_CONFIG_HOME` at a test directory and restores both on drop.
struct WorkspaceGuard {
    previous_dir: PathBuf,
    previous_config_home: Option<String>,
}

impl WorkspaceGuard {
    fn enter(dir: &Path) -> Self {
        let previous_dir = std::env::current_dir().expect("Working directory should exist");
        let previous_config_home = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_current_dir(dir).expect("Failed to enter test directory");
        // SAFETY: tests touching the environment are `#[serial]`.
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.join("config")) };
        WorkspaceGuard {
            previous_dir,
            previous_config_home,
        }
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous_dir);
        // SAFETY: tests touching the environment are `#[serial]`.
        unsafe {
            match &self.previous_config_home {
                Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }
}

fn write_config(contents: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("endpoint-client.toml"), contents).expect("Failed to write config");
    dir
}

/// **VALUE**: Verifies that a missing config file yields defaults instead of an error.
///
/// **WHY THIS MATTERS**: First runs have no config file. Failing there would force users to
/// create one before anything works.
///
/// **BUG THIS CATCHES**: Would catch treating "file not found" as a read error.
#[test]
fn given_missing_file_when_loading_then_returns_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let config = ClientConfig::load(dir.path()).expect("Missing file should load defaults");

    assert!(config.connection.base_url.is_none());
    assert!(config.connection.plugin_id.is_none());
    assert_eq!(config.connection.tls, TlsPolicy::Verify);
}

/// **VALUE**: Verifies that every supported key is read from the file.
///
/// **BUG THIS CATCHES**: Would catch serde renames drifting from the documented keys.
#[test]
#[serial]
fn given_complete_file_when_converted_then_options_reflect_it() {
    let _env = EnvGuard::set(&[]);
    let dir = write_config(
        r#"
[connection]
base_url = "https://192.168.1.20:10443"
plugin_id = "@scrypted/core"
client_name = "kitchen-panel"
tls = "accept_invalid_certificates"
"#,
    );

    let options = ClientConfig::load(dir.path())
        .expect("Config should load")
        .into_options()
        .expect("Options should be valid");

    assert_eq!(options.root_location().as_str(), "https://192.168.1.20:10443/");
    assert_eq!(options.plugin_id(), "@scrypted/core");
    assert_eq!(options.client_name(), "kitchen-panel");
    assert_eq!(options.tls_policy(), TlsPolicy::AcceptInvalidCertificates);
    assert!(options.credentials().is_none());
}

/// **VALUE**: Verifies that environment variables override file values.
///
/// **WHY THIS MATTERS**: Deployments point the same config at different servers via the
/// environment.
///
/// **BUG THIS CATCHES**: Would catch file values winning over the environment.
#[test]
#[serial]
fn given_env_overrides_when_loading_then_env_wins() {
    let _env = EnvGuard::set(&[
        (BASE_URL_ENV, "http://10.0.0.5:11080"),
        (PLUGIN_ID_ENV, "@scrypted/webrtc"),
    ]);
    let dir = write_config(
        r#"
[connection]
base_url = "https://192.168.1.20:10443"
plugin_id = "@scrypted/core"
"#,
    );

    let options = ClientConfig::load(dir.path())
        .expect("Config should load")
        .with_env_overrides()
        .expect("Overrides should apply")
        .into_options()
        .expect("Options should be valid");

    assert_eq!(options.root_location().as_str(), "http://10.0.0.5:11080/");
    assert_eq!(options.plugin_id(), "@scrypted/webrtc");
}

/// **VALUE**: Verifies that credentials come from the environment and stay redacted.
///
/// **BUG THIS CATCHES**: Would catch the password showing up in `Debug` output.
#[test]
#[serial]
fn given_credentials_in_env_when_converted_then_options_carry_them() {
    let _env = EnvGuard::set(&[(USERNAME_ENV, "admin"), (PASSWORD_ENV, "hunter2")]);
    let dir = write_config("[connection]\nplugin_id = \"core\"\n");

    let options = ClientConfig::load(dir.path())
        .expect("Config should load")
        .into_options()
        .expect("Options should be valid");

    let credentials = options.credentials().expect("Credentials should be present");
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password.expose(), "hunter2");
    assert!(!format!("{options:?}").contains("hunter2"));
}

/// **VALUE**: Verifies that an empty variable is treated as unset.
///
/// **BUG THIS CATCHES**: Would catch `ENDPOINT_CLIENT_BASE_URL=` replacing a good file value
/// with an empty, unparsable URL.
#[test]
#[serial]
fn given_empty_env_var_when_overriding_then_file_value_kept() {
    let _env = EnvGuard::set(&[(BASE_URL_ENV, "")]);
    let dir = write_config("[connection]\nbase_url = \"http://example.local:8080\"\n");

    let config = ClientConfig::load(dir.path())
        .expect("Config should load")
        .with_env_overrides()
        .expect("Overrides should apply");

    assert_eq!(
        config.connection.base_url.as_deref(),
        Some("http://example.local:8080")
    );
}

/// **VALUE**: Verifies that a password key in the file is rejected.
///
/// **WHY THIS MATTERS**: Secrets must not live in a plain config file; silently ignoring the key
/// would let users believe the password is used.
///
/// **BUG THIS CATCHES**: Would catch `deny_unknown_fields` being removed.
#[test]
fn given_password_in_file_when_loading_then_fails_with_parse_error() {
    let dir = write_config("[connection]\nplugin_id = \"core\"\npassword = \"hunter2\"\n");

    let result = ClientConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies that invalid file values surface as option validation errors.
#[test]
#[serial]
fn given_file_without_plugin_id_when_converted_then_fails_validation() {
    let _env = EnvGuard::set(&[]);
    let dir = write_config("[connection]\nbase_url = \"http://example.local\"\n");

    let result = ClientConfig::load(dir.path())
        .expect("Config should load")
        .into_options();

    assert!(matches!(result, Err(ConfigError::Options(_))));
}

/// **VALUE**: Verifies that the config directory follows the platform convention.
///
/// **BUG THIS CATCHES**: Would catch the directory name drifting from `endpoint-client`, which
/// would silently orphan every existing config file.
#[cfg(target_os = "linux")]
#[test]
#[serial]
fn given_xdg_config_home_when_resolving_default_dir_then_app_dir_is_under_it() {
    let root = TempDir::new().expect("Failed to create temp dir");
    let _workspace = WorkspaceGuard::enter(root.path());

    let dir = ClientConfig::default_dir().expect("Config dir should resolve");

    assert_eq!(dir, root.path().join("config").join("endpoint-client"));
}

/// **VALUE**: Verifies that credentials in a `.env` file reach the connection options.
///
/// **WHY THIS MATTERS**: `.env` is the documented place for the password during development.
/// If it is not loaded, `connect` silently skips the login and the server sees an anonymous client.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `.env` is looked up somewhere other than the working directory
/// - Loaded variables are not the ones `into_options` reads
#[test]
#[serial]
fn given_dotenv_in_working_dir_when_loaded_then_options_carry_credentials() {
    // GIVEN: A working directory with a .env holding credentials, and a clean environment
    let _env = EnvGuard::set(&[]);
    let root = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        root.path().join(".env"),
        format!("{USERNAME_ENV}=admin\n{PASSWORD_ENV}=hunter2\n"),
    )
    .expect("Failed to write .env");
    let _workspace = WorkspaceGuard::enter(root.path());

    // WHEN: Loading .env and converting an otherwise empty config
    let loaded = load_dotenv().expect(".env should be found");
    let options = ClientConfig::load(&root.path().join("config"))
        .expect("Config should load")
        .into_options()
        .expect("Options should be valid");

    // THEN: The file in the working directory was used and the credentials came through
    assert_eq!(
        loaded.canonicalize().expect("Loaded path should exist"),
        root.path().join(".env").canonicalize().expect(".env should exist")
    );
    let credentials = options.credentials().expect("Credentials should be present");
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password.expose(), "hunter2");
}

/// **VALUE**: Verifies that variables already set win over `.env`.
///
/// **BUG THIS CATCHES**: Would catch switching to an overriding loader, which would let a stale
/// `.env` shadow credentials injected by the deployment.
#[test]
#[serial]
fn given_env_var_already_set_when_loading_dotenv_then_process_value_kept() {
    let _env = EnvGuard::set(&[(USERNAME_ENV, "operator")]);
    let root = TempDir::new().expect("Failed to create temp dir");
    fs::write(root.path().join(".env"), format!("{USERNAME_ENV}=admin\n"))
        .expect("Failed to write .env");
    let _workspace = WorkspaceGuard::enter(root.path());

    load_dotenv().expect(".env should be found");

    assert_eq!(std::env::var(USERNAME_ENV).as_deref(), Ok("operator"));
}

/// **VALUE**: Verifies the whole resolution chain: `.env`, config file, environment overrides.
///
/// **WHY THIS MATTERS**: Applications call this one function. Each layer is tested on its own
/// above; this checks they are applied together and in order.
///
/// **BUG THIS CATCHES**: Would catch `resolve_options` skipping a layer or reading the config file
/// from anywhere but the platform directory.
#[cfg(target_os = "linux")]
#[test]
#[serial]
fn given_dotenv_and_config_file_when_resolving_options_then_all_layers_apply() {
    // GIVEN: A config file in the platform dir, a .env with credentials and a plugin override
    let _env = EnvGuard::set(&[]);
    let root = TempDir::new().expect("Failed to create temp dir");
    let config_dir = root.path().join("config").join("endpoint-client");
    fs::create_dir_all(&config_dir).expect("Failed to create config dir");
    fs::write(
        config_dir.join("endpoint-client.toml"),
        "[connection]\nbase_url = \"https://192.168.1.20:10443\"\nplugin_id = \"@scrypted/core\"\n",
    )
    .expect("Failed to write config");
    fs::write(
        root.path().join(".env"),
        format!("{USERNAME_ENV}=admin\n{PASSWORD_ENV}=hunter2\n{PLUGIN_ID_ENV}=@scrypted/webrtc\n"),
    )
    .expect("Failed to write .env");
    let _workspace = WorkspaceGuard::enter(root.path());

    // WHEN: Resolving options
    let options = ClientConfig::resolve_options().expect("Options should resolve");

    // THEN: File value, .env override and .env credentials are all present
    assert_eq!(options.root_location().as_str(), "https://192.168.1.20:10443/");
    assert_eq!(options.plugin_id(), "@scrypted/webrtc");
    assert_eq!(
        options.credentials().map(|c| c.username.as_str()),
        Some("admin")
    );
}
