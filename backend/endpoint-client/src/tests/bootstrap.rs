use crate::UNKNOWN_VERSION;
use crate::bootstrap::phase::ConnectionPhase;
use crate::bootstrap::probe_version;
use crate::error::rpc::RpcError;
use crate::rpc::{InfoComponent, SystemManager};

enum Info {
    Version(&'static str),
    Broken,
}

impl InfoComponent for Info {
    async fn get_version(&self) -> Result<String, RpcError> {
        match self {
            Info::Version(version) => Ok(version.to_string()),
            Info::Broken => Err(RpcError::remote("getVersion is not a function")),
        }
    }
}

enum System {
    WithInfo(&'static str),
    BrokenInfo,
    NoInfo,
}

impl SystemManager for System {
    type Component = Info;

    async fn get_component(&self, name: &str) -> Result<Info, RpcError> {
        assert_eq!(name, "info");
        match self {
            System::WithInfo(version) => Ok(Info::Version(*version)),
            System::BrokenInfo => Ok(Info::Broken),
            System::NoInfo => Err(RpcError::unavailable("no component named info")),
        }
    }
}

/// **VALUE**: Verifies that the version probe returns the server's answer.
#[tokio::test]
async fn given_info_component_when_probed_then_returns_version() {
    let version = probe_version(&System::WithInfo("0.123.4")).await;

    assert_eq!(version, "0.123.4");
}

/// **VALUE**: Verifies that every probe failure falls back to `"unknown"`.
///
/// **WHY THIS MATTERS**: Older servers lack the info component or its version call. The
/// session is still usable and must not be refused over a cosmetic value.
///
/// **BUG THIS CATCHES**: Would catch the component lookup being outside the fallback.
#[tokio::test]
async fn given_missing_or_failing_info_when_probed_then_returns_unknown() {
    assert_eq!(probe_version(&System::BrokenInfo).await, UNKNOWN_VERSION);
    assert_eq!(probe_version(&System::NoInfo).await, UNKNOWN_VERSION);
}

/// **VALUE**: Verifies the allowed phase transitions.
///
/// **BUG THIS CATCHES**: Would catch a path that skips a phase or leaves a terminal state.
#[test]
fn given_phases_when_transitions_checked_then_only_forward_or_failed_allowed() {
    use ConnectionPhase::*;

    assert!(Idle.can_advance_to(HeaderPreparation));
    assert!(HeaderPreparation.can_advance_to(TransportOpening));
    assert!(TransportOpening.can_advance_to(Handshaking));
    assert!(Handshaking.can_advance_to(Ready));
    assert!(HeaderPreparation.can_advance_to(Failed));
    assert!(TransportOpening.can_advance_to(Failed));
    assert!(Handshaking.can_advance_to(Failed));

    assert!(!Idle.can_advance_to(Handshaking));
    assert!(!Ready.can_advance_to(Failed));
    assert!(!Failed.can_advance_to(HeaderPreparation));
    assert!(!Idle.can_advance_to(Failed));
    assert!(Ready.is_terminal() && Failed.is_terminal());
    assert!(!Handshaking.is_terminal());
}
