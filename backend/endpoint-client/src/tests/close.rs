use crate::session::close::CloseNotifier;
use crate::transport::CloseReason;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// **VALUE**: Verifies that repeated notifications run the hook exactly once.
///
/// **WHY THIS MATTERS**: Callers use the hook to tear down UI or reconnect. Running it twice
/// would reconnect twice.
///
/// **BUG THIS CATCHES**: Would catch the fired flag not being set.
#[test]
fn given_hook_when_notified_twice_then_runs_once() {
    // GIVEN: A notifier with a counting hook
    let notifier = CloseNotifier::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    assert!(notifier.set_hook(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    // WHEN: Notified twice
    notifier.notify(CloseReason::ServerClosed);
    notifier.notify(CloseReason::ClientRequested);

    // THEN: One call, and the notifier reports done
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(notifier.is_done());
}

/// **VALUE**: Verifies that a later hook replaces an earlier one.
///
/// **BUG THIS CATCHES**: Would catch both hooks running (slot turned into a list).
#[test]
fn given_two_hooks_when_notified_then_only_latest_runs() {
    let notifier = CloseNotifier::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let first_counter = Arc::clone(&first);
    notifier.set_hook(Box::new(move |_| {
        first_counter.fetch_add(1, Ordering::SeqCst);
    }));
    let second_counter = Arc::clone(&second);
    notifier.set_hook(Box::new(move |_| {
        second_counter.fetch_add(1, Ordering::SeqCst);
    }));

    notifier.notify(CloseReason::ConnectionLost);

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

/// **VALUE**: Verifies that a hook set after the close is refused.
#[test]
fn given_fired_notifier_when_hook_set_then_refused() {
    let notifier = CloseNotifier::new();
    notifier.notify(CloseReason::PingTimeout);

    let accepted = notifier.set_hook(Box::new(|_| panic!("must not run")));

    assert!(!accepted);
}

/// **VALUE**: Verifies that the hook receives the close reason.
#[test]
fn given_hook_when_notified_then_receives_reason() {
    let notifier = CloseNotifier::new();
    let (tx, rx) = std::sync::mpsc::channel();
    notifier.set_hook(Box::new(move |reason| {
        tx.send(reason).unwrap();
    }));

    notifier.notify(CloseReason::Error(String::from("reset")));

    assert_eq!(rx.recv().unwrap(), CloseReason::Error(String::from("reset")));
}

/// **VALUE**: Verifies that waiting resolves after notification.
#[tokio::test]
async fn given_waiter_when_notified_then_wait_resolves() {
    let notifier = CloseNotifier::new();
    let waiter = notifier.clone();
    let handle = tokio::spawn(async move { waiter.wait().await });

    notifier.notify(CloseReason::ServerClosed);

    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("wait should resolve")
        .unwrap();
}
