//! Single-slot close notification shared by the inbound pump and the session.

use crate::transport::CloseReason;

use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

pub(crate) type CloseHook = Box<dyn FnOnce(CloseReason) + Send + 'static>;

#[derive(Default)]
struct HookSlot {
    hook: Option<CloseHook>,
    fired: bool,
}

/// Fires at most once. A hook set after firing is dropped uncalled.
#[derive(Clone)]
pub(crate) struct CloseNotifier {
    slot: Arc<Mutex<HookSlot>>,
    done: Arc<watch::Sender<bool>>,
}

impl CloseNotifier {
    pub(crate) fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            slot: Arc::new(Mutex::new(HookSlot::default())),
            done: Arc::new(done),
        }
    }

    /// Install `hook`, replacing any previous one. Returns false when the
    /// notification has already fired.
    pub(crate) fn set_hook(&self, hook: CloseHook) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.fired {
            return false;
        }
        slot.hook = Some(hook);
        true
    }

    pub(crate) fn notify(&self, reason: CloseReason) {
        let hook = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.fired {
                return;
            }
            slot.fired = true;
            slot.hook.take()
        };

        // Called outside the lock so the hook may touch the session freely.
        if let Some(hook) = hook {
            hook(reason);
        }
        self.done.send_replace(true);
    }

    /// True once the notification has fired and its hook has returned.
    pub(crate) fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    pub(crate) async fn wait(&self) {
        let mut done = self.done.subscribe();
        // The sender lives in self, so this cannot fail while we wait.
        let _ = done.wait_for(|is_done| *is_done).await;
    }
}

impl Debug for CloseNotifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("CloseNotifier")
            .field("done", &self.is_done())
            .finish()
    }
}
