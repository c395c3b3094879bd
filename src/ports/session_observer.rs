//! Session Observer Port - synchronous session change notifications.

use crate::domain::session::SessionEvent;

/// Receives session changes right after they are committed.
///
/// Called synchronously while the store is between writes; implementations
/// must not block and must not call back into the session store's write path.
pub trait SessionObserver: Send + Sync {
    fn on_session_event(&self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_session_event(&self, event: &SessionEvent) {
        self(event)
    }
}
