//! Ambient request state shared by executor adapters.

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::ports::TransportError;

/// Tracks outstanding requests and the most recent failure.
#[derive(Debug, Default)]
pub struct RequestActivity {
    in_flight: AtomicUsize,
    last_error: Mutex<Option<TransportError>>,
}

/// Decrements the in-flight count when dropped, including on cancellation.
pub struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RequestActivity {
    pub fn begin(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: &self.in_flight,
        }
    }

    /// Remembers a failure, or forgets the previous one on success.
    pub fn record(&self, result: &Result<Value, TransportError>) {
        let mut last = self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = result.as_ref().err().cloned();
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_in_flight() {
        let activity = RequestActivity::default();
        assert!(!activity.in_flight());
        {
            let _a = activity.begin();
            let _b = activity.begin();
            assert!(activity.in_flight());
        }
        assert!(!activity.in_flight());
    }

    #[test]
    fn success_clears_last_error() {
        let activity = RequestActivity::default();
        activity.record(&Err(TransportError::NoResponse("reset".into())));
        assert!(activity.last_error().is_some());

        activity.record(&Ok(Value::Null));
        assert!(activity.last_error().is_none());
    }
}
