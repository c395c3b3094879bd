//! Mock request executor for testing.
//!
//! Provides a scripted implementation of `RequestExecutor` for unit and
//! integration tests. Supports:
//! - Sticky responses per route
//! - One-shot responses consumed before the sticky one
//! - An artificial delay to widen race windows
//! - Call tracking

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::activity::RequestActivity;
use crate::ports::{ApiRequest, HttpMethod, RequestExecutor, TransportError};

type Route = (HttpMethod, String);
type Reply = Result<Value, TransportError>;

/// Mock request executor.
///
/// # Example
///
/// ```ignore
/// let executor = MockRequestExecutor::new();
/// executor.respond(HttpMethod::Get, "subscription/plans", Ok(json!([])));
/// executor.respond_once(HttpMethod::Post, "auth/refresh", Err(TransportError::Status {
///     status: 401,
///     body: json!({ "message": "expired" }),
/// }));
///
/// assert_eq!(executor.calls_to("auth/refresh"), 0);
/// ```
#[derive(Default)]
pub struct MockRequestExecutor {
    state: Mutex<MockState>,
    activity: RequestActivity,
}

#[derive(Default)]
struct MockState {
    sticky: HashMap<Route, Reply>,
    once: HashMap<Route, VecDeque<Reply>>,
    calls: Vec<ApiRequest>,
    delay: Option<Duration>,
}

impl MockRequestExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reply to every request on this route.
    pub fn respond(&self, method: HttpMethod, path: &str, reply: Reply) {
        self.state().sticky.insert((method, path.to_string()), reply);
    }

    /// Reply once; queued replies are used before the sticky one.
    pub fn respond_once(&self, method: HttpMethod, path: &str, reply: Reply) {
        self.state()
            .once
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Delay every reply.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.state().calls.clone()
    }

    /// Number of requests to `path`, any method.
    pub fn calls_to(&self, path: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.path() == path)
            .count()
    }

    /// Most recent request to `path`.
    pub fn last_call_to(&self, path: &str) -> Option<ApiRequest> {
        self.state()
            .calls
            .iter()
            .rev()
            .find(|c| c.path() == path)
            .cloned()
    }

    fn next_reply(&self, route: &Route) -> Reply {
        let mut state = self.state();
        if let Some(reply) = state.once.get_mut(route).and_then(VecDeque::pop_front) {
            return reply;
        }
        state.sticky.get(route).cloned().unwrap_or_else(|| {
            Err(TransportError::Status {
                status: 404,
                body: json!({ "message": format!("no mock route for {} {}", route.0, route.1) }),
            })
        })
    }
}

#[async_trait]
impl RequestExecutor for MockRequestExecutor {
    async fn request(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let _in_flight = self.activity.begin();
        let route = (request.method, request.path());
        let delay = {
            let mut state = self.state();
            state.calls.push(request);
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.next_reply(&route);
        self.activity.record(&reply);
        reply
    }

    fn in_flight(&self) -> bool {
        self.activity.in_flight()
    }

    fn last_error(&self) -> Option<TransportError> {
        self.activity.last_error()
    }
}
