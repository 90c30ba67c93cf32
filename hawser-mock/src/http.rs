use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::MockBehavior;
use hawser_core::{Config, HawserError, HttpMethod, HttpTransport, RawRequest};

#[derive(Default)]
struct HttpState {
    routes: HashMap<(HttpMethod, String), MockBehavior<String>>,
    requests: Vec<RawRequest>,
}

/// Controller for [`MockHttpTransport`].
///
/// Requests to an unscripted route fail with transport code 404.
pub struct MockHttpController {
    state: Arc<Mutex<HttpState>>,
}

impl MockHttpController {
    /// Script the response for `method` on `path`.
    pub fn set_route(&self, method: HttpMethod, path: impl Into<String>, behavior: MockBehavior<String>) {
        self.state
            .lock()
            .expect("mutex poisoned")
            .routes
            .insert((method, path.into()), behavior);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RawRequest> {
        self.state.lock().expect("mutex poisoned").requests.clone()
    }
}

/// An HTTP transport that answers from scripted routes.
pub struct MockHttpTransport {
    state: Arc<Mutex<HttpState>>,
}

impl MockHttpTransport {
    /// Create a new mock transport and its controller.
    #[must_use]
    pub fn new_with_controller() -> (Arc<dyn HttpTransport>, MockHttpController) {
        let state = Arc::new(Mutex::new(HttpState::default()));
        let controller = MockHttpController {
            state: Arc::clone(&state),
        };
        (Arc::new(Self { state }) as Arc<dyn HttpTransport>, controller)
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn request(&self, _config: &Config, request: RawRequest) -> Result<String, HawserError> {
        let behavior = {
            let mut guard = self.state.lock().expect("mutex poisoned");
            let route = guard
                .routes
                .get(&(request.method, request.path.clone()))
                .cloned();
            guard.requests.push(request.clone());
            route
        };

        match behavior {
            Some(MockBehavior::Return(body)) => Ok(body),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => Err(HawserError::transport(
                404,
                format!("no route for {} {}", request.method, request.path),
            )),
        }
    }
}
