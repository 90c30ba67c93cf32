#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hawser::{AsyncResult, Config, Hawser, HawserError, SessionHandle, UserData};
use hawser_mock::{DynamicMockBackend, MockController};
use tokio::sync::oneshot;

/// Everything a test wants to keep from an `AsyncResult`.
#[derive(Debug)]
pub struct Outcome {
    pub handle: Option<SessionHandle>,
    pub error: Option<HawserError>,
    pub body: Option<String>,
    pub length: usize,
    pub userdata: Option<u64>,
}

impl Outcome {
    fn from_result(res: &AsyncResult) -> Self {
        let outcome = Self {
            handle: res.handle(),
            error: res.error().cloned(),
            body: res.data::<String>().cloned(),
            length: res.length(),
            userdata: res.userdata().get::<u64>().copied(),
        };
        assert_eq!(outcome.error.is_some(), !res.is_ok());
        assert!(
            outcome.error.is_none() || (outcome.body.is_none() && outcome.length == 0),
            "error and payload must be exclusive"
        );
        outcome
    }
}

/// A callback that forwards its outcome to the returned receiver.
pub fn capture() -> (
    impl FnOnce(&AsyncResult) + Send + 'static,
    oneshot::Receiver<Outcome>,
) {
    let (tx, rx) = oneshot::channel();
    let cb = move |res: &AsyncResult| {
        let _ = tx.send(Outcome::from_result(res));
    };
    (cb, rx)
}

pub async fn wait(rx: oneshot::Receiver<Outcome>) -> Outcome {
    tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("callback did not fire")
        .expect("callback dropped without firing")
}

pub fn config() -> Config {
    Config::new("app-key", "app-secret", "access-token")
}

/// Facade on the current test runtime, backed by a fresh mock.
pub fn hawser_on_current() -> (Hawser, MockController) {
    let (backend, ctl) = DynamicMockBackend::new_with_controller();
    let hawser = Hawser::builder()
        .backend(backend)
        .runtime(tokio::runtime::Handle::current())
        .build()
        .expect("build hawser");
    (hawser, ctl)
}

pub async fn create_handle(hawser: &Hawser) -> SessionHandle {
    let (cb, rx) = capture();
    hawser.create(config(), cb, UserData::none());
    let outcome = wait(rx).await;
    assert!(outcome.error.is_none(), "create failed: {:?}", outcome.error);
    outcome.handle.expect("create delivered no handle")
}

/// Poll `cond` until it holds or a second passes.
pub async fn eventually(cond: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

pub fn counter() -> Arc<std::sync::atomic::AtomicUsize> {
    Arc::new(std::sync::atomic::AtomicUsize::new(0))
}

pub async fn subscribe_private(hawser: &Hawser, handle: SessionHandle) {
    let (cb, rx) = capture();
    hawser.subscribe(handle, &[hawser::TopicType::Private], cb, UserData::none());
    let outcome = wait(rx).await;
    assert!(outcome.error.is_none(), "subscribe failed: {:?}", outcome.error);
}
