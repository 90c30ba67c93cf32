use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A task handle that can be queried for completion and aborted.
pub trait Abortable {
    /// Abort the task if it is still running.
    fn abort(&mut self);
    /// Return `true` once the task has completed.
    fn is_finished(&self) -> bool;
}

impl Abortable for JoinHandle<()> {
    fn abort(&mut self) {
        Self::abort(self);
    }

    fn is_finished(&self) -> bool {
        Self::is_finished(self)
    }
}

/// A one-shot stop signal.
pub trait Stoppable {
    /// Ask the task to stop. Best effort: the task may already be gone.
    fn send(self);
}

impl Stoppable for oneshot::Sender<()> {
    fn send(self) {
        let _ = Self::send(self, ());
    }
}

/// Teardown shared by [`PushTask`] and its tests:
/// - signal stop if a sender is still held
/// - abort the task unless it already finished
///
/// An abort only takes effect at the task's next await point, so a handler that is running
/// when this is called finishes its current delivery.
pub fn drop_impl<H, S>(task: &mut Option<H>, stop_tx: &mut Option<S>)
where
    H: Abortable,
    S: Stoppable,
{
    if let Some(tx) = stop_tx.take() {
        tx.send();
    }
    if let Some(mut h) = task.take()
        && !h.is_finished()
    {
        h.abort();
    }
}

/// Owner of a session's push task.
///
/// Dropping it signals stop and aborts the task if it is still running.
#[derive(Debug)]
pub struct PushTask {
    task: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl PushTask {
    /// Wrap a spawned task and the sender that stops it.
    #[must_use]
    pub const fn new(task: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            task: Some(task),
            stop_tx: Some(stop_tx),
        }
    }
}

impl Drop for PushTask {
    fn drop(&mut self) {
        drop_impl(&mut self.task, &mut self.stop_tx);
    }
}
