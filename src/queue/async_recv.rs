/*!
 * Async Receive Bridge
 *
 * Lets async code consume a handoff queue without blocking the tokio
 * runtime. The blocking receive runs on tokio's blocking pool and hands its
 * result back over a oneshot channel.
 *
 * Dropping the returned future never loses an item: the blocking task waits
 * in short slices and gives up once nobody is listening, and an item taken
 * just as the caller went away is put back at the front of the queue.
 */

use super::handoff::BlockingHandoffQueue;
use super::types::{QueueError, QueueResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::trace;

/// Longest a bridge task waits before checking whether its caller is gone
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl<T> BlockingHandoffQueue<T>
where
    T: Send + 'static,
{
    /// Async-compatible [`receive`](Self::receive) using `spawn_blocking`
    ///
    /// Cancellation-safe: if the future is dropped before it resolves, no
    /// item is consumed on its behalf.
    ///
    /// # Errors
    ///
    /// [`QueueError::Cancelled`] if the blocking task died without replying.
    pub async fn receive_async(self: &Arc<Self>) -> QueueResult<Option<T>> {
        self.bridge(None).await
    }

    /// Async-compatible [`receive_timeout`](Self::receive_timeout)
    pub async fn receive_timeout_async(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> QueueResult<Option<T>> {
        self.bridge(Some(timeout)).await
    }

    async fn bridge(self: &Arc<Self>, timeout: Option<Duration>) -> QueueResult<Option<T>> {
        let (tx, rx) = oneshot::channel();
        let queue = Arc::clone(self);
        tokio::task::spawn_blocking(move || queue.receive_for(tx, timeout));
        rx.await.map_err(|_| QueueError::Cancelled)?
    }

    /// Blocking half of the bridge; runs on the blocking pool
    fn receive_for(
        &self,
        tx: oneshot::Sender<QueueResult<Option<T>>>,
        timeout: Option<Duration>,
    ) {
        // `None` also covers deadlines beyond the clock's range
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        let result = loop {
            if tx.is_closed() {
                trace!(queue = %self.name(), "Async receiver dropped, bridge exiting");
                return;
            }

            let slice = match deadline {
                Some(deadline) => deadline
                    .saturating_duration_since(Instant::now())
                    .min(CANCEL_POLL_INTERVAL),
                None => CANCEL_POLL_INTERVAL,
            };

            match self.receive_timeout(slice) {
                Err(QueueError::Timeout)
                    if deadline.map_or(true, |deadline| Instant::now() < deadline) => {}
                other => break other,
            }
        };

        if let Err(Ok(Some(item))) = tx.send(result) {
            self.requeue_front(item);
        }
    }
}
