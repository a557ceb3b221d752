/*!
 * Blocking Handoff Queue
 *
 * Unbounded FIFO mailbox shared by any number of producer and consumer
 * threads, with a one-way open -> closed lifecycle.
 *
 * # Design
 *
 * A single `parking_lot::Mutex` guards the buffer, the open flag and the
 * counters. One `Condvar` signals "item appended or queue closed". Receivers
 * always wait in a predicate loop, so spurious wakeups and wakeups stolen by
 * another consumer just send them back to sleep.
 *
 * - `append` wakes one receiver (one item can satisfy at most one receiver)
 * - `close` wakes every receiver (each must observe end-of-stream)
 * - buffered items are always drained before end-of-stream is reported
 */

use super::config::QueueConfig;
use super::types::{QueueError, QueueResult, QueueStats, TryReceive};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// State guarded by the queue mutex
struct State<T> {
    buffer: VecDeque<T>,
    open: bool,
    appended: u64,
    received: u64,
}

impl<T> State<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            open: true,
            appended: 0,
            received: 0,
        }
    }

    #[inline]
    fn pop(&mut self) -> Option<T> {
        let item = self.buffer.pop_front()?;
        self.received += 1;
        Some(item)
    }

    #[inline]
    fn is_drained(&self) -> bool {
        !self.open && self.buffer.is_empty()
    }
}

/// Multi-producer, multi-consumer blocking FIFO with graceful shutdown
///
/// Share it across threads with `Arc`. Producers call [`append`], consumers
/// call [`receive`] (or iterate), and whoever owns shutdown calls [`close`]
/// exactly once.
///
/// # Examples
///
/// ```
/// use handoff_queue::BlockingHandoffQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(BlockingHandoffQueue::new());
///
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || queue.iter().collect::<Vec<u32>>())
/// };
///
/// queue.append(1).unwrap();
/// queue.append(2).unwrap();
/// queue.close().unwrap();
///
/// assert_eq!(consumer.join().unwrap(), vec![1, 2]);
/// ```
///
/// [`append`]: BlockingHandoffQueue::append
/// [`receive`]: BlockingHandoffQueue::receive
/// [`close`]: BlockingHandoffQueue::close
pub struct BlockingHandoffQueue<T> {
    state: Mutex<State<T>>,
    /// Signalled on append (one waiter) and close (all waiters)
    ready: Condvar,
    config: QueueConfig,
}

impl<T> BlockingHandoffQueue<T> {
    /// Create an open, empty queue with default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create an open, empty queue with the given configuration
    pub fn with_config(config: QueueConfig) -> Self {
        debug!(
            queue = %config.name,
            initial_capacity = config.initial_capacity,
            "Handoff queue created"
        );
        Self {
            state: Mutex::new(State::with_capacity(config.initial_capacity)),
            ready: Condvar::new(),
            config,
        }
    }

    /// Diagnostic name of this queue
    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Append an item to the back of the queue and wake one receiver
    ///
    /// Storage and wakeup both happen before the lock is released, so
    /// concurrent producers never interleave inside the buffer.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] if the queue was already closed. The item is
    /// dropped, not enqueued.
    pub fn append(&self, item: T) -> QueueResult<()> {
        let mut state = self.state.lock();
        if !state.open {
            drop(state);
            warn!(queue = %self.config.name, "Append rejected: queue closed");
            return Err(QueueError::Closed);
        }

        state.buffer.push_back(item);
        state.appended += 1;
        self.ready.notify_one();

        trace!(queue = %self.config.name, len = state.buffer.len(), "Item appended");
        Ok(())
    }

    /// Receive the front item, blocking while the queue is open and empty
    ///
    /// Returns `None` (end-of-stream) only once the queue is closed and every
    /// buffered item has been handed out. Buffered items are delivered even
    /// after close.
    pub fn receive(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.pop() {
                trace!(queue = %self.config.name, len = state.buffer.len(), "Item received");
                return Some(item);
            }
            if !state.open {
                trace!(queue = %self.config.name, "End of stream");
                return None;
            }
            // Releases the lock while parked, reacquires before returning
            self.ready.wait(&mut state);
        }
    }

    /// Like [`receive`](Self::receive), but give up after `timeout`
    ///
    /// The deadline is fixed on entry; spurious wakeups do not extend it.
    ///
    /// # Errors
    ///
    /// [`QueueError::Timeout`] if no item arrived and the queue was not
    /// closed before the deadline.
    pub fn receive_timeout(&self, timeout: Duration) -> QueueResult<Option<T>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // Deadline beyond the clock's range is indistinguishable from forever
            return Ok(self.receive());
        };

        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.pop() {
                trace!(queue = %self.config.name, len = state.buffer.len(), "Item received");
                return Ok(Some(item));
            }
            if !state.open {
                trace!(queue = %self.config.name, "End of stream");
                return Ok(None);
            }
            if Instant::now() >= deadline {
                trace!(queue = %self.config.name, ?timeout, "Receive timed out");
                return Err(QueueError::Timeout);
            }
            self.ready.wait_until(&mut state, deadline);
        }
    }

    /// Take the front item if one is buffered, never waiting
    pub fn try_receive(&self) -> TryReceive<T> {
        let mut state = self.state.lock();
        match state.pop() {
            Some(item) => TryReceive::Item(item),
            None if state.open => TryReceive::Empty,
            None => TryReceive::Drained,
        }
    }

    /// Close the queue and wake every blocked receiver
    ///
    /// Items already buffered remain receivable. There is no reopen.
    ///
    /// # Errors
    ///
    /// [`QueueError::AlreadyClosed`] on a second call; the queue state is
    /// left untouched.
    pub fn close(&self) -> QueueResult<()> {
        let mut state = self.state.lock();
        if !state.open {
            drop(state);
            warn!(queue = %self.config.name, "Close rejected: queue already closed");
            return Err(QueueError::AlreadyClosed);
        }

        state.open = false;
        self.ready.notify_all();

        debug!(queue = %self.config.name, pending = state.buffer.len(), "Handoff queue closed");
        Ok(())
    }

    /// Number of buffered items
    ///
    /// Inaccurate in the presence of concurrent method invocations.
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Inaccurate in the presence of concurrent method invocations.
    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    /// `true` once [`close`](Self::close) has succeeded
    pub fn is_closed(&self) -> bool {
        !self.state.lock().open
    }

    /// Closed and empty: every receive returns end-of-stream immediately
    pub fn is_drained(&self) -> bool {
        self.state.lock().is_drained()
    }

    /// Consistent snapshot of length, counters and lifecycle flag
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            name: self.config.name.clone(),
            length: state.buffer.len(),
            appended: state.appended,
            received: state.received,
            closed: !state.open,
        }
    }

    /// Put an already received item back at the front of the buffer
    ///
    /// Used when the receiver it was taken for went away before delivery.
    /// Allowed after close: the item was enqueued while the queue was open.
    #[cfg(feature = "tokio")]
    pub(super) fn requeue_front(&self, item: T) {
        let mut state = self.state.lock();
        state.buffer.push_front(item);
        state.received = state.received.saturating_sub(1);
        self.ready.notify_one();

        trace!(queue = %self.config.name, len = state.buffer.len(), "Item requeued");
    }

    /// Consume the queue, returning whatever is still buffered in FIFO order
    pub(super) fn into_buffer(self) -> VecDeque<T> {
        self.state.into_inner().buffer
    }
}

impl<T> Default for BlockingHandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingHandoffQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BlockingHandoffQueue")
            .field("name", &self.config.name)
            .field("len", &state.buffer.len())
            .field("open", &state.open)
            .finish()
    }
}
