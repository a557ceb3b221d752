/*!
 * Handoff Queue
 *
 * Blocking FIFO for handing values from producer threads to consumer threads.
 *
 * # Lifecycle
 *
 * - **Open, has data**: receive returns immediately
 * - **Open, empty**: receive blocks until an append or close
 * - **Closed**: remaining items drain in order, then receive returns `None`
 *
 * Closing is one-way and may happen only once. Appending after close and
 * closing twice are both reported as errors rather than ignored.
 */

mod config;
mod handoff;
mod iter;
mod types;

#[cfg(feature = "tokio")]
mod async_recv;

pub use config::{QueueConfig, DEFAULT_QUEUE_NAME};
pub use handoff::BlockingHandoffQueue;
pub use iter::{IntoIter, Iter};
pub use types::{QueueError, QueueResult, QueueStats, TryReceive};
