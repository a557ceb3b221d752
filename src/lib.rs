/*!
 * Handoff Queue Library
 * Blocking multi-producer, multi-consumer FIFO with graceful shutdown
 */

pub mod monitoring;
pub mod queue;

// Re-exports
pub use monitoring::init_tracing;
pub use queue::{
    BlockingHandoffQueue, IntoIter, Iter, QueueConfig, QueueError, QueueResult, QueueStats,
    TryReceive,
};
