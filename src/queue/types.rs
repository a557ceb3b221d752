/*!
 * Queue Types
 * Error taxonomy, receive outcomes and statistics for the handoff queue
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Queue operation errors
///
/// `Closed` and `AlreadyClosed` are caller-misuse errors: they point at a
/// shutdown coordination bug and are never retried internally. End-of-stream
/// is not an error and never appears here.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum QueueError {
    #[error("cannot append to closed queue")]
    #[diagnostic(
        code(queue::closed),
        help("Producers must stop appending before the queue is closed.")
    )]
    Closed,

    #[error("queue already closed")]
    #[diagnostic(
        code(queue::already_closed),
        help("Exactly one party should own shutdown. Check who else calls close().")
    )]
    AlreadyClosed,

    #[error("receive timed out")]
    #[diagnostic(
        code(queue::timeout),
        help("No item arrived and the queue was not closed before the deadline.")
    )]
    Timeout,

    #[error("receive task was cancelled")]
    #[diagnostic(
        code(queue::cancelled),
        help("The blocking receive task panicked or the runtime shut down.")
    )]
    Cancelled,
}

/// Outcome of a non-blocking receive attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryReceive<T> {
    /// Front item of the buffer
    Item(T),
    /// Queue is open but nothing is buffered; a blocking receive would wait
    Empty,
    /// Queue is closed and empty; no item will ever arrive
    Drained,
}

impl<T> TryReceive<T> {
    /// Convert into the item, discarding the empty/drained distinction
    #[inline]
    pub fn into_item(self) -> Option<T> {
        match self {
            TryReceive::Item(item) => Some(item),
            TryReceive::Empty | TryReceive::Drained => None,
        }
    }

    #[inline]
    pub fn is_drained(&self) -> bool {
        matches!(self, TryReceive::Drained)
    }
}

/// Point-in-time queue statistics
///
/// Taken under the queue lock, so the fields are consistent with each other:
/// `appended - received == length` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub name: String,
    pub length: usize,
    pub appended: u64,
    pub received: u64,
    pub closed: bool,
}

impl QueueStats {
    /// Closed with nothing left to hand off
    pub fn is_drained(&self) -> bool {
        self.closed && self.length == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(QueueError::Closed.to_string(), "cannot append to closed queue");
        assert_eq!(QueueError::AlreadyClosed.to_string(), "queue already closed");
    }

    #[test]
    fn test_error_diagnostic_code() {
        let code = QueueError::AlreadyClosed.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("queue::already_closed"));
    }

    #[test]
    fn test_error_serialization_is_tagged() {
        let json = serde_json::to_string(&QueueError::Timeout).unwrap();
        assert_eq!(json, r#"{"error_type":"timeout"}"#);

        let back: QueueError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, QueueError::Timeout);
    }

    #[test]
    fn test_try_receive_into_item() {
        assert_eq!(TryReceive::Item(7).into_item(), Some(7));
        assert_eq!(TryReceive::<i32>::Empty.into_item(), None);
        assert!(TryReceive::<i32>::Drained.is_drained());
        assert!(!TryReceive::<i32>::Empty.is_drained());
    }

    #[test]
    fn test_stats_drained() {
        let mut stats = QueueStats {
            name: "stats".into(),
            length: 1,
            appended: 3,
            received: 2,
            closed: true,
        };
        assert!(!stats.is_drained());
        stats.length = 0;
        assert!(stats.is_drained());
    }
}
