/*!
 * Queue Configuration
 *
 * Construction-time settings for a handoff queue
 */

/// Default diagnostic name used in log events
pub const DEFAULT_QUEUE_NAME: &str = "handoff";

/// Handoff queue configuration
///
/// Neither field changes queue semantics. `initial_capacity` only
/// preallocates the buffer; the queue stays unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Name attached to every log event emitted by the queue
    pub name: String,
    /// Number of slots to preallocate in the buffer
    pub initial_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            initial_capacity: 0,
        }
    }
}

impl QueueConfig {
    /// Set the diagnostic name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the buffer preallocation
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }
}
