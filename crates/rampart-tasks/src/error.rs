//! Task executor error types.

/// Errors that can occur during task submission and tracking.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The bounded submission queue is saturated.
    ///
    /// Submission never blocks; callers must retry, drop, or apply
    /// backpressure upstream.
    #[error("Task queue is full")]
    QueueFull,

    /// Waiting for a task exceeded its deadline.
    ///
    /// The underlying task is not cancelled; only the wait is abandoned.
    #[error("Timed out waiting for task: {task_id}")]
    Timeout {
        /// The task that was being awaited.
        task_id: String,
    },

    /// No task is registered under the given id.
    #[error("Task not found: {task_id}")]
    NotFound {
        /// The unknown task id.
        task_id: String,
    },

    /// The executor has been stopped and accepts no further work.
    #[error("Executor stopped")]
    Stopped,

    /// A work item failed while processing.
    #[error("Task failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl TaskError {
    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout(task_id: impl Into<String>) -> Self {
        Self::Timeout {
            task_id: task_id.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(task_id: impl Into<String>) -> Self {
        Self::NotFound {
            task_id: task_id.into(),
        }
    }

    /// Creates a new `Failed` error.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Returns `true` if the submission was rejected for backpressure.
    #[must_use]
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull)
    }

    /// Returns `true` if this is a wait deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TaskError::QueueFull.to_string(), "Task queue is full");
        assert_eq!(
            TaskError::timeout("import-7").to_string(),
            "Timed out waiting for task: import-7"
        );
        assert_eq!(
            TaskError::not_found("x").to_string(),
            "Task not found: x"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(TaskError::QueueFull.is_queue_full());
        assert!(!TaskError::QueueFull.is_timeout());
        assert!(TaskError::timeout("t").is_timeout());
    }
}
