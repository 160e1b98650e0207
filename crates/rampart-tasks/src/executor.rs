//! Bounded worker-pool task executor.
//!
//! A fixed set of workers consumes task ids from a bounded queue and runs a
//! caller-supplied handler for each. Submission is non-blocking: a full
//! queue rejects immediately with [`TaskError::QueueFull`] instead of
//! applying backpressure by stalling the caller.
//!
//! Shutdown is a one-shot broadcast observed by all workers. In-flight work
//! finishes; queued-but-unstarted work is abandoned. There is no per-task
//! cancellation, and [`TaskExecutor::wait_for`]'s timeout only abandons the
//! wait; the underlying task keeps running to completion or failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch, Mutex};

use crate::error::TaskError;
use crate::types::{Task, TaskStatus};
use crate::TaskResult;

/// Configuration for a [`TaskExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of concurrent workers.
    pub worker_count: usize,
    /// Capacity of the bounded submission queue.
    pub queue_capacity: usize,
    /// Interval at which [`TaskExecutor::wait_for`] polls task status.
    pub poll_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            queue_capacity: 100,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// The processing function workers apply to each submitted task.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Executes the task, returning its result payload or a failure
    /// description.
    async fn run(&self, task_id: &str) -> Result<serde_json::Value, String>;
}

type Registry = Arc<RwLock<HashMap<String, Task>>>;

/// Worker pool executing submitted tasks concurrently.
pub struct TaskExecutor {
    registry: Registry,
    queue: mpsc::Sender<String>,
    shutdown: watch::Sender<bool>,
    poll_interval: Duration,
}

impl TaskExecutor {
    /// Starts `worker_count` workers processing tasks with `handler`.
    #[must_use]
    pub fn new(config: ExecutorConfig, handler: Arc<dyn TaskHandler>) -> Self {
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));
        let (queue, receiver) = mpsc::channel::<String>(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let (shutdown, _) = watch::channel(false);

        for worker_id in 0..config.worker_count.max(1) {
            let registry = Arc::clone(&registry);
            let receiver = Arc::clone(&receiver);
            let handler = Arc::clone(&handler);
            let mut shutdown_rx = shutdown.subscribe();

            tokio::spawn(async move {
                loop {
                    // Biased so a stop signal wins over queued work: queued
                    // items are abandoned on shutdown, not drained.
                    let task_id = tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => break,
                        task_id = async { receiver.lock().await.recv().await } => {
                            match task_id {
                                Some(task_id) => task_id,
                                None => break,
                            }
                        }
                    };
                    process(&registry, handler.as_ref(), worker_id, &task_id).await;
                }
                tracing::debug!(worker_id, "worker stopped");
            });
        }

        Self {
            registry,
            queue,
            shutdown,
            poll_interval: config.poll_interval,
        }
    }

    /// Submits a task for asynchronous execution.
    ///
    /// Registers a pending [`Task`] under `task_id` and enqueues it without
    /// blocking. When the queue is saturated the registration is rolled back
    /// and [`TaskError::QueueFull`] is returned; the submission leaves no
    /// trace. Resubmitting an id replaces its previous record.
    pub fn submit(&self, task_id: &str) -> TaskResult<()> {
        if *self.shutdown.borrow() {
            return Err(TaskError::Stopped);
        }

        self.registry
            .write()
            .insert(task_id.to_string(), Task::new(task_id));

        match self.queue.try_send(task_id.to_string()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.registry.write().remove(task_id);
                Err(TaskError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.registry.write().remove(task_id);
                Err(TaskError::Stopped)
            }
        }
    }

    /// Submits a batch of task ids, collecting the per-id outcome.
    ///
    /// Submission stops rejecting and starts succeeding again as workers
    /// drain the queue; each id gets exactly one attempt here.
    pub fn submit_all(&self, task_ids: &[&str]) -> HashMap<String, TaskResult<()>> {
        task_ids
            .iter()
            .map(|id| ((*id).to_string(), self.submit(id)))
            .collect()
    }

    /// Returns a snapshot of the task registered under `task_id`.
    #[must_use]
    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.registry.read().get(task_id).cloned()
    }

    /// Returns a snapshot of every registered task.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.registry.read().values().cloned().collect()
    }

    /// Blocks until the task reaches a terminal state or `timeout` elapses.
    ///
    /// Polls at the configured interval. On timeout the task itself is not
    /// cancelled; it continues to completion or failure independently.
    pub async fn wait_for(&self, task_id: &str, timeout: Duration) -> TaskResult<Task> {
        let polled = tokio::time::timeout(timeout, async {
            let mut ticker = tokio::time::interval(self.poll_interval);
            loop {
                ticker.tick().await;
                match self.task(task_id) {
                    None => return Err(TaskError::not_found(task_id)),
                    Some(task) if task.status.is_terminal() => return Ok(task),
                    Some(_) => {}
                }
            }
        })
        .await;

        match polled {
            Ok(result) => result,
            Err(_) => Err(TaskError::timeout(task_id)),
        }
    }

    /// Signals all workers to stop.
    ///
    /// One-shot broadcast: in-flight work completes, queued work is
    /// abandoned, and subsequent submissions fail with
    /// [`TaskError::Stopped`].
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("tasks", &self.registry.read().len())
            .field("stopped", &*self.shutdown.borrow())
            .finish_non_exhaustive()
    }
}

/// Runs one task to a terminal state, recording the transition.
async fn process(registry: &Registry, handler: &dyn TaskHandler, worker_id: usize, task_id: &str) {
    update(registry, task_id, TaskStatus::Running, None, None);
    tracing::debug!(worker_id, task_id, "task started");

    match handler.run(task_id).await {
        Ok(result) => {
            update(registry, task_id, TaskStatus::Completed, Some(result), None);
            tracing::debug!(worker_id, task_id, "task completed");
        }
        Err(message) => {
            update(
                registry,
                task_id,
                TaskStatus::Failed,
                None,
                Some(message.clone()),
            );
            tracing::warn!(worker_id, task_id, error = %message, "task failed");
        }
    }
}

fn update(
    registry: &Registry,
    task_id: &str,
    status: TaskStatus,
    result: Option<serde_json::Value>,
    error: Option<String>,
) {
    let mut tasks = registry.write();
    if let Some(task) = tasks.get_mut(task_id) {
        task.status = status;
        task.updated_at = OffsetDateTime::now_utc();
        if result.is_some() {
            task.result = result;
        }
        if error.is_some() {
            task.error = error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    /// Completes after a configurable delay; ids containing "fail" fail.
    struct StubHandler {
        delay: Duration,
    }

    #[async_trait]
    impl TaskHandler for StubHandler {
        async fn run(&self, task_id: &str) -> Result<serde_json::Value, String> {
            tokio::time::sleep(self.delay).await;
            if task_id.contains("fail") {
                Err(format!("injected failure for {task_id}"))
            } else {
                Ok(json!({ "processed": task_id }))
            }
        }
    }

    fn executor(workers: usize, capacity: usize, delay: Duration) -> TaskExecutor {
        TaskExecutor::new(
            ExecutorConfig {
                worker_count: workers,
                queue_capacity: capacity,
                poll_interval: Duration::from_millis(10),
            },
            Arc::new(StubHandler { delay }),
        )
    }

    #[tokio::test]
    async fn test_submit_and_wait_for_completion() {
        let executor = executor(2, 10, Duration::from_millis(10));
        executor.submit("job-1").unwrap();

        let task = executor
            .wait_for("job-1", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({ "processed": "job-1" })));
        assert!(task.error.is_none());
        assert!(task.updated_at >= task.created_at);
    }

    #[tokio::test]
    async fn test_failed_task_records_error() {
        let executor = executor(1, 10, Duration::from_millis(5));
        executor.submit("job-fail").unwrap();

        let task = executor
            .wait_for("job-fail", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.is_none());
        assert!(task.error.as_deref().unwrap().contains("job-fail"));
    }

    #[tokio::test]
    async fn test_queue_backpressure_rejects_excess() {
        // One slow worker, queue of 2: the worker takes one item, two fill
        // the queue, everything beyond that must be rejected immediately.
        let executor = executor(1, 2, Duration::from_secs(5));

        let mut accepted = 0usize;
        let mut rejected = 0usize;
        for i in 0..10 {
            match executor.submit(&format!("job-{i}")) {
                Ok(()) => accepted += 1,
                Err(e) => {
                    assert!(e.is_queue_full());
                    rejected += 1;
                }
            }
        }

        assert!((2..=3).contains(&accepted));
        assert_eq!(accepted + rejected, 10);
        // Rejected submissions leave no registry trace.
        assert_eq!(executor.tasks().len(), accepted);
    }

    #[tokio::test]
    async fn test_wait_for_times_out_without_cancelling() {
        let executor = executor(1, 10, Duration::from_millis(300));
        executor.submit("slow").unwrap();

        let err = executor
            .wait_for("slow", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        // The task was not cancelled and still runs to completion.
        let task = executor
            .wait_for("slow", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_wait_for_unknown_task() {
        let executor = executor(1, 10, Duration::from_millis(5));
        let err = executor
            .wait_for("ghost", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stop_rejects_new_submissions() {
        let executor = executor(2, 10, Duration::from_millis(5));
        executor.stop();

        // Workers observe the broadcast and exit; new work is refused.
        let err = executor.submit("late").unwrap_err();
        assert!(matches!(err, TaskError::Stopped));
    }

    #[tokio::test]
    async fn test_stop_abandons_queued_work() {
        let executor = executor(1, 10, Duration::from_millis(200));
        executor.submit("running").unwrap();
        // Give the worker time to pick up the first task.
        tokio::time::sleep(Duration::from_millis(50)).await;
        executor.submit("queued").unwrap();

        executor.stop();

        // In-flight work completes.
        let task = executor
            .wait_for("running", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);

        // Queued-but-unstarted work stays pending forever.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(executor.task("queued").unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_all_collects_outcomes() {
        let executor = executor(2, 100, Duration::from_millis(5));
        let outcomes = executor.submit_all(&["a", "b", "c"]);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.values().all(Result::is_ok));
        for id in ["a", "b", "c"] {
            let task = executor.wait_for(id, Duration::from_secs(2)).await.unwrap();
            assert_eq!(task.status, TaskStatus::Completed);
        }
    }
}
