//! Task execution: the owner of the query-to-result lifecycle.
//!
//! A [`TaskExecutor`] serializes every collaborator call through a
//! single worker slot, drives the [`StatusBroadcaster`] while a call is
//! in flight, brackets the call with [`ArtifactWatcher`] snapshots to
//! detect file outputs, and converts every failure into a classified
//! [`TaskResult`]. No exception-style failure ever escapes `submit` or
//! `submit_async`.

pub mod config;

pub use config::ExecutorConfig;

use crate::artifacts::ArtifactWatcher;
use crate::classifier::{messages, ErrorCategory, ErrorClassifier, FailureReport};
use crate::core::{ProcessingStage, ProcessingStatus, TaskResult};
use crate::errors::TaskError;
use crate::status::{CollectingSubscriber, StatusBroadcaster};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// The external, opaque agent invocation this subsystem wraps.
///
/// One blocking call per query: a string in, a string out, or an
/// error. There is no structured side-channel for files or partial
/// progress, which is why artifact detection is done by directory
/// diffing around the call.
pub trait Collaborator: Send + Sync {
    /// Executes the query. May block for unbounded wall-clock time.
    fn invoke(&self, query: &str) -> anyhow::Result<String>;
}

impl<F> Collaborator for F
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    fn invoke(&self, query: &str) -> anyhow::Result<String> {
        self(query)
    }
}

struct Inner {
    config: ExecutorConfig,
    collaborator: Option<Arc<dyn Collaborator>>,
    broadcaster: Arc<StatusBroadcaster>,
    watcher: Arc<ArtifactWatcher>,
    classifier: Arc<ErrorClassifier>,
    // Single worker slot: at most one collaborator call in flight.
    // Concurrent submissions queue here rather than being rejected.
    worker_slot: Mutex<()>,
}

/// Owns the full lifecycle of one query-to-result cycle.
pub struct TaskExecutor {
    inner: Arc<Inner>,
}

impl TaskExecutor {
    /// Creates an executor around an already-constructed collaborator.
    #[must_use]
    pub fn new(config: ExecutorConfig, collaborator: Arc<dyn Collaborator>) -> Self {
        Self::build(config, Some(collaborator))
    }

    /// Creates an executor from a fallible collaborator factory.
    ///
    /// A failing factory is recorded as a configuration error and
    /// leaves the executor permanently unavailable: subsequent
    /// submissions short-circuit to a failed result without touching
    /// the worker.
    #[must_use]
    pub fn from_factory<F>(config: ExecutorConfig, factory: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<Arc<dyn Collaborator>>,
    {
        match factory() {
            Ok(collaborator) => Self::build(config, Some(collaborator)),
            Err(error) => {
                let executor = Self::build(config, None);
                warn!(%error, "collaborator construction failed; executor unavailable");
                executor.inner.classifier.record(
                    FailureReport::new(&error, "task_executor")
                        .with_category(ErrorCategory::Configuration)
                        .with_severity(crate::classifier::ErrorSeverity::High)
                        .with_user_context("Collaborator initialization failed."),
                );
                executor
            }
        }
    }

    fn build(config: ExecutorConfig, collaborator: Option<Arc<dyn Collaborator>>) -> Self {
        let watcher = Arc::new(ArtifactWatcher::new(config.artifact_dir.clone()));
        Self {
            inner: Arc::new(Inner {
                config,
                collaborator,
                broadcaster: Arc::new(StatusBroadcaster::new()),
                watcher,
                classifier: Arc::new(ErrorClassifier::default()),
                worker_slot: Mutex::new(()),
            }),
        }
    }

    /// True iff initialization completed and the executor can accept
    /// work.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.collaborator.is_some()
    }

    /// The progress subscription surface.
    #[must_use]
    pub fn broadcaster(&self) -> &Arc<StatusBroadcaster> {
        &self.inner.broadcaster
    }

    /// The artifact watcher over the configured directory.
    #[must_use]
    pub fn watcher(&self) -> &Arc<ArtifactWatcher> {
        &self.inner.watcher
    }

    /// The error history / observability surface.
    #[must_use]
    pub fn classifier(&self) -> &Arc<ErrorClassifier> {
        &self.inner.classifier
    }

    /// Processes a query synchronously, blocking until resolution.
    ///
    /// Validation happens at this boundary, before the worker slot is
    /// taken; an invalid query never reaches the collaborator. Never
    /// panics and never returns an error: every failure becomes a
    /// classified, failed [`TaskResult`].
    #[must_use]
    pub fn submit(&self, query: &str) -> TaskResult {
        let task_id = Uuid::new_v4();
        let started = Instant::now();

        if let Err(error) = self.inner.validate(query) {
            return self.inner.boundary_failure(task_id, &error, started);
        }
        if !self.is_available() {
            return self
                .inner
                .boundary_failure(task_id, &TaskError::NotInitialized, started);
        }

        let _slot = self.inner.worker_slot.lock();
        self.inner.run(task_id, query, started)
    }

    /// Processes a query on the single worker, awaiting completion
    /// bounded by the configured default timeout.
    pub async fn submit_async(&self, query: &str) -> TaskResult {
        self.submit_async_with_timeout(query, self.inner.config.timeout)
            .await
    }

    /// Processes a query on the single worker, awaiting completion
    /// bounded by `timeout`.
    ///
    /// On timeout the caller immediately receives a failed result
    /// naming the timeout duration. Cancellation is best-effort: the
    /// blocking worker cannot be interrupted mid-call, so it is left to
    /// finish in the background and its result is discarded.
    pub async fn submit_async_with_timeout(&self, query: &str, timeout: Duration) -> TaskResult {
        let task_id = Uuid::new_v4();
        let started = Instant::now();

        if let Err(error) = self.inner.validate(query) {
            return self.inner.boundary_failure(task_id, &error, started);
        }
        if !self.is_available() {
            return self
                .inner
                .boundary_failure(task_id, &TaskError::NotInitialized, started);
        }

        let inner = Arc::clone(&self.inner);
        let owned_query = query.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            let _slot = inner.worker_slot.lock();
            inner.run(task_id, &owned_query, started)
        });

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let error = TaskError::WorkerLost {
                    reason: join_error.to_string(),
                };
                self.inner.boundary_failure(task_id, &error, started)
            }
            Err(_elapsed) => {
                let error = TaskError::Timeout {
                    seconds: timeout.as_secs(),
                };
                // The worker keeps running; its eventual result is
                // discarded because this await already gave up.
                self.inner.boundary_failure(task_id, &error, started)
            }
        }
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("available", &self.is_available())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Inner {
    fn validate(&self, query: &str) -> Result<(), TaskError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(TaskError::InvalidQuery {
                reason: "query must not be empty".to_string(),
            });
        }

        let chars = trimmed.chars().count();
        if chars < self.config.min_query_chars || chars > self.config.max_query_chars {
            return Err(TaskError::InvalidQuery {
                reason: format!(
                    "query must be between {} and {} characters",
                    self.config.min_query_chars, self.config.max_query_chars
                ),
            });
        }

        Ok(())
    }

    /// Executes the full sequence for a valid query. Runs inside the
    /// worker slot.
    fn run(&self, task_id: Uuid, query: &str, started: Instant) -> TaskResult {
        let collector = Arc::new(CollectingSubscriber::new());
        let subscription = self
            .broadcaster
            .subscribe(collector.clone() as Arc<dyn crate::status::StatusSubscriber>);

        let result = self.run_inner(task_id, query, started);

        self.broadcaster.unsubscribe(subscription);
        result.with_status_history(collector.take())
    }

    fn run_inner(&self, task_id: Uuid, query: &str, started: Instant) -> TaskResult {
        let Some(collaborator) = self.collaborator.as_ref() else {
            // Checked at the boundary; repeated here so a direct call
            // through the worker can never panic.
            return self.failure(task_id, &TaskError::NotInitialized, started);
        };

        self.emit(task_id, ProcessingStage::Initializing, "Preparing task", 0.1);
        let before = self.watcher.snapshot();

        self.emit(
            task_id,
            ProcessingStage::Processing,
            "Executing collaborator query",
            0.4,
        );

        let text = match collaborator.invoke(query) {
            Ok(text) => text,
            Err(error) => {
                let error = TaskError::Collaborator(error);
                self.classify_collaborator_failure(&error, query);
                return self.failure(task_id, &error, started);
            }
        };

        let new_files = self.watcher.detect_new(&before);
        if !new_files.is_empty() {
            self.emit(
                task_id,
                ProcessingStage::GeneratingArtifact,
                format!("Detected {} new artifact(s)", new_files.len()),
                0.9,
            );
        }

        let status = ProcessingStatus::new(ProcessingStage::Completing, "Task complete", 1.0)
            .with_detail("task_id", serde_json::json!(task_id.to_string()))
            .with_detail("artifact_count", serde_json::json!(new_files.len()));
        self.broadcaster.deliver(&status);

        let elapsed = started.elapsed().as_secs_f64();
        info!(%task_id, elapsed_seconds = elapsed, "query processed successfully");

        TaskResult::succeeded(task_id, text, new_files, elapsed)
    }

    /// Builds a failed result for an error caught before the worker
    /// ran (validation, unavailability, timeout, lost worker). The
    /// terminal error status is emitted and included as the history.
    fn boundary_failure(&self, task_id: Uuid, error: &TaskError, started: Instant) -> TaskResult {
        self.record_boundary(error, task_id);
        self.failure(task_id, error, started)
    }

    fn failure(&self, task_id: Uuid, error: &TaskError, started: Instant) -> TaskResult {
        let status = ProcessingStatus::new(
            ProcessingStage::Error,
            format!("Processing failed: {error}"),
            0.0,
        )
        .with_detail("task_id", serde_json::json!(task_id.to_string()));
        self.broadcaster.deliver(&status);

        let elapsed = started.elapsed().as_secs_f64();
        TaskResult::failed(task_id, error.to_string(), elapsed).with_status_history(vec![status])
    }

    fn record_boundary(&self, error: &TaskError, task_id: Uuid) {
        let context = match error {
            TaskError::InvalidQuery { .. } => "Query validation failed.",
            TaskError::NotInitialized => "Executor initialization failed.",
            TaskError::Timeout { .. } => "The asynchronous wait gave up before the worker finished.",
            TaskError::WorkerLost { .. } | TaskError::Collaborator(_) => "Task execution failed.",
        };

        self.classifier.record(
            FailureReport::new(error, "task_executor")
                .with_category(error.default_category())
                .with_user_context(format!("{context} (task {task_id})")),
        );
    }

    /// Collaborator failures default to `agent` but are reclassified
    /// when the error text clearly indicates a network, filesystem, or
    /// validation fault.
    fn classify_collaborator_failure(&self, error: &TaskError, query: &str) {
        let inferred = messages::infer_category(&error.to_string());
        if matches!(
            inferred,
            ErrorCategory::Network | ErrorCategory::Filesystem | ErrorCategory::Validation
        ) {
            self.classifier.record(
                FailureReport::new(error, "task_executor")
                    .with_category(inferred)
                    .with_user_context("Query processing failed."),
            );
        } else {
            self.classifier.record_agent_failure(error, query);
        }
    }

    fn emit(&self, task_id: Uuid, stage: ProcessingStage, message: impl Into<String>, progress: f64) {
        let status = ProcessingStatus::new(stage, message, progress)
            .with_detail("task_id", serde_json::json!(task_id.to_string()));
        self.broadcaster.deliver(&status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Collaborator stub that counts invocations.
    struct SpyCollaborator {
        calls: AtomicUsize,
        response: anyhow::Result<String>,
    }

    impl SpyCollaborator {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Ok(text.to_string()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Err(anyhow::anyhow!("{message}")),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Collaborator for SpyCollaborator {
        fn invoke(&self, _query: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(error) => Err(anyhow::anyhow!("{error}")),
            }
        }
    }

    fn executor_with(collaborator: Arc<SpyCollaborator>) -> (TaskExecutor, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig::new().with_artifact_dir(dir.path());
        (TaskExecutor::new(config, collaborator), dir)
    }

    #[test]
    fn test_valid_query_succeeds() {
        let spy = SpyCollaborator::ok("the answer");
        let (executor, _dir) = executor_with(spy.clone());

        let result = executor.submit("design a serverless api");
        assert!(result.success);
        assert_eq!(result.text, "the answer");
        assert!(result.error_message.is_none());
        assert!(result.processing_time_seconds >= 0.0);
        assert_eq!(spy.call_count(), 1);
    }

    #[test]
    fn test_invalid_queries_never_reach_collaborator() {
        let spy = SpyCollaborator::ok("unused");
        let (executor, _dir) = executor_with(spy.clone());

        let too_long = "x".repeat(5001);
        for query in ["", "   ", "ab", too_long.as_str()] {
            let result = executor.submit(query);
            assert!(!result.success, "query {query:?} should fail validation");
            assert!(result.error_message.as_deref().unwrap().contains("Invalid query"));
        }

        assert_eq!(spy.call_count(), 0);

        let history = executor.classifier().history(100);
        assert_eq!(history.len(), 4);
        assert!(history
            .iter()
            .all(|r| r.category == ErrorCategory::Validation));
    }

    #[test]
    fn test_whitespace_padding_is_trimmed_for_validation() {
        let spy = SpyCollaborator::ok("ok");
        let (executor, _dir) = executor_with(spy.clone());

        // Trimmed length is 3, so this passes the boundary.
        let result = executor.submit("  abc  ");
        assert!(result.success);
        assert_eq!(spy.call_count(), 1);
    }

    #[test]
    fn test_collaborator_failure_becomes_failed_result() {
        let spy = SpyCollaborator::failing("model exploded");
        let (executor, _dir) = executor_with(spy);

        let result = executor.submit("design a serverless api");
        assert!(!result.success);
        assert!(result.error_message.is_some());
        assert!(result.generated_artifacts.is_empty());
        assert!(result.processing_time_seconds >= 0.0);

        let history = executor.classifier().history(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].category, ErrorCategory::Agent);
        assert_eq!(history[0].raw_message, "model exploded");
    }

    #[test]
    fn test_collaborator_network_failure_is_reclassified() {
        let spy = SpyCollaborator::failing("connection refused by bedrock endpoint");
        let (executor, _dir) = executor_with(spy);

        let result = executor.submit("design a serverless api");
        assert!(!result.success);

        let history = executor.classifier().history(10);
        assert_eq!(history[0].category, ErrorCategory::Network);
    }

    #[test]
    fn test_unavailable_executor_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig::new().with_artifact_dir(dir.path());
        let executor =
            TaskExecutor::from_factory(config, || Err(anyhow::anyhow!("no credentials")));

        assert!(!executor.is_available());

        let result = executor.submit("design a serverless api");
        assert!(!result.success);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("not initialized"));

        // One configuration record from the factory failure, one from
        // the rejected submission.
        let history = executor.classifier().history(10);
        assert_eq!(history.len(), 2);
        assert!(history
            .iter()
            .all(|r| r.category == ErrorCategory::Configuration));
    }

    #[test]
    fn test_status_events_are_ordered_and_collected() {
        let spy = SpyCollaborator::ok("done");
        let (executor, _dir) = executor_with(spy);

        let collector = Arc::new(CollectingSubscriber::new());
        executor.broadcaster().subscribe(collector.clone());

        let result = executor.submit("draw me a diagram");
        assert!(result.success);

        let stages: Vec<ProcessingStage> =
            collector.events().iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                ProcessingStage::Initializing,
                ProcessingStage::Processing,
                ProcessingStage::Completing,
            ]
        );

        // The result carries the same history without requiring an
        // external subscriber.
        let history_stages: Vec<ProcessingStage> =
            result.status_history.iter().map(|s| s.stage).collect();
        assert_eq!(stages, history_stages);

        // Progress is monotonically non-decreasing on the happy path.
        let progresses: Vec<f64> = collector.events().iter().map(|s| s.progress).collect();
        assert!(progresses.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_artifact_detection_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_path = dir.path().join("out1.png");

        let writing = {
            let artifact_path = artifact_path.clone();
            move |_query: &str| -> anyhow::Result<String> {
                std::fs::write(&artifact_path, b"png bytes")?;
                Ok("OK".to_string())
            }
        };

        let config = ExecutorConfig::new().with_artifact_dir(dir.path());
        let executor = TaskExecutor::new(config, Arc::new(writing));

        let result = executor.submit("build a diagram");
        assert!(result.success);
        assert_eq!(result.text, "OK");
        assert_eq!(result.generated_artifacts.len(), 1);
        assert!(result.generated_artifacts[0].ends_with("out1.png"));

        // The pre-existing file must not be re-detected next task.
        let result = executor.submit("build another diagram");
        assert!(result.success);
        assert!(result.generated_artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_submit_async_success() {
        let spy = SpyCollaborator::ok("async answer");
        let (executor, _dir) = executor_with(spy);

        let result = executor.submit_async("design a serverless api").await;
        assert!(result.success);
        assert_eq!(result.text, "async answer");
    }

    #[tokio::test]
    async fn test_submit_async_timeout_names_duration() {
        let slow = |_query: &str| -> anyhow::Result<String> {
            std::thread::sleep(Duration::from_secs(5));
            Ok("too late".to_string())
        };

        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig::new().with_artifact_dir(dir.path());
        let executor = TaskExecutor::new(config, Arc::new(slow));

        let started = Instant::now();
        let result = executor
            .submit_async_with_timeout("design a serverless api", Duration::from_secs(1))
            .await;
        let waited = started.elapsed();

        assert!(!result.success);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("timed out after 1 seconds"));
        assert!(waited < Duration::from_secs(3), "caller must not wait for the worker");

        let history = executor.classifier().history(10);
        assert_eq!(history[0].category, ErrorCategory::Network);
    }

    #[tokio::test]
    async fn test_submit_async_validation_skips_worker() {
        let spy = SpyCollaborator::ok("unused");
        let (executor, _dir) = executor_with(spy.clone());

        let result = executor.submit_async("").await;
        assert!(!result.success);
        assert_eq!(spy.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_are_serialized() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let overlap_seen = Arc::new(AtomicUsize::new(0));

        let collaborator = {
            let in_flight = Arc::clone(&in_flight);
            let overlap_seen = Arc::clone(&overlap_seen);
            move |_query: &str| -> anyhow::Result<String> {
                if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlap_seen.fetch_add(1, Ordering::SeqCst);
                }
                std::thread::sleep(Duration::from_millis(50));
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok("done".to_string())
            }
        };

        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig::new().with_artifact_dir(dir.path());
        let executor = Arc::new(TaskExecutor::new(config, Arc::new(collaborator)));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let executor = Arc::clone(&executor);
            handles.push(tokio::spawn(async move {
                executor.submit_async("serialize me please").await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.success);
        }

        assert_eq!(overlap_seen.load(Ordering::SeqCst), 0);
    }
}
