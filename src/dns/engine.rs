//! Concurrent validation engine.
//!
//! Checks every candidate resolver exactly once through a bounded worker
//! pool. Network I/O runs in the workers without any shared lock; only the
//! bookkeeping of a finished check (counters, output line, progress event)
//! is serialized, behind a single mutex.

#![allow(clippy::missing_errors_doc)]

use crate::dns::policy::ValidationPolicy;
use crate::dns::transport::QueryTransport;
use crate::dns::types::{CheckResult, ExpectedAnswers, Progress, Resolver, RunTally};
use crate::error::{Error, Result};
use futures::future::join_all;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

/// Default number of concurrent checks.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Default timeout for each query attempt in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// Destination of valid resolvers, one per line.
pub trait OutputSink: Send + 'static {
    /// Append one valid resolver.
    fn write_resolver(&mut self, resolver: &Resolver) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Output file sink. Each resolver is written as one newline-terminated line.
pub struct FileSink {
    writer: LineWriter<File>,
}

impl FileSink {
    /// Create (or truncate) `path`, or open it for appending when `append` is set.
    pub fn create(path: &Path, append: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|source| Error::OutputSinkUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            writer: LineWriter::new(file),
        })
    }
}

impl OutputSink for FileSink {
    fn write_resolver(&mut self, resolver: &Resolver) -> std::io::Result<()> {
        self.writer.write_all(format!("{resolver}\n").as_bytes())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Consumer of progress events.
pub trait ProgressSink: Send + 'static {
    /// Called once per verdict, in verdict order.
    fn update(&mut self, progress: &Progress);

    /// Called once after the last verdict.
    fn finish(&mut self, _tally: &RunTally) {}
}

impl ProgressSink for mpsc::UnboundedSender<Progress> {
    fn update(&mut self, progress: &Progress) {
        let _ = self.send(*progress);
    }
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of checks running at once
    pub concurrency: usize,
    /// Timeout of a single query attempt
    pub timeout: Duration,
    /// Attempts per candidate (1 = no retry)
    pub max_attempts: u32,
    /// Optional latency bound for a passing answer
    pub max_latency: Option<Duration>,
    /// Domain queried on every candidate
    pub test_domain: String,
}

impl EngineConfig {
    /// Default settings for `test_domain`.
    pub fn new(test_domain: impl Into<String>) -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: 1,
            max_latency: None,
            test_domain: test_domain.into(),
        }
    }

    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow `retries` extra attempts after the first one.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.max_attempts = retries.saturating_add(1);
        self
    }

    /// Bound answer latency. `None` or zero disables the bound.
    #[must_use]
    pub fn with_max_latency(mut self, max_latency: Option<Duration>) -> Self {
        self.max_latency = max_latency.filter(|d| !d.is_zero());
        self
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than 0"));
        }
        if self.max_attempts == 0 {
            return Err(Error::config("at least one attempt is required"));
        }
        if self.test_domain.trim().is_empty() {
            return Err(Error::config("test domain cannot be empty"));
        }
        Ok(())
    }
}

/// State touched when a verdict lands.
struct Recorder<S, P> {
    tally: RunTally,
    sink: S,
    progress: P,
}

impl<S: OutputSink, P: ProgressSink> Recorder<S, P> {
    fn record(&mut self, result: &CheckResult) {
        let valid = result.is_valid();
        if valid {
            if let Err(e) = self.sink.write_resolver(&result.resolver) {
                warn!(resolver = %result.resolver, error = %e, "failed to write valid resolver");
            }
        }
        let progress = self.tally.record(valid);
        self.progress.update(&progress);
    }
}

/// Validates candidate resolvers against an expected answer set.
///
/// # Example
///
/// ```ignore
/// let engine = ValidationEngine::new(UdpTransport::new(), EngineConfig::new(domain))?;
/// let tally = engine
///     .run_to_file(candidates, expected, Path::new("valid.txt"), false, SilentProgress)
///     .await?;
/// ```
pub struct ValidationEngine<T> {
    transport: Arc<T>,
    config: EngineConfig,
    policy: ValidationPolicy,
}

impl<T: QueryTransport> ValidationEngine<T> {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` does not pass [`EngineConfig::validate`].
    pub fn new(transport: T, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let policy = ValidationPolicy::new(config.max_latency);
        Ok(Self {
            transport: Arc::new(transport),
            config,
            policy,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the output file, then [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputSinkUnavailable`] if the file cannot be
    /// opened; no candidate is queried in that case.
    pub async fn run_to_file<P: ProgressSink>(
        &self,
        candidates: Vec<Resolver>,
        expected: ExpectedAnswers,
        output: &Path,
        append: bool,
        progress: P,
    ) -> Result<RunTally> {
        let sink = FileSink::create(output, append)?;
        Ok(self.run(candidates, expected, sink, progress).await)
    }

    /// Check every candidate and wait for all verdicts.
    ///
    /// Valid resolvers reach `sink` in completion order. `progress` sees one
    /// event per verdict with strictly increasing `checked`.
    pub async fn run<S: OutputSink, P: ProgressSink>(
        &self,
        candidates: Vec<Resolver>,
        expected: ExpectedAnswers,
        sink: S,
        progress: P,
    ) -> RunTally {
        let total = candidates.len();
        info!(
            total,
            concurrency = self.config.concurrency,
            max_attempts = self.config.max_attempts,
            domain = %self.config.test_domain,
            "starting validation"
        );

        let expected = Arc::new(expected);
        let domain: Arc<str> = Arc::from(self.config.test_domain.as_str());
        let recorder = Arc::new(Mutex::new(Recorder {
            tally: RunTally::new(total),
            sink,
            progress,
        }));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(total);

        for resolver in candidates {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => continue,
            };

            let transport = Arc::clone(&self.transport);
            let expected = Arc::clone(&expected);
            let domain = Arc::clone(&domain);
            let recorder = Arc::clone(&recorder);
            let policy = self.policy;
            let timeout = self.config.timeout;
            let max_attempts = self.config.max_attempts;

            handles.push(tokio::spawn(async move {
                let result = policy
                    .attempt_with_retries(
                        transport.as_ref(),
                        resolver,
                        &domain,
                        timeout,
                        &expected,
                        max_attempts,
                    )
                    .await;

                recorder
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(&result);

                drop(permit);
            }));
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "validation worker failed");
            }
        }

        let mut recorder = recorder.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = recorder.sink.flush() {
            warn!(error = %e, "failed to flush output");
        }
        let tally = recorder.tally;
        recorder.progress.finish(&tally);

        info!(
            checked = tally.checked,
            valid = tally.valid,
            invalid = tally.invalid,
            "validation finished"
        );
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::transport::tests::{ScriptedTransport, Step};
    use tempfile::TempDir;

    /// Sink that keeps written resolvers in memory.
    #[derive(Clone, Default)]
    struct MemorySink(Arc<Mutex<Vec<Resolver>>>);

    impl MemorySink {
        fn written(&self) -> Vec<Resolver> {
            self.0.lock().unwrap().clone()
        }
    }

    impl OutputSink for MemorySink {
        fn write_resolver(&mut self, resolver: &Resolver) -> std::io::Result<()> {
            self.0.lock().unwrap().push(*resolver);
            Ok(())
        }
    }

    struct NoProgress;

    impl ProgressSink for NoProgress {
        fn update(&mut self, _progress: &Progress) {}
    }

    fn expected() -> ExpectedAnswers {
        ExpectedAnswers::new(vec!["10.0.0.1".parse().unwrap()]).unwrap()
    }

    fn resolvers(list: &[&str]) -> Vec<Resolver> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    /// Good, hijacked, empty, slow and dead resolvers, with a duplicate.
    fn mixed_transport() -> ScriptedTransport {
        ScriptedTransport::new()
            .script("192.0.2.1", vec![Step::answer("10.0.0.1", 5)])
            .script("192.0.2.2", vec![Step::answer("203.0.113.66", 5)])
            .script("192.0.2.3", vec![Step::Empty])
            .script("192.0.2.4", vec![Step::answer("10.0.0.1", 900)])
            .script("192.0.2.6", vec![Step::Timeout, Step::answer("10.0.0.1", 5)])
    }

    fn mixed_candidates() -> Vec<Resolver> {
        resolvers(&[
            "192.0.2.1",
            "192.0.2.2",
            "192.0.2.3",
            "192.0.2.4",
            "192.0.2.5",
            "192.0.2.6",
            "192.0.2.1",
        ])
    }

    fn config(concurrency: usize) -> EngineConfig {
        EngineConfig::new("t.test")
            .with_concurrency(concurrency)
            .with_timeout(Duration::from_millis(200))
            .with_max_latency(Some(Duration::from_millis(500)))
    }

    #[test]
    fn test_engine_config_validate() {
        assert!(EngineConfig::new("t.test").validate().is_ok());
        assert!(EngineConfig::new("t.test").with_concurrency(0).validate().is_err());
        assert!(EngineConfig::new("  ").validate().is_err());
        assert!(EngineConfig::new("t.test").with_timeout(Duration::ZERO).validate().is_err());

        let config = EngineConfig::new("t.test").with_retries(2);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(EngineConfig::new("t.test").max_attempts, 1);
        assert_eq!(
            EngineConfig::new("t.test").with_max_latency(Some(Duration::ZERO)).max_latency,
            None
        );
    }

    #[tokio::test]
    async fn test_tally_invariants() {
        let engine = ValidationEngine::new(mixed_transport(), config(3)).unwrap();
        let sink = MemorySink::default();

        let tally = engine.run(mixed_candidates(), expected(), sink.clone(), NoProgress).await;

        assert_eq!(tally.total, 7);
        assert_eq!(tally.checked, 7);
        assert_eq!(tally.valid + tally.invalid, tally.checked);
        // 192.0.2.1 twice; 192.0.2.6 fails its only attempt.
        assert_eq!(tally.valid, 2);
        assert_eq!(tally.invalid, 5);

        let written = sink.written();
        assert_eq!(written, resolvers(&["192.0.2.1", "192.0.2.1"]));
    }

    #[tokio::test]
    async fn test_retries_rescue_flaky_resolver() {
        let engine = ValidationEngine::new(mixed_transport(), config(3).with_retries(2)).unwrap();
        let sink = MemorySink::default();

        let tally = engine.run(mixed_candidates(), expected(), sink.clone(), NoProgress).await;

        assert_eq!(tally.valid, 3);
        assert!(sink.written().contains(&"192.0.2.6".parse().unwrap()));
        // Dead resolver: every attempt used, nothing written.
        assert_eq!(engine.transport.calls("192.0.2.5"), 3);
        assert!(!sink.written().contains(&"192.0.2.5".parse().unwrap()));
        // Passing resolvers stop after the first attempt.
        assert_eq!(engine.transport.calls("192.0.2.1"), 2);
    }

    #[tokio::test]
    async fn test_result_independent_of_concurrency() {
        let serial = ValidationEngine::new(mixed_transport(), config(1)).unwrap();
        let parallel = ValidationEngine::new(mixed_transport(), config(8)).unwrap();

        let a = serial.run(mixed_candidates(), expected(), MemorySink::default(), NoProgress).await;
        let b = parallel.run(mixed_candidates(), expected(), MemorySink::default(), NoProgress).await;

        assert_eq!((a.valid, a.invalid), (b.valid, b.invalid));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_concurrency_limit_respected() {
        let candidates: Vec<Resolver> = (1..=12)
            .map(|i| format!("198.51.100.{i}").parse().unwrap())
            .collect();

        let transport = ScriptedTransport::new().with_delay(Duration::from_millis(20));
        let engine = ValidationEngine::new(transport, config(4)).unwrap();
        let tally = engine.run(candidates.clone(), expected(), MemorySink::default(), NoProgress).await;
        assert_eq!(tally.checked, 12);
        assert_eq!(engine.transport.max_in_flight(), 4);

        let transport = ScriptedTransport::new().with_delay(Duration::from_millis(5));
        let engine = ValidationEngine::new(transport, config(1)).unwrap();
        engine.run(candidates, expected(), MemorySink::default(), NoProgress).await;
        assert_eq!(engine.transport.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_progress_events_are_monotonic() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = ValidationEngine::new(mixed_transport(), config(4)).unwrap();

        let tally = engine.run(mixed_candidates(), expected(), MemorySink::default(), tx).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 7);
        for (idx, event) in events.iter().enumerate() {
            assert_eq!(event.checked, idx + 1);
            assert_eq!(event.total, 7);
            assert_eq!(event.valid + event.invalid, event.checked);
        }
        let last = events.last().unwrap();
        assert_eq!(last.percent, 100.0);
        assert_eq!((last.valid, last.invalid), (tally.valid, tally.invalid));
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let engine = ValidationEngine::new(mixed_transport(), config(4)).unwrap();
        let tally = engine.run(Vec::new(), expected(), MemorySink::default(), NoProgress).await;
        assert_eq!(tally, RunTally::new(0));
    }

    #[tokio::test]
    async fn test_run_to_file_writes_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("valid.txt");
        std::fs::write(&path, "stale\n").unwrap();

        let engine = ValidationEngine::new(mixed_transport(), config(2)).unwrap();
        let tally = engine
            .run_to_file(mixed_candidates(), expected(), &path, false, NoProgress)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "192.0.2.1\n192.0.2.1\n");
        assert_eq!(tally.valid, 2);

        // Appending keeps what is already there.
        engine
            .run_to_file(resolvers(&["192.0.2.1"]), expected(), &path, true, NoProgress)
            .await
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_output_aborts_before_queries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("valid.txt");

        let engine = ValidationEngine::new(mixed_transport(), config(2)).unwrap();
        let err = engine
            .run_to_file(mixed_candidates(), expected(), &path, false, NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::OutputSinkUnavailable { .. }));
        assert_eq!(engine.transport.calls("192.0.2.1"), 0);
    }
}
