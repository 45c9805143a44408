//! Non-blocking audit logger.
//!
//! The decision path only builds a record and `try_send`s it onto a bounded
//! queue. A named worker thread drains the queue into an [`AuditStore`],
//! retrying failed appends a bounded number of times.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use stockgate_pdp::{Decision, RequestContext};

use super::record::AuditRecord;
use super::r#trait::{AuditStore, AuditStoreError};

/// Receives every enforced decision. Must not block or fail the caller.
pub trait AuditSink: Send + Sync {
    fn record(&self, decision: &Decision, ctx: &RequestContext);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, decision: &Decision, ctx: &RequestContext) {
        (**self).record(decision, ctx)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _decision: &Decision, _ctx: &RequestContext) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLoggerConfig {
    /// Bounded queue size; records beyond it are dropped.
    pub queue_capacity: usize,
    /// Append attempts per record, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_backoff_ms: u64,
    /// Worker thread name, also used in logs.
    pub name: String,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_attempts: 3,
            retry_backoff_ms: 50,
            name: "audit-logger".to_string(),
        }
    }
}

impl AuditLoggerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Audit runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    /// Accepted onto the queue.
    pub enqueued: u64,
    /// Appended to the store.
    pub persisted: u64,
    /// Gave up after `max_attempts`.
    pub failed: u64,
    /// Rejected because the queue was full or the worker had stopped.
    pub dropped: u64,
}

fn bump(stats: &Mutex<AuditStats>, f: impl FnOnce(&mut AuditStats)) {
    if let Ok(mut s) = stats.lock() {
        f(&mut s);
    }
}

/// Producer side of the audit queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    name: Arc<str>,
    tx: SyncSender<AuditRecord>,
    stats: Arc<Mutex<AuditStats>>,
}

/// Handle to stop and join the audit worker.
#[derive(Debug)]
pub struct AuditLoggerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<AuditStats>>,
}

impl AuditLoggerHandle {
    /// Persist everything already queued, then stop the worker.
    pub fn shutdown(mut self) -> AuditStats {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            if let Err(payload) = j.join() {
                error!(panic = %panic_message(payload.as_ref()), "audit worker terminated abnormally");
            }
        }
        self.stats()
    }

    pub fn stats(&self) -> AuditStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl AuditLogger {
    /// Start the worker thread draining into `store`.
    pub fn spawn<S>(store: S, config: AuditLoggerConfig) -> std::io::Result<(AuditLogger, AuditLoggerHandle)>
    where
        S: AuditStore + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<AuditRecord>(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(AuditStats::default()));

        let worker_stats = stats.clone();
        let worker_config = config.clone();
        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || worker_loop(store, worker_config, rx, shutdown_rx, worker_stats))?;

        let logger = AuditLogger {
            name: Arc::from(config.name.as_str()),
            tx,
            stats: stats.clone(),
        };
        let handle = AuditLoggerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        };
        Ok((logger, handle))
    }

    pub fn stats(&self) -> AuditStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn enqueue(&self, record: AuditRecord) {
        match self.tx.try_send(record) {
            Ok(()) => bump(&self.stats, |s| s.enqueued += 1),
            Err(TrySendError::Full(record)) => {
                bump(&self.stats, |s| s.dropped += 1);
                warn!(worker = %self.name, record = %record.id, "audit queue full; record dropped");
            }
            Err(TrySendError::Disconnected(record)) => {
                bump(&self.stats, |s| s.dropped += 1);
                warn!(worker = %self.name, record = %record.id, "audit worker stopped; record dropped");
            }
        }
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, decision: &Decision, ctx: &RequestContext) {
        self.enqueue(AuditRecord::from_decision(decision, ctx));
    }
}

fn worker_loop<S: AuditStore>(
    store: S,
    config: AuditLoggerConfig,
    rx: Receiver<AuditRecord>,
    shutdown_rx: Receiver<()>,
    stats: Arc<Mutex<AuditStats>>,
) {
    let tick = Duration::from_millis(250);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            // Drain what is already queued, then stop.
            loop {
                match rx.try_recv() {
                    Ok(record) => persist(&store, &config, &stats, record),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
            break;
        }

        match rx.recv_timeout(tick) {
            Ok(record) => persist(&store, &config, &stats, record),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker = %config.name, "audit worker stopped");
}

fn persist<S: AuditStore>(store: &S, config: &AuditLoggerConfig, stats: &Mutex<AuditStats>, record: AuditRecord) {
    let attempts = config.max_attempts.max(1);

    for attempt in 1..=attempts {
        match append_caught(store, &record) {
            Ok(()) => {
                bump(stats, |s| s.persisted += 1);
                return;
            }
            Err(err) if attempt < attempts => {
                warn!(worker = %config.name, record = %record.id, attempt, error = %err, "audit append failed; retrying");
                thread::sleep(config.retry_backoff());
            }
            Err(err) => {
                bump(stats, |s| s.failed += 1);
                error!(
                    worker = %config.name,
                    record = %record.id,
                    principal = %record.principal_id,
                    resource = %record.resource,
                    action = %record.action,
                    attempts,
                    error = %err,
                    "audit record lost after retries"
                );
            }
        }
    }
}

/// A panicking store counts as a failed attempt instead of killing the worker.
fn append_caught<S: AuditStore>(store: &S, record: &AuditRecord) -> Result<(), AuditStoreError> {
    panic::catch_unwind(AssertUnwindSafe(|| store.append(record))).unwrap_or_else(|payload| {
        Err(AuditStoreError::Storage(format!(
            "append panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::in_memory::InMemoryAuditStore;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use stockgate_auth::{Principal, PrincipalId, Role};
    use stockgate_core::PolicyId;

    fn ctx() -> RequestContext {
        RequestContext::new(Principal::new(PrincipalId::new(), "alice", Role::USER), "product", "read")
    }

    /// Fails the first `failures` appends, then delegates.
    struct FlakyStore {
        failures: AtomicU32,
        inner: Arc<InMemoryAuditStore>,
    }

    impl AuditStore for FlakyStore {
        fn append(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(AuditStoreError::Storage("disk full".to_string()));
            }
            self.inner.append(record)
        }
    }

    /// Blocks every append until the gate is opened.
    struct GatedStore {
        gate: Arc<Mutex<()>>,
        inner: Arc<InMemoryAuditStore>,
    }

    impl AuditStore for GatedStore {
        fn append(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
            let _open = self.gate.lock().map_err(|_| AuditStoreError::Storage("gate".to_string()))?;
            self.inner.append(record)
        }
    }

    /// Panics on the first append, then delegates.
    struct PanicOnceStore {
        panicked: AtomicBool,
        inner: Arc<InMemoryAuditStore>,
    }

    impl AuditStore for PanicOnceStore {
        fn append(&self, record: &AuditRecord) -> Result<(), AuditStoreError> {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("driver bug");
            }
            self.inner.append(record)
        }
    }

    fn fast_config() -> AuditLoggerConfig {
        AuditLoggerConfig::default()
            .with_name("audit-test")
            .with_retry_backoff(Duration::from_millis(1))
    }

    #[test]
    fn records_are_persisted_and_drained_on_shutdown() {
        let store = Arc::new(InMemoryAuditStore::new());
        let (logger, handle) = AuditLogger::spawn(store.clone(), fast_config()).unwrap();

        for _ in 0..10 {
            logger.record(&Decision::permit(PolicyId::new()), &ctx());
        }
        let stats = handle.shutdown();

        assert_eq!(stats.enqueued, 10);
        assert_eq!(stats.persisted, 10);
        assert_eq!(stats.dropped, 0);
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn transient_failures_are_retried() {
        let inner = Arc::new(InMemoryAuditStore::new());
        let flaky = FlakyStore { failures: AtomicU32::new(2), inner: inner.clone() };
        let (logger, handle) = AuditLogger::spawn(flaky, fast_config().with_max_attempts(3)).unwrap();

        logger.record(&Decision::no_applicable_policy(), &ctx());
        let stats = handle.shutdown();

        assert_eq!(stats.persisted, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn exhausted_retries_count_as_failed() {
        let inner = Arc::new(InMemoryAuditStore::new());
        let flaky = FlakyStore { failures: AtomicU32::new(u32::MAX), inner: inner.clone() };
        let (logger, handle) = AuditLogger::spawn(flaky, fast_config().with_max_attempts(2)).unwrap();

        logger.record(&Decision::no_applicable_policy(), &ctx());
        let stats = handle.shutdown();

        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.persisted, 0);
        assert_eq!(stats.failed, 1);
        assert!(inner.is_empty());
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let gate = Arc::new(Mutex::new(()));
        let inner = Arc::new(InMemoryAuditStore::new());
        let closed = gate.lock().unwrap();

        let store = GatedStore { gate: gate.clone(), inner: inner.clone() };
        let (logger, handle) = AuditLogger::spawn(store, fast_config().with_queue_capacity(2)).unwrap();

        // The worker holds at most one record while blocked on the gate, the
        // queue holds two more; everything past that must be dropped.
        for _ in 0..20 {
            logger.record(&Decision::permit(PolicyId::new()), &ctx());
        }
        let during = logger.stats();
        assert!(during.dropped >= 17, "dropped {}", during.dropped);
        assert_eq!(during.enqueued + during.dropped, 20);

        drop(closed);
        let stats = handle.shutdown();
        assert_eq!(stats.persisted, stats.enqueued);
        assert_eq!(inner.len() as u64, stats.persisted);
    }

    #[test]
    fn records_after_shutdown_are_dropped() {
        let store = Arc::new(InMemoryAuditStore::new());
        let (logger, handle) = AuditLogger::spawn(store.clone(), fast_config()).unwrap();
        handle.shutdown();

        logger.record(&Decision::permit(PolicyId::new()), &ctx());
        assert_eq!(logger.stats().dropped, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn panicking_store_counts_as_failed_and_worker_survives() {
        let inner = Arc::new(InMemoryAuditStore::new());
        let store = PanicOnceStore { panicked: AtomicBool::new(false), inner: inner.clone() };
        let (logger, handle) = AuditLogger::spawn(store, fast_config().with_max_attempts(1)).unwrap();

        logger.record(&Decision::permit(PolicyId::new()), &ctx());
        thread::sleep(Duration::from_millis(100));
        for _ in 0..5 {
            logger.record(&Decision::permit(PolicyId::new()), &ctx());
        }
        let stats = handle.shutdown();

        assert_eq!(stats.enqueued, 6);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.persisted, 5);
        assert_eq!(stats.dropped, 0);
        assert_eq!(inner.len(), 5);
    }

    #[test]
    fn panicking_append_is_retried() {
        let inner = Arc::new(InMemoryAuditStore::new());
        let store = PanicOnceStore { panicked: AtomicBool::new(false), inner: inner.clone() };
        let (logger, handle) = AuditLogger::spawn(store, fast_config().with_max_attempts(2)).unwrap();

        logger.record(&Decision::no_applicable_policy(), &ctx());
        let stats = handle.shutdown();

        assert_eq!(stats.persisted, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(inner.len(), 1);
    }
}
