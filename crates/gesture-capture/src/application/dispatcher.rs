//! Dispatcher: bounded hand-off between the taps and the sink.
//!
//! Producers (UI callbacks, the sensor thread) call [`Dispatcher::enqueue`],
//! which never blocks and never awaits.  A single drain task, started with
//! [`Dispatcher::start`], pops samples in FIFO order and appends them to the
//! [`Sink`].
//!
//! # Backpressure
//!
//! The buffer holds at most `capacity` samples.  When it is full, the
//! **oldest** buffered sample is evicted to make room for the new one, and the
//! eviction is counted in [`DispatcherStats::dropped`].  Recent behaviour is
//! worth more than stale behaviour, and a producer must never stall the UI.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──start()──► Draining ──stop()──► Stopped
//!    └──────────────stop()─────────────────────┘
//! ```
//!
//! `Stopped` is terminal.  Stopping lets the sink write in flight finish; the
//! drain task then exits without touching the rest of the buffer.  Enqueue is
//! legal in every state, but samples enqueued after stop are never drained.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gesture_core::Sample;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::sink::{SampleRecord, Sink};

/// Default buffer size.
pub const DEFAULT_CAPACITY: usize = 100;

const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;
const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_millis(500);

/// Error type for dispatcher lifecycle operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no tokio runtime available to run the drain task")]
    NoRuntime,
}

/// Producer-side seam used by the taps.
///
/// [`Dispatcher`] is the production implementation; tap unit tests use a
/// recording double.
pub trait SampleQueue: Send + Sync {
    /// Hands one sample to the queue.  Must not block.
    fn enqueue(&self, sample: Sample);
}

/// Tuning knobs for a [`Dispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of buffered samples.  Values below 1 are treated as 1.
    pub capacity: usize,
    /// Consecutive sink failures after which draining pauses.
    pub max_consecutive_failures: u32,
    /// How long draining pauses after too many consecutive failures.
    pub failure_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
        }
    }
}

/// Lifecycle state of a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Created,
    Draining,
    Stopped,
}

const STATE_CREATED: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_STOPPED: u8 = 2;

impl DispatcherState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            STATE_CREATED => DispatcherState::Created,
            STATE_DRAINING => DispatcherState::Draining,
            _ => DispatcherState::Stopped,
        }
    }
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub enqueued: u64,
    pub delivered: u64,
    /// Samples evicted because the buffer was full.
    pub dropped: u64,
    pub sink_failures: u64,
    pub drain_loops_started: u64,
    /// Samples currently waiting in the buffer.
    pub buffered: usize,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    sink_failures: AtomicU64,
    drain_loops_started: AtomicU64,
}

/// State shared between the dispatcher handle and its drain task.
struct Shared {
    queue: Mutex<VecDeque<Sample>>,
    capacity: usize,
    state: AtomicU8,
    /// Signalled on every enqueue.
    wake: Notify,
    /// Signalled once on stop.
    stop: Notify,
    counters: Counters,
}

impl Shared {
    fn is_stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_STOPPED
    }

    fn pop(&self) -> Option<Sample> {
        self.queue.lock().pop_front()
    }
}

/// Bounded, drop-oldest sample dispatcher with a single drain task.
pub struct Dispatcher {
    shared: Arc<Shared>,
    sink: Arc<dyn Sink>,
    config: DispatcherConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Creates a dispatcher in the `Created` state.  Nothing drains until
    /// [`start`](Self::start) is called.
    pub fn new(sink: Arc<dyn Sink>, config: DispatcherConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                state: AtomicU8::new(STATE_CREATED),
                wake: Notify::new(),
                stop: Notify::new(),
                counters: Counters::default(),
            }),
            sink,
            config,
            task: Mutex::new(None),
        }
    }

    pub fn with_capacity(sink: Arc<dyn Sink>, capacity: usize) -> Self {
        Self::new(
            sink,
            DispatcherConfig {
                capacity,
                ..DispatcherConfig::default()
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Buffers `sample`, evicting the oldest buffered sample when full.
    ///
    /// Constant time; safe to call from any thread, inside or outside a
    /// runtime.
    pub fn enqueue(&self, sample: impl Into<Sample>) {
        let sample = sample.into();
        let evicted = {
            let mut queue = self.shared.queue.lock();
            let evicted = if queue.len() >= self.shared.capacity {
                queue.pop_front()
            } else {
                None
            };
            queue.push_back(sample);
            evicted
        };

        self.shared.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        if evicted.is_some() {
            let dropped = self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            // Log the first overflow and then every power of two.
            if dropped.is_power_of_two() {
                warn!(
                    dropped,
                    capacity = self.shared.capacity,
                    "dispatcher buffer full; oldest samples evicted"
                );
            } else {
                trace!(dropped, "evicted oldest buffered sample");
            }
        }

        self.shared.wake.notify_one();
    }

    /// Launches the drain task.
    ///
    /// Only the first call from `Created` spawns a task; later calls (and calls
    /// after stop) are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoRuntime`] when called outside a tokio
    /// runtime.  The dispatcher stays in `Created` in that case.
    pub fn start(&self) -> Result<(), DispatchError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;

        if self
            .shared
            .state
            .compare_exchange(
                STATE_CREATED,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!(state = ?self.state(), "dispatcher start ignored");
            return Ok(());
        }

        self.shared
            .counters
            .drain_loops_started
            .fetch_add(1, Ordering::Relaxed);
        let task = handle.spawn(drain_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.sink),
            self.config.clone(),
        ));
        *self.task.lock() = Some(task);
        info!(capacity = self.shared.capacity, "dispatcher draining");
        Ok(())
    }

    /// Signals the drain task to exit after its current sink write.
    ///
    /// Returns immediately; use [`shutdown`](Self::shutdown) to also wait for
    /// the task.
    pub fn stop(&self) {
        let previous = self.shared.state.swap(STATE_STOPPED, Ordering::AcqRel);
        if previous == STATE_STOPPED {
            return;
        }
        self.shared.stop.notify_one();
        info!(
            from = ?DispatcherState::from_u8(previous),
            "dispatcher stopping"
        );
    }

    /// Stops the dispatcher and waits for the drain task to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "drain task ended abnormally");
            }
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        let c = &self.shared.counters;
        DispatcherStats {
            enqueued: c.enqueued.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            sink_failures: c.sink_failures.load(Ordering::Relaxed),
            drain_loops_started: c.drain_loops_started.load(Ordering::Relaxed),
            buffered: self.shared.queue.lock().len(),
        }
    }
}

impl SampleQueue for Dispatcher {
    fn enqueue(&self, sample: Sample) {
        Dispatcher::enqueue(self, sample);
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // The drain task only holds `Shared`; without this it would idle
        // forever once the handle is gone.
        self.shared.state.store(STATE_STOPPED, Ordering::Release);
        self.shared.stop.notify_one();
    }
}

async fn drain_loop(shared: Arc<Shared>, sink: Arc<dyn Sink>, config: DispatcherConfig) {
    let mut consecutive_failures = 0u32;
    let mut unflushed = false;

    loop {
        if shared.is_stopped() {
            break;
        }

        let Some(sample) = shared.pop() else {
            if unflushed {
                if let Err(e) = sink.flush().await {
                    warn!(error = %e, "sink flush failed");
                }
                unflushed = false;
                continue;
            }
            tokio::select! {
                _ = shared.wake.notified() => {}
                _ = shared.stop.notified() => {}
            }
            continue;
        };

        let record = SampleRecord::from(&sample);
        match sink.append(&record).await {
            Ok(()) => {
                shared.counters.delivered.fetch_add(1, Ordering::Relaxed);
                consecutive_failures = 0;
                unflushed = true;
            }
            Err(e) => {
                shared.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
                consecutive_failures += 1;
                warn!(error = %e, consecutive_failures, "sink write failed; sample discarded");

                if config.max_consecutive_failures > 0
                    && consecutive_failures >= config.max_consecutive_failures
                {
                    warn!(
                        backoff_ms = config.failure_backoff.as_millis() as u64,
                        "too many consecutive sink failures; pausing drain"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(config.failure_backoff) => {}
                        _ = shared.stop.notified() => {}
                    }
                    consecutive_failures = 0;
                }
            }
        }
    }

    if unflushed {
        if let Err(e) = sink.flush().await {
            warn!(error = %e, "final sink flush failed");
        }
    }
    let abandoned = shared.queue.lock().len();
    info!(abandoned, "drain task exited");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sink::SinkError;
    use async_trait::async_trait;
    use gesture_core::{KeyPhase, KeySample, UptimeMillis};

    /// Sink double that records key codes.
    #[derive(Default)]
    struct CodeSink {
        codes: Mutex<Vec<u32>>,
        fail_codes: Vec<u32>,
    }

    #[async_trait]
    impl Sink for CodeSink {
        async fn append(&self, record: &SampleRecord) -> Result<(), SinkError> {
            let code = record.key_code.unwrap_or_default();
            if self.fail_codes.contains(&code) {
                return Err(SinkError::Rejected(format!("code {code}")));
            }
            self.codes.lock().push(code);
            Ok(())
        }
    }

    fn key(code: u32) -> KeySample {
        KeySample {
            phase: KeyPhase::Down,
            key_code: code,
            timestamp: UptimeMillis(code as i64),
            user_id: None,
            session_id: None,
        }
    }

    async fn wait_for_delivered(dispatcher: &Dispatcher, n: u64) {
        for _ in 0..400 {
            if dispatcher.stats().delivered + dispatcher.stats().sink_failures >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("dispatcher did not drain {n} samples in time");
    }

    #[test]
    fn test_new_dispatcher_is_created_and_empty() {
        let dispatcher =
            Dispatcher::new(Arc::new(CodeSink::default()), DispatcherConfig::default());
        assert_eq!(dispatcher.state(), DispatcherState::Created);
        assert_eq!(dispatcher.capacity(), DEFAULT_CAPACITY);
        assert_eq!(dispatcher.stats(), DispatcherStats::default());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let dispatcher = Dispatcher::with_capacity(Arc::new(CodeSink::default()), 0);
        dispatcher.enqueue(key(1));
        dispatcher.enqueue(key(2));
        assert_eq!(dispatcher.capacity(), 1);
        assert_eq!(dispatcher.stats().buffered, 1);
        assert_eq!(dispatcher.stats().dropped, 1);
    }

    #[test]
    fn test_start_outside_runtime_fails_and_stays_created() {
        // Arrange
        let dispatcher =
            Dispatcher::new(Arc::new(CodeSink::default()), DispatcherConfig::default());

        // Act
        let result = dispatcher.start();

        // Assert
        assert_eq!(result, Err(DispatchError::NoRuntime));
        assert_eq!(dispatcher.state(), DispatcherState::Created);
        assert_eq!(dispatcher.stats().drain_loops_started, 0);
    }

    #[test]
    fn test_stop_from_created_is_terminal() {
        let dispatcher =
            Dispatcher::new(Arc::new(CodeSink::default()), DispatcherConfig::default());
        dispatcher.stop();
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_drains_in_fifo_order() {
        // Arrange
        let sink = Arc::new(CodeSink::default());
        let dispatcher = Dispatcher::new(sink.clone(), DispatcherConfig::default());
        dispatcher.start().unwrap();

        // Act
        for code in 1..=5 {
            dispatcher.enqueue(key(code));
        }
        wait_for_delivered(&dispatcher, 5).await;
        dispatcher.shutdown().await;

        // Assert
        assert_eq!(*sink.codes.lock(), vec![1, 2, 3, 4, 5]);
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_start_after_stop_does_not_resurrect() {
        let dispatcher =
            Dispatcher::new(Arc::new(CodeSink::default()), DispatcherConfig::default());
        dispatcher.stop();

        dispatcher.start().unwrap();

        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
        assert_eq!(dispatcher.stats().drain_loops_started, 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_discarded_and_draining_continues() {
        // Arrange – code 2 is rejected by the sink
        let sink = Arc::new(CodeSink {
            codes: Mutex::new(Vec::new()),
            fail_codes: vec![2],
        });
        let dispatcher = Dispatcher::new(sink.clone(), DispatcherConfig::default());
        dispatcher.start().unwrap();

        // Act
        for code in 1..=3 {
            dispatcher.enqueue(key(code));
        }
        wait_for_delivered(&dispatcher, 3).await;
        dispatcher.shutdown().await;

        // Assert
        assert_eq!(*sink.codes.lock(), vec![1, 3]);
        let stats = dispatcher.stats();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.sink_failures, 1);
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_harmless() {
        let dispatcher =
            Dispatcher::new(Arc::new(CodeSink::default()), DispatcherConfig::default());
        dispatcher.start().unwrap();
        dispatcher.shutdown().await;
        dispatcher.shutdown().await;
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_enqueue_after_stop_buffers_but_never_drains() {
        // Arrange
        let sink = Arc::new(CodeSink::default());
        let dispatcher = Dispatcher::with_capacity(sink.clone(), 2);
        dispatcher.start().unwrap();
        dispatcher.shutdown().await;

        // Act
        for code in 1..=3 {
            dispatcher.enqueue(key(code));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Assert
        let stats = dispatcher.stats();
        assert_eq!(stats.buffered, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.delivered, 0);
        assert!(sink.codes.lock().is_empty());
    }
}
