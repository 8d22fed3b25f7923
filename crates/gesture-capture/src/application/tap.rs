//! State shared by every tap: where to stamp identity from, and where to send
//! the stamped sample.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gesture_core::{Sample, SessionContext, SessionSnapshot};
use tracing::trace;

use super::dispatcher::SampleQueue;

/// Collaborators handed to each tap at construction.
#[derive(Clone)]
pub struct TapContext {
    session: Arc<SessionContext>,
    queue: Arc<dyn SampleQueue>,
    strict_session: bool,
}

impl TapContext {
    /// Permissive context: samples are emitted with empty identity tags when
    /// no session is open.
    pub fn new(session: Arc<SessionContext>, queue: Arc<dyn SampleQueue>) -> Self {
        Self {
            session,
            queue,
            strict_session: false,
        }
    }

    /// When `strict` is set, taps skip samples while no session is open.
    pub fn with_strict_session(mut self, strict: bool) -> Self {
        self.strict_session = strict;
        self
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn strict_session(&self) -> bool {
        self.strict_session
    }

    /// Takes one consistent identity snapshot for a sample about to be built.
    ///
    /// `None` means the sample must be skipped (strict mode, no session).
    pub(crate) fn stamp(&self) -> Option<Arc<SessionSnapshot>> {
        let snapshot = self.session.snapshot();
        if self.strict_session && !snapshot.has_session() {
            trace!("no active session; sample skipped");
            return None;
        }
        Some(snapshot)
    }

    pub(crate) fn emit(&self, sample: impl Into<Sample>) {
        self.queue.enqueue(sample.into());
    }
}

/// Per-tap counters.
#[derive(Debug, Default)]
pub(crate) struct TapCounters {
    pub emitted: AtomicU64,
    /// Samples emitted with defaulted fields.
    pub malformed: AtomicU64,
    /// Events that produced no sample.
    pub skipped: AtomicU64,
}

pub(crate) fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

impl TapCounters {
    pub fn snapshot(&self) -> TapStats {
        TapStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time tap counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapStats {
    pub emitted: u64,
    pub malformed: u64,
    pub skipped: u64,
}
