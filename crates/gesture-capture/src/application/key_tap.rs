//! KeyEventTap: records raw key presses on a text entry surface.
//!
//! Only the key code, the phase and the uptime timestamp are kept.  The tap
//! shares the session stamp with the pointer tap on the same surface, so key
//! and touch samples from one screen line up by user and session.

use gesture_core::{KeySample, RawKeyEvent, UptimeMillis};
use tracing::debug;

use super::tap::{bump, TapContext, TapCounters, TapStats};

pub struct KeyEventTap {
    ctx: TapContext,
    counters: TapCounters,
}

impl KeyEventTap {
    pub fn new(ctx: TapContext) -> Self {
        Self {
            ctx,
            counters: TapCounters::default(),
        }
    }

    /// Records one key event.  Observes only; the event is not consumed.
    pub fn on_key(&self, event: &RawKeyEvent) {
        let Some(stamp) = self.ctx.stamp() else {
            bump(&self.counters.skipped);
            return;
        };

        if !event.is_complete() {
            let malformed = bump(&self.counters.malformed);
            debug!(action = ?event.action, malformed, "key event missing fields");
        }

        self.ctx.emit(KeySample {
            phase: event.phase(),
            key_code: event.key_code.unwrap_or(0),
            timestamp: UptimeMillis(event.event_time_ms.unwrap_or(0)),
            user_id: stamp.user_id.clone(),
            session_id: stamp.session_id.clone(),
        });
        bump(&self.counters.emitted);
    }

    pub fn stats(&self) -> TapStats {
        self.counters.snapshot()
    }
}
