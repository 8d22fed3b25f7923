//! PointerEventTap: turns raw touch/pointer events into [`PointerSample`]s.
//!
//! One tap is attached per capture surface (the swipe-capable area or a text
//! entry field).  The tap observes; it never consumes the event, so the host
//! toolkit keeps delivering it to the widget underneath.

use gesture_core::{PointerSample, RawPointerEvent, SurfaceKind, UptimeMillis};
use tracing::{debug, trace};

use super::tap::{bump, TapContext, TapCounters, TapStats};

pub struct PointerEventTap {
    surface: SurfaceKind,
    ctx: TapContext,
    counters: TapCounters,
}

impl PointerEventTap {
    pub fn new(surface: SurfaceKind, ctx: TapContext) -> Self {
        Self {
            surface,
            ctx,
            counters: TapCounters::default(),
        }
    }

    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    /// Records one pointer event.
    ///
    /// Every event produces exactly one sample (unless strict session mode is
    /// on and no session is open).  Unrecognised action codes yield
    /// [`Unknown`](gesture_core::PointerPhase::Unknown); missing numeric fields are recorded as zero.
    /// Values are copied as reported, with no smoothing.
    pub fn on_event(&self, event: &RawPointerEvent) {
        let Some(stamp) = self.ctx.stamp() else {
            bump(&self.counters.skipped);
            return;
        };

        if !event.is_complete() {
            let malformed = bump(&self.counters.malformed);
            debug!(
                surface = self.surface.as_str(),
                action = ?event.action,
                malformed,
                "pointer event missing fields; defaulting to zero"
            );
        }

        let sample = PointerSample {
            phase: event.phase(),
            pressure: event.pressure.unwrap_or(0.0),
            contact_size: event.size.unwrap_or(0.0),
            x: event.x.unwrap_or(0.0),
            y: event.y.unwrap_or(0.0),
            timestamp: UptimeMillis(event.event_time_ms.unwrap_or(0)),
            surface: self.surface,
            user_id: stamp.user_id.clone(),
            session_id: stamp.session_id.clone(),
        };
        trace!(
            surface = self.surface.as_str(),
            phase = sample.phase.as_str(),
            x = sample.x,
            y = sample.y,
            "pointer sample"
        );

        self.ctx.emit(sample);
        bump(&self.counters.emitted);
    }

    pub fn stats(&self) -> TapStats {
        self.counters.snapshot()
    }
}
