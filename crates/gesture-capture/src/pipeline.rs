//! CapturePipeline: owns the session context and the dispatcher, and builds
//! taps wired to both.
//!
//! ```text
//!  UI thread ──► PointerEventTap ─┐
//!  UI thread ──► KeyEventTap ─────┼─► Dispatcher (bounded, drop-oldest) ──► drain task ──► Sink
//!  sensor thr ─► SensorEventTap ──┘        ▲
//!                     │                    │ start() / shutdown()
//!                     └── SessionContext ◄─┴── CapturePipeline
//! ```
//!
//! The drain task's lifetime is tied to the pipeline: [`CapturePipeline::start`]
//! launches it, [`CapturePipeline::shutdown`] stops it and waits for it.

use std::sync::Arc;

use gesture_core::{SessionContext, SurfaceKind};

use crate::application::dispatcher::{DispatchError, Dispatcher, DispatcherConfig, DispatcherStats};
use crate::application::key_tap::KeyEventTap;
use crate::application::pointer_tap::PointerEventTap;
use crate::application::sensor_tap::{SensorEventTap, SensorRegistrar};
use crate::application::sink::Sink;
use crate::application::tap::TapContext;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub dispatcher: DispatcherConfig,
    /// Taps skip samples while no session is open.
    pub strict_session: bool,
}

pub struct CapturePipeline {
    session: Arc<SessionContext>,
    dispatcher: Arc<Dispatcher>,
    strict_session: bool,
}

impl CapturePipeline {
    pub fn new(
        session: Arc<SessionContext>,
        sink: Arc<dyn Sink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            session,
            dispatcher: Arc::new(Dispatcher::new(sink, options.dispatcher)),
            strict_session: options.strict_session,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    fn tap_context(&self) -> TapContext {
        TapContext::new(Arc::clone(&self.session), self.dispatcher.clone())
            .with_strict_session(self.strict_session)
    }

    pub fn pointer_tap(&self, surface: SurfaceKind) -> PointerEventTap {
        PointerEventTap::new(surface, self.tap_context())
    }

    pub fn key_tap(&self) -> KeyEventTap {
        KeyEventTap::new(self.tap_context())
    }

    /// Builds an inactive sensor tap.
    pub fn sensor_tap(&self, registrar: Arc<dyn SensorRegistrar>) -> SensorEventTap {
        SensorEventTap::new(self.tap_context(), registrar)
    }

    /// Starts draining.  Idempotent.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoRuntime`] outside a tokio runtime.
    pub fn start(&self) -> Result<(), DispatchError> {
        self.dispatcher.start()
    }

    /// Stops draining and waits for the in-flight sink write to finish.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }

    pub fn stats(&self) -> DispatcherStats {
        self.dispatcher.stats()
    }
}
