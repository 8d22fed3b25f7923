//! SensorEventTap: motion-sensor capture tied to the active UI action.
//!
//! Sensors are only listened to while a screen that wants motion data is on
//! top.  [`activate`](SensorEventTap::activate) and
//! [`deactivate`](SensorEventTap::deactivate) register and unregister with the
//! platform through a [`SensorRegistrar`]; readings that arrive while the tap
//! is inactive (late callbacks after unregistering) are dropped.
//!
//! Only accelerometer, gyroscope and magnetometer readings are recorded.  Any
//! other sensor type code is ignored without a sample.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gesture_core::{CaptureAction, MotionSample, SensorKind, SensorNanos};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::tap::{bump, TapContext, TapCounters, TapStats};

/// Error type for sensor capture.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The platform refused the listener registration.
    #[error("sensor registration failed: {0}")]
    RegistrationFailed(String),

    /// The device has no sensor of this kind.
    #[error("sensor not available on this device: {0:?}")]
    SensorUnavailable(SensorKind),
}

/// Platform hook for starting and stopping sensor delivery.
///
/// The infrastructure implementation talks to the OS sensor service; tests use
/// a mock.
#[cfg_attr(test, mockall::automock)]
pub trait SensorRegistrar: Send + Sync {
    /// Starts delivering readings for `kinds`.
    fn register(&self, kinds: &[SensorKind]) -> Result<(), CaptureError>;

    /// Stops delivering readings.  Idempotent.
    fn unregister(&self);
}

/// The interface navigation code uses to steer sensor capture.
#[cfg_attr(test, mockall::automock)]
pub trait SensorControl: Send + Sync {
    fn active_sensor(&self);
    fn disable_sensor(&self);
    fn set_action_context(&self, action: CaptureAction);
}

pub struct SensorEventTap {
    ctx: TapContext,
    registrar: Arc<dyn SensorRegistrar>,
    active: AtomicBool,
    action: RwLock<Option<CaptureAction>>,
    /// Serialises activate/deactivate so register/unregister never interleave.
    transition: Mutex<()>,
    counters: TapCounters,
}

impl SensorEventTap {
    /// Creates an inactive tap.
    pub fn new(ctx: TapContext, registrar: Arc<dyn SensorRegistrar>) -> Self {
        Self {
            ctx,
            registrar,
            active: AtomicBool::new(false),
            action: RwLock::new(None),
            transition: Mutex::new(()),
            counters: TapCounters::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn action_context(&self) -> Option<CaptureAction> {
        *self.action.read()
    }

    /// Tags subsequent motion samples with `action`.
    pub fn set_action_context(&self, action: CaptureAction) {
        debug!(action = action.as_str(), "sensor action context set");
        *self.action.write() = Some(action);
    }

    pub fn clear_action_context(&self) {
        *self.action.write() = None;
    }

    /// Registers with the platform and starts accepting readings.
    ///
    /// Activating an active tap does nothing.
    ///
    /// # Errors
    ///
    /// Propagates the registrar's error; the tap stays inactive.
    pub fn activate(&self) -> Result<(), CaptureError> {
        let _guard = self.transition.lock();
        if self.is_active() {
            return Ok(());
        }
        self.registrar.register(&SensorKind::ALL)?;
        self.active.store(true, Ordering::Release);
        info!(action = ?self.action_context(), "sensor capture active");
        Ok(())
    }

    /// Stops accepting readings and unregisters from the platform.
    pub fn deactivate(&self) {
        let _guard = self.transition.lock();
        if !self.is_active() {
            return;
        }
        self.active.store(false, Ordering::Release);
        self.registrar.unregister();
        info!("sensor capture inactive");
    }

    /// Records one sensor reading.
    ///
    /// `values` holds the x, y and z axes; missing axes are recorded as zero.
    /// `timestamp_ns` is the sensor's own nanosecond clock and is kept as is.
    pub fn on_reading(&self, sensor_type: i32, values: &[f32], timestamp_ns: i64) {
        if !self.is_active() {
            bump(&self.counters.skipped);
            trace!(sensor_type, "reading while inactive; dropped");
            return;
        }
        let Some(sensor) = SensorKind::from_type_code(sensor_type) else {
            bump(&self.counters.skipped);
            return;
        };
        let Some(stamp) = self.ctx.stamp() else {
            bump(&self.counters.skipped);
            return;
        };

        if values.len() < 3 {
            let malformed = bump(&self.counters.malformed);
            debug!(
                sensor = sensor.as_str(),
                axes = values.len(),
                malformed,
                "short sensor reading; missing axes set to zero"
            );
        }
        let axis = |i: usize| values.get(i).copied().unwrap_or(0.0);

        self.ctx.emit(MotionSample {
            sensor,
            x: axis(0),
            y: axis(1),
            z: axis(2),
            timestamp: SensorNanos(timestamp_ns),
            action: self.action_context(),
            user_id: stamp.user_id.clone(),
            session_id: stamp.session_id.clone(),
        });
        bump(&self.counters.emitted);
    }

    /// Logs an accuracy change.  Produces no sample.
    pub fn on_accuracy_changed(&self, sensor_type: i32, accuracy: i32) {
        let stamp = self.ctx.session().snapshot();
        info!(
            sensor_type,
            accuracy,
            user = ?stamp.user_id,
            session = ?stamp.session_id,
            "sensor accuracy changed"
        );
    }

    pub fn stats(&self) -> TapStats {
        self.counters.snapshot()
    }
}

impl SensorControl for SensorEventTap {
    fn active_sensor(&self) {
        if let Err(e) = self.activate() {
            warn!(error = %e, "could not activate sensor capture");
        }
    }

    fn disable_sensor(&self) {
        self.deactivate();
    }

    fn set_action_context(&self, action: CaptureAction) {
        SensorEventTap::set_action_context(self, action);
    }
}

impl Drop for SensorEventTap {
    fn drop(&mut self) {
        if *self.active.get_mut() {
            self.registrar.unregister();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
