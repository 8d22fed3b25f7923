//! JSON-lines replay driver.
//!
//! Stands in for the UI toolkit and the sensor service when the pipeline runs
//! headless: each line of the script is one [`DriverEvent`] (a login, a
//! screen change, a touch, a key, a sensor reading) and is fed to the same
//! taps and navigation hook a device build would call.
//!
//! ```text
//! {"event":"login","user":"u1"}
//! {"event":"navigate","screen":"log_in"}
//! {"event":"pointer","surface":"text_entry","raw":{"action":0,"x":10.5,"y":20.0,"pressure":0.8,"size":0.1,"event_time_ms":1000}}
//! {"event":"key","raw":{"action":0,"key_code":8,"event_time_ms":1001}}
//! {"event":"sensor","sensor_type":1,"values":[0.1,9.8,0.2],"timestamp_ns":1000000000}
//! {"event":"navigate_up"}
//! {"event":"logout"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.  A line that does not
//! parse is logged and counted; the replay carries on.

use std::sync::Arc;

use gesture_core::{RawKeyEvent, RawPointerEvent, SessionContext, SessionId, SurfaceKind, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::application::key_tap::KeyEventTap;
use crate::application::navigation::{NavigationHook, Screen};
use crate::application::pointer_tap::PointerEventTap;
use crate::application::sensor_tap::{SensorEventTap, SensorRegistrar};
use crate::pipeline::CapturePipeline;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay script: {0}")]
    Io(#[from] std::io::Error),
}

/// One scripted driver action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DriverEvent {
    /// Select `user` and open a fresh session.
    Login { user: String },
    Logout,
    SetUser { user: String },
    StartSession,
    EndSession,
    /// Install an externally assigned user/session pair.
    Adopt { user: String, session: String },
    Navigate { screen: Screen },
    NavigateUp,
    Pointer { surface: SurfaceKind, raw: RawPointerEvent },
    Key { raw: RawKeyEvent },
    Sensor {
        sensor_type: i32,
        #[serde(default)]
        values: Vec<f32>,
        timestamp_ns: i64,
    },
    Accuracy { sensor_type: i32, accuracy: i32 },
}

/// Parses one script line.  `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// The `serde_json` error for a malformed line.
pub fn parse_line(line: &str) -> Result<Option<DriverEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: u64,
    pub rejected: u64,
}

/// The taps and hooks of one simulated screen stack.
pub struct ReplayDriver {
    session: Arc<SessionContext>,
    swipe: PointerEventTap,
    text_entry: PointerEventTap,
    keys: KeyEventTap,
    sensors: Arc<SensorEventTap>,
    navigation: NavigationHook,
}

impl ReplayDriver {
    pub fn new(pipeline: &CapturePipeline, registrar: Arc<dyn SensorRegistrar>) -> Self {
        let sensors = Arc::new(pipeline.sensor_tap(registrar));
        Self {
            session: Arc::clone(pipeline.session()),
            swipe: pipeline.pointer_tap(SurfaceKind::Swipe),
            text_entry: pipeline.pointer_tap(SurfaceKind::TextEntry),
            keys: pipeline.key_tap(),
            navigation: NavigationHook::new(sensors.clone()),
            sensors,
        }
    }

    pub fn sensor_tap(&self) -> &SensorEventTap {
        &self.sensors
    }

    pub fn pointer_tap(&self, surface: SurfaceKind) -> &PointerEventTap {
        match surface {
            SurfaceKind::Swipe => &self.swipe,
            SurfaceKind::TextEntry => &self.text_entry,
        }
    }

    pub fn key_tap(&self) -> &KeyEventTap {
        &self.keys
    }

    pub fn navigation(&self) -> &NavigationHook {
        &self.navigation
    }

    /// Feeds one event to the matching tap or hook.
    pub fn apply(&self, event: &DriverEvent) {
        match event {
            DriverEvent::Login { user } => {
                self.session.login(UserId::new(user.as_str()));
            }
            DriverEvent::Logout => self.session.logout(),
            DriverEvent::SetUser { user } => self.session.set_user(UserId::new(user.as_str())),
            DriverEvent::StartSession => {
                self.session.start_session();
            }
            DriverEvent::EndSession => self.session.end_session(),
            DriverEvent::Adopt { user, session } => self
                .session
                .adopt_session(UserId::new(user.as_str()), SessionId::new(session.as_str())),
            DriverEvent::Navigate { screen } => self.navigation.navigate_to(*screen),
            DriverEvent::NavigateUp => self.navigation.navigate_up(),
            DriverEvent::Pointer { surface, raw } => self.pointer_tap(*surface).on_event(raw),
            DriverEvent::Key { raw } => self.keys.on_key(raw),
            DriverEvent::Sensor {
                sensor_type,
                values,
                timestamp_ns,
            } => self.sensors.on_reading(*sensor_type, values, *timestamp_ns),
            DriverEvent::Accuracy {
                sensor_type,
                accuracy,
            } => self.sensors.on_accuracy_changed(*sensor_type, *accuracy),
        }
    }

    /// Replays a whole script.
    ///
    /// # Errors
    ///
    /// [`ReplayError::Io`] when the reader fails.  Malformed lines are not
    /// errors; they are counted in [`ReplaySummary::rejected`].
    pub async fn run<R>(&self, reader: R) -> Result<ReplaySummary, ReplayError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = ReplaySummary::default();
        let mut lines = reader.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            match parse_line(&line) {
                Ok(Some(event)) => {
                    debug!(line = line_no, ?event, "replay");
                    self.apply(&event);
                    summary.applied += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(line = line_no, error = %e, "skipping malformed replay line");
                    summary.rejected += 1;
                }
            }
            // Keep the drain task moving on a single-threaded runtime.
            if line_no % 64 == 0 {
                tokio::task::yield_now().await;
            }
        }

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            "replay finished"
        );
        Ok(summary)
    }
}
