//! The sink seam: where drained samples end up.
//!
//! The dispatcher flattens every [`Sample`] into a [`SampleRecord`] and hands
//! it to a [`Sink`].  A sink is an append-only, ordered, best-effort record
//! store: a diagnostic log, a local CSV file, or (in a production build) a
//! remote collector.  Implementations live in `infrastructure::sinks`.
//!
//! # Record layout
//!
//! A record is one flat line.  Columns that do not apply to the sample family
//! are `None`:
//!
//! | column       | pointer        | key          | motion          |
//! |--------------|----------------|--------------|-----------------|
//! | event_type   | `DOWN`/`MOVE`… | `KEY_DOWN`…  | `ACCELEROMETER`…|
//! | context      | surface        | –            | UI action       |
//! | x, y         | ✓              | –            | ✓               |
//! | z            | –              | –            | ✓               |
//! | pressure     | ✓              | –            | –               |
//! | contact_size | ✓              | –            | –               |
//! | key_code     | –              | ✓            | –               |
//! | timestamp    | uptime ms      | uptime ms    | sensor ns       |

use async_trait::async_trait;
use gesture_core::Sample;
use serde::Serialize;
use thiserror::Error;

/// Error type for sink writes.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink is closed")]
    Closed,
    #[error("sink rejected record: {0}")]
    Rejected(String),
}

/// Which sample family a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Pointer,
    Key,
    Motion,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Pointer => "pointer",
            RecordKind::Key => "key",
            RecordKind::Motion => "motion",
        }
    }
}

/// Unit of [`SampleRecord::timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimestampUnit {
    #[serde(rename = "ms")]
    UptimeMillis,
    #[serde(rename = "ns")]
    SensorNanos,
}

impl TimestampUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimestampUnit::UptimeMillis => "ms",
            TimestampUnit::SensorNanos => "ns",
        }
    }
}

/// One flattened, sink-ready sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub kind: RecordKind,
    /// Pointer/key phase label or sensor kind label.
    pub event_type: &'static str,
    /// Surface (pointer) or UI action (motion); empty when not applicable.
    pub context: &'static str,
    /// Empty when no user was selected.
    pub user_id: String,
    /// Empty when no session was open.
    pub session_id: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub pressure: Option<f32>,
    pub contact_size: Option<f32>,
    pub key_code: Option<u32>,
    pub timestamp: i64,
    pub timestamp_unit: TimestampUnit,
}

impl From<&Sample> for SampleRecord {
    fn from(sample: &Sample) -> Self {
        let user_id = sample
            .user_id()
            .map(|u| u.as_str().to_string())
            .unwrap_or_default();
        let session_id = sample
            .session_id()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();

        match sample {
            Sample::Pointer(p) => SampleRecord {
                kind: RecordKind::Pointer,
                event_type: p.phase.as_str(),
                context: p.surface.as_str(),
                user_id,
                session_id,
                x: Some(p.x),
                y: Some(p.y),
                z: None,
                pressure: Some(p.pressure),
                contact_size: Some(p.contact_size),
                key_code: None,
                timestamp: p.timestamp.0,
                timestamp_unit: TimestampUnit::UptimeMillis,
            },
            Sample::Key(k) => SampleRecord {
                kind: RecordKind::Key,
                event_type: k.phase.as_str(),
                context: "",
                user_id,
                session_id,
                x: None,
                y: None,
                z: None,
                pressure: None,
                contact_size: None,
                key_code: Some(k.key_code),
                timestamp: k.timestamp.0,
                timestamp_unit: TimestampUnit::UptimeMillis,
            },
            Sample::Motion(m) => SampleRecord {
                kind: RecordKind::Motion,
                event_type: m.sensor.as_str(),
                context: m.action.map(|a| a.as_str()).unwrap_or(""),
                user_id,
                session_id,
                x: Some(m.x),
                y: Some(m.y),
                z: Some(m.z),
                pressure: None,
                contact_size: None,
                key_code: None,
                timestamp: m.timestamp.0,
                timestamp_unit: TimestampUnit::SensorNanos,
            },
        }
    }
}

/// Append-only destination for drained samples.
///
/// Called only from the dispatcher's drain task, one record at a time, in
/// queue order.  A failed append is logged and the record discarded; the
/// dispatcher never retries it.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Appends one record.
    async fn append(&self, record: &SampleRecord) -> Result<(), SinkError>;

    /// Pushes buffered records to durable storage.
    ///
    /// Called when the queue runs dry and once more at shutdown.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
