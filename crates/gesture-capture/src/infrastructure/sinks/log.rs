//! Sink that writes every record as a structured `tracing` event.

use async_trait::async_trait;
use tracing::info;

use crate::application::sink::{SampleRecord, Sink, SinkError};

/// `tracing` target of the per-record events, for filtering with `RUST_LOG`.
pub const SAMPLE_TARGET: &str = "gesture_capture::samples";

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sink for LogSink {
    async fn append(&self, record: &SampleRecord) -> Result<(), SinkError> {
        // Absent columns are `None` and leave no field on the event.
        info!(
            target: SAMPLE_TARGET,
            kind = record.kind.as_str(),
            event_type = record.event_type,
            context = record.context,
            user = %record.user_id,
            session = %record.session_id,
            x = record.x,
            y = record.y,
            z = record.z,
            pressure = record.pressure,
            contact_size = record.contact_size,
            key_code = record.key_code,
            ts = record.timestamp,
            unit = record.timestamp_unit.as_str(),
            "sample"
        );
        Ok(())
    }
}
