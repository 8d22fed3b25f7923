//! Sink that appends records to a local CSV file.
//!
//! The header row is written only when the file is empty, so restarting the
//! binary against the same path keeps appending to one table.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::application::sink::{SampleRecord, Sink, SinkError};

pub const CSV_HEADER: &str =
    "kind,event_type,context,user_id,session_id,x,y,z,pressure,contact_size,key_code,timestamp,unit";

pub struct CsvFileSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl CsvFileSink {
    /// Opens (or creates) `path` for appending.
    ///
    /// # Errors
    ///
    /// [`SinkError::Io`] when the file or its parent directory cannot be
    /// created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let empty = file.metadata().await?.len() == 0;
        let mut writer = BufWriter::new(file);
        if empty {
            writer.write_all(CSV_HEADER.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            debug!(path = %path.display(), "csv header written");
        }

        info!(path = %path.display(), "csv sink open");
        Ok(Self {
            path,
            writer: Mutex::new(Some(writer)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes and closes the file.  Later appends fail with
    /// [`SinkError::Closed`].
    pub async fn close(&self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer.flush().await?;
            info!(path = %self.path.display(), "csv sink closed");
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for CsvFileSink {
    async fn append(&self, record: &SampleRecord) -> Result<(), SinkError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;
        writer.write_all(&csv_row(record)?).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.lock().await.as_mut() {
            writer.flush().await?;
        }
        Ok(())
    }
}

/// Formats one record as a CSV line, newline included.
///
/// # Errors
///
/// [`SinkError::Rejected`] when the row cannot be encoded.
pub fn csv_row(record: &SampleRecord) -> Result<Vec<u8>, SinkError> {
    let x = column(record.x);
    let y = column(record.y);
    let z = column(record.z);
    let pressure = column(record.pressure);
    let contact_size = column(record.contact_size);
    let key_code = column(record.key_code);
    let timestamp = record.timestamp.to_string();

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(128));
    writer
        .write_record([
            record.kind.as_str(),
            record.event_type,
            record.context,
            record.user_id.as_str(),
            record.session_id.as_str(),
            x.as_str(),
            y.as_str(),
            z.as_str(),
            pressure.as_str(),
            contact_size.as_str(),
            key_code.as_str(),
            timestamp.as_str(),
            record.timestamp_unit.as_str(),
        ])
        .map_err(|e| SinkError::Rejected(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| SinkError::Rejected(e.to_string()))
}

fn column<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
