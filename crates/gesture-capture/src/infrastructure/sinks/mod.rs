//! [`Sink`](crate::application::sink::Sink) implementations.
//!
//! - **`log`** – diagnostic `tracing` line per record.
//! - **`csv`** – appends to a local CSV file.
//! - **`recording`** – keeps records in memory; used by tests.

pub mod csv;
pub mod log;
pub mod recording;

pub use self::csv::CsvFileSink;
pub use self::log::LogSink;
pub use self::recording::RecordingSink;
