//! gesture-capture library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`,
//! the benchmarks, and the binary entry point in `main.rs` share the same
//! module tree.

pub mod application;
pub mod infrastructure;
pub mod pipeline;

pub use application::dispatcher::{
    DispatchError, Dispatcher, DispatcherConfig, DispatcherState, DispatcherStats,
};
pub use application::sink::{SampleRecord, Sink, SinkError};
pub use pipeline::{CapturePipeline, PipelineOptions};
