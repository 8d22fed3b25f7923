//! Infrastructure layer of the capture pipeline.
//!
//! Concrete adapters behind the application traits: record sinks, the
//! sensor registrar, the TOML configuration file, and the JSON-lines replay
//! driver that stands in for the UI toolkit when running headless.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `gesture_core`, but MUST NOT be imported by the `application` layer.

pub mod replay;
pub mod sensors;
pub mod sinks;
pub mod storage;
