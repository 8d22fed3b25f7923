//! Application layer of the capture pipeline.
//!
//! Everything here depends on `gesture_core` and on traits (`Sink`,
//! `SensorRegistrar`, `SensorControl`, `SampleQueue`); nothing touches a file,
//! a socket, or a platform sensor API directly.
//!
//! # Sub-modules
//!
//! - **`pointer_tap`** / **`key_tap`** / **`sensor_tap`** – the producers.
//!   Synchronous `on_*` callbacks that build a stamped sample and enqueue it.
//!   They run on UI and sensor threads and never block.
//! - **`tap`** – the collaborators every tap shares (session, queue, strict
//!   session flag) and the per-tap counters.
//! - **`dispatcher`** – the bounded drop-oldest buffer and its single drain
//!   task.
//! - **`sink`** – the record shape and the `Sink` trait the drain task writes
//!   to.
//! - **`navigation`** – which screens turn motion capture on.

pub mod dispatcher;
pub mod key_tap;
pub mod navigation;
pub mod pointer_tap;
pub mod sensor_tap;
pub mod sink;
pub mod tap;
