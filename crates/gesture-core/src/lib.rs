//! # gesture-core
//!
//! Shared domain layer for the gesture capture pipeline: the sample model,
//! the raw platform event shapes, and the session context.
//!
//! This crate has no dependency on an async runtime, a UI toolkit, or a
//! sensor API.  The capture crate builds the taps, the dispatcher, and the
//! sinks on top of it.
//!
//! # Architecture overview
//!
//! The pipeline records touch dynamics, raw key codes, and motion-sensor
//! streams while a user walks through a simulated banking transfer flow.
//! Each observation becomes a *sample* stamped with the user and session it
//! belongs to, so the samples can later be grouped per session for
//! continuous-authentication research.
//!
//! - **`domain::sample`** – [`PointerSample`], [`KeySample`], [`MotionSample`]
//!   and the [`Sample`] envelope the dispatcher carries.
//! - **`domain::raw`** – [`RawPointerEvent`], [`RawKeyEvent`] and the platform
//!   action/sensor code tables.
//! - **`domain::session`** – [`SessionContext`], the injectable holder of the
//!   current user/session pair.

pub mod domain;

pub use domain::raw::{RawKeyEvent, RawPointerEvent};
pub use domain::sample::{
    CaptureAction, KeyPhase, KeySample, MotionSample, ParseEnumError, PointerPhase, PointerSample,
    Sample, SensorKind, SensorNanos, SessionId, SurfaceKind, UptimeMillis, UserId,
};
pub use domain::session::{SessionContext, SessionSnapshot};
