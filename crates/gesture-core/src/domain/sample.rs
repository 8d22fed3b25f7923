//! Sample value types produced by the capture taps.
//!
//! A *sample* is one normalized, timestamped, identity-tagged observation.
//! Three families exist:
//!
//! - [`PointerSample`] – one touch/pointer event on an observed surface.
//! - [`KeySample`] – one raw physical key code typed into a text-entry field.
//! - [`MotionSample`] – one accelerometer, gyroscope, or magnetometer reading.
//!
//! Every sample carries a copy of the user/session pair that was current when
//! the sample was built.  Samples never hold a reference back to the
//! [`SessionContext`](crate::domain::session::SessionContext), so a login or
//! logout that happens while a sample is still queued cannot rewrite it.
//!
//! # Two clock domains
//!
//! Pointer and key timestamps come from the device uptime clock in
//! milliseconds; motion timestamps come from the sensor clock in nanoseconds.
//! They are kept as distinct newtypes ([`UptimeMillis`], [`SensorNanos`]) so
//! the compiler rejects any attempt to compare or subtract one from the other.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ── Identity ──────────────────────────────────────────────────────────────────

/// Identity reference of the user a sample belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque token identifying one authenticated interaction period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random session token (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── Clocks ────────────────────────────────────────────────────────────────────

/// Device uptime in milliseconds (pointer and key events).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UptimeMillis(pub i64);

/// Sensor clock in nanoseconds (motion readings).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorNanos(pub i64);

// ── Enumerations ──────────────────────────────────────────────────────────────

/// Error returned when parsing one of the sample enumerations from text.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Phase of a pointer interaction.
///
/// `Unknown` is the sentinel for platform action codes that do not map to a
/// press, move, or release (e.g. cancel, hover).  Such events still produce a
/// sample so no delivered event is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Unknown,
}

impl PointerPhase {
    /// Log/record label.  `Unknown` renders as an empty string.
    pub fn as_str(self) -> &'static str {
        match self {
            PointerPhase::Down => "DOWN",
            PointerPhase::Move => "MOVE",
            PointerPhase::Up => "UP",
            PointerPhase::Unknown => "",
        }
    }
}

/// Phase of a physical key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    Down,
    Up,
    Unknown,
}

impl KeyPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyPhase::Down => "KEY_DOWN",
            KeyPhase::Up => "KEY_UP",
            KeyPhase::Unknown => "",
        }
    }
}

/// The motion sensors the pipeline records.  Every other sensor is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
}

impl SensorKind {
    /// All recorded sensor kinds, in registration order.
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Magnetometer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "ACCELEROMETER",
            SensorKind::Gyroscope => "GYROSCOPE",
            SensorKind::Magnetometer => "MAGNETIC",
        }
    }
}

impl std::str::FromStr for SensorKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accelerometer" => Ok(SensorKind::Accelerometer),
            "gyroscope" => Ok(SensorKind::Gyroscope),
            "magnetometer" | "magnetic" | "magnetic_field" => Ok(SensorKind::Magnetometer),
            _ => Err(ParseEnumError {
                kind: "sensor kind",
                value: s.to_string(),
            }),
        }
    }
}

/// The UI action a burst of motion readings belongs to.
///
/// Set by the navigation flow whenever a keyboard-entry screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureAction {
    /// Password entry on the login screen.
    KeyboardLogin,
    /// Amount entry on the PIX money screen.
    KeyboardMoney,
    /// Recipient CPF entry on the PIX receiver screen.
    KeyboardCpf,
    /// Password confirmation before a transfer is authorised.
    KeyboardAuth,
}

impl CaptureAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureAction::KeyboardLogin => "KEYBOARD_LOGIN",
            CaptureAction::KeyboardMoney => "KEYBOARD_MONEY",
            CaptureAction::KeyboardCpf => "KEYBOARD_CPF",
            CaptureAction::KeyboardAuth => "KEYBOARD_AUTH",
        }
    }
}

impl std::str::FromStr for CaptureAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keyboard_login" => Ok(CaptureAction::KeyboardLogin),
            "keyboard_money" => Ok(CaptureAction::KeyboardMoney),
            "keyboard_cpf" => Ok(CaptureAction::KeyboardCpf),
            "keyboard_auth" => Ok(CaptureAction::KeyboardAuth),
            _ => Err(ParseEnumError {
                kind: "capture action",
                value: s.to_string(),
            }),
        }
    }
}

/// The UI region a pointer tap is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// The horizontally swiped list of bank services.
    Swipe,
    /// A text-entry field (PIX key, amount, password).
    TextEntry,
}

impl SurfaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceKind::Swipe => "SWIPE",
            SurfaceKind::TextEntry => "TEXT_ENTRY",
        }
    }
}

// ── Samples ───────────────────────────────────────────────────────────────────

/// One pointer/touch observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub phase: PointerPhase,
    /// Nominally 0.0–1.0 but left unclamped; some digitisers report above 1.0.
    pub pressure: f32,
    /// Contact area/radius in device units, exactly as the platform reported it.
    pub contact_size: f32,
    /// Surface-local X.
    pub x: f32,
    /// Surface-local Y.
    pub y: f32,
    pub timestamp: UptimeMillis,
    pub surface: SurfaceKind,
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
}

/// One raw physical key observation (key code, never the decoded character).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySample {
    pub phase: KeyPhase,
    pub key_code: u32,
    pub timestamp: UptimeMillis,
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
}

/// One motion-sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub sensor: SensorKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub timestamp: SensorNanos,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CaptureAction>,
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
}

/// Any sample the dispatcher can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sample {
    Pointer(PointerSample),
    Key(KeySample),
    Motion(MotionSample),
}

impl Sample {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Sample::Pointer(s) => s.user_id.as_ref(),
            Sample::Key(s) => s.user_id.as_ref(),
            Sample::Motion(s) => s.user_id.as_ref(),
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Sample::Pointer(s) => s.session_id.as_ref(),
            Sample::Key(s) => s.session_id.as_ref(),
            Sample::Motion(s) => s.session_id.as_ref(),
        }
    }
}

impl From<PointerSample> for Sample {
    fn from(s: PointerSample) -> Self {
        Sample::Pointer(s)
    }
}

impl From<KeySample> for Sample {
    fn from(s: KeySample) -> Self {
        Sample::Key(s)
    }
}

impl From<MotionSample> for Sample {
    fn from(s: MotionSample) -> Self {
        Sample::Motion(s)
    }
}
