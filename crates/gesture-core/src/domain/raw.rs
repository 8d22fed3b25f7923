//! Raw platform event shapes handed to the taps by the UI/sensor drivers.
//!
//! The host toolkit delivers loosely-populated event objects: a pointer event
//! from a composable surface may lack a pressure reading, a synthetic key
//! event may have no timestamp, and a sensor callback may carry fewer than
//! three values.  These structs keep every numeric field optional so that
//! the taps can decide how to default them, rather than forcing the driver
//! to invent numbers.
//!
//! The numeric code tables follow the platform's published constants so a
//! driver can forward codes without translating them.

use serde::{Deserialize, Serialize};

use super::sample::{KeyPhase, PointerPhase, SensorKind};

/// Pointer action codes.
pub mod action_code {
    pub const DOWN: i32 = 0;
    pub const UP: i32 = 1;
    pub const MOVE: i32 = 2;
    pub const CANCEL: i32 = 3;
    pub const OUTSIDE: i32 = 4;
    /// A secondary finger touched down.
    pub const POINTER_DOWN: i32 = 5;
    /// A secondary finger lifted.
    pub const POINTER_UP: i32 = 6;
    pub const HOVER_MOVE: i32 = 7;
    /// The low byte holds the action; the high bits hold the pointer index.
    pub const MASK: i32 = 0xff;
}

/// Key action codes.
pub mod key_action {
    pub const DOWN: i32 = 0;
    pub const UP: i32 = 1;
    pub const MULTIPLE: i32 = 2;
}

/// Sensor type codes.
pub mod sensor_type {
    pub const ACCELEROMETER: i32 = 1;
    pub const MAGNETIC_FIELD: i32 = 2;
    pub const ORIENTATION: i32 = 3;
    pub const GYROSCOPE: i32 = 4;
    pub const LIGHT: i32 = 5;
    pub const PROXIMITY: i32 = 8;
}

impl PointerPhase {
    /// Classifies a platform pointer action code.
    ///
    /// The pointer index bits are masked off first, so a secondary finger
    /// going down is still a `Down`.
    pub fn from_action_code(code: i32) -> Self {
        match code & action_code::MASK {
            action_code::DOWN | action_code::POINTER_DOWN => PointerPhase::Down,
            action_code::UP | action_code::POINTER_UP => PointerPhase::Up,
            action_code::MOVE => PointerPhase::Move,
            _ => PointerPhase::Unknown,
        }
    }
}

impl KeyPhase {
    pub fn from_action_code(code: i32) -> Self {
        match code {
            key_action::DOWN => KeyPhase::Down,
            key_action::UP => KeyPhase::Up,
            _ => KeyPhase::Unknown,
        }
    }
}

impl SensorKind {
    /// Maps a platform sensor type code to a recorded sensor kind.
    ///
    /// Returns `None` for every sensor the pipeline does not record.
    pub fn from_type_code(code: i32) -> Option<Self> {
        match code {
            sensor_type::ACCELEROMETER => Some(SensorKind::Accelerometer),
            sensor_type::MAGNETIC_FIELD => Some(SensorKind::Magnetometer),
            sensor_type::GYROSCOPE => Some(SensorKind::Gyroscope),
            _ => None,
        }
    }

    /// The platform type code for this sensor kind.
    pub fn type_code(self) -> i32 {
        match self {
            SensorKind::Accelerometer => sensor_type::ACCELEROMETER,
            SensorKind::Magnetometer => sensor_type::MAGNETIC_FIELD,
            SensorKind::Gyroscope => sensor_type::GYROSCOPE,
        }
    }
}

/// A pointer event as delivered by the UI toolkit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPointerEvent {
    /// Platform action code (see [`action_code`]).
    #[serde(default)]
    pub action: Option<i32>,
    #[serde(default)]
    pub pressure: Option<f32>,
    /// Contact size as reported by the digitiser.  Never derived from the
    /// surface dimensions.
    #[serde(default)]
    pub size: Option<f32>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    /// Uptime milliseconds at which the event happened.
    #[serde(default)]
    pub event_time_ms: Option<i64>,
}

impl RawPointerEvent {
    /// A fully-populated event; convenient for drivers and tests.
    pub fn new(action: i32, x: f32, y: f32, pressure: f32, size: f32, event_time_ms: i64) -> Self {
        Self {
            action: Some(action),
            pressure: Some(pressure),
            size: Some(size),
            x: Some(x),
            y: Some(y),
            event_time_ms: Some(event_time_ms),
        }
    }

    /// The classified phase; an event without an action code is `Unknown`.
    pub fn phase(&self) -> PointerPhase {
        self.action
            .map_or(PointerPhase::Unknown, PointerPhase::from_action_code)
    }

    /// Returns `true` when the action code and every numeric field are present.
    pub fn is_complete(&self) -> bool {
        self.action.is_some()
            && self.pressure.is_some()
            && self.size.is_some()
            && self.x.is_some()
            && self.y.is_some()
            && self.event_time_ms.is_some()
    }
}

/// A hardware/soft-keyboard key event as delivered by the UI toolkit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyEvent {
    /// Platform key action code (see [`key_action`]).
    #[serde(default)]
    pub action: Option<i32>,
    /// Physical key code.
    #[serde(default)]
    pub key_code: Option<u32>,
    #[serde(default)]
    pub event_time_ms: Option<i64>,
}

impl RawKeyEvent {
    pub fn phase(&self) -> KeyPhase {
        self.action.map_or(KeyPhase::Unknown, KeyPhase::from_action_code)
    }

    pub fn is_complete(&self) -> bool {
        self.action.is_some() && self.key_code.is_some() && self.event_time_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_action_codes_classify() {
        assert_eq!(PointerPhase::from_action_code(action_code::DOWN), PointerPhase::Down);
        assert_eq!(PointerPhase::from_action_code(action_code::MOVE), PointerPhase::Move);
        assert_eq!(PointerPhase::from_action_code(action_code::UP), PointerPhase::Up);
    }

    #[test]
    fn test_secondary_pointer_with_index_bits_classifies_as_down() {
        // Arrange – pointer index 1 is encoded in the bits above the action byte
        let code = action_code::POINTER_DOWN | (1 << 8);

        // Act / Assert
        assert_eq!(PointerPhase::from_action_code(code), PointerPhase::Down);
    }

    #[test]
    fn test_cancel_and_hover_are_unknown() {
        assert_eq!(PointerPhase::from_action_code(action_code::CANCEL), PointerPhase::Unknown);
        assert_eq!(
            PointerPhase::from_action_code(action_code::HOVER_MOVE),
            PointerPhase::Unknown
        );
    }

    #[test]
    fn test_only_three_sensor_types_are_recorded() {
        assert_eq!(SensorKind::from_type_code(1), Some(SensorKind::Accelerometer));
        assert_eq!(SensorKind::from_type_code(2), Some(SensorKind::Magnetometer));
        assert_eq!(SensorKind::from_type_code(4), Some(SensorKind::Gyroscope));
        assert_eq!(SensorKind::from_type_code(sensor_type::LIGHT), None);
        assert_eq!(SensorKind::from_type_code(sensor_type::PROXIMITY), None);
    }

    #[test]
    fn test_type_code_inverts_from_type_code() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_type_code(kind.type_code()), Some(kind));
        }
    }

    #[test]
    fn test_key_action_multiple_is_unknown() {
        assert_eq!(KeyPhase::from_action_code(key_action::MULTIPLE), KeyPhase::Unknown);
    }

    #[test]
    fn test_partial_pointer_event_deserializes_with_missing_fields() {
        // Arrange
        let json = r#"{"action": 2, "x": 3.5}"#;

        // Act
        let event: RawPointerEvent = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(event.x, Some(3.5));
        assert_eq!(event.pressure, None);
        assert!(!event.is_complete());
    }

    #[test]
    fn test_event_without_action_code_is_unknown_and_incomplete() {
        // Arrange
        let pointer: RawPointerEvent =
            serde_json::from_str(r#"{"x": 1.0, "y": 2.0, "pressure": 0.5}"#).unwrap();
        let key: RawKeyEvent = serde_json::from_str(r#"{"key_code": 8}"#).unwrap();

        // Assert
        assert_eq!(pointer.action, None);
        assert_eq!(pointer.phase(), PointerPhase::Unknown);
        assert!(!pointer.is_complete());
        assert_eq!(key.phase(), KeyPhase::Unknown);
        assert!(!key.is_complete());
    }
}
