//! Sensor registrar adapters.
//!
//! On a device the registrar would hand a listener to the OS sensor service.
//! The binary runs headless: readings come from a replay script, so the
//! registrar only tracks which kinds are registered and logs transitions.

use gesture_core::SensorKind;
use parking_lot::Mutex;
use tracing::info;

use crate::application::sensor_tap::{CaptureError, SensorRegistrar};

/// Registrar for environments without a platform sensor service.
#[derive(Debug, Default)]
pub struct HeadlessSensorRegistrar {
    registered: Mutex<Vec<SensorKind>>,
    /// Kinds this "device" lacks; registering them fails.
    unavailable: Vec<SensorKind>,
}

impl HeadlessSensorRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registrar whose device has no sensor of the given kinds.
    pub fn without(unavailable: impl IntoIterator<Item = SensorKind>) -> Self {
        Self {
            registered: Mutex::new(Vec::new()),
            unavailable: unavailable.into_iter().collect(),
        }
    }

    pub fn registered(&self) -> Vec<SensorKind> {
        self.registered.lock().clone()
    }
}

impl SensorRegistrar for HeadlessSensorRegistrar {
    fn register(&self, kinds: &[SensorKind]) -> Result<(), CaptureError> {
        if let Some(missing) = kinds.iter().find(|k| self.unavailable.contains(k)) {
            return Err(CaptureError::SensorUnavailable(*missing));
        }
        let mut registered = self.registered.lock();
        for kind in kinds {
            if !registered.contains(kind) {
                registered.push(*kind);
            }
        }
        info!(kinds = ?kinds, "sensor listeners registered");
        Ok(())
    }

    fn unregister(&self) {
        let mut registered = self.registered.lock();
        if !registered.is_empty() {
            registered.clear();
            info!("sensor listeners unregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_unregister() {
        // Arrange
        let registrar = HeadlessSensorRegistrar::new();

        // Act
        registrar.register(&SensorKind::ALL).unwrap();
        let during = registrar.registered();
        registrar.unregister();

        // Assert
        assert_eq!(during.len(), 3);
        assert!(registrar.registered().is_empty());
    }

    #[test]
    fn test_missing_sensor_fails_registration() {
        let registrar = HeadlessSensorRegistrar::without([SensorKind::Magnetometer]);

        let result = registrar.register(&SensorKind::ALL);

        assert_eq!(result, Err(CaptureError::SensorUnavailable(SensorKind::Magnetometer)));
        assert!(registrar.registered().is_empty());
    }
}
