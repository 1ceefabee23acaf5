//! Aggregate tuning for a drive session.

use serde::{Deserialize, Serialize};

use crate::{
    camera::{CameraEffects, CameraTuning},
    error,
    input::InputTuning,
    orbit::OrbitTuning,
    vehicle::VehicleTuning,
    zones::ZoneLayout,
};

/// Every tunable of a [`crate::DriveSession`].
///
/// Missing fields deserialize to their defaults, so a tuning file only needs
/// to mention what it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub vehicle: VehicleTuning,
    pub camera: CameraTuning,
    pub effects: CameraEffects,
    pub orbit: OrbitTuning,
    pub input: InputTuning,
    pub zones: ZoneLayout,
}

impl DriveConfig {
    /// Check every section.
    pub fn validate(&self) -> error::Result<()> {
        self.vehicle.validate()?;
        self.camera.validate()?;
        self.orbit.validate()?;
        self.input.validate()?;
        self.zones.validate()
    }

    /// Switch to the reduced camera effects.
    #[must_use]
    pub fn with_reduced_effects(mut self) -> Self {
        self.effects = CameraEffects::reduced();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(DriveConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DriveConfig =
            serde_json::from_str(r#"{ "vehicle": { "base_speed": 9.0 }, "effects": { "shake": false } }"#)
                .unwrap();
        assert!((config.vehicle.base_speed - 9.0).abs() < f32::EPSILON);
        assert!((config.vehicle.friction - 0.95).abs() < f32::EPSILON);
        assert!(!config.effects.shake);
        assert!(config.effects.roll);
        assert_eq!(config.zones, ZoneLayout::default());
    }

    #[test]
    fn test_zone_layout_from_json() {
        let config: DriveConfig = serde_json::from_str(
            r#"{ "zones": [ { "id": "contact", "position": [1.0, 0.0, 2.0], "radius": 3.0 } ] }"#,
        )
        .unwrap();
        assert_eq!(config.zones.zones.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_friction_is_rejected() {
        let mut config = DriveConfig::default();
        config.vehicle.friction = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "vehicle.friction",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_deadzone_is_rejected() {
        let mut config = DriveConfig::default();
        config.input.joystick_deadzone = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reduced_effects() {
        let config = DriveConfig::default().with_reduced_effects();
        assert_eq!(config.effects, CameraEffects::reduced());
    }
}
