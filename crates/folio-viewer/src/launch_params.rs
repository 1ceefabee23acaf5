//! Launch parameter parsing for the viewer.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used (CLI argument parsing is not available).

use std::{fmt, path::PathBuf};

use bevy::prelude::*;
use folio_sim::{ConfigError, DriveConfig};

/// Launch parameters for the viewer.
#[derive(Resource, Debug)]
pub struct LaunchParams {
    /// JSON tuning file overriding the built-in constants.
    pub tuning: Option<PathBuf>,
    /// Force the touch layout regardless of viewport detection.
    pub force_touch: bool,
    /// Disable camera shake and roll.
    pub reduced_effects: bool,
    /// Seed for camera shake and scenery placement.
    pub seed: u64,
    /// Skip the loading screen and instructions.
    pub skip_intro: bool,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            tuning: None,
            force_touch: false,
            reduced_effects: false,
            seed: clock_seed(),
            skip_intro: false,
        }
    }
}

impl LaunchParams {
    /// Build the drive configuration, falling back to defaults when the
    /// tuning file is unusable.
    pub fn drive_config(&self) -> DriveConfig {
        let config = match &self.tuning {
            Some(path) => match load_tuning(path) {
                Ok(config) => {
                    tracing::info!("Loaded tuning from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to load tuning from {}: {e}", path.display());
                    DriveConfig::default()
                }
            },
            None => DriveConfig::default(),
        };

        if self.reduced_effects {
            config.with_reduced_effects()
        } else {
            config
        }
    }
}

/// Seed derived from the wall clock.
fn clock_seed() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() ^ u64::from(elapsed.subsec_nanos()))
        .unwrap_or_default()
}

// ============================================================================
// Tuning files
// ============================================================================

/// Why a tuning file was rejected.
#[derive(Debug)]
pub enum TuningLoadError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(ConfigError),
}

impl fmt::Display for TuningLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Invalid(e) => write!(f, "invalid tuning: {e}"),
        }
    }
}

impl std::error::Error for TuningLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for TuningLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for TuningLoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<ConfigError> for TuningLoadError {
    fn from(e: ConfigError) -> Self {
        Self::Invalid(e)
    }
}

/// Parse and validate a tuning document.
pub fn parse_tuning(json: &str) -> Result<DriveConfig, TuningLoadError> {
    let config: DriveConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a tuning file.
pub fn load_tuning(path: &std::path::Path) -> Result<DriveConfig, TuningLoadError> {
    let json = std::fs::read_to_string(path)?;
    parse_tuning(&json)
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    #[command(about = "Driveable 3D portfolio")]
    struct CliArgs {
        /// JSON file overriding vehicle, camera, input and zone tuning.
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Use the touch layout even on a desktop-sized window.
        #[arg(long)]
        touch: bool,

        /// Disable camera shake and roll.
        #[arg(long)]
        reduced_effects: bool,

        /// Seed for camera shake and scenery placement.
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the loading screen and instructions.
        #[arg(long)]
        skip_intro: bool,
    }

    pub fn parse() -> LaunchParams {
        let args = CliArgs::parse();
        LaunchParams {
            tuning: args.tuning,
            force_touch: args.touch,
            reduced_effects: args.reduced_effects,
            seed: args.seed.unwrap_or_else(clock_seed),
            skip_intro: args.skip_intro,
        }
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        LaunchParams::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tuning_accepts_partial_documents() {
        let config = parse_tuning(r#"{ "camera": { "distance": 20.0 } }"#).unwrap();
        assert!((config.camera.distance - 20.0).abs() < f32::EPSILON);
        assert_eq!(config.vehicle, DriveConfig::default().vehicle);
    }

    #[test]
    fn test_parse_tuning_rejects_bad_json() {
        assert!(matches!(
            parse_tuning("{ not json"),
            Err(TuningLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_tuning_rejects_invalid_values() {
        assert!(matches!(
            parse_tuning(r#"{ "zones": [] }"#),
            Err(TuningLoadError::Invalid(ConfigError::NoZones))
        ));
    }

    #[test]
    fn test_missing_tuning_file_falls_back_to_defaults() {
        let params = LaunchParams {
            tuning: Some(PathBuf::from("/nonexistent/folio-tuning.json")),
            ..Default::default()
        };
        assert!(matches!(
            load_tuning(params.tuning.as_deref().unwrap()),
            Err(TuningLoadError::Io(_))
        ));
        assert_eq!(params.drive_config(), DriveConfig::default());
    }

    #[test]
    fn test_reduced_effects_flag() {
        let params = LaunchParams {
            reduced_effects: true,
            ..Default::default()
        };
        assert!(!params.drive_config().effects.shake);
    }
}
