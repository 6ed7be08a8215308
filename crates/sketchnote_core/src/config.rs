//! Core configuration surface.
//!
//! # Responsibility
//! - Hold the tunables the host passes in at startup (density, brush
//!   defaults, log level).
//! - Name the brush and color presets offered by the drawing panel.
//!
//! # Invariants
//! - Every field has a default so partial JSON documents deserialize.
//! - `display_density` and `default_brush_size` are validated before use.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use crate::raster::Rgba;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Startup configuration for the drawing engine and pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Device pixels per logical unit.
    pub display_density: f32,
    /// Logical brush size applied to a fresh canvas.
    pub default_brush_size: f32,
    /// Paint color applied to a fresh canvas.
    pub default_color: Rgba,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            display_density: 1.0,
            default_brush_size: BrushSize::Medium.logical_size(),
            default_color: Rgba::BLACK,
            log_level: default_log_level().to_string(),
        }
    }
}

/// Configuration validation/parse failure.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue { field: &'static str, value: f32 },
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidValue { field, value } => {
                write!(f, "config field `{field}` must be finite and > 0, got {value}")
            }
            Self::InvalidLogLevel(err) => write!(f, "config field `log_level`: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("display_density", self.display_density),
            ("default_brush_size", self.default_brush_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(())
    }
}

/// Brush size presets, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushSize {
    Small,
    Medium,
    Large,
}

impl BrushSize {
    pub fn logical_size(self) -> f32 {
        match self {
            Self::Small => 5.0,
            Self::Medium => 10.0,
            Self::Large => 20.0,
        }
    }
}

/// Paint color presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPreset {
    Black,
    Red,
    Blue,
    Green,
    Yellow,
}

impl ColorPreset {
    pub fn color(self) -> Rgba {
        match self {
            Self::Black => Rgba::BLACK,
            Self::Red => Rgba::RED,
            Self::Blue => Rgba::BLUE,
            Self::Green => Rgba::GREEN,
            Self::Yellow => Rgba::YELLOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BrushSize, ColorPreset, ConfigError, CoreConfig};
    use crate::raster::Rgba;

    #[test]
    fn partial_document_falls_back_to_defaults() {
        let config = CoreConfig::from_json_str(r#"{"display_density": 2.5}"#).unwrap();
        assert_eq!(config.display_density, 2.5);
        assert_eq!(config.default_brush_size, 10.0);
        assert_eq!(config.default_color, Rgba::BLACK);
    }

    #[test]
    fn non_positive_density_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"display_density": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "display_density",
                ..
            }
        ));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"log_level": "chatty"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn presets_map_to_expected_values() {
        assert_eq!(BrushSize::Small.logical_size(), 5.0);
        assert_eq!(BrushSize::Large.logical_size(), 20.0);
        assert_eq!(ColorPreset::Yellow.color(), Rgba::YELLOW);
    }
}
