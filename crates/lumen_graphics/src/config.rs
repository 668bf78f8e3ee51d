//! # Particle Settings
//!
//! Tunables for the particle update pipeline, loaded once at startup
//! from a TOML table:
//!
//! ```toml
//! max_frames_behind = 1
//! max_step_seconds = 0.033333
//! default_capacity = 32
//! async_updates = true
//! worker_thread_name = "lumen-particles"
//! stretch = 1.0
//! ```

use crate::error::{GraphicsError, GraphicsResult};
use serde::Deserialize;

/// Configuration for particle effects and their update scheduler.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleSettings {
    /// Queued-but-unapplied steps an effect may accumulate before
    /// `update` starts stepping synchronously.
    pub max_frames_behind: u32,
    /// Upper bound on the simulation step length, in seconds.
    pub max_step_seconds: f32,
    /// Ring capacity when an emitter offers no estimate.
    pub default_capacity: usize,
    /// Whether effects built from these settings use the background worker.
    pub async_updates: bool,
    /// OS thread name of the background worker.
    pub worker_thread_name: String,
    /// Default stretch factor for constrained billboards.
    pub stretch: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            max_frames_behind: 1,
            max_step_seconds: 1.0 / 30.0,
            default_capacity: 32,
            async_updates: false,
            worker_thread_name: "lumen-particles".to_owned(),
            stretch: 1.0,
        }
    }
}

impl ParticleSettings {
    /// Production settings: background updates with one frame of lag.
    #[must_use]
    pub fn production() -> Self {
        Self {
            async_updates: true,
            max_frames_behind: 1,
            ..Self::default()
        }
    }

    /// Parses settings from a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Config`] for malformed TOML, unknown keys, or
    /// out-of-range values.
    pub fn from_toml_str(source: &str) -> GraphicsResult<Self> {
        let settings: Self =
            toml::from_str(source).map_err(|e| GraphicsError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Config`] naming the first invalid field.
    pub fn validate(&self) -> GraphicsResult<()> {
        if self.max_step_seconds.is_nan() || self.max_step_seconds <= 0.0 {
            return Err(GraphicsError::Config(
                "max_step_seconds must be positive".to_owned(),
            ));
        }
        if self.default_capacity == 0 {
            return Err(GraphicsError::Config(
                "default_capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ParticleSettings::default();
        assert_eq!(settings.max_frames_behind, 1);
        assert_eq!(settings.default_capacity, 32);
        assert!((settings.max_step_seconds - 1.0 / 30.0).abs() < 1e-6);
        assert!(!settings.async_updates);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = ParticleSettings::from_toml_str("max_frames_behind = 3\n").unwrap();
        assert_eq!(settings.max_frames_behind, 3);
        assert_eq!(settings.default_capacity, 32);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ParticleSettings::from_toml_str("frames = 3\n").unwrap_err();
        assert!(matches!(err, GraphicsError::Config(_)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ParticleSettings::from_toml_str("default_capacity = 0\n").unwrap_err();
        assert_eq!(
            err,
            GraphicsError::Config("default_capacity must be at least 1".to_owned())
        );
    }

    #[test]
    fn test_production_is_async() {
        assert!(ParticleSettings::production().async_updates);
    }
}
