//! Environment configuration
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ATLAS_STORE_DIR` | `.atlas/layouts` |
//! | `ATLAS_CANVAS_WIDTH` | `1200` |
//! | `ATLAS_CANVAS_HEIGHT` | `900` |
//! | `ATLAS_STATUS_TTL_SECS` | `3.0` |
//! | `ATLAS_EXPORT_DIR` | `.` |

use crate::error::ConfigError;
use atlas_graph::graph::layout::{CANVAS_HEIGHT, CANVAS_WIDTH};
use atlas_graph::LayoutConfig;
use std::path::PathBuf;

pub const DEFAULT_STORE_DIR: &str = ".atlas/layouts";
pub const DEFAULT_STATUS_TTL_SECS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AtlasConfig {
    /// Directory holding device-local layout blobs
    pub store_dir: PathBuf,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// How long a status message stays visible
    pub status_ttl_secs: f64,
    pub export_dir: PathBuf,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            status_ttl_secs: DEFAULT_STATUS_TTL_SECS,
            export_dir: PathBuf::from("."),
        }
    }
}

impl AtlasConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map)
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            store_dir: lookup("ATLAS_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            canvas_width: positive("ATLAS_CANVAS_WIDTH", lookup("ATLAS_CANVAS_WIDTH"))?
                .map_or(defaults.canvas_width, |v| v as f32),
            canvas_height: positive("ATLAS_CANVAS_HEIGHT", lookup("ATLAS_CANVAS_HEIGHT"))?
                .map_or(defaults.canvas_height, |v| v as f32),
            status_ttl_secs: positive("ATLAS_STATUS_TTL_SECS", lookup("ATLAS_STATUS_TTL_SECS"))?
                .unwrap_or(defaults.status_ttl_secs),
            export_dir: lookup("ATLAS_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        })
    }

    /// Layout parameters for the configured canvas
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig::with_canvas(self.canvas_width, self.canvas_height)
    }
}

fn positive(var: &str, raw: Option<String>) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let invalid = |reason: &str| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.clone(),
        reason: reason.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid("not a number"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("must be a positive number"));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AtlasConfig::from_vars(lookup(&[])).unwrap();
        assert_eq!(config, AtlasConfig::default());
        assert_eq!(config.store_dir, PathBuf::from(".atlas/layouts"));
    }

    #[test]
    fn test_overrides() {
        let config = AtlasConfig::from_vars(lookup(&[
            ("ATLAS_STORE_DIR", "/tmp/layouts"),
            ("ATLAS_CANVAS_WIDTH", "1600"),
            ("ATLAS_CANVAS_HEIGHT", " 1000 "),
            ("ATLAS_STATUS_TTL_SECS", "5.5"),
        ]))
        .unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/layouts"));
        assert_eq!(config.canvas_width, 1600.0);
        assert_eq!(config.canvas_height, 1000.0);
        assert_eq!(config.status_ttl_secs, 5.5);
        assert_eq!(config.layout_config().width, 1600.0);
    }

    #[test]
    fn test_invalid_value_names_the_variable() {
        let err = AtlasConfig::from_vars(lookup(&[("ATLAS_CANVAS_WIDTH", "wide")])).unwrap_err();
        let ConfigError::InvalidValue { var, value, .. } = err;
        assert_eq!(var, "ATLAS_CANVAS_WIDTH");
        assert_eq!(value, "wide");

        assert!(AtlasConfig::from_vars(lookup(&[("ATLAS_STATUS_TTL_SECS", "-1")])).is_err());
    }
}
