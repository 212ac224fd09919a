use cubeedit_author::DEFAULT_SWATCHES;
use cubeedit_input::GestureConfig;
use cubeedit_render::CameraConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a session can be tuned with. Missing fields take their defaults,
/// so a file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub camera: CameraConfig,
    pub gesture: GestureConfig,
    /// Largest |x| or |z| of a pickable ground cell.
    pub ground_extent: i32,
    /// Control bar colours as `#RRGGBB` text.
    pub swatches: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            gesture: GestureConfig::default(),
            ground_extent: 10,
            swatches: DEFAULT_SWATCHES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject camera tuning under which momentum would never come to rest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if camera.decay.is_nan() || camera.decay <= 0.0 || camera.decay >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.decay must be in (0, 1), got {}",
                camera.decay
            )));
        }
        let rest = camera.rest_threshold;
        for (axis, value) in [
            ("distance", rest.distance),
            ("ascension", rest.ascension),
            ("rotation", rest.rotation),
            ("pan", rest.pan),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "camera.rest_threshold.{axis} must be positive, got {value}"
                )));
            }
        }
        if !camera.sim_rate_ms.is_finite() || camera.sim_rate_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.sim_rate_ms must be positive, got {}",
                camera.sim_rate_ms
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeedit_render::PanRange;
    use glam::Vec3;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = SessionConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_camera_section() {
        let yaml = "camera:\n  pan_range: extended\n  anchor: [1.0, 2.0, 8.0]\nground_extent: 4\n";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.camera.pan_range, PanRange::Extended);
        assert_eq!(config.camera.anchor, Vec3::new(1.0, 2.0, 8.0));
        assert_eq!(config.camera.decay, CameraConfig::default().decay);
        assert_eq!(config.ground_extent, 4);
        assert_eq!(config.gesture, GestureConfig::default());
    }

    #[test]
    fn swatches_override() {
        let yaml = "swatches:\n  - \"#000000\"\n  - \"#FF00FF\"\n";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.swatches, vec!["#000000", "#FF00FF"]);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SessionConfig::from_yaml_str("ground_extent: [nope").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    fn invalid(yaml: &str) -> String {
        match SessionConfig::from_yaml_str(yaml) {
            Err(ConfigError::Invalid(message)) => message,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn decay_must_be_below_one() {
        assert!(invalid("camera:\n  decay: 1.0\n").contains("decay"));
        assert!(invalid("camera:\n  decay: 1.5\n").contains("decay"));
        assert!(invalid("camera:\n  decay: 0.0\n").contains("decay"));
        assert!(SessionConfig::from_yaml_str("camera:\n  decay: 0.5\n").is_ok());
    }

    #[test]
    fn rest_threshold_must_be_positive() {
        let yaml = "camera:\n  rest_threshold: {distance: 0.005, ascension: 0.002, rotation: 0.0, pan: 0.03}\n";
        assert!(invalid(yaml).contains("rest_threshold.rotation"));
    }

    #[test]
    fn sim_rate_must_be_positive() {
        assert!(invalid("camera:\n  sim_rate_ms: 0.0\n").contains("sim_rate_ms"));
        assert!(invalid("camera:\n  sim_rate_ms: -16.0\n").contains("sim_rate_ms"));
    }

    #[test]
    fn invalid_file_is_rejected_on_load() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "camera:\n  decay: 1.0").unwrap();
        let err = SessionConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "gesture:\n  move_threshold: 4.0").unwrap();
        let config = SessionConfig::load(tmp.path()).unwrap();
        assert_eq!(config.gesture.move_threshold, 4.0);
        assert_eq!(config.gesture.lock_ratio, 0.7);
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = SessionConfig::default();
        config.camera.rotation = 45.0;
        config.swatches.push("#010203".into());
        config.save(tmp.path()).unwrap();

        let loaded = SessionConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
