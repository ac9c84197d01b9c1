use std::path::{Path, PathBuf};

use glam::Vec3;
use rigspace_common::{Pose, Sensitivity, Transform};
use rigspace_input::{InputConfig, KeyMap};
use rigspace_locomotion::{BallConfig, TimeScaling};
use rigspace_physics::{ChainConfig, Proportional};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing scene config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid scene config: {0}")]
    Invalid(String),
}

/// Static floor slab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub half_extents: Vec3,
    /// World height of the slab's top face.
    pub top: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            half_extents: Vec3::new(50.0, 0.05, 50.0),
            top: 0.0,
        }
    }
}

/// Everything a [`crate::Simulation`] is built from. Every field has a
/// default, so an empty document is a valid scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub gravity: Vec3,
    /// Fixed step used when the caller does not supply a frame delta.
    pub timestep: f32,
    /// Where the player rig starts.
    pub spawn: Vec3,
    pub sensitivity: Sensitivity,
    pub scaling: TimeScaling,
    pub input: InputConfig,
    pub keymap: KeyMap,
    pub pivot: Proportional,
    /// Initial pivot target in the rope frame.
    pub pivot_target: Option<Pose>,
    pub rope: Option<ChainConfig>,
    pub ball: Option<BallConfig>,
    pub ground: Option<GroundConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -60.0, 0.0),
            timestep: 1.0 / 60.0,
            spawn: Vec3::new(7.0, 4.0, 21.0),
            sensitivity: Sensitivity::default(),
            scaling: TimeScaling::default(),
            input: InputConfig::default(),
            keymap: KeyMap::default(),
            pivot: Proportional::default(),
            pivot_target: Some(Pose::IDENTITY),
            rope: Some(ChainConfig {
                frame: Transform::from_position(Vec3::new(-4.0, 4.0, 0.0)),
                ..ChainConfig::default()
            }),
            ball: Some(BallConfig::default()),
            ground: Some(GroundConfig::default()),
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(src: &str) -> Result<Self, ConfigError> {
        // An empty document parses as null; treat it as all defaults.
        if src.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&src)?;
        tracing::info!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if !self.gravity.is_finite() || !self.spawn.is_finite() {
            return Err(ConfigError::Invalid("gravity and spawn must be finite".into()));
        }
        if !(0.0..1.0).contains(&self.input.deadzone) {
            return Err(ConfigError::Invalid(format!(
                "deadzone must be in [0, 1), got {}",
                self.input.deadzone
            )));
        }
        Ok(())
    }
}
