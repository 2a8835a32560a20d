//! Application configuration: `[ecs]` and `[scene]` tables.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use glint_core::EcsConfig;
use serde::Deserialize;

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// ECS capacity settings.
    pub ecs: EcsConfig,
    /// Scene population settings.
    pub scene: SceneConfig,
}

/// What the runner spawns and for how long it runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Meshes are laid out on a `grid_size` x `grid_size` grid.
    pub grid_size: u32,
    /// Distance between neighbouring grid cells.
    pub spacing: f32,
    /// Frames to run before teardown.
    pub frames: u32,
    /// Simulated seconds per frame.
    pub frame_time: f32,
    /// Camera vertical field of view in degrees.
    pub fov: f32,
    /// Viewport aspect ratio.
    pub aspect: f32,
    /// OBJ file to instance; a built-in triangle when absent.
    pub mesh: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            grid_size: 8,
            spacing: 2.5,
            frames: 120,
            frame_time: 1.0 / 60.0,
            fov: 45.0,
            aspect: 16.0 / 9.0,
            mesh: None,
        }
    }
}

impl AppConfig {
    /// Parses and validates a config document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid config syntax")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in config {}", path.display()))
    }

    /// Checks value ranges across both tables.
    pub fn validate(&self) -> Result<()> {
        self.ecs.validate()?;
        let scene = &self.scene;
        ensure!(scene.fov > 0.0 && scene.fov < 180.0, "scene.fov must be in (0, 180)");
        ensure!(scene.aspect > 0.0, "scene.aspect must be positive");
        ensure!(scene.frame_time >= 0.0, "scene.frame_time must not be negative");

        // Camera plus one entity per grid cell
        let needed = u64::from(scene.grid_size).pow(2) + 1;
        ensure!(
            needed <= self.ecs.max_entities as u64,
            "scene needs {needed} entities but ecs.max_entities is {}",
            self.ecs.max_entities
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = AppConfig::from_toml_str(include_str!("../../../glint.toml")).unwrap();
        assert_eq!(config.ecs.max_entities, 10_000);
        assert_eq!(config.scene.grid_size, 8);
    }

    #[test]
    fn test_partial_tables() {
        let config = AppConfig::from_toml_str("[scene]\nframes = 3\n").unwrap();
        assert_eq!(config.scene.frames, 3);
        assert_eq!(config.scene.grid_size, SceneConfig::default().grid_size);
        assert_eq!(config.ecs, EcsConfig::default());
    }

    #[test]
    fn test_grid_must_fit() {
        let err = AppConfig::from_toml_str("[ecs]\nmax_entities = 10\n[scene]\ngrid_size = 3\n")
            .unwrap_err();
        assert!(err.to_string().contains("entities"));
    }

    #[test]
    fn test_rejects_bad_fov() {
        assert!(AppConfig::from_toml_str("[scene]\nfov = 0.0\n").is_err());
    }
}
