//! Render configuration stored as RON
//!
//! Every field has a default, so a config file only needs to name what it
//! changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{length, normalize, subtract, Color, MathError, Matrix, Scene, Vec3};

/// Largest surface side; the viewer uploads frames as GPU textures with
/// 16-bit dimensions
pub const MAX_SURFACE_SIZE: usize = u16::MAX as usize;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Math(#[from] MathError),
}

/// How the mesh is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Triangle edges only
    Wireframe,
    /// Solid color, one intensity per face
    #[default]
    Flat,
    /// Texture sampled with the mesh uvs, one intensity per face
    Textured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [1.0, 1.0, 3.0],
            center: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub background: Color,
    pub camera: CameraConfig,
    /// Direction light travels in; normalized by [`RenderConfig::scene`]
    pub light_dir: Vec3,
    /// Depth range the viewport maps z onto
    pub depth: f32,
    pub mode: RenderMode,
    /// Fill color for [`RenderMode::Flat`]
    pub color: Color,
    /// Edge color for [`RenderMode::Wireframe`]
    pub wire_color: Color,
    /// RON mesh file; the built-in cube when unset
    pub mesh: Option<PathBuf>,
    /// TGA texture for [`RenderMode::Textured`]; a checkerboard when unset
    pub texture: Option<PathBuf>,
    /// PNG written after the first frame
    pub output: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            background: Color::BLACK,
            camera: CameraConfig::default(),
            light_dir: [0.0, 0.0, -1.0],
            depth: 255.0,
            mode: RenderMode::default(),
            color: Color::WHITE,
            wire_color: Color::WHITE,
            mesh: None,
            texture: None,
            output: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let side_ok = |n: usize| (1..=MAX_SURFACE_SIZE).contains(&n);
        if !(side_ok(self.width) && side_ok(self.height)) {
            return Err(ConfigError::Invalid(format!(
                "surface size {}x{}, each side must be 1..={}",
                self.width, self.height, MAX_SURFACE_SIZE
            )));
        }
        if !(self.depth.is_finite() && self.depth > 0.0) {
            return Err(ConfigError::Invalid(format!("depth {}", self.depth)));
        }
        if length(subtract(self.camera.eye, self.camera.center)) == 0.0 {
            return Err(ConfigError::Invalid("camera eye and center coincide".to_string()));
        }
        if length(self.light_dir) == 0.0 {
            return Err(ConfigError::Invalid("zero light direction".to_string()));
        }
        Ok(())
    }

    /// World-to-screen transform (`viewport * projection * look_at`) and
    /// the normalized light. Screen y grows downward.
    pub fn scene(&self) -> Result<Scene, ConfigError> {
        self.validate()?;

        let (w, h) = (self.width as f32, self.height as f32);
        let camera = &self.camera;
        let distance = length(subtract(camera.eye, camera.center));

        let viewport = Matrix::viewport(0.0, h, w, -h, self.depth);
        let projection = Matrix::projection(distance);
        let model_view = Matrix::look_at(camera.eye, camera.center, camera.up);
        let transform = viewport.mul(&projection)?.mul(&model_view)?;

        Ok(Scene {
            transform,
            light_dir: normalize(self.light_dir),
        })
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Load a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    let config: RenderConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
