//! Pipeline configuration

use serde::{Deserialize, Serialize};

use crate::device::ClearColor;
use crate::render_target::{ColorFormat, DepthFormat};
use crate::water::WaterSettings;
use crate::{Error, Result};

/// Default scale of the sky cube
pub const DEFAULT_SKYBOX_SIZE: f32 = 2000.0;

/// Optional stages and inputs of the water pipeline.
///
/// The reflection-only variant is `refraction: false, distortion_map: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineFeatures {
    /// Capture the scene below the surface and blend it in
    pub refraction: bool,
    /// Sample a separate distortion map; otherwise the normal map doubles as one
    pub distortion_map: bool,
    /// View-angle dependent blend instead of a fixed mix factor
    pub fresnel: bool,
}

impl PipelineFeatures {
    pub const REFLECTION_ONLY: Self = Self { refraction: false, distortion_map: false, fresnel: false };
}

impl Default for PipelineFeatures {
    fn default() -> Self {
        Self { refraction: true, distortion_map: true, fresnel: true }
    }
}

/// Formats of the capture targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetFormats {
    pub color: ColorFormat,
    pub depth: DepthFormat,
    pub mipmapped: bool,
}

impl Default for TargetFormats {
    fn default() -> Self {
        Self {
            color: ColorFormat::Rgba8,
            depth: DepthFormat::Depth24Stencil8,
            mipmapped: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterPipelineConfig {
    pub features: PipelineFeatures,
    /// Sky/background color the captures and the onscreen pass clear to
    pub clear_color: [f32; 4],
    pub targets: TargetFormats,
    pub water: WaterSettings,
    pub skybox_size: f32,
}

impl Default for WaterPipelineConfig {
    fn default() -> Self {
        Self {
            features: PipelineFeatures::default(),
            clear_color: ClearColor::CORNFLOWER_BLUE.to_array(),
            targets: TargetFormats::default(),
            water: WaterSettings::default(),
            skybox_size: DEFAULT_SKYBOX_SIZE,
        }
    }
}

impl WaterPipelineConfig {
    pub fn reflection_only() -> Self {
        Self {
            features: PipelineFeatures::REFLECTION_ONLY,
            ..Self::default()
        }
    }

    /// Parse a RON document; missing fields take their defaults
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn clear_color(&self) -> ClearColor {
        ClearColor::from_array(self.clear_color)
    }
}
