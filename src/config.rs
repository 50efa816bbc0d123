//! Tunable parameters for the light-bar pipeline.
//!
//! Defaults were chosen for one camera and resolution; scenes with other
//! lighting or distances usually need different thresholds, which is why
//! everything here can be loaded from JSON:
//!
//! ```no_run
//! use lightbars::LightBarConfig;
//! use std::path::Path;
//!
//! let config = LightBarConfig::from_json_file(Path::new("lightbars.json"))?;
//! # Ok::<(), lightbars::DetectionError>(())
//! ```
//!
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DetectionError, Result};
use crate::models::{ColorRange, Hsv};

/// Outline thicknesses above this are rejected.
pub const MAX_ANNOTATION_THICKNESS: u32 = 64;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightBarConfig {
    /// Low-hue red band
    pub red_range1: ColorRange,

    /// High-hue red band (red wraps around hue 180)
    pub red_range2: ColorRange,

    pub blue_range: ColorRange,

    /// Side length of the square structuring element used by the refiner
    pub structuring_element_size: u32,

    pub thresholds: ClassificationThresholds,

    pub annotation: AnnotationStyle,
}

impl Default for LightBarConfig {
    fn default() -> Self {
        Self {
            red_range1: ColorRange::new(Hsv::new(0, 100, 100), Hsv::new(10, 255, 255)),
            red_range2: ColorRange::new(Hsv::new(160, 100, 100), Hsv::new(180, 255, 255)),
            blue_range: ColorRange::new(Hsv::new(100, 100, 100), Hsv::new(130, 255, 255)),
            structuring_element_size: 3,
            thresholds: ClassificationThresholds::default(),
            annotation: AnnotationStyle::default(),
        }
    }
}

impl LightBarConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DetectionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: LightBarConfig =
            serde_json::from_str(&text).map_err(|source| DetectionError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// All colour ranges the mask builder unions together.
    pub fn color_ranges(&self) -> [ColorRange; 3] {
        [self.red_range1, self.red_range2, self.blue_range]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("red_range1", &self.red_range1),
            ("red_range2", &self.red_range2),
            ("blue_range", &self.blue_range),
        ] {
            if !range.is_ordered() {
                return Err(DetectionError::InvalidConfig(format!(
                    "{name} lower bound exceeds upper bound"
                )));
            }
        }

        if self.structuring_element_size == 0 || self.structuring_element_size % 2 == 0 {
            return Err(DetectionError::InvalidConfig(format!(
                "structuring_element_size must be a positive odd number, got {}",
                self.structuring_element_size
            )));
        }
        if self.structuring_element_size > 511 {
            return Err(DetectionError::InvalidConfig(format!(
                "structuring_element_size {} is too large",
                self.structuring_element_size
            )));
        }

        self.thresholds.validate()?;

        self.annotation.validate()
    }
}

/// Geometric acceptance policy for light-bar candidates. All bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    pub area_min: f64,
    pub area_max: f64,
    pub aspect_ratio_min: f64,
    pub aspect_ratio_max: f64,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            area_min: 50.0,
            area_max: 5000.0,
            aspect_ratio_min: 1.5,
            aspect_ratio_max: 8.0,
            min_width: 3,
            min_height: 10,
        }
    }
}

impl ClassificationThresholds {
    pub fn validate(&self) -> Result<()> {
        if !(self.area_min < self.area_max) {
            return Err(DetectionError::InvalidConfig(format!(
                "area_min ({}) must be below area_max ({})",
                self.area_min, self.area_max
            )));
        }
        if !(self.aspect_ratio_min < self.aspect_ratio_max) {
            return Err(DetectionError::InvalidConfig(format!(
                "aspect_ratio_min ({}) must be below aspect_ratio_max ({})",
                self.aspect_ratio_min, self.aspect_ratio_max
            )));
        }
        Ok(())
    }
}

/// How accepted candidates are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// RGB highlight colour for boxes and labels
    pub color: [u8; 3],
    /// Box line thickness in pixels
    pub thickness: u32,
    /// Label height in pixels
    pub label_scale: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            thickness: 2,
            label_scale: 12.0,
        }
    }
}

impl AnnotationStyle {
    pub fn validate(&self) -> Result<()> {
        if self.thickness == 0 || self.thickness > MAX_ANNOTATION_THICKNESS {
            return Err(DetectionError::InvalidConfig(format!(
                "annotation thickness must be between 1 and {MAX_ANNOTATION_THICKNESS}, got {}",
                self.thickness
            )));
        }
        if !(self.label_scale.is_finite() && self.label_scale > 0.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "annotation label_scale must be a positive number, got {}",
                self.label_scale
            )));
        }
        Ok(())
    }
}
