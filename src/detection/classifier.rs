use std::fmt;
use tracing::{debug, info};

use crate::config::ClassificationThresholds;
use crate::models::{BoundingBox, Candidate, Contour};

/// The quantities a contour is judged on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMeasurements {
    pub area: f64,
    pub bounding_box: BoundingBox,
}

impl ShapeMeasurements {
    pub fn of(contour: &Contour) -> Self {
        Self {
            area: contour.area(),
            bounding_box: contour.bounding_box(),
        }
    }
}

/// Why a contour did not qualify. Never an error, only a verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Zero-width or zero-height bounding box
    DegenerateShape,
    AreaOutOfRange { area: f64 },
    AspectRatioOutOfRange { ratio: f64 },
    TooNarrow { width: u32 },
    TooShort { height: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DegenerateShape => write!(f, "degenerate bounding box"),
            Rejection::AreaOutOfRange { area } => write!(f, "area {area} out of range"),
            Rejection::AspectRatioOutOfRange { ratio } => write!(f, "aspect ratio {ratio:.3} out of range"),
            Rejection::TooNarrow { width } => write!(f, "width {width} too small"),
            Rejection::TooShort { height } => write!(f, "height {height} too small"),
        }
    }
}

/// Decides which contours are light bars.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CandidateClassifier {
    pub thresholds: ClassificationThresholds,
}

impl CandidateClassifier {
    pub fn new(thresholds: ClassificationThresholds) -> Self {
        Self { thresholds }
    }

    /// Light-bar acceptance rule. Every bound is exclusive.
    pub fn evaluate(&self, m: &ShapeMeasurements) -> Result<Candidate, Rejection> {
        let t = &self.thresholds;
        let bbox = m.bounding_box;

        if bbox.height == 0 {
            return Err(Rejection::DegenerateShape);
        }
        let Some(ratio) = bbox.aspect_ratio() else {
            return Err(Rejection::DegenerateShape);
        };

        if !(m.area > t.area_min && m.area < t.area_max) {
            return Err(Rejection::AreaOutOfRange { area: m.area });
        }
        if !(ratio > t.aspect_ratio_min && ratio < t.aspect_ratio_max) {
            return Err(Rejection::AspectRatioOutOfRange { ratio });
        }
        if bbox.width <= t.min_width {
            return Err(Rejection::TooNarrow { width: bbox.width });
        }
        if bbox.height <= t.min_height {
            return Err(Rejection::TooShort { height: bbox.height });
        }

        Ok(Candidate {
            bounding_box: bbox,
            area: m.area,
            aspect_ratio: ratio,
        })
    }

    pub fn is_light_bar(&self, m: &ShapeMeasurements) -> bool {
        self.evaluate(m).is_ok()
    }

    /// Stable filter: accepted candidates keep the contours' order.
    pub fn classify(&self, contours: &[Contour]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for (index, contour) in contours.iter().enumerate() {
            match self.evaluate(&ShapeMeasurements::of(contour)) {
                Ok(candidate) => {
                    info!("{}", candidate.summary(candidates.len() + 1));
                    candidates.push(candidate);
                }
                Err(rejection) => {
                    debug!(index, points = contour.len(), %rejection, "contour rejected");
                }
            }
        }

        info!(accepted = candidates.len(), total = contours.len(), "classification finished");
        candidates
    }
}
