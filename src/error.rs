use std::fmt;
use std::path::PathBuf;

/// Pipeline stage, used to say where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocessing,
    ColorMask,
    Refinement,
    ContourExtraction,
    Classification,
    Annotation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preprocessing => "preprocessing",
            Stage::ColorMask => "mask construction",
            Stage::Refinement => "mask refinement",
            Stage::ContourExtraction => "contour extraction",
            Stage::Classification => "classification",
            Stage::Annotation => "annotation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// Empty image or mask handed to a stage, or an unusable stage argument.
    #[error("{stage} received {reason}")]
    InvalidInput { stage: Stage, reason: String },

    /// Two masks of different sizes were combined.
    #[error("cannot combine masks of different dimensions: {}x{} vs {}x{}", .left.0, .left.1, .right.0, .right.1)]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DetectionError {
    pub(crate) fn empty_image(stage: Stage) -> Self {
        DetectionError::InvalidInput {
            stage,
            reason: "an empty image".to_string(),
        }
    }

    pub(crate) fn empty_mask(stage: Stage) -> Self {
        DetectionError::InvalidInput {
            stage,
            reason: "an empty mask".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectionError>;
