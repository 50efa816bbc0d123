mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from lightbars for tests
#[allow(unused_imports)]
pub use lightbars::{
    BinaryMask, BoundingBox, Candidate, ClassificationThresholds, Contour, DetectionError,
    LightBarConfig, LightBarPipeline, Stage,
};
