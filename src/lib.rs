pub mod backend;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;

pub use backend::{ColorConverter, ContourExtractor, ImageprocBackend, MorphOp, Morphology};
pub use config::{AnnotationStyle, ClassificationThresholds, LightBarConfig};
pub use detection::classifier::{CandidateClassifier, Rejection, ShapeMeasurements};
pub use detection::{Detection, LightBarPipeline};
pub use error::{DetectionError, Stage};
pub use models::{BinaryMask, BoundingBox, Candidate, CandidateSummary, ColorRange, Contour, Hsv, HsvImage};
