pub mod annotate;
pub mod classifier;
pub mod color_mask;
pub mod contours;
pub mod preprocessing;
pub mod refine;

use ab_glyph::FontArc;
use image::RgbImage;
use tracing::info;

use crate::backend::{ColorConverter, ContourExtractor, ImageprocBackend, Morphology};
use crate::config::LightBarConfig;
use crate::error::{Result, Stage};
use crate::models::{BinaryMask, Candidate, CandidateSummary, Contour};

use annotate::Annotator;
use classifier::CandidateClassifier;
use color_mask::ColorMaskBuilder;
use refine::MaskRefiner;

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Refined foreground mask, kept for diagnostics
    pub mask: BinaryMask,
    /// Number of outer contours found in `mask`
    pub contour_count: usize,
    /// Accepted light bars in contour extraction order
    pub candidates: Vec<Candidate>,
    /// Copy of the input with candidates drawn on it
    pub annotated: RgbImage,
}

impl Detection {
    pub fn summaries(&self) -> Vec<CandidateSummary> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(i, c)| c.summary(i + 1))
            .collect()
    }
}

/// Light-bar detection pipeline:
/// colour mask -> refinement -> contours -> classification -> annotation.
///
/// Runs synchronously; any failing stage aborts the run. The pipeline holds
/// only read-only configuration and can be shared between threads.
#[derive(Debug, Clone)]
pub struct LightBarPipeline<B = ImageprocBackend> {
    backend: B,
    mask_builder: ColorMaskBuilder,
    refiner: MaskRefiner,
    classifier: CandidateClassifier,
    annotator: Annotator,
}

impl LightBarPipeline<ImageprocBackend> {
    pub fn new() -> Self {
        let config = LightBarConfig::default();
        Self::assemble(&config, ImageprocBackend)
    }

    pub fn from_config(config: &LightBarConfig) -> Result<Self> {
        Self::with_backend(config, ImageprocBackend)
    }
}

impl Default for LightBarPipeline<ImageprocBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> LightBarPipeline<B>
where
    B: ColorConverter + Morphology + ContourExtractor,
{
    /// Validate `config` and run it on a custom backend.
    pub fn with_backend(config: &LightBarConfig, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, backend))
    }

    fn assemble(config: &LightBarConfig, backend: B) -> Self {
        Self {
            backend,
            mask_builder: ColorMaskBuilder::from_config(config),
            refiner: MaskRefiner::new(config.structuring_element_size),
            classifier: CandidateClassifier::new(config.thresholds),
            annotator: Annotator::new(config.annotation),
        }
    }

    /// Enable candidate labels on the annotated image
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.annotator = self.annotator.with_font(font);
        self
    }

    pub fn classifier(&self) -> &CandidateClassifier {
        &self.classifier
    }

    pub fn build_mask(&self, image: &RgbImage) -> Result<BinaryMask> {
        self.mask_builder.build(&self.backend, image)
    }

    pub fn refine_mask(&self, mask: &BinaryMask) -> Result<BinaryMask> {
        self.refiner.refine(&self.backend, mask)
    }

    pub fn extract_contours(&self, mask: &BinaryMask) -> Result<Vec<Contour>> {
        contours::find_contours(&self.backend, mask)
    }

    pub fn classify(&self, contours: &[Contour]) -> Vec<Candidate> {
        self.classifier.classify(contours)
    }

    pub fn annotate(&self, image: &RgbImage, candidates: &[Candidate]) -> Result<RgbImage> {
        self.annotator.annotate(image, candidates)
    }

    /// Run every stage once on `image`.
    pub fn detect(&self, image: &RgbImage) -> Result<Detection> {
        info!("Loaded {}x{} image", image.width(), image.height());

        let raw = self.build_mask(image)?;
        info!(stage = %Stage::ColorMask, foreground = raw.foreground_count(), "stage complete");

        let mask = self.refine_mask(&raw)?;
        info!(stage = %Stage::Refinement, foreground = mask.foreground_count(), "stage complete");

        let contours = self.extract_contours(&mask)?;
        info!(stage = %Stage::ContourExtraction, contours = contours.len(), "stage complete");

        let candidates = self.classify(&contours);
        info!(stage = %Stage::Classification, candidates = candidates.len(), "stage complete");

        let annotated = self.annotate(image, &candidates)?;
        info!(stage = %Stage::Annotation, "stage complete");

        Ok(Detection {
            mask,
            contour_count: contours.len(),
            candidates,
            annotated,
        })
    }
}
