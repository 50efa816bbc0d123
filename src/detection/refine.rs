use tracing::debug;

use crate::backend::{MorphOp, Morphology};
use crate::error::{DetectionError, Result, Stage};
use crate::models::BinaryMask;

/// One open followed by one close with a square structuring element.
///
/// Opening drops isolated noise pixels; closing then fills small gaps so a
/// light bar broken up by sensor noise still traces as a single contour.
/// Not idempotent in general: run it once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRefiner {
    pub element_size: u32,
}

impl Default for MaskRefiner {
    fn default() -> Self {
        Self { element_size: 3 }
    }
}

impl MaskRefiner {
    pub fn new(element_size: u32) -> Self {
        Self { element_size }
    }

    pub fn refine<M: Morphology + ?Sized>(&self, morphology: &M, mask: &BinaryMask) -> Result<BinaryMask> {
        if mask.is_empty() {
            return Err(DetectionError::empty_mask(Stage::Refinement));
        }

        let opened = morphology.apply(mask, MorphOp::Open, self.element_size)?;
        let closed = morphology.apply(&opened, MorphOp::Close, self.element_size)?;

        debug!(
            before = mask.foreground_count(),
            after = closed.foreground_count(),
            "mask refined"
        );
        Ok(closed)
    }
}
