use tracing::debug;

use crate::backend::ContourExtractor;
use crate::error::{DetectionError, Result, Stage};
use crate::models::{BinaryMask, Contour};

/// Outer contours of the refined mask, in the extractor's scan order.
pub fn find_contours<E: ContourExtractor + ?Sized>(extractor: &E, mask: &BinaryMask) -> Result<Vec<Contour>> {
    if mask.is_empty() {
        return Err(DetectionError::empty_mask(Stage::ContourExtraction));
    }

    let contours = extractor.extract(mask)?;
    debug!(count = contours.len(), "contours extracted");
    Ok(contours)
}
