//! Image-algebra primitives the pipeline delegates to.
//!
//! The pipeline owns thresholds and decisions; colour conversion, morphology
//! and contour tracing come from an implementation of these traits.
//! [`ImageprocBackend`] binds them to `imageproc`.

use image::{imageops, GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::point::Point;

use crate::detection::preprocessing;
use crate::error::{DetectionError, Result, Stage};
use crate::models::{BinaryMask, Contour, HsvImage};

/// Converts RGB images to 8-bit HSV.
pub trait ColorConverter: Send + Sync {
    fn to_hsv(&self, image: &RgbImage) -> Result<HsvImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOp {
    Erode,
    Dilate,
    /// Erode then dilate
    Open,
    /// Dilate then erode
    Close,
}

/// Binary morphology with a square structuring element of side `size`.
pub trait Morphology: Send + Sync {
    fn apply(&self, mask: &BinaryMask, op: MorphOp, size: u32) -> Result<BinaryMask>;
}

/// Traces the outermost borders of foreground regions.
pub trait ContourExtractor: Send + Sync {
    fn extract(&self, mask: &BinaryMask) -> Result<Vec<Contour>>;
}

/// Default backend built on `imageproc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocBackend;

impl ColorConverter for ImageprocBackend {
    fn to_hsv(&self, image: &RgbImage) -> Result<HsvImage> {
        preprocessing::to_hsv(image)
    }
}

impl Morphology for ImageprocBackend {
    fn apply(&self, mask: &BinaryMask, op: MorphOp, size: u32) -> Result<BinaryMask> {
        if mask.is_empty() {
            return Err(DetectionError::empty_mask(Stage::Refinement));
        }
        if size == 0 || size % 2 == 0 {
            return Err(DetectionError::InvalidInput {
                stage: Stage::Refinement,
                reason: format!("a structuring element of even or zero size {size}"),
            });
        }

        // Under the L-infinity norm, radius k covers a (2k + 1) square.
        let k = u8::try_from(size / 2).map_err(|_| DetectionError::InvalidInput {
            stage: Stage::Refinement,
            reason: format!("a structuring element of size {size}, larger than supported"),
        })?;

        let gray = mask.as_gray();
        let out = match op {
            MorphOp::Erode => morphology::erode(gray, Norm::LInf, k),
            MorphOp::Dilate => morphology::dilate(gray, Norm::LInf, k),
            MorphOp::Open => morphology::open(gray, Norm::LInf, k),
            MorphOp::Close => morphology::close(gray, Norm::LInf, k),
        };
        Ok(BinaryMask::from_gray(out))
    }
}

impl ContourExtractor for ImageprocBackend {
    fn extract(&self, mask: &BinaryMask) -> Result<Vec<Contour>> {
        if mask.is_empty() {
            return Err(DetectionError::empty_mask(Stage::ContourExtraction));
        }

        // find_contours never starts a border on column 0, so regions touching
        // the left edge would vanish. Trace on a one-pixel background frame.
        let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut padded, mask.as_gray(), 1, 1);

        let contours = find_contours::<i32>(&padded)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .map(|c| {
                let points = c
                    .points
                    .into_iter()
                    .map(|p| Point::new(p.x - 1, p.y - 1))
                    .collect();
                Contour::new(points)
            })
            .collect();
        Ok(contours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_block(w: u32, h: u32, x0: u32, y0: u32, bw: u32, bh: u32) -> BinaryMask {
        let mut mask = BinaryMask::new(w, h);
        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                mask.set(x, y, true);
            }
        }
        mask
    }

    #[test]
    fn open_removes_isolated_pixel() {
        let mut mask = mask_with_block(20, 20, 5, 5, 6, 6);
        mask.set(15, 15, true);
        let opened = ImageprocBackend.apply(&mask, MorphOp::Open, 3).unwrap();
        assert!(!opened.is_foreground(15, 15));
        assert!(opened.is_foreground(7, 7));
    }

    #[test]
    fn close_fills_single_pixel_gap() {
        let mut mask = mask_with_block(20, 20, 5, 5, 6, 6);
        mask.set(7, 7, false);
        let closed = ImageprocBackend.apply(&mask, MorphOp::Close, 3).unwrap();
        assert!(closed.is_foreground(7, 7));
    }

    #[test]
    fn even_element_is_invalid() {
        let mask = mask_with_block(10, 10, 2, 2, 3, 3);
        let err = ImageprocBackend.apply(&mask, MorphOp::Open, 4).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput { stage: Stage::Refinement, .. }));
    }

    #[test]
    fn nested_regions_yield_only_outer_contour() {
        // Ring with a filled island inside its hole
        let mut mask = mask_with_block(30, 30, 5, 5, 20, 20);
        for y in 8..22 {
            for x in 8..22 {
                mask.set(x, y, false);
            }
        }
        for y in 12..18 {
            for x in 12..18 {
                mask.set(x, y, true);
            }
        }

        let contours = ImageprocBackend.extract(&mask).unwrap();
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_box();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (5, 5, 20, 20));
    }

    #[test]
    fn regions_touching_every_edge_are_traced() {
        for (x, y) in [(0, 40), (94, 40), (40, 0), (40, 70)] {
            let mask = mask_with_block(100, 100, x, y, 6, 30);
            let contours = ImageprocBackend.extract(&mask).unwrap();
            assert_eq!(contours.len(), 1, "bar at ({x}, {y})");

            let bbox = contours[0].bounding_box();
            assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (x, y, 6, 30));
            assert_eq!(contours[0].area(), 145.0);
        }
    }

    #[test]
    fn full_frame_region_is_traced() {
        let mask = mask_with_block(8, 12, 0, 0, 8, 12);
        let contours = ImageprocBackend.extract(&mask).unwrap();
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_box();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (0, 0, 8, 12));
    }

    #[test]
    fn extracting_from_empty_mask_fails() {
        let err = ImageprocBackend.extract(&BinaryMask::new(0, 0)).unwrap_err();
        assert_eq!(err.to_string(), "contour extraction received an empty mask");
    }
}
