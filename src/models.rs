use image::{GrayImage, ImageBuffer, Luma, Rgb};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DetectionError, Result};

/// Pixel value stored for foreground cells of a [`BinaryMask`].
pub const FOREGROUND: u8 = 255;

/// A colour in 8-bit HSV: hue in 0..=180 (degrees halved), saturation and value in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Image whose three channels hold H, S and V instead of R, G and B.
#[derive(Debug, Clone)]
pub struct HsvImage(ImageBuffer<Rgb<u8>, Vec<u8>>);

impl HsvImage {
    pub fn from_buffer(buffer: ImageBuffer<Rgb<u8>, Vec<u8>>) -> Self {
        Self(buffer)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Hsv {
        let [h, s, v] = self.0.get_pixel(x, y).0;
        Hsv::new(h, s, v)
    }

    /// Raw interleaved H, S, V bytes in row-major order.
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }
}

/// Inclusive HSV bounds. A hue band that wraps past 180 is expressed as two ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl ColorRange {
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, px: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&px.h)
            && (self.lower.s..=self.upper.s).contains(&px.s)
            && (self.lower.v..=self.upper.v).contains(&px.v)
    }

    /// Lower bound does not exceed upper bound on any component.
    pub fn is_ordered(&self) -> bool {
        self.lower.h <= self.upper.h && self.lower.s <= self.upper.s && self.lower.v <= self.upper.v
    }
}

/// Foreground/background grid backed by a grayscale image holding 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    /// All-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Wrap a grayscale image; any nonzero pixel becomes foreground.
    pub fn from_gray(mut image: GrayImage) -> Self {
        for px in image.pixels_mut() {
            if px[0] != 0 {
                px[0] = FOREGROUND;
            }
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// True when the mask has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let value = if foreground { FOREGROUND } else { 0 };
        self.image.put_pixel(x, y, Luma([value]));
    }

    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] != 0).count()
    }

    /// Cell-wise OR of two masks of identical dimensions.
    pub fn union(&self, other: &BinaryMask) -> Result<BinaryMask> {
        if self.dimensions() != other.dimensions() {
            return Err(DetectionError::DimensionMismatch {
                left: self.dimensions(),
                right: other.dimensions(),
            });
        }

        let data = self
            .image
            .as_raw()
            .iter()
            .zip(other.image.as_raw())
            .map(|(a, b)| a | b)
            .collect();

        let image = GrayImage::from_raw(self.width(), self.height(), data).ok_or_else(|| {
            DetectionError::DimensionMismatch {
                left: self.dimensions(),
                right: other.dimensions(),
            }
        })?;
        Ok(Self { image })
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_gray(self) -> GrayImage {
        self.image
    }
}

/// Axis-aligned bounding box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// height / width, or `None` for a zero-width box.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 {
            return None;
        }
        Some(self.height as f64 / self.width as f64)
    }
}

/// Boundary polygon of one connected foreground region, in tracing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn from_coords(coords: &[(i32, i32)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inclusive pixel extent of the points; zero-sized when there are none.
    ///
    /// Negative coordinates lie off the image; the box covers only the
    /// non-negative part of the extent.
    pub fn bounding_box(&self) -> BoundingBox {
        let Some(first) = self.points.first() else {
            return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let (x, width) = clamped_extent(min_x, max_x);
        let (y, height) = clamped_extent(min_y, max_y);
        BoundingBox { x, y, width, height }
    }

    /// Enclosed polygon area (shoelace formula), not the bounding box area.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }
}

/// A contour that passed classification, with the measurements it was judged on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub bounding_box: BoundingBox,
    pub area: f64,
    pub aspect_ratio: f64,
}

impl Candidate {
    /// Short on-image label, e.g. `A:145 R:5.00`.
    pub fn label(&self) -> String {
        format!("A:{} R:{}", self.area as i64, truncate_ratio(self.aspect_ratio))
    }

    pub fn summary(&self, rank: usize) -> CandidateSummary {
        CandidateSummary {
            rank,
            area: self.area,
            aspect_ratio: self.aspect_ratio,
            origin: (self.bounding_box.x, self.bounding_box.y),
        }
    }
}

/// Diagnostic record for one accepted candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    /// 1-based position among accepted candidates
    pub rank: usize,
    pub area: f64,
    pub aspect_ratio: f64,
    pub origin: (u32, u32),
}

impl fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "light bar {}: area={}, aspect={}, at=({},{})",
            self.rank,
            self.area,
            truncate_ratio(self.aspect_ratio),
            self.origin.0,
            self.origin.1
        )
    }
}

/// First four characters of the six-decimal rendering: 5.0 -> "5.00", 1.666 -> "1.66".
pub fn truncate_ratio(ratio: f64) -> String {
    format!("{ratio:.6}").chars().take(4).collect()
}

/// Start and inclusive length of `min..=max` after dropping negative coordinates.
fn clamped_extent(min: i32, max: i32) -> (u32, u32) {
    let start = i64::from(min).max(0);
    let len = (i64::from(max) - start + 1).max(0);
    // both fit: start <= i32::MAX and len <= i32::MAX + 1
    (start as u32, len as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_truncated_not_rounded() {
        assert_eq!(truncate_ratio(5.0), "5.00");
        assert_eq!(truncate_ratio(5.0 / 3.0), "1.66");
        assert_eq!(truncate_ratio(12.5), "12.5");
    }

    #[test]
    fn rectangle_contour_measurements() {
        let c = Contour::from_coords(&[(10, 20), (15, 20), (15, 49), (10, 49)]);
        let bbox = c.bounding_box();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (10, 20, 6, 30));
        assert_eq!(c.area(), 145.0);
        assert_eq!(bbox.aspect_ratio(), Some(5.0));
    }

    #[test]
    fn degenerate_contours_have_no_area() {
        assert_eq!(Contour::new(vec![]).area(), 0.0);
        assert_eq!(Contour::from_coords(&[(1, 1), (1, 5)]).area(), 0.0);
        assert_eq!(Contour::new(vec![]).bounding_box().width, 0);
    }

    #[test]
    fn summary_display() {
        let candidate = Candidate {
            bounding_box: BoundingBox { x: 3, y: 7, width: 6, height: 30 },
            area: 145.0,
            aspect_ratio: 5.0,
        };
        assert_eq!(candidate.label(), "A:145 R:5.00");
        assert_eq!(
            candidate.summary(1).to_string(),
            "light bar 1: area=145, aspect=5.00, at=(3,7)"
        );
    }

    #[test]
    fn bounding_box_drops_negative_extent() {
        let contour = Contour::from_coords(&[(-2, -3), (4, -3), (4, 6), (-2, 6)]);
        assert_eq!(
            contour.bounding_box(),
            BoundingBox { x: 0, y: 0, width: 5, height: 7 }
        );

        let off_image = Contour::from_coords(&[(-5, -5), (-1, -2)]);
        let bbox = off_image.bounding_box();
        assert_eq!((bbox.width, bbox.height), (0, 0));
    }

    #[test]
    fn bounding_box_of_extreme_points_does_not_overflow() {
        let contour = Contour::from_coords(&[(i32::MIN, 0), (i32::MAX, 0)]);
        let bbox = contour.bounding_box();
        assert_eq!((bbox.x, bbox.width, bbox.height), (0, i32::MAX as u32 + 1, 1));
    }
}
