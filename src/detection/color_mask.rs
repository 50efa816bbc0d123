use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use tracing::debug;

use crate::backend::ColorConverter;
use crate::config::LightBarConfig;
use crate::error::{DetectionError, Result, Stage};
use crate::models::{BinaryMask, ColorRange, Hsv, HsvImage, FOREGROUND};

/// Builds the red-or-blue foreground mask from a colour image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMaskBuilder {
    /// Red straddles the hue wrap point, so it takes two bands.
    pub red_low: ColorRange,
    pub red_high: ColorRange,
    pub blue: ColorRange,
}

impl ColorMaskBuilder {
    pub fn from_config(config: &LightBarConfig) -> Self {
        Self {
            red_low: config.red_range1,
            red_high: config.red_range2,
            blue: config.blue_range,
        }
    }

    /// Threshold `image` in HSV space and union the red and blue masks.
    pub fn build<C: ColorConverter + ?Sized>(&self, converter: &C, image: &RgbImage) -> Result<BinaryMask> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectionError::empty_image(Stage::ColorMask));
        }

        let hsv = converter.to_hsv(image)?;
        self.build_from_hsv(&hsv)
    }

    pub fn build_from_hsv(&self, hsv: &HsvImage) -> Result<BinaryMask> {
        let red = in_range(hsv, &self.red_low)?.union(&in_range(hsv, &self.red_high)?)?;
        let blue = in_range(hsv, &self.blue)?;
        let mask = red.union(&blue)?;

        debug!(
            red = red.foreground_count(),
            blue = blue.foreground_count(),
            total = mask.foreground_count(),
            "colour mask built"
        );
        Ok(mask)
    }
}

/// Foreground wherever the pixel lies inside `range` (bounds inclusive).
pub fn in_range(hsv: &HsvImage, range: &ColorRange) -> Result<BinaryMask> {
    if hsv.width() == 0 || hsv.height() == 0 {
        return Err(DetectionError::empty_image(Stage::ColorMask));
    }

    let data: Vec<u8> = hsv
        .as_raw()
        .par_chunks_exact(3)
        .map(|px| {
            let inside = range.contains(Hsv::new(px[0], px[1], px[2]));
            if inside { FOREGROUND } else { 0 }
        })
        .collect();

    GrayImage::from_raw(hsv.width(), hsv.height(), data)
        .map(BinaryMask::from_gray)
        .ok_or_else(|| DetectionError::InvalidInput {
            stage: Stage::ColorMask,
            reason: "an HSV buffer that does not match its dimensions".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ImageprocBackend;
    use image::Rgb;

    fn builder() -> ColorMaskBuilder {
        ColorMaskBuilder::from_config(&LightBarConfig::default())
    }

    #[test]
    fn both_red_bands_and_blue_are_foreground() {
        let mut img = RgbImage::from_pixel(4, 1, Rgb([128, 128, 128]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 0, 40]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let mask = builder().build(&ImageprocBackend, &img).unwrap();
        assert!(mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(mask.is_foreground(2, 0));
        assert!(!mask.is_foreground(3, 0));
    }

    #[test]
    fn dim_or_washed_out_colors_are_background() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([60, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 200, 200]));
        img.put_pixel(2, 0, Rgb([0, 255, 0]));

        let mask = builder().build(&ImageprocBackend, &img).unwrap();
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn empty_image_is_invalid() {
        let err = builder().build(&ImageprocBackend, &RgbImage::new(0, 5)).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput { stage: Stage::ColorMask, .. }));
    }
}
