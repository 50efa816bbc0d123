use image::{GrayImage, ImageBuffer, RgbImage};
use imageproc::filter::separable_filter_equal;
use rayon::prelude::*;
use std::fmt;

use crate::error::{DetectionError, Result, Stage};
use crate::models::{Hsv, HsvImage};

/// Convert a single RGB pixel to 8-bit HSV (hue halved into 0..180).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * diff / max };

    let mut h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = ((h / 2.0).round() as u32 % 180) as u8;
    Hsv::new(h, s.round() as u8, max as u8)
}

/// Convert a whole image to HSV. Pixels are independent and converted in parallel.
pub fn to_hsv(image: &RgbImage) -> Result<HsvImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectionError::empty_image(Stage::ColorMask));
    }

    let data: Vec<u8> = image
        .as_raw()
        .par_chunks_exact(3)
        .flat_map_iter(|px| {
            let hsv = rgb_to_hsv(px[0], px[1], px[2]);
            [hsv.h, hsv.s, hsv.v]
        })
        .collect();

    let buffer = ImageBuffer::from_raw(image.width(), image.height(), data)
        .ok_or_else(|| DetectionError::empty_image(Stage::ColorMask))?;
    Ok(HsvImage::from_buffer(buffer))
}

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

fn check_kernel(img: &RgbImage, kernel_size: u32) -> Result<()> {
    if img.width() == 0 || img.height() == 0 {
        return Err(DetectionError::empty_image(Stage::Preprocessing));
    }
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(DetectionError::InvalidInput {
            stage: Stage::Preprocessing,
            reason: format!("kernel size {kernel_size}; it must be a positive odd number"),
        });
    }
    Ok(())
}

/// Box (mean) blur with a square kernel of side `kernel_size`
pub fn mean_blur(img: &RgbImage, kernel_size: u32) -> Result<RgbImage> {
    check_kernel(img, kernel_size)?;
    let weight = 1.0 / kernel_size as f32;
    let kernel = vec![weight; kernel_size as usize];
    Ok(separable_filter_equal(img, &kernel))
}

/// Gaussian blur with an explicit kernel size and standard deviation
pub fn gaussian_blur(img: &RgbImage, kernel_size: u32, sigma: f32) -> Result<RgbImage> {
    check_kernel(img, kernel_size)?;
    if !(sigma > 0.0) {
        return Err(DetectionError::InvalidInput {
            stage: Stage::Preprocessing,
            reason: format!("sigma {sigma}; it must be positive"),
        });
    }

    let half = (kernel_size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= total;
    }
    Ok(separable_filter_equal(img, &kernel))
}

/// Basic facts about a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl ImageInfo {
    pub fn of(img: &RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            channels: 3,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size: {} x {}", self.width, self.height)?;
        writeln!(f, "Channels: {}", self.channels)?;
        write!(f, "Total pixels: {}", self.pixel_count())
    }
}
