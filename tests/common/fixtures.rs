//! Synthetic frames and masks shared by the integration tests.
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use lightbars::{BinaryMask, Contour};

pub const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const HIGHLIGHT: Rgb<u8> = Rgb([0, 255, 0]);

/// Uniform gray frame, outside every colour range
pub fn background_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}

pub fn fill_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for yy in y..y + height {
        for xx in x..x + width {
            img.put_pixel(xx, yy, color);
        }
    }
}

/// Background frame with one solid rectangle
pub fn frame_with_rect(x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    let mut img = background_frame(100, 100);
    fill_rect(&mut img, x, y, width, height, color);
    img
}

/// Mask with foreground wherever `(x + y) % modulus == 0`
pub fn patterned_mask(width: u32, height: u32, modulus: u32) -> BinaryMask {
    let mut mask = BinaryMask::new(width, height);
    for y in 0..height {
        for x in 0..width {
            mask.set(x, y, (x + y) % modulus == 0);
        }
    }
    mask
}

pub fn mask_with_rect(width: u32, height: u32, x: u32, y: u32, w: u32, h: u32) -> BinaryMask {
    let mut mask = BinaryMask::new(width, height);
    for yy in y..y + h {
        for xx in x..x + w {
            mask.set(xx, yy, true);
        }
    }
    mask
}

/// Closed rectangle polygon whose bounding box is `(w + 1) x (h + 1)` and area `w * h`
pub fn rect_contour(x: i32, y: i32, w: i32, h: i32) -> Contour {
    Contour::from_coords(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)])
}
