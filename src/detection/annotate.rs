use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::warn;

use crate::config::AnnotationStyle;
use crate::error::{DetectionError, Result, Stage};
use crate::models::Candidate;

/// Gap between a box's top edge and the bottom of its label
const LABEL_GAP: f32 = 5.0;

/// DejaVu Sans Mono, see `assets/DejaVu-LICENSE.txt`
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

fn default_font() -> Option<FontArc> {
    match FontArc::try_from_slice(DEFAULT_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("bundled label font failed to load, labels disabled: {}", e);
            None
        }
    }
}

/// Draws candidate boxes and their labels on a copy of the frame.
#[derive(Clone)]
pub struct Annotator {
    pub style: AnnotationStyle,
    font: Option<FontArc>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(AnnotationStyle::default())
    }
}

impl Annotator {
    /// Labels use the bundled font unless replaced with [`Annotator::with_font`].
    pub fn new(style: AnnotationStyle) -> Self {
        Self {
            style,
            font: default_font(),
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Returns the annotated copy; `image` itself is left untouched.
    pub fn annotate(&self, image: &RgbImage, candidates: &[Candidate]) -> Result<RgbImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectionError::empty_image(Stage::Annotation));
        }

        let mut canvas = image.clone();
        let color = Rgb(self.style.color);

        for candidate in candidates {
            let bbox = candidate.bounding_box;
            if bbox.width == 0 || bbox.height == 0 {
                continue;
            }

            self.draw_outline(&mut canvas, candidate, color);

            if let Some(font) = &self.font {
                let top = label_top(bbox.y, self.style.label_scale);
                draw_text_mut(
                    &mut canvas,
                    color,
                    bbox.x as i32,
                    top,
                    PxScale::from(self.style.label_scale),
                    font,
                    &candidate.label(),
                );
            }
        }

        Ok(canvas)
    }

    /// Extra thickness grows outward from the box edge. Rings stop once all
    /// four sides have left the canvas.
    fn draw_outline(&self, canvas: &mut RgbImage, candidate: &Candidate, color: Rgb<u8>) {
        let bbox = candidate.bounding_box;
        let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

        for i in 0..self.style.thickness as i64 {
            let left = bbox.x as i64 - i;
            let top = bbox.y as i64 - i;
            let right = bbox.x as i64 + bbox.width as i64 - 1 + i;
            let bottom = bbox.y as i64 + bbox.height as i64 - 1 + i;
            if left < 0 && top < 0 && right >= cw && bottom >= ch {
                break;
            }

            let (Ok(x), Ok(y), Ok(w), Ok(h)) = (
                i32::try_from(left),
                i32::try_from(top),
                u32::try_from(right - left + 1),
                u32::try_from(bottom - top + 1),
            ) else {
                break;
            };
            draw_hollow_rect_mut(canvas, Rect::at(x, y).of_size(w, h), color);
        }
    }
}

/// Label top edge: above the box, clamped to the first row.
fn label_top(box_y: u32, scale: f32) -> i32 {
    (box_y as f32 - LABEL_GAP - scale).max(0.0) as i32
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("style", &self.style)
            .field("font", &self.font.is_some())
            .finish()
    }
}
