//! An in-memory RGB framebuffer implementing [`Canvas`].
//!
//! Nothing is ever cleared: every fill is alpha-blended over what was there before, so painting a
//! translucent rectangle over the whole canvas each frame leaves fading trails behind moving
//! things. Text can't be rasterised without a font, so it's collected as overlays for the host to
//! draw however it draws text.

use glam::{DAffine2, DVec2};
use palette::Mix as _;

use crate::canvas::Canvas;
use crate::colour::Fill;
use crate::errors::CanvasError;

/// A single opaque pixel.
pub type Pixel = palette::Srgb<f32>;

/// The colour of a freshly acquired canvas.
pub const BLANK: Pixel = Pixel::new(1.0, 1.0, 1.0);

/// Text drawn onto the canvas, in device coordinates.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct TextOverlay {
    /// Left edge
    pub x: f64,
    /// Baseline
    pub y: f64,
    /// The text itself
    pub text: String,
    /// Text colour
    pub colour: Fill,
}

/// A pixel-addressable canvas.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    /// Width in pixels
    width: usize,
    /// Height in pixels
    height: usize,
    /// Row-major pixels
    pixels: Vec<Pixel>,
    /// The active transform
    transform: DAffine2,
    /// Transforms pushed by `save()`
    saved: Vec<DAffine2>,
    /// Text drawn since the last `take_texts()`
    texts: Vec<TextOverlay>,
}

#[expect(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Canvas dimensions are well within f64's exact integer range"
)]
impl PixelCanvas {
    /// Acquire a blank canvas.
    ///
    /// # Errors
    /// If either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::EmptySurface { width, height });
        }

        Ok(Self {
            width,
            height,
            pixels: vec![BLANK; width * height],
            transform: DAffine2::IDENTITY,
            saved: Vec::new(),
            texts: Vec::new(),
        })
    }

    /// Change size. The old contents are dropped.
    ///
    /// # Errors
    /// If either dimension is zero.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), CanvasError> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width_px(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height_px(&self) -> usize {
        self.height
    }

    /// The pixel at the given coordinates, if it's on the canvas.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Pixel> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Take all the text drawn since the last call.
    pub fn take_texts(&mut self) -> Vec<TextOverlay> {
        std::mem::take(&mut self.texts)
    }

    /// The smallest pixel-aligned box, clipped to the canvas, containing all the given points.
    fn device_bounds(&self, points: &[DVec2]) -> Option<(usize, usize, usize, usize)> {
        let min = points
            .iter()
            .fold(DVec2::INFINITY, |accumulated, point| accumulated.min(*point));
        let max = points
            .iter()
            .fold(DVec2::NEG_INFINITY, |accumulated, point| accumulated.max(*point));
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let left = min.x.floor().max(0.0);
        let top = min.y.floor().max(0.0);
        let right = max.x.ceil().min(self.width as f64);
        let bottom = max.y.ceil().min(self.height as f64);
        if left >= right || top >= bottom {
            return None;
        }

        Some((left as usize, top as usize, right as usize, bottom as usize))
    }

    /// Blend a colour over a single pixel.
    fn blend(&mut self, x: usize, y: usize, colour: Fill) {
        let index = y * self.width + x;
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = pixel.mix(colour.color, colour.alpha);
        }
    }

    /// Visit every pixel whose centre maps into the device-space box, passing the centre mapped
    /// back into the current transform's local space.
    fn fill_where(&mut self, points: &[DVec2], colour: Fill, covers: impl Fn(DVec2) -> bool) {
        let Some((left, top, right, bottom)) = self.device_bounds(points) else {
            return;
        };
        let inverse = self.transform.inverse();

        for y in top..bottom {
            for x in left..right {
                let centre = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                if covers(inverse.transform_point2(centre)) {
                    self.blend(x, y, colour);
                }
            }
        }
    }
}

impl Canvas for PixelCanvas {
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Canvas dimensions are well within f64's exact integer range"
    )]
    fn width(&self) -> f64 {
        self.width as f64
    }

    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Canvas dimensions are well within f64's exact integer range"
    )]
    fn height(&self) -> f64 {
        self.height as f64
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Fill) {
        let corners = [
            DVec2::new(x, y),
            DVec2::new(x + width, y),
            DVec2::new(x, y + height),
            DVec2::new(x + width, y + height),
        ]
        .map(|corner| self.transform.transform_point2(corner));

        self.fill_where(&corners, colour, |local| {
            local.x >= x && local.x < x + width && local.y >= y && local.y < y + height
        });
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, colour: Fill) {
        let centre = DVec2::new(x, y);
        let extent = [
            centre + DVec2::splat(-radius),
            centre + DVec2::new(radius, -radius),
            centre + DVec2::new(-radius, radius),
            centre + DVec2::splat(radius),
        ]
        .map(|corner| self.transform.transform_point2(corner));

        let radius_squared = radius * radius;
        self.fill_where(&extent, colour, |local| {
            local.distance_squared(centre) <= radius_squared
        });
    }

    fn fill_text(&mut self, x: f64, y: f64, text: &str, colour: Fill) {
        let position = self.transform.transform_point2(DVec2::new(x, y));
        self.texts.push(TextOverlay {
            x: position.x,
            y: position.y,
            text: text.to_owned(),
            colour,
        });
    }

    fn save(&mut self) {
        self.saved.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.saved.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.transform = self.transform * DAffine2::from_translation(DVec2::new(x, y));
    }

    fn rotate(&mut self, radians: f64) {
        self.transform = self.transform * DAffine2::from_angle(radians);
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    fn red() -> Fill {
        Fill::new(1.0, 0.0, 0.0, 1.0)
    }

    fn is_red(pixel: Pixel) -> bool {
        (pixel.red - 1.0).abs() < 0.001 && pixel.green.abs() < 0.001 && pixel.blue.abs() < 0.001
    }

    fn is_blank(pixel: Pixel) -> bool {
        pixel == BLANK
    }

    #[test]
    fn empty_surfaces_are_refused() {
        let result = PixelCanvas::new(0, 10);
        assert!(matches!(
            result,
            Err(CanvasError::EmptySurface {
                width: 0,
                height: 10
            })
        ));
    }

    #[test]
    fn opaque_rectangles() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        canvas.fill_rect(2.0, 2.0, 3.0, 3.0, red());

        assert!(is_red(canvas.pixel(2, 2).unwrap()));
        assert!(is_red(canvas.pixel(4, 4).unwrap()));
        assert!(is_blank(canvas.pixel(5, 5).unwrap()));
        assert!(is_blank(canvas.pixel(1, 2).unwrap()));
    }

    #[test]
    fn rectangles_are_clipped() {
        let mut canvas = PixelCanvas::new(4, 4).unwrap();
        canvas.fill_rect(-10.0, -10.0, 100.0, 100.0, red());
        assert!(is_red(canvas.pixel(0, 0).unwrap()));
        assert!(is_red(canvas.pixel(3, 3).unwrap()));
        assert!(canvas.pixel(4, 0).is_none());
    }

    #[test]
    fn translucent_fills_blend() {
        let mut canvas = PixelCanvas::new(1, 1).unwrap();
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Fill::new(0.0, 0.0, 0.0, 0.5));
        let pixel = canvas.pixel(0, 0).unwrap();
        assert!((pixel.red - 0.5).abs() < 0.001);

        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Fill::new(0.0, 0.0, 0.0, 0.5));
        let pixel = canvas.pixel(0, 0).unwrap();
        assert!((pixel.red - 0.25).abs() < 0.001);
    }

    #[test]
    fn rotated_squares() {
        let mut canvas = PixelCanvas::new(20, 20).unwrap();
        canvas.save();
        canvas.translate(10.0, 10.0);
        canvas.rotate(std::f64::consts::FRAC_PI_4);
        canvas.fill_rect(-4.0, -4.0, 8.0, 8.0, red());
        canvas.restore();

        assert!(is_red(canvas.pixel(10, 10).unwrap()));
        // A diamond reaches further along the axes than an unrotated square would.
        assert!(is_red(canvas.pixel(10, 5).unwrap()));
        // But it no longer covers the square's corners.
        assert!(is_blank(canvas.pixel(6, 6).unwrap()));
    }

    #[test]
    fn restore_doesnt_leak_transforms() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        crate::canvas::scoped(&mut canvas, |scoped| {
            scoped.translate(5.0, 5.0);
            scoped.rotate(1.0);
        });
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, red());
        assert!(is_red(canvas.pixel(0, 0).unwrap()));
    }

    #[test]
    fn circles() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        canvas.fill_circle(5.0, 5.0, 2.0, red());
        assert!(is_red(canvas.pixel(5, 5).unwrap()));
        assert!(is_red(canvas.pixel(4, 4).unwrap()));
        assert!(is_blank(canvas.pixel(2, 2).unwrap()));
    }

    #[test]
    fn non_finite_positions_are_skipped() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        canvas.fill_rect(f64::NAN, 0.0, 1.0, 1.0, red());
        canvas.fill_circle(f64::INFINITY, 0.0, 1.0, red());
        assert!(is_blank(canvas.pixel(0, 0).unwrap()));
    }

    #[test]
    fn text_is_collected() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        canvas.fill_text(1.0, 2.0, "60 FPS", red());
        let texts = canvas.take_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts.first().unwrap().text, "60 FPS");
        assert!(canvas.take_texts().is_empty());
    }
}
