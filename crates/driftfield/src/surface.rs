//! Turn the simulation's canvas into terminal cells.
//!
//! Every terminal cell shows two "pixels" using the upper half block: the upper pixel is the
//! cell's foreground colour and the lower pixel is its background. Each of those pixels is the
//! average of a square block of the canvas's virtual pixels.

use color_eyre::eyre::bail;
use color_eyre::eyre::Result;
use driftfield_engine::pixel_canvas::{Pixel, PixelCanvas};
use palette::{LinSrgb, Srgb};
use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Position as TermwizPosition;

/// An RGBA colour
pub(crate) type Colour = (f32, f32, f32, f32);

/// A default pure white.
pub const WHITE: Colour = (1.0, 1.0, 1.0, 1.0);

/// A default pure black.
pub const BLACK: Colour = (0.0, 0.0, 0.0, 1.0);

/// The upper half block, the character that every pixel pair is drawn with.
const UPPER_HALF_BLOCK: &str = "▀";

/// `Surface`
pub(crate) struct Surface {
    /// The terminal's width
    pub width: usize,
    /// The terminal's height
    pub height: usize,
    /// A surface of terminal cells
    pub surface: termwiz::surface::Surface,
}

impl Surface {
    /// An empty surface
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            surface: termwiz::surface::Surface::new(width, height),
        }
    }

    /// Downsample a whole canvas into a surface, then draw any text the canvas collected.
    pub fn from_canvas(
        canvas: &mut PixelCanvas,
        width: usize,
        height: usize,
        pixel_scale: usize,
    ) -> Result<Self> {
        let mut surface = Self::new(width, height);
        let scale = pixel_scale.max(1);

        for row in 0..height {
            for col in 0..width {
                let x = col * scale;
                let upper_y = row * 2 * scale;
                let upper = Self::average_block(canvas, x, upper_y, scale);
                let lower = Self::average_block(canvas, x, upper_y + scale, scale);
                surface.add_pixel_pair(col, row, upper, lower)?;
            }
        }

        for overlay in canvas.take_texts() {
            #[expect(
                clippy::as_conversions,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "Text positions are small and positive"
            )]
            let (col, row) = (
                overlay.x.max(0.0) as usize / scale,
                overlay.y.max(0.0) as usize / (scale * 2),
            );
            let colour = overlay.colour;
            surface.add_text(
                col,
                row,
                &overlay.text,
                Some(WHITE),
                Some((colour.red, colour.green, colour.blue, colour.alpha)),
            );
        }

        Ok(surface)
    }

    /// The mean colour of a square of pixels, in linear light. Pixels beyond the canvas are
    /// ignored, a block entirely beyond it is white.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Block sizes are tiny"
    )]
    fn average_block(canvas: &PixelCanvas, x: usize, y: usize, scale: usize) -> Colour {
        let mut total = LinSrgb::new(0.0_f32, 0.0, 0.0);
        let mut count = 0_usize;
        let mut first: Option<Pixel> = None;
        let mut is_uniform = true;
        for block_y in y..y + scale {
            for block_x in x..x + scale {
                if let Some(pixel) = canvas.pixel(block_x, block_y) {
                    is_uniform = is_uniform && first.is_none_or(|colour| colour == pixel);
                    first.get_or_insert(pixel);
                    total += pixel.into_linear();
                    count += 1;
                }
            }
        }

        let average: Pixel = match first {
            None => return WHITE,
            Some(colour) if is_uniform => colour,
            Some(_) => Srgb::from_linear(total / count as f32),
        };
        (average.red, average.green, average.blue, 1.0)
    }

    /// Set a whole cell from its upper and lower pixels.
    pub fn add_pixel_pair(
        &mut self,
        col: usize,
        row: usize,
        upper: Colour,
        lower: Colour,
    ) -> Result<()> {
        if col >= self.width {
            bail!("Tried to add pixel to column: {col}")
        }
        if row >= self.height {
            bail!("Tried to add pixel to row: {row}")
        }

        self.surface.add_changes(vec![
            TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(col),
                y: TermwizPosition::Absolute(row),
            },
            Self::make_fg_colour(upper),
            Self::make_bg_colour(lower),
        ]);
        self.surface.add_change(UPPER_HALF_BLOCK);

        Ok(())
    }

    /// Overlay text at a given coord with the given colours.
    pub fn add_text(
        &mut self,
        x: usize,
        y: usize,
        text: &str,
        maybe_background_colour: Option<Colour>,
        maybe_foreground_colour: Option<Colour>,
    ) {
        if x >= self.width || y >= self.height {
            return;
        }
        let visible: String = text.chars().take(self.width - x).collect();

        let bg_colour = maybe_background_colour
            .map_or_else(Self::make_default_bg_colour, Self::make_bg_colour);
        let fg_colour = maybe_foreground_colour
            .map_or_else(|| Self::make_fg_colour(BLACK), Self::make_fg_colour);

        self.surface.add_changes(vec![
            TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(x),
                y: TermwizPosition::Absolute(y),
            },
            bg_colour,
            fg_colour,
        ]);
        self.surface.add_change(visible);
    }

    /// Make a Termwiz colour attribute
    #[must_use]
    pub const fn make_colour_attribute(colour: Colour) -> termwiz::color::ColorAttribute {
        termwiz::color::ColorAttribute::TrueColorWithDefaultFallback(termwiz::color::SrgbaTuple(
            colour.0, colour.1, colour.2, colour.3,
        ))
    }

    /// Make a Termwiz background colour
    #[must_use]
    pub const fn make_bg_colour(colour: Colour) -> TermwizChange {
        let colour_attribute = Self::make_colour_attribute(colour);
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(colour_attribute))
    }

    /// Make the default Termwiz background colour.
    #[must_use]
    pub const fn make_default_bg_colour() -> TermwizChange {
        let colour_attribute = termwiz::color::ColorAttribute::Default;
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(colour_attribute))
    }

    /// Make a Termwiz foreground colour
    #[must_use]
    pub const fn make_fg_colour(colour: Colour) -> TermwizChange {
        let colour_attribute = Self::make_colour_attribute(colour);
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Foreground(colour_attribute))
    }
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Tests aren't so strict"
)]
mod test {
    use driftfield_engine::canvas::Canvas as _;
    use driftfield_engine::colour::rgba;

    use super::*;

    #[test]
    fn blank_canvases_are_white() {
        let mut canvas = PixelCanvas::new(4, 8).unwrap();
        let mut surface = Surface::from_canvas(&mut canvas, 2, 2, 2).unwrap();

        let cell = &surface.surface.screen_cells()[1][1];
        assert_eq!(cell.str(), UPPER_HALF_BLOCK);
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(WHITE)
        );
        assert_eq!(
            cell.attrs().background(),
            Surface::make_colour_attribute(WHITE)
        );
    }

    #[test]
    fn upper_and_lower_pixels() {
        let mut canvas = PixelCanvas::new(1, 2).unwrap();
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, rgba(0, 0, 0, 1.0));
        let mut surface = Surface::from_canvas(&mut canvas, 1, 1, 1).unwrap();

        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(BLACK)
        );
        assert_eq!(
            cell.attrs().background(),
            Surface::make_colour_attribute(WHITE)
        );
    }

    #[test]
    fn blocks_are_averaged() {
        let mut canvas = PixelCanvas::new(2, 4).unwrap();
        canvas.fill_rect(0.0, 0.0, 1.0, 2.0, rgba(0, 0, 0, 1.0));
        let mut surface = Surface::from_canvas(&mut canvas, 1, 1, 2).unwrap();

        let cell = &surface.surface.screen_cells()[0][0];
        let termwiz::color::ColorAttribute::TrueColorWithDefaultFallback(upper) =
            cell.attrs().foreground()
        else {
            panic!("Not a true colour");
        };
        assert!(upper.0 > 0.5 && upper.0 < 1.0);
        assert!((upper.0 - upper.1).abs() < f32::EPSILON);
    }

    #[test]
    fn text_overlays_land_in_cells() {
        let mut canvas = PixelCanvas::new(40, 16).unwrap();
        canvas.fill_text(10.0, 9.0, "Hi", rgba(0, 0, 0, 1.0));
        let mut surface = Surface::from_canvas(&mut canvas, 10, 2, 4).unwrap();

        let cells = surface.surface.screen_cells();
        assert_eq!(cells[1][2].str(), "H");
        assert_eq!(cells[1][3].str(), "i");
    }

    #[test]
    fn text_is_cropped() {
        let mut surface = Surface::new(3, 1);
        surface.add_text(1, 0, "Hello", None, None);
        let text = surface.surface.screen_chars_to_string();
        assert!(text.starts_with(" He"));
        assert!(!text.contains('l'));
    }

    #[test]
    fn pixels_outside_the_surface() {
        let mut surface = Surface::new(1, 1);
        let result = surface.add_pixel_pair(0, 1, WHITE, WHITE).unwrap_err();
        assert_eq!(
            format!("{}", result.root_cause()),
            "Tried to add pixel to row: 1"
        );
    }
}
