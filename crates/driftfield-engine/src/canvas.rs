//! The drawing surface that particles and forces render onto.
//!
//! It's modelled on the familiar 2D-context style of API: filled primitives, a transform stack,
//! and text. Any host that can provide these can display the simulation.

use crate::colour::Fill;

/// A 2D drawing surface.
pub trait Canvas {
    /// Width in canvas pixels.
    fn width(&self) -> f64;

    /// Height in canvas pixels.
    fn height(&self) -> f64;

    /// Fill an axis-aligned rectangle (in the current transform's local space).
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Fill);

    /// Fill a circle.
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, colour: Fill);

    /// Draw a single line of monospace text with its baseline at `y`.
    fn fill_text(&mut self, x: f64, y: f64, text: &str, colour: Fill);

    /// Push a copy of the current transform.
    fn save(&mut self);

    /// Pop back to the most recently saved transform.
    fn restore(&mut self);

    /// Move the origin.
    fn translate(&mut self, x: f64, y: f64);

    /// Rotate clockwise around the current origin.
    fn rotate(&mut self, radians: f64);
}

/// Run some drawing with a transform that is guaranteed not to leak into later draws.
pub fn scoped(canvas: &mut dyn Canvas, draw: impl FnOnce(&mut dyn Canvas)) {
    canvas.save();
    draw(&mut *canvas);
    canvas.restore();
}
