//! # Driftfield Engine
//! A cloud of small squares, each pulled back towards its home, pushed around by a handful of
//! wandering forces and by the pointer.
//!
//! The engine knows nothing about windows, terminals or clocks. A host owns a [`world::World`],
//! feeds it timestamps and input, and hands it something implementing [`canvas::Canvas`] to
//! draw on each frame. [`pixel_canvas::PixelCanvas`] is a ready-made in-memory canvas for hosts
//! that don't have their own.

pub mod body;
pub mod canvas;
pub mod colour;
pub mod debounce;
pub mod errors;
pub mod force;
pub mod params;
pub mod particle;
pub mod pixel_canvas;
pub mod snapshot;
pub mod vector;
pub mod world;

/// Builders shared by unit and end-to-end tests.
pub mod tests {
    pub mod helpers;
}
