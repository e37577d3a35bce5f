//! The capability shared by everything that moves: update once per frame, then maybe render.

use crate::canvas::Canvas;
use crate::force::Force;
use crate::params::Parameters;
use crate::vector::Vector2;

/// The base particle mass used while a burst is active, overriding the configured mass.
pub const BURST_PARTICLE_MASS: f64 = 0.1;

/// A read-only view of the world, as seen by a body during one phase of a frame.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Environment<'world> {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// The simulation's tunables
    pub params: &'world Parameters,
    /// The last known pointer position
    pub pointer: Vector2,
    /// The phase accumulator that drives the autonomous forces
    pub counter: f64,
    /// Whether a burst is currently lowering the particle mass
    pub is_bursting: bool,
    /// The forces that particles are pushed by
    pub forces: &'world [Force],
}

impl<'world> Environment<'world> {
    /// An environment with no forces and no burst, pointer at the origin.
    #[must_use]
    pub const fn new(width: f64, height: f64, params: &'world Parameters) -> Self {
        Self {
            width,
            height,
            params,
            pointer: Vector2::ZERO,
            counter: 0.0,
            is_bursting: false,
            forces: &[],
        }
    }

    /// The same environment, but with the given forces.
    #[must_use]
    pub fn with_forces(self, forces: &'world [Force]) -> Self {
        Self { forces, ..self }
    }

    /// The base particle mass in effect right now.
    #[must_use]
    pub const fn particle_mass(&self) -> f64 {
        if self.is_bursting {
            BURST_PARTICLE_MASS
        } else {
            self.params.particle_mass
        }
    }

    /// Is the position inside the canvas, expanded on every side by the off-screen margin?
    #[must_use]
    pub fn is_within_margin(&self, position: Vector2) -> bool {
        let margin = self.params.offscreen_margin;
        position.x >= -margin
            && position.x <= self.width + margin
            && position.y >= -margin
            && position.y <= self.height + margin
    }
}

/// Anything that moves each frame and can draw itself.
pub trait Body {
    /// Advance by `dt` milliseconds. Returns whether the body should be rendered this frame.
    fn update(&mut self, dt: f64, environment: &Environment<'_>) -> bool;

    /// Draw onto the canvas.
    fn render(&mut self, canvas: &mut dyn Canvas, environment: &Environment<'_>);
}
