//! Shared conveniences for tests, both in this crate and in the end-to-end tests.

use crate::params::Parameters;

/// A canvas wide enough that every spawn position lands inside it.
pub const CANVAS_WIDTH: f64 = 1200.0;

/// The height that goes with [`CANVAS_WIDTH`].
pub const CANVAS_HEIGHT: f64 = 800.0;

/// Default parameters, but with no force strength at all. That also disables the pull home,
/// so only friction acts on particles.
#[must_use]
pub fn quiet_parameters() -> Parameters {
    let mut params = Parameters::default();
    params.force_mass = 0.0;
    params
}

/// Default parameters with a small population, quick to reseed.
#[must_use]
pub fn small_parameters(particles: usize, forces: usize) -> Parameters {
    let mut params = Parameters::default();
    params.particle_count = particles;
    params.force_count = forces;
    params
}
