//! Forces push particles away. There's one that follows the pointer, the rest wander in
//! Lissajous-style curves over the canvas.

use crate::body::{Body, Environment};
use crate::canvas::Canvas;
use crate::colour::rgba;
use crate::vector::{random_range, Vector2};

/// Diameter of a force when it's drawn in debug mode.
pub const FORCE_SIZE: f64 = 10.0;

/// How a force decides where to be.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum ForceKind {
    /// Follows the pointer.
    Pointer,
    /// Oscillates around the canvas, driven by the world's phase counter.
    Oscillator {
        /// Horizontal frequency multiplier
        x_factor: f64,
        /// Vertical frequency multiplier
        y_factor: f64,
    },
}

/// A source of repulsion.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Force {
    /// Current position
    pub pos: Vector2,
    /// Diameter when drawn
    pub size: f64,
    /// What drives this force's movement
    pub kind: ForceKind,
}

impl Force {
    /// The force that follows the pointer, starting at the origin.
    #[must_use]
    pub const fn pointer() -> Self {
        Self::pointer_at(Vector2::ZERO)
    }

    /// A pointer force starting somewhere specific.
    #[must_use]
    pub const fn pointer_at(pos: Vector2) -> Self {
        Self {
            pos,
            size: FORCE_SIZE,
            kind: ForceKind::Pointer,
        }
    }

    /// An autonomous force with the given frequencies.
    #[must_use]
    pub const fn oscillator(x_factor: f64, y_factor: f64) -> Self {
        Self {
            pos: Vector2::ZERO,
            size: FORCE_SIZE,
            kind: ForceKind::Oscillator { x_factor, y_factor },
        }
    }

    /// An autonomous force with random frequencies.
    pub fn random_oscillator<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self::oscillator(random_range(rng, 0.1, 0.5), random_range(rng, 0.5, 1.0))
    }

    /// Does this force follow the pointer?
    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        matches!(self.kind, ForceKind::Pointer)
    }

    /// Where an autonomous force is for a given phase. Horizontally it stays between the
    /// `force_left` and `force_right` fractions of the width, vertically it covers the whole height.
    #[must_use]
    pub fn oscillator_position(
        x_factor: f64,
        y_factor: f64,
        environment: &Environment<'_>,
    ) -> Vector2 {
        let params = environment.params;
        let x_phase = (environment.counter * x_factor).rem_euclid(std::f64::consts::TAU);
        let y_phase = (environment.counter * y_factor).rem_euclid(std::f64::consts::TAU);

        let left = environment.width * params.force_left;
        let right = environment.width * params.force_right;

        Vector2::new(
            left + (right - left) * (1.0 + x_phase.sin()) / 2.0,
            environment.height * (1.0 + y_phase.sin()) / 2.0,
        )
    }
}

impl Body for Force {
    fn update(&mut self, _dt: f64, environment: &Environment<'_>) -> bool {
        self.pos = match self.kind {
            ForceKind::Pointer => environment.pointer,
            ForceKind::Oscillator { x_factor, y_factor } => {
                Self::oscillator_position(x_factor, y_factor, environment)
            }
        };
        true
    }

    fn render(&mut self, canvas: &mut dyn Canvas, environment: &Environment<'_>) {
        if !environment.params.debug {
            return;
        }

        let red = if self.is_pointer() { 255 } else { 0 };
        canvas.fill_circle(self.pos.x, self.pos.y, self.size / 2.0, rgba(red, 0, 0, 0.5));
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests aren't so strict")]
mod test {
    use super::*;
    use crate::params::Parameters;
    use crate::pixel_canvas::{PixelCanvas, BLANK};
    use crate::tests::helpers::{CANVAS_HEIGHT, CANVAS_WIDTH};

    #[test]
    fn pointer_force_follows_the_pointer() {
        let params = Parameters::default();
        let environment = Environment {
            pointer: Vector2::new(12.0, 34.0),
            ..Environment::new(CANVAS_WIDTH, CANVAS_HEIGHT, &params)
        };
        let mut force = Force::pointer();
        assert!(force.update(16.0, &environment));
        assert_eq!(force.pos, Vector2::new(12.0, 34.0));
    }

    #[test]
    fn random_oscillators_have_bounded_frequencies() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let force = Force::random_oscillator(&mut rng);
            let ForceKind::Oscillator { x_factor, y_factor } = force.kind else {
                panic!("Not an oscillator");
            };
            assert!((0.1..0.5).contains(&x_factor));
            assert!((0.5..1.0).contains(&y_factor));
        }
    }

    #[test]
    fn oscillators_stay_in_their_band() {
        let params = Parameters::default();
        let left = CANVAS_WIDTH * params.force_left;
        let right = CANVAS_WIDTH * params.force_right;
        let mut force = Force::oscillator(0.37, 0.81);

        let mut counter = 0.0;
        for _ in 0..10_000 {
            let environment = Environment {
                counter,
                ..Environment::new(CANVAS_WIDTH, CANVAS_HEIGHT, &params)
            };
            force.update(16.0, &environment);
            assert!(force.pos.x >= left - 1e-9 && force.pos.x <= right + 1e-9);
            assert!(force.pos.y >= -1e-9 && force.pos.y <= CANVAS_HEIGHT + 1e-9);
            counter += params.force_speed * 7.0;
        }
    }

    #[test]
    fn oscillators_start_in_the_middle() {
        let params = Parameters::default();
        let environment = Environment::new(CANVAS_WIDTH, CANVAS_HEIGHT, &params);
        let position = Force::oscillator_position(0.3, 0.7, &environment);
        let left = CANVAS_WIDTH * params.force_left;
        let right = CANVAS_WIDTH * params.force_right;
        assert!((position.x - (left + right) / 2.0).abs() < 1e-9);
        assert!((position.y - CANVAS_HEIGHT / 2.0).abs() < 1e-9);
    }

    #[test]
    fn only_drawn_when_debugging() {
        let mut params = Parameters::default();
        params.debug = false;
        let environment = Environment::new(20.0, 20.0, &params);
        let mut canvas = PixelCanvas::new(20, 20).unwrap();
        let mut force = Force::pointer_at(Vector2::new(10.0, 10.0));

        force.render(&mut canvas, &environment);
        assert_eq!(canvas.pixel(10, 10).unwrap(), BLANK);

        params.debug = true;
        let environment = Environment::new(20.0, 20.0, &params);
        force.render(&mut canvas, &environment);
        assert_ne!(canvas.pixel(10, 10).unwrap(), BLANK);
    }
}
