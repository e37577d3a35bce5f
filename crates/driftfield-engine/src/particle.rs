//! A particle: pushed around by the forces, always pulled back towards its home.

use crate::body::{Body, Environment};
use crate::canvas::{scoped, Canvas};
use crate::colour::{Fill, ParticleColour};
use crate::params::Parameters;
use crate::vector::{canvas_fraction, random_int_range, random_range, sign, Vector2};

/// Radians of spin per millisecond.
pub const ROTATION_RATE: f64 = 0.001;

/// How much stronger the pull home is than any single force.
pub const HOME_STRENGTH: f64 = 8.0;

/// Added to the distance from home, so that the pull is finite even when a particle is at home.
pub const HOME_DISTANCE_FLOOR: f64 = 0.1;

/// Lightest possible particle, as a multiplier of the base mass.
pub const MIN_MASS: f64 = 0.1;

/// Heaviest possible particle, as a multiplier of the base mass.
pub const MAX_MASS: f64 = 1.0;

/// A single square of the cloud.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Where the particle wants to be. Never changes.
    home: Vector2,
    /// Side length. Never changes.
    size: f64,
    /// Sensitivity to forces. Never changes.
    mass: f64,
    /// Current position
    pub pos: Vector2,
    /// Current velocity, in pixels per frame
    pub vel: Vector2,
    /// Current spin, in radians
    pub angle: f64,
    /// Colour derived from the most recent visible update
    colour: ParticleColour,
    /// The colour last turned into a fill, so that conversion only happens on change
    last_colour: Option<String>,
    /// The fill to draw with
    fill: Fill,
}

impl Particle {
    /// A stationary particle sitting at its home.
    #[must_use]
    pub fn new(home: Vector2, size: f64, mass: f64) -> Self {
        let colour = ParticleColour::default();
        Self {
            home,
            size,
            mass,
            pos: home,
            vel: Vector2::ZERO,
            angle: 0.0,
            colour,
            last_colour: None,
            fill: colour.to_fill(),
        }
    }

    /// A particle at a random home in the spawn cloud, the right-hand `particle_space` fraction
    /// of the canvas, shifted by `particle_x_offset`.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "Pixel coordinates are small whole numbers"
    )]
    pub fn spawn<R: rand::Rng + ?Sized>(
        rng: &mut R,
        params: &Parameters,
        width: f64,
        height: f64,
    ) -> Self {
        let cloud_left = (width * (1.0 - params.particle_space)).floor();
        let inset = random_int_range(rng, 0, 100);
        let cloud_right = (width - cloud_left) as i64 - inset;
        let x = cloud_left + random_int_range(rng, inset, cloud_right) as f64;
        let y = random_int_range(rng, 0, height as i64) as f64;

        let size = random_int_range(
            rng,
            i64::from(params.particle_min_size),
            i64::from(params.particle_max_size),
        ) as f64;
        let mass = random_range(rng, MIN_MASS, MAX_MASS);

        Self::new(Vector2::new(x + params.particle_x_offset, y), size, mass)
    }

    /// The position the particle is always pulled back towards.
    #[must_use]
    pub const fn home(&self) -> Vector2 {
        self.home
    }

    /// Side length of the particle's square.
    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size
    }

    /// Sensitivity to forces.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// The colour from the most recent visible update.
    #[must_use]
    pub const fn colour(&self) -> ParticleColour {
        self.colour
    }

    /// The velocity change caused by a single force.
    fn push_from(&self, force: Vector2, strength: f64, environment: &Environment<'_>) -> Vector2 {
        let distance = canvas_fraction(self.pos - force, environment.width, environment.height);
        // Deliberately unguarded, a particle exactly on a force gets NaN.
        let normalised = distance / distance.length();
        Vector2::new(
            strength * normalised.x * normalised.x * sign(distance.x),
            strength
                * normalised.y
                * normalised.y
                * environment.params.force_y_multiplier
                * sign(distance.y),
        )
    }

    /// The velocity change caused by the pull home.
    fn pull_home(&self, strength: f64, environment: &Environment<'_>) -> Vector2 {
        let distance =
            canvas_fraction(self.pos - self.home, environment.width, environment.height);
        let normalised = distance / (distance.length() + HOME_DISTANCE_FLOOR);
        let strength = HOME_STRENGTH * strength;
        Vector2::new(
            strength * normalised.x * normalised.x * sign(distance.x),
            strength
                * normalised.y
                * normalised.y
                * environment.params.force_y_multiplier
                * sign(distance.y),
        )
    }
}

impl Body for Particle {
    fn update(&mut self, dt: f64, environment: &Environment<'_>) -> bool {
        let params = environment.params;
        self.angle += ROTATION_RATE * dt;

        let strength = params.force_mass * environment.particle_mass() * self.mass;
        for force in environment.forces {
            self.vel += self.push_from(force.pos, strength, environment);
        }
        self.vel -= self.pull_home(strength, environment);

        self.vel *= Vector2::new(params.x_friction, params.y_friction);
        // Not scaled by `dt`: speed is tied to the frame rate.
        self.pos += self.vel;

        if !params.offscreen_render && !environment.is_within_margin(self.pos) {
            return false;
        }

        let speed = self.vel.x.abs() + self.vel.y.abs();
        self.colour = ParticleColour::from_speed(speed);
        true
    }

    fn render(&mut self, canvas: &mut dyn Canvas, environment: &Environment<'_>) {
        let css = self.colour.to_css();
        if self.last_colour.as_deref() != Some(css.as_str()) {
            self.fill = self.colour.to_fill();
            self.last_colour = Some(css);
        }

        let size = self.size;
        let half = size / 2.0;
        let fill = self.fill;
        if environment.params.particle_rotation {
            let (pos, angle) = (self.pos, self.angle);
            scoped(canvas, |local| {
                local.translate(pos.x, pos.y);
                local.rotate(angle);
                local.fill_rect(-half, -half, size, size, fill);
            });
        } else {
            canvas.fill_rect(self.pos.x - half, self.pos.y - half, size, size, fill);
        }
    }
}
