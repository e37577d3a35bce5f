//! The world owns every particle and force, and advances them all one frame at a time.
//!
//! All timing comes from the caller as [`Instant`]s, so the world itself never reads a clock.
//! That keeps every frame, reset and burst reproducible in tests.

use std::time::Instant;

use crate::body::{Body as _, Environment};
use crate::canvas::Canvas;
use crate::colour::rgba;
use crate::debounce::{Debouncer, Throttle, BURST_WINDOW, RESET_DELAY};
use crate::force::Force;
use crate::params::{Parameter, Parameters};
use crate::particle::Particle;
use crate::vector::Vector2;

/// The frame rate assumed before any frames have been measured.
pub const INITIAL_AVERAGE_FPS: f64 = 60.0;

/// How much of the previous average survives each new FPS sample.
pub const FPS_SMOOTHING: f64 = 0.9;

/// The burst cooldown set by an accepted burst.
pub const BURST_COOLDOWN: f64 = 2.0;

/// Milliseconds of frame time per unit of burst cooldown.
pub const BURST_DECAY_MS: f64 = 100.0;

/// Where the debug readout is drawn.
pub const DEBUG_TEXT_POSITION: (f64, f64) = (10.0, 20.0);

/// The lifecycle of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SimulationState {
    /// No population has been built yet.
    Uninitialised,
    /// Frames advance the simulation.
    Running,
    /// Frames do nothing.
    Paused,
}

/// What happened in a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct FrameStats {
    /// Milliseconds since the previous frame
    pub dt: f64,
    /// The instantaneous frame rate, if it could be measured
    pub fps: Option<f64>,
    /// The smoothed frame rate
    pub average_fps: f64,
    /// How many particles were drawn
    pub visible: usize,
    /// How many particles exist
    pub total: usize,
    /// The number of autonomous forces
    pub forces: usize,
}

/// The whole simulation.
#[derive(Debug)]
pub struct World {
    /// Canvas width
    width: f64,
    /// Canvas height
    height: f64,
    /// The current tunables
    params: Parameters,
    /// Every particle, rebuilt on reset
    particles: Vec<Particle>,
    /// The pointer force followed by the autonomous ones, rebuilt on reset
    forces: Vec<Force>,
    /// Where in the lifecycle we are
    state: SimulationState,
    /// When the last frame ran
    last_tick: Option<Instant>,
    /// Smoothed frame rate
    average_fps: f64,
    /// Phase accumulator for the autonomous forces
    counter: f64,
    /// While above zero, particles are lighter and so scatter further
    burst_cooldown: f64,
    /// Stops bursts from being triggered too often
    burst_throttle: Throttle,
    /// Last known pointer position
    pointer: Vector2,
    /// Coalesces reset requests
    reset_debouncer: Debouncer,
    /// Counts how many times the population has been built
    generation: u64,
}

impl World {
    /// A world with no population yet. Call [`World::start`] to build one.
    #[must_use]
    pub fn new(width: f64, height: f64, params: Parameters) -> Self {
        Self {
            width,
            height,
            params: params.clamped(),
            particles: Vec::new(),
            forces: Vec::new(),
            state: SimulationState::Uninitialised,
            last_tick: None,
            average_fps: INITIAL_AVERAGE_FPS,
            counter: 0.0,
            burst_cooldown: 0.0,
            burst_throttle: Throttle::new(BURST_WINDOW),
            pointer: Vector2::ZERO,
            reset_debouncer: Debouncer::new(RESET_DELAY),
            generation: 0,
        }
    }

    /// Build the first population and start running. Does nothing if already started.
    pub fn start(&mut self, now: Instant) {
        if self.state == SimulationState::Uninitialised {
            self.reseed(now);
        }
    }

    /// Advance one frame and draw it. Returns `None` when the world isn't running.
    ///
    /// Any reset that has become due is carried out first.
    pub fn step(&mut self, now: Instant, canvas: &mut dyn Canvas) -> Option<FrameStats> {
        if self.reset_debouncer.fire(now) {
            self.reseed(now);
        }
        if self.state != SimulationState::Running {
            return None;
        }

        let dt = self.last_tick.map_or(0.0, |last| {
            now.saturating_duration_since(last).as_secs_f64() * 1000.0
        });
        let fps = (dt > 0.0).then(|| 1000.0 / dt);
        if let Some(sample) = fps {
            self.average_fps =
                self.average_fps * FPS_SMOOTHING + sample * (1.0 - FPS_SMOOTHING);
        }

        #[expect(
            clippy::as_conversions,
            clippy::cast_possible_truncation,
            reason = "Alpha doesn't need double precision"
        )]
        let trail = rgba(255, 255, 255, (1.0 - self.params.blur_amount) as f32);
        canvas.fill_rect(0.0, 0.0, self.width, self.height, trail);

        if self.params.debug {
            self.draw_guides(canvas);
        }

        let is_bursting = self.burst_cooldown > 0.0;
        let visible = self.advance_particles(dt, is_bursting, canvas);
        self.advance_forces(dt, is_bursting, canvas);

        let stats = FrameStats {
            dt,
            fps,
            average_fps: self.average_fps,
            visible,
            total: self.particles.len(),
            forces: self.params.force_count,
        };

        if self.params.debug {
            let (x, y) = DEBUG_TEXT_POSITION;
            canvas.fill_text(x, y, &self.debug_text(&stats), rgba(0, 0, 0, 1.0));
        }

        if self.burst_cooldown > 0.0 {
            self.burst_cooldown = (self.burst_cooldown - dt / BURST_DECAY_MS).max(0.0);
        }
        self.last_tick = Some(now);
        self.counter += self.params.force_speed;

        Some(stats)
    }

    /// Update every particle, drawing the visible ones. Returns how many were drawn.
    fn advance_particles(&mut self, dt: f64, is_bursting: bool, canvas: &mut dyn Canvas) -> usize {
        let environment = Environment {
            pointer: self.pointer,
            counter: self.counter,
            is_bursting,
            ..Environment::new(self.width, self.height, &self.params)
        }
        .with_forces(&self.forces);

        let mut visible = 0;
        for particle in self.particles.iter_mut().rev() {
            if particle.update(dt, &environment) {
                particle.render(canvas, &environment);
                visible += 1;
            }
        }
        visible
    }

    /// Move every force, then draw it.
    fn advance_forces(&mut self, dt: f64, is_bursting: bool, canvas: &mut dyn Canvas) {
        let environment = Environment {
            pointer: self.pointer,
            counter: self.counter,
            is_bursting,
            ..Environment::new(self.width, self.height, &self.params)
        };

        for force in self.forces.iter_mut().rev() {
            force.update(dt, &environment);
            force.render(canvas, &environment);
        }
    }

    /// Faint vertical lines showing the forces' band and the left edge of the spawn cloud.
    fn draw_guides(&self, canvas: &mut dyn Canvas) {
        let guides = [
            (self.params.force_left, rgba(0, 255, 0, 0.1)),
            (self.params.force_right, rgba(0, 0, 255, 0.1)),
            (1.0 - self.params.particle_space, rgba(255, 0, 0, 0.1)),
        ];
        for (fraction, colour) in guides {
            canvas.fill_rect(self.width * fraction - 0.5, 0.0, 1.0, self.height, colour);
        }
    }

    /// The single line of statistics shown in debug mode.
    fn debug_text(&self, stats: &FrameStats) -> String {
        format!(
            "{:.2} FPS | {:.0} ms | {}/{} visible particles | {} force(s) | X:{:.0} Y:{:.0}",
            stats.average_fps,
            stats.dt,
            stats.visible,
            stats.total,
            stats.forces,
            self.pointer.x,
            self.pointer.y
        )
    }

    /// Throw away the population and build a fresh one from the current parameters.
    fn reseed(&mut self, now: Instant) {
        self.state = SimulationState::Paused;
        self.reset_debouncer.cancel();

        let mut rng = rand::thread_rng();
        self.forces = std::iter::once(Force::pointer_at(self.pointer))
            .chain((0..self.params.force_count).map(|_| Force::random_oscillator(&mut rng)))
            .collect();
        self.particles = (0..self.params.particle_count)
            .map(|_| Particle::spawn(&mut rng, &self.params, self.width, self.height))
            .collect();

        self.last_tick = Some(now);
        self.generation += 1;
        self.state = SimulationState::Running;

        tracing::debug!(
            "Reseeded generation {}: {} particles, {} forces, {}x{}",
            self.generation,
            self.particles.len(),
            self.forces.len(),
            self.width,
            self.height
        );
    }

    /// Pause now, and rebuild the population once requests stop arriving.
    pub fn request_reset(&mut self, now: Instant) {
        self.state = SimulationState::Paused;
        self.reset_debouncer.schedule(now);
    }

    /// Change a single parameter. Returns the value actually stored after clamping.
    ///
    /// Parameters that shape the population pause the world and request a reset.
    pub fn set_parameter(&mut self, parameter: Parameter, value: f64, now: Instant) -> f64 {
        let previous = self.params.get(parameter);
        self.params.set(parameter, value);
        if self.params.particle_max_size < self.params.particle_min_size {
            self.params.particle_max_size = self.params.particle_min_size;
        }
        let stored = self.params.get(parameter);

        tracing::debug!("Parameter {parameter} set to {stored}");
        if parameter.affects_population() && (stored - previous).abs() > f64::EPSILON {
            self.request_reset(now);
        }
        stored
    }

    /// Replace all the parameters at once, eg after the config file changes.
    pub fn apply_parameters(&mut self, params: Parameters, now: Instant) {
        let params = params.clamped();
        let needs_reset = self.params.population_differs(&params);
        self.params = params;
        if needs_reset {
            self.request_reset(now);
        }
    }

    /// The canvas changed size.
    pub fn resize(&mut self, width: f64, height: f64, now: Instant) {
        tracing::debug!("Resizing world to {width}x{height}");
        self.width = width;
        self.height = height;
        self.request_reset(now);
    }

    /// Record where the pointer is.
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer = Vector2::new(x, y);
    }

    /// Make every particle lighter for a short while. Returns whether the burst was accepted.
    pub fn trigger_burst(&mut self, now: Instant) -> bool {
        if self.state != SimulationState::Running {
            return false;
        }
        if !self.burst_throttle.try_acquire(now) {
            return false;
        }
        if self.burst_cooldown <= 0.0 {
            self.burst_cooldown = BURST_COOLDOWN;
        }
        tracing::debug!("Burst triggered");
        true
    }

    /// Flip debug drawing on or off.
    pub fn toggle_debug(&mut self) {
        self.params.debug = !self.params.debug;
    }

    /// Stop advancing frames.
    pub fn pause(&mut self) {
        if self.state == SimulationState::Running {
            self.state = SimulationState::Paused;
        }
    }

    /// Carry on after a pause. The frame clock restarts from `now`, so there's no jump.
    ///
    /// Has no effect while a reset is pending, the reset itself resumes the world.
    pub fn resume(&mut self, now: Instant) {
        if self.state == SimulationState::Paused && !self.reset_debouncer.is_pending() {
            self.last_tick = Some(now);
            self.state = SimulationState::Running;
        }
    }

    /// Pause if running, resume if paused.
    pub fn toggle_pause(&mut self, now: Instant) {
        match self.state {
            SimulationState::Running => self.pause(),
            SimulationState::Paused => self.resume(now),
            SimulationState::Uninitialised => (),
        }
    }

    /// An SVG document of every on-canvas particle. The world is frozen while it's built.
    pub fn snapshot_svg(&mut self) -> String {
        let previous = self.state;
        if previous == SimulationState::Running {
            self.state = SimulationState::Paused;
        }
        let document = crate::snapshot::svg_document(
            &self.particles,
            self.width,
            self.height,
            self.params.particle_rotation,
        );
        self.state = previous;

        tracing::debug!("Snapshot taken of {} particles", self.particles.len());
        document
    }

    /// Where in the lifecycle the world is.
    #[must_use]
    pub const fn state(&self) -> SimulationState {
        self.state
    }

    /// The current tunables.
    #[must_use]
    pub const fn params(&self) -> &Parameters {
        &self.params
    }

    /// Every particle.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Every particle, for moving them around. The population itself can't be changed.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// The pointer force, then the autonomous ones.
    #[must_use]
    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    /// How many times the population has been built.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Remaining burst cooldown.
    #[must_use]
    pub const fn burst_cooldown(&self) -> f64 {
        self.burst_cooldown
    }

    /// The phase accumulator driving the autonomous forces.
    #[must_use]
    pub const fn counter(&self) -> f64 {
        self.counter
    }

    /// The smoothed frame rate.
    #[must_use]
    pub const fn average_fps(&self) -> f64 {
        self.average_fps
    }

    /// The last known pointer position.
    #[must_use]
    pub const fn pointer(&self) -> Vector2 {
        self.pointer
    }

    /// Is a reset waiting for requests to settle?
    #[must_use]
    pub const fn is_reset_pending(&self) -> bool {
        self.reset_debouncer.is_pending()
    }

    /// Canvas width.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Canvas height.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }
}
