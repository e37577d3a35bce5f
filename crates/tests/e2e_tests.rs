//! End to end tests
#[cfg(test)]
mod e2e {
    use std::time::{Duration, Instant};

    use driftfield_engine::{
        canvas::Canvas,
        colour::Fill,
        debounce::{BURST_WINDOW, RESET_DELAY},
        params::Parameter,
        pixel_canvas::{PixelCanvas, BLANK},
        tests::helpers::{quiet_parameters, small_parameters, CANVAS_HEIGHT, CANVAS_WIDTH},
        vector::Vector2,
        world::{SimulationState, World},
    };

    const FRAME: Duration = Duration::from_millis(16);

    fn setup_logging() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "The test canvas dimensions are small whole numbers"
    )]
    fn canvas() -> PixelCanvas {
        PixelCanvas::new(CANVAS_WIDTH as usize, CANVAS_HEIGHT as usize).unwrap()
    }

    /// Draws nothing, so that long runs only cost the physics.
    struct BlankCanvas;

    impl Canvas for BlankCanvas {
        fn width(&self) -> f64 {
            CANVAS_WIDTH
        }

        fn height(&self) -> f64 {
            CANVAS_HEIGHT
        }

        fn fill_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64, _colour: Fill) {}

        fn fill_circle(&mut self, _x: f64, _y: f64, _radius: f64, _colour: Fill) {}

        fn fill_text(&mut self, _x: f64, _y: f64, _text: &str, _colour: Fill) {}

        fn save(&mut self) {}

        fn restore(&mut self) {}

        fn translate(&mut self, _x: f64, _y: f64) {}

        fn rotate(&mut self, _radians: f64) {}
    }

    fn started_world(params: driftfield_engine::params::Parameters) -> (World, Instant) {
        let now = Instant::now();
        let mut world = World::new(CANVAS_WIDTH, CANVAS_HEIGHT, params);
        world.start(now);
        (world, now)
    }

    /// Run `frames` frames, 16ms apart, returning the time of the last one.
    fn run_frames(
        world: &mut World,
        canvas: &mut PixelCanvas,
        mut now: Instant,
        frames: usize,
    ) -> Instant {
        for _ in 0..frames {
            now += FRAME;
            world.step(now, canvas);
        }
        now
    }

    #[test]
    fn a_headless_run() {
        setup_logging();
        let (mut world, mut now) = started_world(small_parameters(300, 2));
        let mut canvas = canvas();

        let mut last = None;
        for _ in 0..120 {
            now += FRAME;
            last = world.step(now, &mut canvas);
            let stats = last.unwrap();
            assert!(stats.visible <= stats.total);
            assert_eq!(stats.total, 300);
            assert_eq!(stats.forces, 2);
        }

        let stats = last.unwrap();
        assert!((stats.dt - 16.0).abs() < 1e-9);
        assert!((stats.average_fps - 62.5).abs() < 0.01);
        assert_eq!(world.forces().len(), 3);
        assert!(world.forces()[0].is_pointer());

        let mut drawn = 0;
        for y in 0..canvas.height_px() {
            for x in 0..canvas.width_px() {
                if canvas.pixel(x, y) != Some(BLANK) {
                    drawn += 1;
                }
            }
        }
        assert!(drawn > 0, "Nothing was drawn in 120 frames");
        assert!(!canvas.take_texts().is_empty(), "Debug statistics weren't drawn");
    }

    #[test]
    fn friction_alone_slows_particles_down() {
        let mut params = quiet_parameters();
        params.particle_count = 50;
        params.force_count = 0;
        let (mut world, mut now) = started_world(params);
        let mut canvas = canvas();
        for particle in world.particles_mut() {
            particle.vel = Vector2::new(2.0, -2.0);
        }

        let mut previous = 2.0_f64;
        for _ in 0..100 {
            now = run_frames(&mut world, &mut canvas, now, 1);
            let particle = &world.particles()[0];
            assert!(particle.vel.x.abs() < previous);
            previous = particle.vel.x.abs();
        }

        for particle in world.particles() {
            // 0.99^100 and 0.95^100
            assert!((particle.vel.x - 2.0 * 0.99_f64.powi(100)).abs() < 1e-9);
            assert!(particle.vel.y.abs() < 0.02);
        }
    }

    #[test]
    fn the_pointer_scatters_nearby_particles() {
        let (mut world, now) = started_world(small_parameters(1, 0));

        let home = world.particles()[0].home();
        world.set_pointer(home.x - 5.0, home.y - 5.0);
        let mut canvas = canvas();
        // The pointer force catches up with the pointer during the first frame.
        let now = run_frames(&mut world, &mut canvas, now, 1);
        let before = world.particles()[0].pos;
        run_frames(&mut world, &mut canvas, now, 1);
        let after = world.particles()[0].pos;

        assert!(after.x > before.x);
        assert!(after.y > before.y);
    }

    #[test]
    fn a_lone_particle_settles_beside_its_home() {
        let mut world = World::new(CANVAS_WIDTH, CANVAS_HEIGHT, small_parameters(1, 0));
        world.set_pointer(100.0, 100.0);
        let mut now = Instant::now();
        world.start(now);
        assert_eq!(world.forces().len(), 1);
        assert_eq!(world.forces()[0].pos, Vector2::new(100.0, 100.0));

        let home = world.particles()[0].home();
        assert_eq!(world.particles()[0].pos, home);
        assert_eq!(world.particles()[0].vel, Vector2::ZERO);

        let mut canvas = BlankCanvas;
        now += FRAME;
        let stats = world.step(now, &mut canvas).unwrap();
        assert!((stats.dt - 16.0).abs() < 1e-9);
        let particle = &world.particles()[0];
        assert!((particle.angle - 0.016).abs() < 1e-12);
        // Sitting at home there's no pull, so the only push is away from the pointer.
        assert!(particle.vel.x > 0.0);
        assert!(particle.vel.y * (home.y - 100.0) >= 0.0);

        for _ in 1..2000 {
            now += FRAME;
            world.step(now, &mut canvas);
        }

        // The pull home balances the pointer's push a little way from home, where friction
        // brings the particle to rest.
        let particle = &world.particles()[0];
        let speed = particle.vel.x.abs() + particle.vel.y.abs();
        assert!(speed < 0.01, "Still moving at {speed} after 2000 frames");
        let offset = particle.pos.distance(home);
        assert!((20.0..100.0).contains(&offset), "Settled {offset}px from home");
        assert!(particle.pos.x > home.x);
        assert_eq!(world.forces()[0].pos, Vector2::new(100.0, 100.0));
    }

    #[test]
    fn a_flurry_of_changes_causes_one_reset() {
        let (mut world, mut now) = started_world(small_parameters(20, 1));
        let mut canvas = canvas();
        now = run_frames(&mut world, &mut canvas, now, 3);
        assert_eq!(world.generation(), 1);

        for count in 21..40 {
            now += Duration::from_millis(5);
            world.set_parameter(Parameter::ParticleCount, f64::from(count), now);
            assert!(world.step(now, &mut canvas).is_none());
        }
        assert_eq!(world.state(), SimulationState::Paused);

        now += RESET_DELAY + Duration::from_millis(1);
        assert!(world.step(now, &mut canvas).is_some());
        assert_eq!(world.generation(), 2);
        assert_eq!(world.particles().len(), 39);
        assert_eq!(world.state(), SimulationState::Running);
    }

    #[test]
    fn cosmetic_changes_dont_reset() {
        let (mut world, now) = started_world(small_parameters(20, 1));
        world.set_parameter(Parameter::BlurAmount, 0.5, now);
        world.set_parameter(Parameter::XFriction, 0.9, now);
        assert!(!world.is_reset_pending());
        assert_eq!(world.state(), SimulationState::Running);
        assert_eq!(world.generation(), 1);
    }

    #[test]
    fn bursts_are_throttled_and_decay() {
        let (mut world, mut now) = started_world(small_parameters(20, 1));
        let mut canvas = canvas();

        assert!(world.trigger_burst(now));
        assert!((world.burst_cooldown() - 2.0).abs() < f64::EPSILON);
        assert!(!world.trigger_burst(now + Duration::from_millis(100)));

        now = run_frames(&mut world, &mut canvas, now, 20);
        assert!(world.burst_cooldown().abs() < f64::EPSILON);

        assert!(world.trigger_burst(now + BURST_WINDOW));
    }

    #[test]
    fn resizing_reseeds_into_the_new_bounds() {
        let (mut world, now) = started_world(small_parameters(200, 1));
        let mut canvas = PixelCanvas::new(300, 200).unwrap();

        world.resize(300.0, 200.0, now);
        assert_eq!(world.state(), SimulationState::Paused);
        world.step(now + RESET_DELAY, &mut canvas);

        assert_eq!(world.generation(), 2);
        assert!((world.width() - 300.0).abs() < f64::EPSILON);
        for particle in world.particles() {
            // The spawn cloud's random inset can reach a little past either side of it.
            assert!((200.0..=340.0).contains(&particle.home().x));
            assert!((0.0..=200.0).contains(&particle.home().y));
        }
    }

    #[test]
    fn pausing_freezes_everything() {
        let (mut world, now) = started_world(small_parameters(20, 1));
        let mut canvas = canvas();
        let now = run_frames(&mut world, &mut canvas, now, 5);

        world.toggle_pause(now);
        let positions: Vec<_> = world.particles().iter().map(|particle| particle.pos).collect();
        let counter = world.counter();
        let now = run_frames(&mut world, &mut canvas, now, 5);
        let frozen: Vec<_> = world.particles().iter().map(|particle| particle.pos).collect();
        assert_eq!(positions, frozen);
        assert!((world.counter() - counter).abs() < f64::EPSILON);

        world.toggle_pause(now);
        let stats = world.step(now + FRAME, &mut canvas).unwrap();
        assert!((stats.dt - 16.0).abs() < 1e-9);
    }

    #[test]
    fn snapshots_describe_the_visible_cloud() {
        let (mut world, now) = started_world(small_parameters(40, 1));
        let mut canvas = canvas();
        run_frames(&mut world, &mut canvas, now, 10);

        let on_canvas = world
            .particles()
            .iter()
            .filter(|particle| {
                (0.0..=CANVAS_WIDTH).contains(&particle.pos.x)
                    && (0.0..=CANVAS_HEIGHT).contains(&particle.pos.y)
            })
            .count();
        let document = world.snapshot_svg();

        assert!(document.starts_with("<svg"));
        assert!(document.ends_with("</svg>"));
        assert!(document.contains(r#"width="1200" height="800""#));
        assert_eq!(document.matches("<rect").count(), on_canvas);
        assert_eq!(world.state(), SimulationState::Running);
    }
}
