//! The task that owns the world. It's the only place the simulation is ever touched, so none of
//! it needs locking.

use std::sync::Arc;
use std::time::Instant;

use color_eyre::eyre::Result;
use driftfield_engine::pixel_canvas::PixelCanvas;
use driftfield_engine::world::World;

use crate::config::input::KeybindingAction;
use crate::shared_state::{SharedState, TTYSize};
use crate::surface::Surface;

/// The size of the virtual canvas for a terminal of the given size. Each cell is two half-block
/// pixels, each of which is a square of `pixel_scale` virtual pixels.
pub(crate) fn canvas_size(tty_size: TTYSize, pixel_scale: u16) -> (usize, usize) {
    let scale = usize::from(pixel_scale.max(1));
    (
        usize::from(tty_size.width) * scale,
        usize::from(tty_size.height) * 2 * scale,
    )
}

/// The centre of a cell's block of virtual pixels. Terminal mouse coordinates are 1-based.
pub(crate) fn pointer_position(x: u16, y: u16, pixel_scale: u16) -> (f64, f64) {
    let scale = f64::from(pixel_scale.max(1));
    let col = f64::from(x.saturating_sub(1));
    let row = f64::from(y.saturating_sub(1));
    ((col + 0.5) * scale, (row * 2.0 + 1.0) * scale)
}

/// The simulation and the canvas it draws onto.
pub(crate) struct Simulation {
    /// Shared app state
    state: Arc<SharedState>,
    /// Every particle and force
    world: World,
    /// The virtual canvas the world draws onto
    canvas: PixelCanvas,
    /// Where finished frames are sent for rendering
    frames_tx: tokio::sync::mpsc::Sender<Surface>,
    /// The terminal size that the canvas was made for
    tty_size: TTYSize,
    /// Virtual pixels per half-block pixel
    pixel_scale: u16,
    /// Target frames per second
    frame_rate: u32,
    /// Where snapshots are saved
    snapshot_path: std::path::PathBuf,
    /// When the last frame started
    last_frame_tick: Instant,
    /// Whether the left mouse button was down at the last mouse event
    is_left_button_down: bool,
}

impl Simulation {
    /// Instantiate, with a running world sized to the user's terminal.
    pub async fn new(
        state: Arc<SharedState>,
        frames_tx: tokio::sync::mpsc::Sender<Surface>,
    ) -> Result<Self> {
        let tty_size = state.get_tty_size().await;
        let config = state.config.read().await.clone();
        let (width, height) = canvas_size(tty_size, config.pixel_scale);
        let canvas = PixelCanvas::new(width, height)?;

        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Canvas sizes are small"
        )]
        let mut world = World::new(width as f64, height as f64, config.simulation);
        world.start(Instant::now());

        Ok(Self {
            state,
            world,
            canvas,
            frames_tx,
            tty_size,
            pixel_scale: config.pixel_scale,
            frame_rate: config.frame_rate,
            snapshot_path: config.snapshot_path,
            last_frame_tick: Instant::now(),
            is_left_button_down: false,
        })
    }

    /// Our main entrypoint.
    pub async fn start(
        state: Arc<SharedState>,
        frames_tx: tokio::sync::mpsc::Sender<Surface>,
    ) -> Result<()> {
        let mut protocol = state.protocol_tx.subscribe();
        let mut simulation = Self::new(state, frames_tx).await?;

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "This is caused by the `tokio::select!`"
        )]
        loop {
            tokio::select! {
                () = simulation.sleep_until_next_frame_tick() => {
                    simulation.render().await?;
                },
                Ok(message) = protocol.recv() => {
                    if matches!(message, crate::run::Protocol::End) {
                        break;
                    }
                    simulation.handle_protocol_message(message).await?;
                }
            }
        }

        tracing::debug!("Leaving simulation loop");
        Ok(())
    }

    /// Sleep until the next frame render is due.
    async fn sleep_until_next_frame_tick(&mut self) {
        crate::utils::sleep_until_next_frame_tick(&mut self.last_frame_tick, self.frame_rate)
            .await;
    }

    /// Advance the world a frame and send it off to be rendered.
    async fn render(&mut self) -> Result<()> {
        let Some(stats) = self.world.step(Instant::now(), &mut self.canvas) else {
            return Ok(());
        };
        tracing::trace!("Frame: {stats:?}");

        let surface = Surface::from_canvas(
            &mut self.canvas,
            usize::from(self.tty_size.width),
            usize::from(self.tty_size.height),
            usize::from(self.pixel_scale),
        )?;
        if self.frames_tx.send(surface).await.is_err() {
            tracing::debug!("Renderer has gone, dropping frame");
        }

        Ok(())
    }

    /// Handle messages from the global Driftfield protocol.
    async fn handle_protocol_message(&mut self, message: crate::run::Protocol) -> Result<()> {
        match message {
            crate::run::Protocol::Resize { width, height } => {
                self.resize(TTYSize { width, height }, self.pixel_scale)?;
            }
            crate::run::Protocol::Input(event) => self.handle_input(&event).await,
            crate::run::Protocol::Config(config) => {
                self.frame_rate = config.frame_rate;
                self.snapshot_path = config.snapshot_path;
                if config.pixel_scale != self.pixel_scale {
                    self.resize(self.tty_size, config.pixel_scale)?;
                }
                self.world
                    .apply_parameters(config.simulation, Instant::now());
            }
            crate::run::Protocol::End | crate::run::Protocol::Notice(_) => (),
        }

        Ok(())
    }

    /// Remake the canvas for a new terminal or pixel size. The world reseeds itself to fit.
    ///
    /// A terminal with no area is ignored, the last good canvas and world carry on until the
    /// terminal is given some room again.
    fn resize(&mut self, tty_size: TTYSize, pixel_scale: u16) -> Result<()> {
        let (width, height) = canvas_size(tty_size, pixel_scale);
        if width == 0 || height == 0 {
            tracing::warn!(
                "Ignoring resize to a {}x{} terminal",
                tty_size.width,
                tty_size.height
            );
            return Ok(());
        }
        self.canvas.resize(width, height)?;
        self.tty_size = tty_size;
        self.pixel_scale = pixel_scale;

        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Canvas sizes are small"
        )]
        let (world_width, world_height) = (width as f64, height as f64);
        self.world.resize(world_width, world_height, Instant::now());

        Ok(())
    }

    /// Turn keyboard and mouse events into actions on the world.
    async fn handle_input(&mut self, event: &termwiz::input::InputEvent) {
        #[expect(
            clippy::wildcard_enum_match_arm,
            reason = "We only care about keyboard and mouse events"
        )]
        match event {
            termwiz::input::InputEvent::Key(key_event) => {
                if crate::config::input::is_interrupt(key_event) {
                    self.perform(KeybindingAction::Quit).await;
                    return;
                }

                let keybindings = self.state.keybindings.read().await;
                let maybe_action = crate::config::input::find_action(&keybindings, key_event);
                drop(keybindings);
                if let Some(action) = maybe_action {
                    self.perform(action).await;
                }
            }
            termwiz::input::InputEvent::Mouse(mouse) => {
                let (x, y) = pointer_position(mouse.x, mouse.y, self.pixel_scale);
                self.world.set_pointer(x, y);

                let is_left_button_down = mouse
                    .mouse_buttons
                    .contains(termwiz::input::MouseButtons::LEFT);
                if is_left_button_down && !self.is_left_button_down {
                    self.world.trigger_burst(Instant::now());
                }
                self.is_left_button_down = is_left_button_down;
            }
            _ => (),
        }
    }

    /// Carry out a user-triggered action.
    async fn perform(&mut self, action: KeybindingAction) {
        tracing::debug!("Performing action: {action:?}");
        let now = Instant::now();
        match action {
            KeybindingAction::ToggleDebug => self.world.toggle_debug(),
            KeybindingAction::TogglePause => self.world.toggle_pause(now),
            KeybindingAction::Reseed => self.world.request_reset(now),
            KeybindingAction::Snapshot => self.save_snapshot().await,
            KeybindingAction::Quit => crate::run::broadcast_protocol_end(&self.state.protocol_tx),
        }
    }

    /// Write the world as an SVG. Failing to write isn't fatal, the user is just told about it.
    async fn save_snapshot(&mut self) {
        let document = self.world.snapshot_svg();
        let path = self.snapshot_path.clone();
        let notice = match tokio::fs::write(&path, document).await {
            Ok(()) => {
                tracing::info!("Snapshot saved to {}", path.display());
                format!("Snapshot saved to {}", path.display())
            }
            Err(error) => {
                tracing::error!("Saving snapshot to {}: {error:?}", path.display());
                format!("Couldn't save snapshot: {error}")
            }
        };
        self.state.send(crate::run::Protocol::Notice(notice));
    }
}
