//! Render the simulation's frames to the user's terminal

use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::sync::mpsc;

use termwiz::surface::Change as TermwizChange;
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal as TermwizTerminal};

use crate::shared_state::SharedState;
use crate::surface::Surface;

/// How long a notice stays on screen.
const NOTICE_DURATION: std::time::Duration = std::time::Duration::from_secs(3);

/// How often to check for a resized terminal when no frames are arriving, eg when paused.
const RESIZE_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(250);

/// `Render`
pub(crate) struct Renderer {
    /// Shared app state
    pub state: Arc<SharedState>,
    /// The terminal's width
    pub width: u16,
    /// The terminal's height
    pub height: u16,
    /// The most recent message for the user, and when it arrived
    notice: Option<(String, std::time::Instant)>,
}

impl Renderer {
    /// Create a renderer to render to a user's terminal
    pub fn new(state: Arc<SharedState>) -> Result<Self> {
        let size = Self::get_users_tty_size()?;
        Ok(Self {
            state,
            width: size.cols.try_into()?,
            height: size.rows.try_into()?,
            notice: None,
        })
    }

    /// Instantiate and run
    pub fn start(
        state: Arc<SharedState>,
        frames_rx: mpsc::Receiver<Surface>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let result = match Self::new(Arc::clone(&state)) {
                Ok(mut renderer) => {
                    renderer
                        .run(frames_rx, protocol_rx, protocol_tx.clone())
                        .await
                }
                Err(error) => Err(error),
            };

            if result.is_err() {
                crate::run::broadcast_protocol_end(&protocol_tx);
            }
            result
        })
    }

    /// We need this just because I can't figure out how to pass `Box<dyn Terminal>` to
    /// `BufferedTerminal::new()`
    fn get_termwiz_terminal() -> Result<impl TermwizTerminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// Just for initialisation
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        let mut terminal = Self::get_termwiz_terminal()?;
        Ok(terminal.get_screen_size()?)
    }

    /// Get the user's current terminal size and propogate it
    pub async fn handle_resize<T: TermwizTerminal + Send>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        let is_resized = terminal.check_for_resize()?;
        if !is_resized {
            return Ok(());
        }

        terminal.repaint()?;

        let (width, height) = terminal.dimensions();
        self.width = width.try_into()?;
        self.height = height.try_into()?;
        tracing::debug!("Terminal resized to {}x{}", self.width, self.height);
        self.state.set_tty_size(self.width, self.height).await;
        protocol_tx.send(crate::run::Protocol::Resize {
            width: self.width,
            height: self.height,
        })?;

        Ok(())
    }

    /// Listen for frames from the simulation. It lives in its own method so that we can catch
    /// any errors and ensure that the user's terminal is always returned to cooked mode.
    async fn run(
        &mut self,
        mut frames: mpsc::Receiver<Surface>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        tracing::debug!("Putting user's terminal into raw mode");
        let mut users_terminal = Self::get_termwiz_terminal()?;
        users_terminal.set_raw_mode()?;
        users_terminal.enter_alternate_screen()?;
        let mut terminal = BufferedTerminal::new(users_terminal)?;
        Self::cursor_visibility(&mut terminal, false)?;

        let result = self
            .render_loop(&mut terminal, &mut frames, &mut protocol_rx, &protocol_tx)
            .await;

        tracing::debug!("Setting user's terminal to cooked mode");
        Self::cursor_visibility(&mut terminal, true)?;
        terminal.terminal().exit_alternate_screen()?;
        terminal.terminal().set_cooked_mode()?;

        result
    }

    /// Render every frame that arrives, until the protocol says to stop.
    async fn render_loop<T: TermwizTerminal + Send>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        frames: &mut mpsc::Receiver<Surface>,
        protocol_rx: &mut tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        let mut resize_check = tokio::time::interval(RESIZE_CHECK_INTERVAL);

        tracing::debug!("Starting render loop");
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "`tokio::select! generates this.`"
        )]
        loop {
            tokio::select! {
                Some(frame) = frames.recv() => {
                    self.handle_resize(terminal, protocol_tx).await?;
                    self.render(&frame, terminal)?;
                }
                _ = resize_check.tick() => {
                    self.handle_resize(terminal, protocol_tx).await?;
                }
                Ok(message) = protocol_rx.recv() => {
                    match message {
                        crate::run::Protocol::End => break,
                        crate::run::Protocol::Notice(text) => {
                            tracing::debug!("Notice: {text}");
                            self.notice = Some((text, std::time::Instant::now()));
                        }
                        crate::run::Protocol::Resize { .. }
                        | crate::run::Protocol::Input(_)
                        | crate::run::Protocol::Config(_) => (),
                    }
                }
            }
        }
        tracing::debug!("Exited render loop");

        Ok(())
    }

    /// Hide/show the cursor in the end user's terminal.
    fn cursor_visibility(
        terminal: &mut BufferedTerminal<impl TermwizTerminal>,
        is_visible: bool,
    ) -> Result<()> {
        let cursor_visibility = if is_visible {
            termwiz::surface::CursorVisibility::Visible
        } else {
            termwiz::surface::CursorVisibility::Hidden
        };
        terminal.add_change(TermwizChange::CursorVisibility(cursor_visibility));
        terminal.flush()?;

        Ok(())
    }

    /// The current notice, if it hasn't expired.
    fn active_notice(&mut self) -> Option<&str> {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, arrived)| arrived.elapsed() > NOTICE_DURATION)
        {
            self.notice = None;
        }
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    /// Do a single render to the user's actual terminal. It uses a diffing algorithm to make
    /// the minimum number of changes.
    fn render(
        &mut self,
        frame: &Surface,
        terminal: &mut BufferedTerminal<impl TermwizTerminal>,
    ) -> Result<()> {
        let (width, height) = (usize::from(self.width), usize::from(self.height));
        if frame.width != width || frame.height != height {
            tracing::trace!("Dropping frame made for a different terminal size");
            return Ok(());
        }

        let mut composited = Surface::new(width, height);
        composited.surface.draw_from_screen(&frame.surface, 0, 0);
        if let Some(notice) = self.active_notice() {
            composited.add_text(
                0,
                height.saturating_sub(1),
                notice,
                Some(crate::surface::BLACK),
                Some(crate::surface::WHITE),
            );
        }

        // This is where we actually render to the user's real terminal.
        terminal.draw_from_screen(&composited.surface, 0, 0);
        terminal.flush()?;

        Ok(())
    }
}
