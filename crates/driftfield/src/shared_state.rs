//! State that more than one task needs to see.
//!
//! The world isn't in here: the simulation task owns it outright. What is shared is the start-up
//! context, the config as last loaded, and the terminal size.

use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::sync::RwLock;

/// Terminal size in cells.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "A terminal only has two dimensions"
)]
pub struct TTYSize {
    /// Columns
    pub width: u16,
    /// Rows
    pub height: u16,
}

/// Everything the tasks share, behind async locks.
#[non_exhaustive]
pub(crate) struct SharedState {
    /// Sender half of the protocol channel, for anyone that needs to talk to every task
    pub protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    /// Parsed CLI arguments, set once during setup
    pub cli_args: RwLock<Option<crate::cli_args::CliArgs>>,
    /// The config directory
    pub config_path: RwLock<std::path::PathBuf>,
    /// The main config's file name, inside the config directory
    pub main_config_file: RwLock<std::path::PathBuf>,
    /// The config as last loaded, with CLI overrides applied
    pub config: RwLock<crate::config::main::Config>,
    /// Keybindings from the config, already turned into key events
    pub keybindings: RwLock<crate::config::input::KeybindingsAsEvents>,
    /// The terminal's size, kept current by the renderer
    pub tty_size: RwLock<TTYSize>,
    /// Whether a log file is being written
    pub is_logging: RwLock<bool>,
}

impl SharedState {
    /// Shared state for a terminal of the given size, with default config.
    pub async fn init(
        width: u16,
        height: u16,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<Arc<Self>> {
        let state = Arc::new(Self {
            protocol_tx,
            cli_args: RwLock::default(),
            config_path: RwLock::default(),
            main_config_file: RwLock::default(),
            config: RwLock::default(),
            keybindings: RwLock::default(),
            tty_size: RwLock::default(),
            is_logging: RwLock::default(),
        });
        state.set_tty_size(width, height).await;
        Ok(state)
    }

    /// Shared state sized to the terminal we're running in.
    pub async fn init_with_users_tty_size(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<Arc<Self>> {
        let size = crate::renderer::Renderer::get_users_tty_size()?;
        Self::init(size.cols.try_into()?, size.rows.try_into()?, protocol_tx).await
    }

    /// Broadcast a message. Having no listeners only happens while shutting down, so it's logged
    /// rather than returned.
    pub fn send(&self, message: crate::run::Protocol) {
        if let Err(error) = self.protocol_tx.send(message) {
            tracing::error!("Couldn't broadcast {:?}", error.0);
        }
    }

    /// The terminal's current size.
    pub async fn get_tty_size(&self) -> TTYSize {
        *self.tty_size.read().await
    }

    /// Record a new terminal size.
    pub async fn set_tty_size(&self, width: u16, height: u16) {
        *self.tty_size.write().await = TTYSize { width, height };
    }
}
