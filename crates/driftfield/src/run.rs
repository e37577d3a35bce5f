//! Main entrypoint for running Driftfield

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{bail, eyre, ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::cli_args::CliArgs;
use crate::input::Input;
use crate::renderer::Renderer;
use crate::shared_state::SharedState;

/// How many rendered frames may queue up before the simulation waits for the renderer.
const FRAME_QUEUE_SIZE: usize = 4;

/// Commands to control the various tasks/threads
#[non_exhaustive]
#[derive(Clone, Debug)]
pub(crate) enum Protocol {
    /// The entire application is exiting.
    End,
    /// User's TTY is resized.
    Resize {
        /// Width of new terminal.
        width: u16,
        /// Height of new terminal.
        height: u16,
    },
    /// Parsed input from STDIN.
    Input(termwiz::input::InputEvent),
    /// Driftfield's configuration.
    Config(crate::config::main::Config),
    /// A short message to show the user.
    Notice(String),
}

/// Main entrypoint
pub(crate) async fn run(state_arc: &std::sync::Arc<SharedState>) -> Result<()> {
    let protocol_tx = state_arc.protocol_tx.clone();
    setup(state_arc).await?;

    let (frames_tx, frames_rx) = tokio::sync::mpsc::channel(FRAME_QUEUE_SIZE);
    let renderer = Renderer::start(Arc::clone(state_arc), frames_rx, protocol_tx.clone());
    let config_handle = crate::config::main::Config::watch(Arc::clone(state_arc));
    let input_thread_handle = Input::start(protocol_tx.clone());

    let simulation_result =
        crate::simulation::Simulation::start(Arc::clone(state_arc), frames_tx).await;
    tracing::debug!("Left simulation loop, exiting Driftfield...");
    broadcast_protocol_end(&protocol_tx);

    if input_thread_handle.is_finished() {
        // The STDIN loop doesn't listen to the protocol, so it can't exit its loop. Therefore we
        // should only join it if it finished because of its own error.
        input_thread_handle
            .join()
            .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
    }
    renderer.await??;
    config_handle.await??;
    simulation_result?;

    tracing::trace!("Leaving Driftfield's main `run()` function");
    Ok(())
}

/// Signal all task/thread loops to exit.
///
/// We keep it in its own function because we need to handle the error separately. If the error
/// were to be bubbled with `?` as usual, there's a chance it would never be logged, because the
/// protocol end signal is itself what allows the central error handler to even be reached.
pub(crate) fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// Parse the CLI, load the config and start logging. Any failure here is fatal.
async fn setup(state: &std::sync::Arc<SharedState>) -> Result<()> {
    let cli_args = CliArgs::parse();
    *state.cli_args.write().await = Some(cli_args.clone());
    state
        .main_config_file
        .write()
        .await
        .clone_from(&cli_args.main_config);

    crate::config::main::Config::setup_directory(cli_args.config_dir.clone(), state)
        .await
        .map_err(|error| eyre!("Couldn't set up the config directory: {error:?}"))?;

    if let Err(error) = crate::config::main::Config::load_config_into_shared_state(state).await {
        let path = crate::config::main::Config::main_config_path(state).await;
        bail!("Bad config file {}: {error:?}", path.display());
    }

    let config = state.config.read().await.clone();
    setup_logging(&config.log_level, &config.log_path)?;
    *state.is_logging.write().await = log_filter_override().is_some()
        || !matches!(config.log_level, crate::config::main::LogLevel::Off);

    tracing::info!("Starting Driftfield, {:?}", state.get_tty_size().await);
    tracing::debug!("Config: {config:?}");

    Ok(())
}

/// Filter directives from `DRIFTFIELD_LOG`, which replace the config's level entirely.
fn log_filter_override() -> Option<String> {
    std::env::var("DRIFTFIELD_LOG").ok()
}

/// The filter for a plain log level: our crates at that level, everything else off.
fn log_filter(level: &crate::config::main::LogLevel) -> Result<tracing_subscriber::EnvFilter> {
    let level = format!("{level:?}").to_lowercase();
    let mut filter = tracing_subscriber::EnvFilter::new("off");
    for target in ["driftfield", "driftfield_engine"] {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    Ok(filter)
}

/// Log to a file. The terminal is the simulation's display, so nothing is ever logged to it.
fn setup_logging(level: &crate::config::main::LogLevel, path: &std::path::Path) -> Result<()> {
    let filter = match log_filter_override() {
        Some(directives) => tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::ERROR.into())
            .parse_lossy(directives),
        None if matches!(level, crate::config::main::LogLevel::Off) => return Ok(()),
        None => log_filter(level)?,
    };

    std::fs::create_dir_all(path.parent().context("Log path has no parent directory")?)?;
    let file = std::fs::File::create(path)?;
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(layer).init();

    Ok(())
}
