//! Driftfield: a particle field drifting around your terminal.

pub mod cli_args;
/// The config file, and the keybindings inside it.
pub mod config {
    pub mod input;
    pub mod main;
}
pub mod input;
pub mod renderer;
pub mod run;
pub mod shared_state;
pub mod simulation;
pub mod surface;
pub mod utils;

use color_eyre::eyre::Result;

/// Room for a burst of input events between frames.
const PROTOCOL_CAPACITY: usize = 1024;

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "The terminal is back in cooked mode by now, so this is how we talk to the user"
)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let (protocol_tx, _) = tokio::sync::broadcast::channel(PROTOCOL_CAPACITY);
    let state = shared_state::SharedState::init_with_users_tty_size(protocol_tx).await?;

    let result = run::run(&state).await;
    println!("{}", utils::RESET_SCREEN);
    tracing::debug!("Exiting with {result:?}");

    let log_note = if *state.is_logging.read().await {
        Some(format!(
            "Logs are in {}",
            state.config.read().await.log_path.display()
        ))
    } else {
        None
    };

    if let Err(error) = result {
        tracing::error!("{error:?}");
        eprintln!("Driftfield stopped: {error}");
        if let Some(note) = log_note {
            eprintln!("{note}");
        }
    } else if let Some(note) = log_note {
        println!("{note}");
    }

    Ok(())
}
