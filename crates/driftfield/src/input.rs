//! Keyboard and mouse input, read from STDIN on its own thread.

use std::io::Read as _;

use color_eyre::eyre::Result;

/// How many bytes are read from STDIN at a time.
const READ_SIZE: usize = 128;

/// Reads STDIN and forwards the events the simulation cares about.
pub(crate) struct Input {
    /// Where events are sent
    protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    /// Turns escape sequences into events, keeping partial sequences between reads
    parser: termwiz::input::InputParser,
}

impl Input {
    /// Spawn the STDIN thread. Blocking reads don't belong on the async runtime.
    ///
    /// If reading fails then everything else is told to stop, since without input there's no
    /// way to quit.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        std::thread::spawn(move || -> Result<()> {
            let mut input = Self {
                protocol_tx: protocol_tx.clone(),
                parser: termwiz::input::InputParser::new(),
            };
            input.read_until_closed().inspect_err(|error| {
                tracing::error!("Reading STDIN: {error:?}");
                crate::run::broadcast_protocol_end(&protocol_tx);
            })
        })
    }

    /// Keep reading until STDIN closes.
    fn read_until_closed(&mut self) -> Result<()> {
        tracing::debug!("Listening on STDIN");
        let mut stdin = std::io::stdin().lock();
        let mut buffer = [0_u8; READ_SIZE];

        loop {
            let count = stdin.read(&mut buffer)?;
            let Some(bytes) = buffer.get(..count).filter(|bytes| !bytes.is_empty()) else {
                tracing::debug!("STDIN closed");
                return Ok(());
            };
            self.forward(bytes);
        }
    }

    /// Parse some bytes and send on any key or mouse events.
    fn forward(&mut self, bytes: &[u8]) {
        let mut events = Vec::new();
        self.parser.parse(bytes, |event| events.push(event), false);

        for event in events {
            if !is_relevant(&event) {
                continue;
            }
            tracing::trace!("Input: {event:?}");
            if let Err(error) = self.protocol_tx.send(crate::run::Protocol::Input(event)) {
                tracing::error!("Couldn't forward input: {error:?}");
            }
        }
    }
}

/// Only keys and the mouse drive the simulation.
const fn is_relevant(event: &termwiz::input::InputEvent) -> bool {
    matches!(
        event,
        termwiz::input::InputEvent::Key(_) | termwiz::input::InputEvent::Mouse(_)
    )
}
