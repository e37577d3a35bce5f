//! Supporting user-defined keybindings.

/// The user config for defining keybindings.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone)]
pub(crate) struct KeybindingConfigRaw {
    /// The modifier keys, like `CTRL`, `SHIFT`, etc.
    pub mods: Option<String>,
    /// The actual key, like a 'x' or `PageUp`.
    pub key: String,
}

/// All the possible actions a user can trigger in Driftfield
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub(crate) enum KeybindingAction {
    /// Show or hide the forces, guide lines and statistics.
    ToggleDebug,
    /// Freeze or unfreeze the simulation.
    TogglePause,
    /// Save an SVG of the current frame.
    Snapshot,
    /// Throw away all the particles and spawn new ones.
    Reseed,
    /// Exit Driftfield.
    Quit,
}

/// All the active user-configured keybindings.
pub(crate) type KeybindingsRaw = std::collections::HashMap<KeybindingAction, KeybindingConfigRaw>;

/// The user keybindings converted to native `termwiz::input::KeyEvent`s.
pub(crate) type KeybindingsAsEvents =
    std::collections::HashMap<KeybindingAction, termwiz::input::KeyEvent>;

/// Find the action bound to a key event, if any.
pub(crate) fn find_action(
    keybindings: &KeybindingsAsEvents,
    key_event: &termwiz::input::KeyEvent,
) -> Option<KeybindingAction> {
    keybindings
        .iter()
        .find_map(|(action, binding)| (binding == key_event).then_some(*action))
}

/// `Ctrl-C` always quits, whatever the keybindings say.
pub(crate) fn is_interrupt(key_event: &termwiz::input::KeyEvent) -> bool {
    key_event.modifiers == termwiz::input::Modifiers::CTRL
        && matches!(key_event.key, termwiz::input::KeyCode::Char('c' | 'C'))
}

impl TryFrom<KeybindingConfigRaw> for termwiz::input::KeyEvent {
    type Error = std::io::Error;

    /// `termwiz::input::KeyEvent` doesn't have a `impl From<String>` but it does derive
    /// `serde::Deserialize`, so the `toml` crate is used as a stepping stone to avoid manually
    /// mapping all the keycodes and modifiers.
    fn try_from(binding: KeybindingConfigRaw) -> std::result::Result<Self, Self::Error> {
        let key = if binding.key.chars().count() == 1 {
            format!("{{ Char = \"{}\" }}", binding.key)
        } else {
            format!("\"{}\"", binding.key)
        };

        let config = format!(
            "
                modifiers = {{ bits = 0 }}
                key = {key}
            ",
        );

        let mut key_event = toml::from_str::<Self>(&config).map_err(|error| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Couldn't parse keybinding ({binding:?}): {}", error.message()),
            )
        })?;

        if let Some(modifiers) = binding.mods {
            key_event.modifiers = modifiers.try_into().map_err(|error| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Couldn't parse keybinding modifier: {error:?}"),
                )
            })?;
        }

        Ok(key_event)
    }
}
