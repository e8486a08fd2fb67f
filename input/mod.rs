/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Keyboard shortcuts for the browser shell.
//!
//! Detection (turning a host key event into a [`Chord`]) is separate from
//! interpretation (looking the chord up in the bound tables), so the intent
//! mapping is testable without a host. Decoding is a pure lookup: unmatched
//! chords produce nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use keyboard_types::{Key, Modifiers};
use log::warn;
use register_input::{Chord, Keyboard, Phase, Platform};
use serde::{Deserialize, Serialize};

use crate::app::Action;

/// Named shortcut targets. Config files refer to these by [`KeyIntent::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyIntent {
    EditWebView,
    OpenNewTab,
    ResetZoom,
    ZoomOut,
    ZoomIn,
    CloseSelected,
    SelectNext,
    SelectPrevious,
    Reload,
    Escape,
    GoBack,
    GoForward,
    ToggleDevtools,
    ReloadRuntime,
    Quit,
    PrintSnapshot,
    PublishSnapshot,
    EndSelection,
    ShowTabs,
    Stop,
}

impl KeyIntent {
    pub const ALL: [KeyIntent; 20] = [
        KeyIntent::EditWebView,
        KeyIntent::OpenNewTab,
        KeyIntent::ResetZoom,
        KeyIntent::ZoomOut,
        KeyIntent::ZoomIn,
        KeyIntent::CloseSelected,
        KeyIntent::SelectNext,
        KeyIntent::SelectPrevious,
        KeyIntent::Reload,
        KeyIntent::Escape,
        KeyIntent::GoBack,
        KeyIntent::GoForward,
        KeyIntent::ToggleDevtools,
        KeyIntent::ReloadRuntime,
        KeyIntent::Quit,
        KeyIntent::PrintSnapshot,
        KeyIntent::PublishSnapshot,
        KeyIntent::EndSelection,
        KeyIntent::ShowTabs,
        KeyIntent::Stop,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            KeyIntent::EditWebView => "edit-webview",
            KeyIntent::OpenNewTab => "open-new-tab",
            KeyIntent::ResetZoom => "reset-zoom",
            KeyIntent::ZoomOut => "zoom-out",
            KeyIntent::ZoomIn => "zoom-in",
            KeyIntent::CloseSelected => "close",
            KeyIntent::SelectNext => "select-next",
            KeyIntent::SelectPrevious => "select-previous",
            KeyIntent::Reload => "reload",
            KeyIntent::Escape => "escape",
            KeyIntent::GoBack => "go-back",
            KeyIntent::GoForward => "go-forward",
            KeyIntent::ToggleDevtools => "toggle-devtools",
            KeyIntent::ReloadRuntime => "reload-runtime",
            KeyIntent::Quit => "quit",
            KeyIntent::PrintSnapshot => "print-snapshot",
            KeyIntent::PublishSnapshot => "publish-snapshot",
            KeyIntent::EndSelection => "end-selection",
            KeyIntent::ShowTabs => "show-tabs",
            KeyIntent::Stop => "stop",
        }
    }

    /// The root action this shortcut dispatches.
    pub fn action(self) -> Action {
        match self {
            KeyIntent::EditWebView => Action::EditWebView,
            KeyIntent::OpenNewTab => Action::OpenNewTab,
            KeyIntent::ResetZoom => Action::ResetZoom,
            KeyIntent::ZoomOut => Action::ZoomOut,
            KeyIntent::ZoomIn => Action::ZoomIn,
            KeyIntent::CloseSelected => Action::CloseSelected,
            KeyIntent::SelectNext => Action::SelectNext,
            KeyIntent::SelectPrevious => Action::SelectPrevious,
            KeyIntent::Reload => Action::Reload,
            KeyIntent::Escape => Action::Escape,
            KeyIntent::GoBack => Action::GoBack,
            KeyIntent::GoForward => Action::GoForward,
            KeyIntent::ToggleDevtools => Action::ToggleDevtools,
            KeyIntent::ReloadRuntime => Action::ReloadRuntime,
            KeyIntent::Quit => Action::Quit,
            KeyIntent::PrintSnapshot => Action::PrintSnapshot,
            KeyIntent::PublishSnapshot => Action::PublishSnapshot,
            KeyIntent::EndSelection => Action::EndSelection,
            KeyIntent::ShowTabs => Action::ShowTabs,
            KeyIntent::Stop => Action::Stop,
        }
    }
}

impl fmt::Display for KeyIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyIntent {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        KeyIntent::ALL
            .into_iter()
            .find(|intent| intent.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown key intent `{name}`"))
    }
}

/// User keybinding overrides as read from the config file: chord descriptor
/// to intent name, per phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub down: BTreeMap<String, String>,
    pub up: BTreeMap<String, String>,
}

impl KeyBindings {
    fn entries(&self) -> impl Iterator<Item = (Phase, &str, &str)> {
        let down = self.down.iter().map(|(chord, intent)| (Phase::Down, chord.as_str(), intent.as_str()));
        let up = self.up.iter().map(|(chord, intent)| (Phase::Up, chord.as_str(), intent.as_str()));
        down.chain(up)
    }
}

/// Built-in bindings for `platform`.
///
/// History navigation and quit use `alt` on Linux and the accelerator
/// elsewhere.
pub fn default_bindings(platform: Platform) -> Vec<(Phase, String, KeyIntent)> {
    let nav = match platform {
        Platform::Linux => "alt",
        Platform::MacOs | Platform::Windows => "accel",
    };
    let down = [
        ("accel l", KeyIntent::EditWebView),
        ("accel t", KeyIntent::OpenNewTab),
        ("accel 0", KeyIntent::ResetZoom),
        ("accel -", KeyIntent::ZoomOut),
        ("accel =", KeyIntent::ZoomIn),
        ("accel shift =", KeyIntent::ZoomIn),
        ("accel w", KeyIntent::CloseSelected),
        ("accel shift ]", KeyIntent::SelectNext),
        ("accel shift [", KeyIntent::SelectPrevious),
        ("control tab", KeyIntent::SelectNext),
        ("control shift tab", KeyIntent::SelectPrevious),
        ("accel r", KeyIntent::Reload),
        ("escape", KeyIntent::Escape),
        // `meta alt i` arrives as `accel alt ˆ` on some macOS layouts.
        ("accel alt i", KeyIntent::ToggleDevtools),
        ("accel alt ˆ", KeyIntent::ToggleDevtools),
        ("F12", KeyIntent::ToggleDevtools),
        ("F5", KeyIntent::ReloadRuntime),
        ("meta control r", KeyIntent::ReloadRuntime),
        ("meta alt 3", KeyIntent::PrintSnapshot),
        ("meta alt 4", KeyIntent::PublishSnapshot),
    ];
    let nav_down = [
        (format!("{nav} left"), KeyIntent::GoBack),
        (format!("{nav} right"), KeyIntent::GoForward),
        (format!("{nav} q"), KeyIntent::Quit),
    ];
    let up = [
        ("control", KeyIntent::EndSelection),
        ("accel", KeyIntent::EndSelection),
    ];

    down.into_iter()
        .map(|(chord, intent)| (Phase::Down, chord.to_string(), intent))
        .chain(nav_down.into_iter().map(|(chord, intent)| (Phase::Down, chord, intent)))
        .chain(up.into_iter().map(|(chord, intent)| (Phase::Up, chord.to_string(), intent)))
        .collect()
}

/// Bind the built-in tables for `platform`, then apply `overrides`.
///
/// Override entries with an unparsable chord or an unknown intent name are
/// skipped with a warning; the rest still apply.
pub fn keyboard(platform: Platform, overrides: &KeyBindings) -> Keyboard<KeyIntent> {
    let mut keyboard = Keyboard::new(platform);
    for (phase, descriptor, intent) in default_bindings(platform) {
        if let Err(error) = keyboard.bind(phase, &descriptor, intent) {
            warn!("built-in keybinding `{descriptor}` rejected: {error}");
        }
    }
    for (phase, descriptor, name) in overrides.entries() {
        let intent = match name.parse::<KeyIntent>() {
            Ok(intent) => intent,
            Err(error) => {
                warn!("ignoring keybinding `{descriptor}`: {error}");
                continue;
            },
        };
        if let Err(error) = keyboard.bind(phase, descriptor, intent) {
            warn!("ignoring keybinding `{descriptor}`: {error}");
        }
    }
    keyboard
}

/// Interpret an already normalised chord.
pub fn decode_chord(keyboard: &Keyboard<KeyIntent>, phase: Phase, chord: &Chord) -> Option<Action> {
    keyboard.resolve(phase, chord).map(|intent| intent.action())
}

pub fn decode_key_down(keyboard: &Keyboard<KeyIntent>, key: &Key, modifiers: Modifiers) -> Option<Action> {
    decode_chord(keyboard, Phase::Down, &Chord::from_key(key, modifiers))
}

pub fn decode_key_up(keyboard: &Keyboard<KeyIntent>, key: &Key, modifiers: Modifiers) -> Option<Action> {
    decode_chord(keyboard, Phase::Up, &Chord::from_key(key, modifiers))
}

/// Interpret a textual descriptor such as `"accel t"`, as scripts provide them.
pub fn decode_descriptor(keyboard: &Keyboard<KeyIntent>, phase: Phase, descriptor: &str) -> Option<Action> {
    match keyboard.chord(descriptor) {
        Ok(chord) => decode_chord(keyboard, phase, &chord),
        Err(error) => {
            warn!("unreadable key chord `{descriptor}`: {error}");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard_types::NamedKey;
    use rstest::rstest;

    fn linux() -> Keyboard<KeyIntent> {
        keyboard(Platform::Linux, &KeyBindings::default())
    }

    fn mac() -> Keyboard<KeyIntent> {
        keyboard(Platform::MacOs, &KeyBindings::default())
    }

    #[rstest]
    #[case(Key::Character("t".into()), Modifiers::CONTROL, Some(Action::OpenNewTab))]
    #[case(Key::Character("T".into()), Modifiers::CONTROL, Some(Action::OpenNewTab))]
    #[case(Key::Character("=".into()), Modifiers::CONTROL | Modifiers::SHIFT, Some(Action::ZoomIn))]
    #[case(Key::Named(NamedKey::Tab), Modifiers::CONTROL, Some(Action::SelectNext))]
    #[case(Key::Named(NamedKey::Tab), Modifiers::CONTROL | Modifiers::SHIFT, Some(Action::SelectPrevious))]
    #[case(Key::Named(NamedKey::ArrowLeft), Modifiers::ALT, Some(Action::GoBack))]
    #[case(Key::Named(NamedKey::ArrowLeft), Modifiers::CONTROL, None)]
    #[case(Key::Character("q".into()), Modifiers::ALT, Some(Action::Quit))]
    #[case(Key::Named(NamedKey::F12), Modifiers::empty(), Some(Action::ToggleDevtools))]
    #[case(Key::Named(NamedKey::Escape), Modifiers::empty(), Some(Action::Escape))]
    #[case(Key::Character("t".into()), Modifiers::empty(), None)]
    fn linux_key_down(#[case] key: Key, #[case] modifiers: Modifiers, #[case] expected: Option<Action>) {
        assert_eq!(decode_key_down(&linux(), &key, modifiers), expected);
    }

    #[rstest]
    #[case(Key::Character("t".into()), Modifiers::META, Some(Action::OpenNewTab))]
    #[case(Key::Character("t".into()), Modifiers::CONTROL, None)]
    #[case(Key::Named(NamedKey::ArrowRight), Modifiers::META, Some(Action::GoForward))]
    #[case(Key::Character("r".into()), Modifiers::META | Modifiers::CONTROL, Some(Action::ReloadRuntime))]
    #[case(Key::Character("ˆ".into()), Modifiers::META | Modifiers::ALT, Some(Action::ToggleDevtools))]
    fn mac_key_down(#[case] key: Key, #[case] modifiers: Modifiers, #[case] expected: Option<Action>) {
        assert_eq!(decode_key_down(&mac(), &key, modifiers), expected);
    }

    #[test]
    fn releasing_the_switch_modifier_ends_selection() {
        assert_eq!(
            decode_key_up(&linux(), &Key::Named(NamedKey::Control), Modifiers::CONTROL),
            Some(Action::EndSelection)
        );
        assert_eq!(
            decode_key_up(&mac(), &Key::Named(NamedKey::Meta), Modifiers::META),
            Some(Action::EndSelection)
        );
        assert_eq!(
            decode_key_up(&mac(), &Key::Named(NamedKey::Control), Modifiers::empty()),
            Some(Action::EndSelection)
        );
        // Key-up tables are independent of key-down.
        assert_eq!(decode_key_up(&linux(), &Key::Named(NamedKey::Escape), Modifiers::empty()), None);
        assert_eq!(decode_key_down(&linux(), &Key::Named(NamedKey::Control), Modifiers::CONTROL), None);
    }

    #[test]
    fn overrides_replace_and_extend_builtins() {
        let overrides = KeyBindings {
            down: BTreeMap::from([
                ("accel t".to_string(), "show-tabs".to_string()),
                ("F6".to_string(), "stop".to_string()),
                ("hyper x".to_string(), "quit".to_string()),
                ("F7".to_string(), "launch-rockets".to_string()),
            ]),
            up: BTreeMap::new(),
        };
        let keyboard = keyboard(Platform::Linux, &overrides);
        assert_eq!(
            decode_descriptor(&keyboard, Phase::Down, "control t"),
            Some(Action::ShowTabs)
        );
        assert_eq!(decode_descriptor(&keyboard, Phase::Down, "f6"), Some(Action::Stop));
        assert_eq!(decode_descriptor(&keyboard, Phase::Down, "F7"), None);
        assert_eq!(
            decode_descriptor(&keyboard, Phase::Down, "accel l"),
            Some(Action::EditWebView)
        );
    }

    #[test]
    fn intent_names_round_trip() {
        for intent in KeyIntent::ALL {
            assert_eq!(intent.name().parse::<KeyIntent>(), Ok(intent));
        }
        assert!("Select-Next".parse::<KeyIntent>().is_ok());
        assert!("nope".parse::<KeyIntent>().is_err());
    }

    #[test]
    fn every_builtin_chord_parses() {
        for platform in [Platform::Linux, Platform::MacOs, Platform::Windows] {
            let keyboard = keyboard(platform, &KeyBindings::default());
            for (phase, descriptor, intent) in default_bindings(platform) {
                let chord = keyboard.chord(&descriptor).unwrap();
                assert!(keyboard.resolve(phase, &chord).is_some(), "{descriptor} ({intent})");
            }
        }
    }
}
