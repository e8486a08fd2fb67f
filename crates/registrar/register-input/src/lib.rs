/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Keyboard chord registry.
//!
//! Chord descriptors are whitespace separated tokens such as `"accel shift ]"`
//! or `"control tab"`. The final token names the key; every token before it is
//! a modifier. `accel` is the platform accelerator and is resolved once, when
//! the descriptor is registered, so lookups at key time are a plain map hit.
//!
//! Key-down and key-up chords live in separate tables.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use keyboard_types::{Key, Modifiers};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(alias = "darwin", alias = "mac")]
    MacOs,
    #[serde(alias = "win32")]
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Modifier that `accel` stands for.
    pub const fn accel(self) -> Modifier {
        match self {
            Platform::MacOs => Modifier::Meta,
            Platform::Linux | Platform::Windows => Modifier::Control,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl FromStr for Platform {
    type Err = ChordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" | "mac" => Ok(Platform::MacOs),
            "windows" | "win32" => Ok(Platform::Windows),
            other => Err(ChordError::UnknownPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modifiers in canonical rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    const ALL: [Modifier; 4] = [
        Modifier::Control,
        Modifier::Alt,
        Modifier::Shift,
        Modifier::Meta,
    ];

    const fn bit(self) -> u8 {
        match self {
            Modifier::Control => 1,
            Modifier::Alt => 1 << 1,
            Modifier::Shift => 1 << 2,
            Modifier::Meta => 1 << 3,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Modifier::Control => "control",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Meta => "meta",
        }
    }

    fn parse(token: &str, platform: Platform) -> Option<Self> {
        match token {
            "accel" => Some(platform.accel()),
            "control" | "ctrl" => Some(Modifier::Control),
            "alt" | "option" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "meta" | "cmd" | "command" | "super" => Some(Modifier::Meta),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChordError {
    #[error("empty chord descriptor")]
    Empty,
    #[error("unknown modifier `{modifier}` in chord `{descriptor}`")]
    UnknownModifier { descriptor: String, modifier: String },
    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
}

/// A normalised key chord: a modifier set plus a lowercase key name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    modifiers: u8,
    key: String,
}

impl Chord {
    /// Parse a textual descriptor, resolving `accel` for `platform`.
    pub fn parse(descriptor: &str, platform: Platform) -> Result<Self, ChordError> {
        let tokens: Vec<String> = descriptor
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let Some((key, modifiers)) = tokens.split_last() else {
            return Err(ChordError::Empty);
        };

        let key = match Modifier::parse(key, platform) {
            // A lone modifier descriptor (key-up of `accel`) names the modifier key itself.
            Some(modifier) => modifier.name().to_string(),
            None => normalize_key(key),
        };

        let mut chord = Chord { modifiers: 0, key };
        for token in modifiers {
            let modifier = Modifier::parse(token, platform).ok_or_else(|| {
                ChordError::UnknownModifier {
                    descriptor: descriptor.to_string(),
                    modifier: token.clone(),
                }
            })?;
            chord.modifiers |= modifier.bit();
        }
        Ok(chord)
    }

    /// Build the chord for a keyboard event as delivered by the host.
    ///
    /// When the key itself is a modifier, that modifier is dropped from the
    /// held set so pressing and releasing `Control` both read as `"control"`.
    pub fn from_key(key: &Key, held: Modifiers) -> Self {
        let key = normalize_key(&key.to_string());
        let mut modifiers = 0;
        for (modifier, flag) in [
            (Modifier::Control, Modifiers::CONTROL),
            (Modifier::Alt, Modifiers::ALT),
            (Modifier::Shift, Modifiers::SHIFT),
            (Modifier::Meta, Modifiers::META),
        ] {
            if held.contains(flag) && modifier.name() != key {
                modifiers |= modifier.bit();
            }
        }
        Chord { modifiers, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers & modifier.bit() != 0
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in Modifier::ALL {
            if self.has(modifier) {
                write!(f, "{} ", modifier.name())?;
            }
        }
        f.write_str(&self.key)
    }
}

fn normalize_key(raw: &str) -> String {
    if raw == " " {
        return "space".to_string();
    }
    let lowered = raw.to_lowercase();
    match lowered.as_str() {
        "arrowleft" => "left".to_string(),
        "arrowright" => "right".to_string(),
        "arrowup" => "up".to_string(),
        "arrowdown" => "down".to_string(),
        "esc" => "escape".to_string(),
        "ctrl" => "control".to_string(),
        "os" | "super" | "command" | "cmd" => "meta".to_string(),
        "plus" => "+".to_string(),
        _ => lowered,
    }
}

/// Lookup table from normalised chords to intents.
#[derive(Debug, Clone)]
pub struct ChordTable<I> {
    bindings: HashMap<Chord, I>,
}

impl<I> Default for ChordTable<I> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }
}

impl<I> ChordTable<I> {
    /// Insert a binding. A later binding for the same chord replaces the earlier one.
    pub fn bind(&mut self, chord: Chord, intent: I) -> Option<I> {
        self.bindings.insert(chord, intent)
    }

    pub fn resolve(&self, chord: &Chord) -> Option<&I> {
        self.bindings.get(chord)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Which phase of a key event a chord belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Down,
    Up,
}

/// Key-down and key-up tables bound for one platform.
#[derive(Debug, Clone)]
pub struct Keyboard<I> {
    platform: Platform,
    down: ChordTable<I>,
    up: ChordTable<I>,
}

impl<I> Keyboard<I> {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            down: ChordTable::default(),
            up: ChordTable::default(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn chord(&self, descriptor: &str) -> Result<Chord, ChordError> {
        Chord::parse(descriptor, self.platform)
    }

    pub fn bind(&mut self, phase: Phase, descriptor: &str, intent: I) -> Result<(), ChordError> {
        let chord = self.chord(descriptor)?;
        let table = match phase {
            Phase::Down => &mut self.down,
            Phase::Up => &mut self.up,
        };
        if table.bind(chord.clone(), intent).is_some() {
            debug!("keybinding {phase:?} `{chord}` overridden");
        }
        Ok(())
    }

    pub fn resolve(&self, phase: Phase, chord: &Chord) -> Option<&I> {
        match phase {
            Phase::Down => self.down.resolve(chord),
            Phase::Up => self.up.resolve(chord),
        }
    }

    pub fn table(&self, phase: Phase) -> &ChordTable<I> {
        match phase {
            Phase::Down => &self.down,
            Phase::Up => &self.up,
        }
    }
}
