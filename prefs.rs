/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application preferences: config file, environment and command line.
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! `BROWSERSHELL_*` environment variables, command-line flags. Everything is
//! resolved here once and handed to [`crate::app::init`] as plain values.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use bpaf::{Bpaf, ParseFailure};
use log::warn;
use register_input::{ChordError, Platform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::BrowserFlags;
use crate::input::KeyBindings;
use crate::model::navigators::{DEFAULT_NEWTAB_URI, DEFAULT_SEARCH_URI};

pub const CONFIG_DIR_NAME: &str = "browsershell";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_REPLAY: &str = "BROWSERSHELL_REPLAY";
pub const ENV_TRACING_FILTER: &str = "BROWSERSHELL_TRACING_FILTER";
pub const ENV_DEVTOOLS: &str = "BROWSERSHELL_DEVTOOLS";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Platform(#[from] ChordError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppPreferences {
    /// Platform whose accelerator and navigation modifiers apply.
    pub platform: Platform,
    pub devtools: bool,
    /// Snapshot URI to replay on startup.
    pub replay: Option<String>,
    pub newtab_uri: String,
    pub search_uri: String,
    pub crash_report_endpoint: Option<String>,
    pub snapshot_publish_endpoint: Option<String>,
    pub tracing_filter: Option<String>,
    pub keybindings: KeyBindings,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            devtools: false,
            replay: None,
            newtab_uri: DEFAULT_NEWTAB_URI.to_string(),
            search_uri: DEFAULT_SEARCH_URI.to_string(),
            crash_report_endpoint: None,
            snapshot_publish_endpoint: None,
            tracing_filter: None,
            keybindings: KeyBindings::default(),
        }
    }
}

impl AppPreferences {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, PrefsError> {
        toml::from_str(text).map_err(|source| PrefsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, PrefsError> {
        let text = fs::read_to_string(path).map_err(|source| PrefsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Load `explicit`, or the default config file when it exists.
    ///
    /// An explicitly named file must exist; a missing default file just
    /// means built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PrefsError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply `BROWSERSHELL_*` overrides read through `lookup`.
    pub fn with_env<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let replay = lookup(ENV_REPLAY).filter(|uri| !uri.trim().is_empty());
        let tracing_filter = lookup(ENV_TRACING_FILTER).filter(|filter| !filter.trim().is_empty());
        let devtools = match lookup(ENV_DEVTOOLS) {
            Some(value) => parse_env_flag(ENV_DEVTOOLS, &value).unwrap_or(self.devtools),
            None => self.devtools,
        };
        AppPreferences {
            replay: replay.or(self.replay),
            tracing_filter: tracing_filter.or(self.tracing_filter),
            devtools,
            ..self
        }
    }

    pub fn with_cli(self, opts: &CliOptions) -> Result<Self, PrefsError> {
        let platform = match opts.platform.as_deref() {
            Some(name) => name.parse()?,
            None => self.platform,
        };
        Ok(AppPreferences {
            platform,
            replay: opts.replay.clone().or(self.replay),
            tracing_filter: opts.tracing_filter.clone().or(self.tracing_filter),
            ..self
        })
    }

    pub fn flags(&self, version: &str) -> BrowserFlags {
        BrowserFlags {
            version: version.to_string(),
            devtools: self.devtools,
            replay: self.replay.clone(),
            newtab_uri: self.newtab_uri.clone(),
            search_uri: self.search_uri.clone(),
            crash_report_endpoint: self.crash_report_endpoint.clone(),
            snapshot_publish_endpoint: self.snapshot_publish_endpoint.clone(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn parse_env_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        other => {
            warn!("{key} invalid ('{other}'); ignoring");
            None
        },
    }
}

/// Headless browser shell driver.
#[derive(Debug, Clone, PartialEq, Eq, Bpaf)]
#[bpaf(options, version(crate::VERSION))]
pub struct CliOptions {
    /// Config file to load instead of the default location
    #[bpaf(long, argument("PATH"))]
    pub config: Option<PathBuf>,
    /// Platform whose shortcuts apply: linux, macos or windows
    #[bpaf(long, argument("NAME"))]
    pub platform: Option<String>,
    /// Snapshot URI to fetch and adopt on startup
    #[bpaf(long, argument("URI"))]
    pub replay: Option<String>,
    /// JSON-lines file of host events and key chords to feed in
    #[bpaf(long, argument("PATH"))]
    pub script: Option<PathBuf>,
    /// Log filter, in env_logger syntax
    #[bpaf(long, argument("FILTER"))]
    pub tracing_filter: Option<String>,
    /// Print the final state tree as JSON
    #[bpaf(long)]
    pub print_state: bool,
}

#[derive(Debug)]
pub enum ArgumentParsingResult {
    Run(CliOptions, AppPreferences),
    Exit,
    ErrorParsing,
}

pub fn parse_command_line_arguments(args: &[String]) -> ArgumentParsingResult {
    parse_arguments_with_env(args, |key| env::var(key).ok())
}

/// [`parse_command_line_arguments`] with the environment supplied by the
/// caller.
pub fn parse_arguments_with_env<F>(args: &[String], lookup: F) -> ArgumentParsingResult
where
    F: Fn(&str) -> Option<String>,
{
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let opts = match cli_options().run_inner(&args[..]) {
        Ok(opts) => opts,
        Err(failure) => {
            failure.print_message(100);
            return match failure {
                ParseFailure::Stderr(_) => ArgumentParsingResult::ErrorParsing,
                ParseFailure::Stdout(..) | ParseFailure::Completion(_) => ArgumentParsingResult::Exit,
            };
        },
    };

    let preferences = AppPreferences::load(opts.config.as_deref())
        .map(|prefs| prefs.with_env(lookup))
        .and_then(|prefs| prefs.with_cli(&opts));
    match preferences {
        Ok(preferences) => ArgumentParsingResult::Run(opts, preferences),
        Err(error) => {
            eprintln!("{error}");
            ArgumentParsingResult::ErrorParsing
        },
    }
}
