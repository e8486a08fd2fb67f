/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, panic, process};

use log::{debug, error, info, warn};
use register_input::{Keyboard, Phase};
use thiserror::Error;

use crate::app::{Action, BrowserModel};
use crate::input::{self, KeyIntent};
use crate::panic_hook;
use crate::prefs::{AppPreferences, ArgumentParsingResult, CliOptions, parse_command_line_arguments};
use crate::shell::desktop::host::HostPort;
use crate::shell::desktop::host::events::{self, Inbound};
use crate::shell::desktop::host::headless::HeadlessHost;
use crate::shell::desktop::runtime::executor::Runtime;

/// How long to wait for in-flight network work before printing state.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to start the effect executor: {0}")]
    Executor(#[source] io::Error),
    #[error("failed to read script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write state: {0}")]
    Output(#[from] io::Error),
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn main() {
    panic::set_hook(Box::new(panic_hook::panic_hook));

    // Skip the first argument, which is the binary name.
    let args: Vec<String> = env::args().skip(1).collect();
    let (opts, app_preferences) = match parse_command_line_arguments(&args) {
        ArgumentParsingResult::Run(opts, app_preferences) => (opts, app_preferences),
        ArgumentParsingResult::Exit => process::exit(0),
        ArgumentParsingResult::ErrorParsing => process::exit(1),
    };

    crate::init_tracing(app_preferences.tracing_filter.as_deref());
    log_startup_environment();

    let stdout = io::stdout();
    if let Err(error) = run(&opts, &app_preferences, &mut stdout.lock()) {
        error!("{error}");
        process::exit(1);
    }
}

/// Drive a headless session: start from the preferences, feed the script,
/// wait for network work, optionally print the final state.
pub fn run(opts: &CliOptions, app_preferences: &AppPreferences, out: &mut dyn Write) -> Result<BrowserModel, CliError> {
    info!(
        "browsershell {} on {}",
        crate::VERSION,
        app_preferences.platform
    );
    let keyboard = input::keyboard(app_preferences.platform, &app_preferences.keybindings);
    let mut runtime = Runtime::start(HeadlessHost::echoing(), app_preferences.flags(crate::VERSION))
        .map_err(CliError::Executor)?;

    if let Some(path) = &opts.script {
        let script = fs::read_to_string(path).map_err(|source| CliError::Script {
            path: path.clone(),
            source,
        })?;
        run_script(&mut runtime, &keyboard, path, &script);
    }

    if !runtime.settle(SETTLE_TIMEOUT) {
        warn!("printing state with {} network tasks outstanding", runtime.in_flight());
    }

    let (model, _) = runtime.into_parts();
    if opts.print_state {
        serde_json::to_writer_pretty(&mut *out, &model)?;
        writeln!(out)?;
    }
    Ok(model)
}

/// Feed a JSON-lines script through the dispatcher. Blank lines and lines
/// starting with `#` are skipped; unreadable lines are logged and skipped.
pub fn run_script<H: HostPort>(runtime: &mut Runtime<H>, keyboard: &Keyboard<KeyIntent>, path: &Path, script: &str) {
    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let inbound = serde_json::from_str(line).and_then(events::decode);
        let action = match inbound {
            Ok(Inbound::Action(action)) => Some(action),
            Ok(Inbound::Key { phase, chord }) => decode_key(keyboard, phase, &chord),
            Err(error) => {
                warn!("{}:{}: {error}", path.display(), index + 1);
                None
            },
        };
        if let Some(action) = action {
            runtime.dispatch(action);
        }
        runtime.poll();
    }
}

fn decode_key(keyboard: &Keyboard<KeyIntent>, phase: Phase, chord: &str) -> Option<Action> {
    let action = input::decode_descriptor(keyboard, phase, chord);
    if action.is_none() {
        debug!("no binding for {phase:?} `{chord}`");
    }
    action
}

fn log_startup_environment() {
    let keys: Vec<&str> = [
        crate::prefs::ENV_REPLAY,
        crate::prefs::ENV_TRACING_FILTER,
        crate::prefs::ENV_DEVTOOLS,
    ]
    .into_iter()
    .filter(|key| env::var_os(key).is_some())
    .collect();
    if !keys.is_empty() {
        debug!("environment overrides: {}", keys.join(","));
    }
}
