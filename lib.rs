/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Headless browser shell built around a single pure update function.
//!
//! All state lives in one [`app::BrowserModel`] tree. Events from the host,
//! the keyboard and completed network work become [`app::Action`]s, and the
//! executor in [`shell::desktop::runtime::executor`] applies them one at a
//! time, carrying out the [`browsershell_core::Effect`]s they return.

pub mod app;
pub mod input;
pub mod model;
pub(crate) mod panic_hook;
pub mod prefs;
pub mod shell;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::shell::desktop::runtime::cli::main;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the log subscriber. `filter` uses `EnvFilter` syntax; without one,
/// `RUST_LOG` applies, then `info`.
#[cfg(feature = "tracing")]
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|error| {
            eprintln!("invalid tracing filter `{filter}`: {error}; using `info`");
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(error) = installed {
        eprintln!("tracing subscriber already installed: {error}");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_filter: Option<&str>) {}
