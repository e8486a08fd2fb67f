/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::io::Write;
use std::panic::PanicHookInfo;
use std::thread;

use backtrace::Backtrace;
use browsershell_core::CrashReport;
use log::{error, warn};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

fn payload_message<'a>(info: &'a PanicHookInfo<'_>) -> &'a str {
    match info.payload().downcast_ref::<&'static str>() {
        Some(message) => message,
        None => match info.payload().downcast_ref::<String>() {
            Some(message) => message,
            None => "Box<Any>",
        },
    }
}

/// Build the report a process-level panic is rendered as. Panics are not
/// tied to a document, so `url` stays empty.
pub fn crash_report(description: &str, backtrace: &Backtrace) -> CrashReport {
    CrashReport::new(description, crate::VERSION, format!("{backtrace:?}"), "")
}

pub(crate) fn panic_hook(info: &PanicHookInfo) {
    warn!("Panic hook called.");
    let message = payload_message(info);
    let current_thread = thread::current();
    let name = current_thread.name().unwrap_or("<unnamed>");
    let description = match info.location() {
        Some(location) => format!(
            "{message} (thread {name}, at {}:{})",
            location.file(),
            location.line()
        ),
        None => format!("{message} (thread {name})"),
    };

    let report = crash_report(&description, &Backtrace::new());
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown time"));

    let stderr = std::io::stderr();
    let mut stderr = stderr.lock();
    let _ = writeln!(&mut stderr, "[{timestamp}] {description}");
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            let _ = writeln!(&mut stderr, "{json}");
        },
        Err(error) => {
            let _ = writeln!(&mut stderr, "{}", report.backtrace);
            error!("could not render crash report: {error}");
        },
    }
    drop(stderr);

    error!("{description}");
}
