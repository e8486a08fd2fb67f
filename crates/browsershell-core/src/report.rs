/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

/// Exit/crash reporting payload.
///
/// The serialized field names are the wire format submitted to a crash
/// report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrashReport {
    pub description: String,
    pub version: String,
    pub backtrace: String,
    /// Originating document; empty for runtime-level faults.
    pub url: String,
}

impl CrashReport {
    pub fn new(
        description: impl Into<String>,
        version: impl Into<String>,
        backtrace: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            version: version.into(),
            backtrace: backtrace.into(),
            url: url.into(),
        }
    }

    pub fn has_backtrace(&self) -> bool {
        !self.backtrace.trim().is_empty()
    }
}
