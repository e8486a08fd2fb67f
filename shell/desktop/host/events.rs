/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host event vocabulary and its decoding into root actions.
//!
//! Events arrive as JSON objects tagged by `type`. Kinds this build does not
//! know decode to [`Action::Unrecognized`] so the dispatcher can log and
//! ignore them. A missing `type`, or a known kind with malformed fields, is
//! a decode error.

use browsershell_core::{CrashReport, Timestamp, WebViewId};
use register_input::Phase;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::Action;
use crate::model::navigators::page::Icon;
use crate::model::navigators::webview::{Disposition, WebViewAction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostEvent {
    LoadStart {
        id: WebViewId,
        #[serde(default)]
        time: Timestamp,
    },
    LoadEnd {
        id: WebViewId,
        #[serde(default)]
        time: Timestamp,
    },
    #[serde(alias = "error")]
    LoadFail {
        id: WebViewId,
        #[serde(default)]
        time: Timestamp,
        #[serde(default)]
        code: i32,
        #[serde(default)]
        message: String,
    },
    LocationChange {
        id: WebViewId,
        uri: String,
        #[serde(default)]
        time: Timestamp,
        #[serde(default)]
        can_go_back: bool,
        #[serde(default)]
        can_go_forward: bool,
    },
    TitleChange {
        id: WebViewId,
        title: String,
    },
    IconsChange {
        id: WebViewId,
        icons: Vec<Icon>,
    },
    MetaChange {
        id: WebViewId,
        name: String,
        content: String,
    },
    FirstPaint {
        id: WebViewId,
    },
    WebviewFocus {
        id: WebViewId,
    },
    WebviewBlur {
        id: WebViewId,
    },
    CloseRequest {
        id: WebViewId,
    },
    OpenWindow {
        id: WebViewId,
        uri: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        features: String,
        #[serde(default)]
        disposition: String,
    },
    WebviewCrash {
        id: WebViewId,
        #[serde(default)]
        description: String,
        #[serde(default)]
        version: String,
        #[serde(default)]
        report: String,
    },
    WindowFocus,
    WindowBlur,
    Unload,
    OpenUrl {
        uri: String,
    },
    /// A fault in the embedding runtime itself, not tied to a tab.
    RuntimeCrash {
        #[serde(default)]
        description: String,
        #[serde(default)]
        version: String,
        #[serde(default)]
        backtrace: String,
    },
    Key {
        chord: String,
        #[serde(default)]
        phase: Option<Phase>,
    },
    #[serde(other)]
    Unknown,
}

/// A decoded inbound event: either a root action, or a key chord that still
/// has to go through the keyboard tables.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Action(Action),
    Key { phase: Phase, chord: String },
}

impl HostEvent {
    pub fn into_inbound(self) -> Inbound {
        let webview = |id, action| Inbound::Action(Action::webview(id, action));
        match self {
            HostEvent::LoadStart { id, time } => webview(id, WebViewAction::LoadStart { time }),
            HostEvent::LoadEnd { id, time } => webview(id, WebViewAction::LoadEnd { time }),
            HostEvent::LoadFail {
                id,
                time,
                code,
                message,
            } => webview(id, WebViewAction::LoadFail { time, code, message }),
            HostEvent::LocationChange {
                id,
                uri,
                time,
                can_go_back,
                can_go_forward,
            } => webview(
                id,
                WebViewAction::LocationChanged {
                    uri,
                    time,
                    can_go_back,
                    can_go_forward,
                },
            ),
            HostEvent::TitleChange { id, title } => webview(id, WebViewAction::TitleChanged(title)),
            HostEvent::IconsChange { id, icons } => webview(id, WebViewAction::IconsChanged(icons)),
            HostEvent::MetaChange { id, name, content } => webview(id, WebViewAction::MetaChanged { name, content }),
            HostEvent::FirstPaint { id } => webview(id, WebViewAction::FirstPaint),
            HostEvent::WebviewFocus { id } => webview(id, WebViewAction::Focus),
            HostEvent::WebviewBlur { id } => webview(id, WebViewAction::Blur),
            HostEvent::CloseRequest { id } => webview(id, WebViewAction::CloseRequest),
            HostEvent::OpenWindow {
                id,
                uri,
                name,
                features,
                disposition,
            } => webview(
                id,
                WebViewAction::OpenWindow {
                    uri,
                    name,
                    disposition: Disposition::from_host(&disposition),
                    features,
                },
            ),
            HostEvent::WebviewCrash {
                id,
                description,
                version,
                report,
            } => webview(
                id,
                WebViewAction::Crashed {
                    description,
                    version,
                    report,
                },
            ),
            HostEvent::WindowFocus => Inbound::Action(Action::Focus),
            HostEvent::WindowBlur => Inbound::Action(Action::Blur),
            HostEvent::Unload => Inbound::Action(Action::Unload),
            HostEvent::OpenUrl { uri } => Inbound::Action(Action::OpenUrl(uri)),
            HostEvent::RuntimeCrash {
                description,
                version,
                backtrace,
            } => Inbound::Action(Action::Crash(CrashReport::new(description, version, backtrace, ""))),
            HostEvent::Key { chord, phase } => Inbound::Key {
                phase: phase.unwrap_or(Phase::Down),
                chord,
            },
            HostEvent::Unknown => Inbound::Action(Action::Unrecognized(String::new())),
        }
    }
}

/// Decode one JSON event.
pub fn decode(value: Value) -> Result<Inbound, serde_json::Error> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let event: HostEvent = serde_json::from_value(value)?;
    Ok(match event {
        HostEvent::Unknown => Inbound::Action(Action::Unrecognized(kind)),
        event => event.into_inbound(),
    })
}
