/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Requests a reducer may address to the world outside the update loop.
//!
//! A request is plain data. Reducers put it inside an [`crate::Effect`];
//! only the executor ever acts on it.

use serde_json::Value;
use thiserror::Error;

use crate::id::WebViewId;
use crate::report::CrashReport;

#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    /// Ask the embedding runtime to materialize a native view for a new entity.
    CreateWebView {
        id: WebViewId,
        uri: String,
        name: String,
        opener: Option<WebViewId>,
        background: bool,
    },
    CloseWebView(WebViewId),
    FocusWebView(WebViewId),
    /// Set the navigation target of a view.
    Navigate {
        id: WebViewId,
        uri: String,
    },
    GoBack(WebViewId),
    GoForward(WebViewId),
    Reload(WebViewId),
    Stop(WebViewId),
    SetZoom {
        id: WebViewId,
        level: f32,
    },
    MinimizeWindow,
    SetFullscreen(bool),
    Quit,
    ReloadRuntime,
    PrintSnapshot(Value),
    PublishSnapshot {
        endpoint: String,
        snapshot: Value,
    },
    FetchSnapshot {
        uri: String,
    },
    SubmitCrashReport {
        endpoint: String,
        report: CrashReport,
    },
    /// Surface an error message through the host's diagnostics channel.
    ReportFailure(String),
}

impl HostRequest {
    /// Requests that leave the process and therefore complete asynchronously.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            HostRequest::FetchSnapshot { .. }
                | HostRequest::SubmitCrashReport { .. }
                | HostRequest::PublishSnapshot { .. }
        )
    }

    /// The WebView a request is aimed at, if any.
    pub fn target(&self) -> Option<WebViewId> {
        match self {
            HostRequest::CreateWebView { id, .. }
            | HostRequest::Navigate { id, .. }
            | HostRequest::SetZoom { id, .. } => Some(*id),
            HostRequest::CloseWebView(id)
            | HostRequest::FocusWebView(id)
            | HostRequest::GoBack(id)
            | HostRequest::GoForward(id)
            | HostRequest::Reload(id)
            | HostRequest::Stop(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostResponse {
    Ack,
    Document(Value),
    Published { location: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("request not supported by this host: {0}")]
    Unsupported(String),
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected http status {0}")]
    HttpStatus(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("host failure: {0}")]
    Host(String),
}

pub type HostOutcome = Result<HostResponse, HostError>;
