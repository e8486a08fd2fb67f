/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A host with no windows: it tracks which views exist and records every
//! request it is asked to carry out.

use std::collections::BTreeSet;

use browsershell_core::{HostError, HostOutcome, HostRequest, HostResponse, WebViewId};
use log::{error, info};
use serde_json::Value;

use super::HostPort;

/// Native views the host has materialized.
#[derive(Debug, Default)]
pub struct WebViewCollection {
    webviews: BTreeSet<WebViewId>,
    /// The order in which the webviews were created.
    creation_order: Vec<WebViewId>,
    active_webview_id: Option<WebViewId>,
}

impl WebViewCollection {
    pub fn add(&mut self, id: WebViewId) {
        if self.webviews.insert(id) {
            self.creation_order.push(id);
        }
    }

    /// Removes a webview. If it was active, the newest remaining one is
    /// activated.
    pub fn remove(&mut self, id: WebViewId) -> bool {
        self.creation_order.retain(|&webview_id| webview_id != id);
        let removed = self.webviews.remove(&id);
        if self.active_webview_id == Some(id) {
            self.active_webview_id = self.creation_order.last().copied();
        }
        removed
    }

    pub fn contains(&self, id: WebViewId) -> bool {
        self.webviews.contains(&id)
    }

    pub fn active_id(&self) -> Option<WebViewId> {
        self.active_webview_id
    }

    pub fn activate(&mut self, id: WebViewId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active_webview_id = Some(id);
        true
    }

    pub fn all_in_creation_order(&self) -> impl Iterator<Item = WebViewId> + '_ {
        self.creation_order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.webviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.webviews.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub webviews: WebViewCollection,
    /// Every request executed, in order.
    pub log: Vec<HostRequest>,
    pub snapshots: Vec<Value>,
    pub failures: Vec<String>,
    pub quit_requested: bool,
    pub reloads: usize,
    /// Write printed snapshots to stdout as they arrive.
    pub echo_snapshots: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoing() -> Self {
        Self {
            echo_snapshots: true,
            ..Self::default()
        }
    }

    fn require(&self, id: WebViewId) -> HostOutcome {
        if self.webviews.contains(id) {
            Ok(HostResponse::Ack)
        } else {
            Err(HostError::Host(format!("no such view {id}")))
        }
    }
}

impl HostPort for HeadlessHost {
    fn execute(&mut self, request: &HostRequest) -> HostOutcome {
        self.log.push(request.clone());
        match request {
            HostRequest::CreateWebView { id, background, .. } => {
                self.webviews.add(*id);
                if !background {
                    self.webviews.activate(*id);
                }
                Ok(HostResponse::Ack)
            },
            HostRequest::CloseWebView(id) => {
                let outcome = self.require(*id);
                self.webviews.remove(*id);
                outcome
            },
            HostRequest::FocusWebView(id) => {
                self.webviews.activate(*id);
                self.require(*id)
            },
            HostRequest::Navigate { id, .. }
            | HostRequest::SetZoom { id, .. }
            | HostRequest::GoBack(id)
            | HostRequest::GoForward(id)
            | HostRequest::Reload(id)
            | HostRequest::Stop(id) => self.require(*id),
            HostRequest::MinimizeWindow | HostRequest::SetFullscreen(_) => Ok(HostResponse::Ack),
            HostRequest::Quit => {
                info!("quit requested");
                self.quit_requested = true;
                Ok(HostResponse::Ack)
            },
            HostRequest::ReloadRuntime => {
                self.reloads += 1;
                Ok(HostResponse::Ack)
            },
            HostRequest::PrintSnapshot(snapshot) => {
                if self.echo_snapshots {
                    println!("{snapshot}");
                }
                self.snapshots.push(snapshot.clone());
                Ok(HostResponse::Ack)
            },
            HostRequest::ReportFailure(message) => {
                error!("{message}");
                self.failures.push(message.clone());
                Ok(HostResponse::Ack)
            },
            HostRequest::FetchSnapshot { .. }
            | HostRequest::PublishSnapshot { .. }
            | HostRequest::SubmitCrashReport { .. } => Err(HostError::Unsupported(format!("{request:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(id: u64, background: bool) -> HostRequest {
        HostRequest::CreateWebView {
            id: WebViewId::new(id),
            uri: "about:blank".into(),
            name: String::new(),
            opener: None,
            background,
        }
    }

    #[test]
    fn closing_the_active_view_activates_the_newest() {
        let mut host = HeadlessHost::new();
        host.execute(&create(1, false)).unwrap();
        host.execute(&create(2, true)).unwrap();
        host.execute(&create(3, false)).unwrap();
        assert_eq!(host.webviews.active_id(), Some(WebViewId::new(3)));

        host.execute(&HostRequest::CloseWebView(WebViewId::new(3))).unwrap();
        assert_eq!(host.webviews.active_id(), Some(WebViewId::new(2)));
        assert_eq!(
            host.webviews.all_in_creation_order().collect::<Vec<_>>(),
            vec![WebViewId::new(1), WebViewId::new(2)]
        );
    }

    #[test]
    fn requests_for_missing_views_fail() {
        let mut host = HeadlessHost::new();
        assert_eq!(
            host.execute(&HostRequest::Reload(WebViewId::new(9))),
            Err(HostError::Host("no such view webview-9".into()))
        );
        assert_eq!(host.log.len(), 1);
    }

    #[test]
    fn network_requests_are_not_local() {
        let mut host = HeadlessHost::new();
        let outcome = host.execute(&HostRequest::FetchSnapshot {
            uri: "https://example.org/s.json".into(),
        });
        assert!(matches!(outcome, Err(HostError::Unsupported(_))));
    }

    #[test]
    fn snapshots_and_failures_are_recorded() {
        let mut host = HeadlessHost::new();
        host.execute(&HostRequest::PrintSnapshot(json!({"version": "1"}))).unwrap();
        host.execute(&HostRequest::ReportFailure("boom".into())).unwrap();
        host.execute(&HostRequest::Quit).unwrap();
        assert_eq!(host.snapshots, vec![json!({"version": "1"})]);
        assert_eq!(host.failures, vec!["boom".to_string()]);
        assert!(host.quit_requested);
    }
}
