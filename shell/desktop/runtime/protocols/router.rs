/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Scheme router for outbound fetches made on behalf of reducers.
//!
//! Handlers are keyed by URL scheme so tests and embedders can plug in
//! their own transport without touching the executor.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use browsershell_core::HostError;
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde_json::Value;
use thiserror::Error;
use url::Url;

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Error)]
pub enum OutboundFetchError {
    #[error("invalid url `{0}`")]
    InvalidUrl(String),
    #[error("no handler for scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("{0}")]
    Network(String),
    #[error("unexpected http status {0}")]
    HttpStatus(u16),
    #[error("unreadable body: {0}")]
    Body(String),
}

impl From<OutboundFetchError> for HostError {
    fn from(error: OutboundFetchError) -> Self {
        match error {
            OutboundFetchError::InvalidUrl(url) => HostError::InvalidUri(url),
            OutboundFetchError::UnsupportedScheme(scheme) => HostError::Unsupported(format!("scheme `{scheme}`")),
            OutboundFetchError::Network(message) => HostError::Network(message),
            OutboundFetchError::HttpStatus(status) => HostError::HttpStatus(status),
            OutboundFetchError::Body(message) => HostError::Decode(message),
        }
    }
}

pub trait OutboundSchemeHandler: Send + Sync {
    fn fetch_text(&self, url: &Url) -> Result<String, OutboundFetchError>;

    /// Send `body` as JSON and return where the server stored it.
    fn post_json(&self, url: &Url, _body: &str) -> Result<String, OutboundFetchError> {
        Err(OutboundFetchError::UnsupportedScheme(url.scheme().to_string()))
    }
}

impl<F> OutboundSchemeHandler for F
where
    F: Fn(&Url) -> Result<String, OutboundFetchError> + Send + Sync,
{
    fn fetch_text(&self, url: &Url) -> Result<String, OutboundFetchError> {
        self(url)
    }
}

#[derive(Clone)]
pub struct OutboundSchemeRouter {
    handlers: HashMap<String, Arc<dyn OutboundSchemeHandler>>,
}

impl OutboundSchemeRouter {
    /// A router with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<H>(&mut self, scheme: &str, handler: H)
    where
        H: OutboundSchemeHandler + 'static,
    {
        self.handlers
            .insert(scheme.to_ascii_lowercase(), Arc::new(handler));
    }

    fn handler(&self, url: &str) -> Result<(Url, &dyn OutboundSchemeHandler), OutboundFetchError> {
        let parsed = Url::parse(url).map_err(|_| OutboundFetchError::InvalidUrl(url.to_string()))?;
        let Some(handler) = self.handlers.get(parsed.scheme()) else {
            return Err(OutboundFetchError::UnsupportedScheme(parsed.scheme().to_string()));
        };
        Ok((parsed, handler.as_ref()))
    }

    pub fn fetch_text(&self, url: &str) -> Result<String, OutboundFetchError> {
        let (parsed, handler) = self.handler(url)?;
        debug!("fetching {parsed}");
        handler.fetch_text(&parsed)
    }

    pub fn fetch_json(&self, url: &str) -> Result<Value, HostError> {
        let text = self.fetch_text(url)?;
        serde_json::from_str(&text).map_err(|error| HostError::Decode(error.to_string()))
    }

    pub fn post_json(&self, url: &str, body: &Value) -> Result<String, HostError> {
        let (parsed, handler) = self.handler(url)?;
        let body = serde_json::to_string(body).map_err(|error| HostError::Decode(error.to_string()))?;
        debug!("posting {} bytes to {parsed}", body.len());
        Ok(handler.post_json(&parsed, &body)?)
    }
}

impl Default for OutboundSchemeRouter {
    fn default() -> Self {
        let mut router = Self::empty();
        router.register("http", HttpHandler);
        router.register("https", HttpHandler);
        router.register("file", fetch_file_text);
        router
    }
}

fn outbound_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()
            .unwrap_or_else(|error| {
                warn!("falling back to default http client: {error}");
                Client::new()
            })
    })
}

struct HttpHandler;

impl OutboundSchemeHandler for HttpHandler {
    fn fetch_text(&self, url: &Url) -> Result<String, OutboundFetchError> {
        let response = outbound_client()
            .get(url.clone())
            .send()
            .map_err(|error| OutboundFetchError::Network(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutboundFetchError::HttpStatus(status.as_u16()));
        }
        response
            .text()
            .map_err(|error| OutboundFetchError::Body(error.to_string()))
    }

    fn post_json(&self, url: &Url, body: &str) -> Result<String, OutboundFetchError> {
        let response = outbound_client()
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(|error| OutboundFetchError::Network(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutboundFetchError::HttpStatus(status.as_u16()));
        }
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match location {
            Some(location) => Ok(location),
            None => Ok(url.to_string()),
        }
    }
}

fn fetch_file_text(url: &Url) -> Result<String, OutboundFetchError> {
    let path = url
        .to_file_path()
        .map_err(|_| OutboundFetchError::InvalidUrl(url.to_string()))?;
    fs::read_to_string(&path).map_err(|error| OutboundFetchError::Network(format!("{}: {error}", path.display())))
}
