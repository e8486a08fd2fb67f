/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Lifecycle of a single WebView.
//!
//! `Pending -> Loading -> Loaded | Failed`, with `Loaded` and `Failed`
//! re-entering `Loading` on the next navigation start. `Crashed` is
//! terminal; the owning collection drops the entity in the same transition.

use browsershell_core::{CrashReport, Effect, HostRequest, Timestamp, WebViewId, unknown};
use log::trace;
use serde::{Deserialize, Serialize};

use super::page::{Icon, PageModel, Pallet, Progress};

pub const DEFAULT_ZOOM: f32 = 1.0;
pub const ZOOM_STEP: f32 = 0.1;
pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadStatus {
    #[default]
    Pending,
    Loading,
    Loaded,
    Failed,
    Crashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    #[default]
    Foreground,
    Background,
}

impl Disposition {
    /// Interpret the disposition string an embedding runtime attaches to
    /// open-window requests.
    pub fn from_host(value: &str) -> Self {
        match value {
            "background-tab" | "background" => Disposition::Background,
            _ => Disposition::Foreground,
        }
    }

    pub fn is_foreground(self) -> bool {
        self == Disposition::Foreground
    }
}

/// Who asked for a WebView to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    User,
    OpenWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub uri: String,
    pub name: String,
    pub features: String,
    pub disposition: Disposition,
    pub origin: Origin,
    pub opener: Option<WebViewId>,
}

impl OpenRequest {
    pub fn user(uri: impl Into<String>, disposition: Disposition) -> Self {
        OpenRequest {
            uri: uri.into(),
            name: String::new(),
            features: String::new(),
            disposition,
            origin: Origin::User,
            opener: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Navigation {
    /// Last URI the shell asked the view to load.
    pub target: String,
    /// Last URI the view committed to.
    pub uri: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebViewModel {
    pub id: WebViewId,
    pub name: String,
    pub features: String,
    /// Non-owning; only consulted when handing selection back on close.
    pub opener: Option<WebViewId>,
    pub origin: Origin,
    pub disposition: Disposition,
    pub status: LoadStatus,
    pub navigation: Navigation,
    pub page: PageModel,
    pub fault: Option<Fault>,
    pub zoom: f32,
    pub is_focused: bool,
    pub first_paint: bool,
    pub progress: Progress,
}

impl WebViewModel {
    pub fn new(id: WebViewId, request: &OpenRequest) -> Self {
        WebViewModel {
            id,
            name: request.name.clone(),
            features: request.features.clone(),
            opener: request.opener,
            origin: request.origin,
            disposition: request.disposition,
            status: LoadStatus::Pending,
            navigation: Navigation {
                target: request.uri.clone(),
                uri: request.uri.clone(),
                can_go_back: false,
                can_go_forward: false,
            },
            page: PageModel::default(),
            fault: None,
            zoom: DEFAULT_ZOOM,
            is_focused: false,
            first_paint: false,
            progress: Progress::default(),
        }
    }

    pub fn favicon_uri(&self) -> Option<String> {
        self.page.favicon_uri(&self.navigation.uri)
    }

    pub fn progress_at(&self, now: Timestamp) -> f32 {
        self.progress.estimate(now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebViewAction {
    LoadStart {
        time: Timestamp,
    },
    LoadEnd {
        time: Timestamp,
    },
    LoadFail {
        time: Timestamp,
        code: i32,
        message: String,
    },
    LocationChanged {
        uri: String,
        time: Timestamp,
        can_go_back: bool,
        can_go_forward: bool,
    },
    TitleChanged(String),
    IconsChanged(Vec<Icon>),
    MetaChanged {
        name: String,
        content: String,
    },
    FirstPaint,
    Focus,
    Blur,
    /// The page asked to be closed (e.g. `window.close()`).
    CloseRequest,
    /// The page asked for a new window.
    OpenWindow {
        uri: String,
        name: String,
        disposition: Disposition,
        features: String,
    },
    Crashed {
        description: String,
        version: String,
        report: String,
    },

    Navigate(String),
    GoBack,
    GoForward,
    Reload,
    Stop,
    ZoomIn,
    ZoomOut,
    ResetZoom,

    /// Upward: remove this view from its collection.
    Close,
    /// Upward: open another view with this one as opener.
    Open(OpenRequest),
    /// Upward: this view crashed.
    Crash(CrashReport),
}

fn clamp_zoom(level: f32) -> f32 {
    ((level * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM)
}

fn set_zoom(model: WebViewModel, level: f32) -> (WebViewModel, Effect<WebViewAction>) {
    let zoom = clamp_zoom(level);
    if zoom == model.zoom {
        return (model, Effect::none());
    }
    let effect = Effect::command(HostRequest::SetZoom { id: model.id, level: zoom });
    (WebViewModel { zoom, ..model }, effect)
}

pub fn update(model: WebViewModel, action: WebViewAction) -> (WebViewModel, Effect<WebViewAction>) {
    if model.status == LoadStatus::Crashed {
        trace!("{} crashed; dropping {action:?}", model.id);
        return (model, Effect::none());
    }

    match action {
        WebViewAction::LoadStart { time } => (
            WebViewModel {
                status: LoadStatus::Loading,
                fault: None,
                progress: Progress::started(time),
                ..model
            },
            Effect::none(),
        ),
        WebViewAction::LoadEnd { time } => {
            // Hosts report the end of a failed load too; keep the failure.
            let status = match model.status {
                LoadStatus::Failed => LoadStatus::Failed,
                _ => LoadStatus::Loaded,
            };
            let progress = Progress {
                load_end: Some(time),
                ..model.progress
            };
            (
                WebViewModel {
                    status,
                    progress,
                    ..model
                },
                Effect::none(),
            )
        },
        WebViewAction::LoadFail {
            time,
            code,
            message,
        } => {
            let progress = Progress {
                load_end: Some(time),
                ..model.progress
            };
            (
                WebViewModel {
                    status: LoadStatus::Failed,
                    fault: Some(Fault { code, message }),
                    progress,
                    ..model
                },
                Effect::none(),
            )
        },
        WebViewAction::LocationChanged {
            uri,
            time: _,
            can_go_back,
            can_go_forward,
        } => {
            let navigation = Navigation {
                uri,
                can_go_back,
                can_go_forward,
                ..model.navigation
            };
            (WebViewModel { navigation, ..model }, Effect::none())
        },
        WebViewAction::TitleChanged(title) => {
            let page = PageModel {
                title: Some(title),
                ..model.page
            };
            (WebViewModel { page, ..model }, Effect::none())
        },
        WebViewAction::IconsChanged(icons) => {
            let page = model.page.with_icons(icons);
            (WebViewModel { page, ..model }, Effect::none())
        },
        WebViewAction::MetaChanged { name, content } if name == "theme-color" => {
            let page = PageModel {
                pallet: Pallet::from_theme_color(&content),
                ..model.page
            };
            (WebViewModel { page, ..model }, Effect::none())
        },
        WebViewAction::MetaChanged { name, .. } => {
            trace!("{} ignoring meta {name}", model.id);
            (model, Effect::none())
        },
        WebViewAction::FirstPaint => (
            WebViewModel {
                first_paint: true,
                ..model
            },
            Effect::none(),
        ),
        WebViewAction::Focus => (
            WebViewModel {
                is_focused: true,
                ..model
            },
            Effect::none(),
        ),
        WebViewAction::Blur => (
            WebViewModel {
                is_focused: false,
                ..model
            },
            Effect::none(),
        ),
        WebViewAction::CloseRequest => (model, Effect::receive(WebViewAction::Close)),
        WebViewAction::OpenWindow {
            uri,
            name,
            disposition,
            features,
        } => {
            let request = OpenRequest {
                uri,
                name,
                features,
                disposition,
                origin: Origin::OpenWindow,
                opener: Some(model.id),
            };
            (model, Effect::receive(WebViewAction::Open(request)))
        },
        WebViewAction::Crashed {
            description,
            version,
            report,
        } => {
            let report = CrashReport::new(description, version, report, model.navigation.uri.clone());
            (
                WebViewModel {
                    status: LoadStatus::Crashed,
                    is_focused: false,
                    ..model
                },
                Effect::receive(WebViewAction::Crash(report)),
            )
        },
        WebViewAction::Navigate(uri) => {
            let effect = Effect::command(HostRequest::Navigate {
                id: model.id,
                uri: uri.clone(),
            });
            let navigation = Navigation {
                target: uri,
                ..model.navigation
            };
            (WebViewModel { navigation, ..model }, effect)
        },
        WebViewAction::GoBack if model.navigation.can_go_back => {
            let effect = Effect::command(HostRequest::GoBack(model.id));
            (model, effect)
        },
        WebViewAction::GoForward if model.navigation.can_go_forward => {
            let effect = Effect::command(HostRequest::GoForward(model.id));
            (model, effect)
        },
        WebViewAction::GoBack | WebViewAction::GoForward => (model, Effect::none()),
        WebViewAction::Reload => {
            let effect = Effect::command(HostRequest::Reload(model.id));
            (model, effect)
        },
        WebViewAction::Stop => {
            let effect = Effect::command(HostRequest::Stop(model.id));
            (model, effect)
        },
        WebViewAction::ZoomIn => {
            let level = model.zoom + ZOOM_STEP;
            set_zoom(model, level)
        },
        WebViewAction::ZoomOut => {
            let level = model.zoom - ZOOM_STEP;
            set_zoom(model, level)
        },
        WebViewAction::ResetZoom => set_zoom(model, DEFAULT_ZOOM),
        action @ (WebViewAction::Close | WebViewAction::Open(_) | WebViewAction::Crash(_)) => {
            unknown::update(model, action)
        },
    }
}
