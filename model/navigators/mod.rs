/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Ordered collection of WebViews plus the current selection.
//!
//! `order` is the tab display order; `entries` holds the models keyed by id.
//! Every transition that removes an id also repairs `selected` before it
//! returns, so `selected` is always `None` or a key of `entries`.
//!
//! Per-view events are routed by id. An id that is no longer present (the
//! view was closed while the host event was in flight) is a silent no-op.

pub mod page;
pub mod webview;

use std::collections::{BTreeMap, BTreeSet};

use browsershell_core::{CrashReport, Effect, HostRequest, WebViewId, unknown};
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Url, form_urlencoded};

use self::webview::{Disposition, LoadStatus, OpenRequest, WebViewAction, WebViewModel};

pub const DEFAULT_NEWTAB_URI: &str = "about:newtab";
pub const DEFAULT_SEARCH_URI: &str = "https://duckduckgo.com/?q={query}";

/// Schemes accepted verbatim from the address input even without `//`.
const OPAQUE_SCHEMES: &[&str] = &["about", "data", "file", "javascript", "mailto", "view-source"];

/// Whether the tab deck is showing one view or the tab overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Presentation {
    #[default]
    Focused,
    Exposed,
}

/// Deck width; shrunk while the sidebar is docked beside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    Expanded,
    Shrunk,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputModel {
    pub is_editing: bool,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatorSettings {
    pub newtab_uri: String,
    /// Search URI template; `{query}` is replaced by the encoded input.
    pub search_uri: String,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            newtab_uri: DEFAULT_NEWTAB_URI.to_string(),
            search_uri: DEFAULT_SEARCH_URI.to_string(),
        }
    }
}

/// A collection from outside the reducers whose tab order and entries do
/// not describe the same set of views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InconsistentNavigators {
    #[error("{0} appears more than once in the tab order")]
    DuplicateTab(WebViewId),
    #[error("{0} is in the tab order but has no entry")]
    MissingEntry(WebViewId),
    #[error("{0} has an entry but no place in the tab order")]
    UnorderedEntry(WebViewId),
    #[error("entry {key} describes {id}")]
    MisfiledEntry { key: WebViewId, id: WebViewId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorsModel {
    next_id: u64,
    order: Vec<WebViewId>,
    entries: BTreeMap<WebViewId, WebViewModel>,
    selected: Option<WebViewId>,
    pub presentation: Presentation,
    pub layout: Layout,
    pub input: InputModel,
    pub settings: NavigatorSettings,
}

impl Default for NavigatorsModel {
    fn default() -> Self {
        Self::new(NavigatorSettings::default())
    }
}

impl NavigatorsModel {
    pub fn new(settings: NavigatorSettings) -> Self {
        Self {
            next_id: 1,
            order: Vec::new(),
            entries: BTreeMap::new(),
            selected: None,
            presentation: Presentation::default(),
            layout: Layout::default(),
            input: InputModel::default(),
            settings,
        }
    }

    pub fn selected(&self) -> Option<WebViewId> {
        self.selected
    }

    pub fn selected_webview(&self) -> Option<&WebViewModel> {
        self.selected.and_then(|id| self.entries.get(&id))
    }

    pub fn get(&self, id: WebViewId) -> Option<&WebViewModel> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: WebViewId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Ids in tab display order.
    pub fn order(&self) -> &[WebViewId] {
        &self.order
    }

    /// WebViews in tab display order.
    pub fn iter(&self) -> impl Iterator<Item = &WebViewModel> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The id the next opened view will receive.
    pub fn next_id(&self) -> WebViewId {
        WebViewId::new(self.next_id)
    }

    /// Check a collection that did not come from [`update`], such as a
    /// replayed snapshot.
    ///
    /// `order` and `entries` must name the same views exactly once. The id
    /// counter is moved past every known id, and a selection of a view that
    /// is not present falls back to the first tab.
    pub fn repaired(mut self) -> Result<Self, InconsistentNavigators> {
        let mut ordered = BTreeSet::new();
        for &id in &self.order {
            if !ordered.insert(id) {
                return Err(InconsistentNavigators::DuplicateTab(id));
            }
            if !self.entries.contains_key(&id) {
                return Err(InconsistentNavigators::MissingEntry(id));
            }
        }
        for (&key, webview) in &self.entries {
            if !ordered.contains(&key) {
                return Err(InconsistentNavigators::UnorderedEntry(key));
            }
            if webview.id != key {
                return Err(InconsistentNavigators::MisfiledEntry { key, id: webview.id });
            }
        }

        let floor = ordered
            .last()
            .map_or(1, |id| id.get().saturating_add(1))
            .max(1);
        if self.next_id < floor {
            warn!("id counter {} is behind the open views; resuming at {floor}", self.next_id);
            self.next_id = floor;
        }
        if let Some(selected) = self.selected.filter(|id| !self.entries.contains_key(id)) {
            warn!("selection {selected} is not open; selecting the first tab");
            self.selected = self.order.first().copied();
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigatorsAction {
    /// Upward: show the selected view full size.
    ShowWebView,
    /// Upward: a view crashed and has been removed.
    Crash(CrashReport),

    OpenNewTab,
    Open(OpenRequest),
    /// Change the selection only.
    Select(WebViewId),
    /// Select, focus, and show a view.
    Activate(WebViewId),
    Close(WebViewId),
    CloseSelected,
    SelectNext,
    SelectPrevious,
    Reorder {
        id: WebViewId,
        index: usize,
    },
    Expose,
    Focus,
    Shrink,
    Expand,
    EditInput,
    ChangeInput(String),
    SubmitInput(String),
    BlurInput,
    GoBack,
    GoForward,
    Reload,
    Stop,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Modify {
        id: WebViewId,
        action: WebViewAction,
    },
}

/// Lift an action emitted by the view `id` into the collection.
fn tag_webview(id: WebViewId, action: WebViewAction) -> NavigatorsAction {
    match action {
        WebViewAction::Close => NavigatorsAction::Close(id),
        WebViewAction::Open(request) => NavigatorsAction::Open(OpenRequest {
            opener: Some(id),
            ..request
        }),
        WebViewAction::Crash(report) => NavigatorsAction::Crash(report),
        action => NavigatorsAction::Modify { id, action },
    }
}

pub fn update(model: NavigatorsModel, action: NavigatorsAction) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    match action {
        NavigatorsAction::OpenNewTab => {
            let request = OpenRequest::user(model.settings.newtab_uri.clone(), Disposition::Foreground);
            let (model, effect) = open(model, request);
            let input = InputModel {
                is_editing: true,
                value: String::new(),
            };
            (NavigatorsModel { input, ..model }, effect)
        },
        NavigatorsAction::Open(request) => open(model, request),
        NavigatorsAction::Select(id) => select(model, id),
        NavigatorsAction::Activate(id) => activate(model, id),
        NavigatorsAction::Close(id) => close(model, id),
        NavigatorsAction::CloseSelected => match model.selected {
            Some(id) => close(model, id),
            None => (model, Effect::none()),
        },
        NavigatorsAction::SelectNext => (select_by_offset(model, true), Effect::none()),
        NavigatorsAction::SelectPrevious => (select_by_offset(model, false), Effect::none()),
        NavigatorsAction::Reorder { id, index } => (reorder(model, id, index), Effect::none()),
        NavigatorsAction::Expose => (
            NavigatorsModel {
                presentation: Presentation::Exposed,
                ..model
            },
            Effect::none(),
        ),
        NavigatorsAction::Focus => (
            NavigatorsModel {
                presentation: Presentation::Focused,
                ..model
            },
            Effect::none(),
        ),
        NavigatorsAction::Shrink => (
            NavigatorsModel {
                layout: Layout::Shrunk,
                ..model
            },
            Effect::none(),
        ),
        NavigatorsAction::Expand => (
            NavigatorsModel {
                layout: Layout::Expanded,
                ..model
            },
            Effect::none(),
        ),
        NavigatorsAction::EditInput => {
            let value = model
                .selected_webview()
                .map(|webview| webview.navigation.uri.clone())
                .unwrap_or_default();
            let input = InputModel {
                is_editing: true,
                value,
            };
            (NavigatorsModel { input, ..model }, Effect::none())
        },
        NavigatorsAction::ChangeInput(value) => {
            let input = InputModel {
                value,
                ..model.input
            };
            (NavigatorsModel { input, ..model }, Effect::none())
        },
        NavigatorsAction::SubmitInput(text) => submit(model, &text),
        NavigatorsAction::BlurInput => {
            let input = InputModel {
                is_editing: false,
                ..model.input
            };
            (NavigatorsModel { input, ..model }, Effect::none())
        },
        NavigatorsAction::GoBack => route_selected(model, WebViewAction::GoBack),
        NavigatorsAction::GoForward => route_selected(model, WebViewAction::GoForward),
        NavigatorsAction::Reload => route_selected(model, WebViewAction::Reload),
        NavigatorsAction::Stop => route_selected(model, WebViewAction::Stop),
        NavigatorsAction::ZoomIn => route_selected(model, WebViewAction::ZoomIn),
        NavigatorsAction::ZoomOut => route_selected(model, WebViewAction::ZoomOut),
        NavigatorsAction::ResetZoom => route_selected(model, WebViewAction::ResetZoom),
        NavigatorsAction::Modify { id, action } => modify(model, id, action),
        action @ (NavigatorsAction::ShowWebView | NavigatorsAction::Crash(_)) => {
            unknown::update(model, action)
        },
    }
}

fn open(mut model: NavigatorsModel, request: OpenRequest) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    let id = WebViewId::new(model.next_id);
    model.next_id += 1;

    let webview = WebViewModel::new(id, &request);
    model.order.push(id);
    model.entries.insert(id, webview);
    if request.disposition.is_foreground() {
        model.selected = Some(id);
    }

    let effect = Effect::command(HostRequest::CreateWebView {
        id,
        uri: request.uri,
        name: request.name,
        opener: request.opener,
        background: !request.disposition.is_foreground(),
    });
    (model, effect)
}

fn select(model: NavigatorsModel, id: WebViewId) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    if !model.contains(id) {
        trace!("select: {id} is gone");
        return (model, Effect::none());
    }
    (
        NavigatorsModel {
            selected: Some(id),
            ..model
        },
        Effect::none(),
    )
}

fn activate(model: NavigatorsModel, id: WebViewId) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    if !model.contains(id) {
        trace!("activate: {id} is gone");
        return (model, Effect::none());
    }
    let effect = Effect::batch([
        Effect::command(HostRequest::FocusWebView(id)),
        Effect::receive(NavigatorsAction::ShowWebView),
    ]);
    (
        NavigatorsModel {
            selected: Some(id),
            ..model
        },
        effect,
    )
}

fn close(model: NavigatorsModel, id: WebViewId) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    if !model.contains(id) {
        trace!("close: {id} is gone");
        return (model, Effect::none());
    }
    (remove(model, id), Effect::command(HostRequest::CloseWebView(id)))
}

/// Drop `id` and repair the selection in the same step.
///
/// A removed selection passes to the view's opener if it is still open,
/// otherwise to the tab that sat before it, otherwise to the one after it.
fn remove(mut model: NavigatorsModel, id: WebViewId) -> NavigatorsModel {
    let Some(position) = model.order.iter().position(|entry| *entry == id) else {
        return model;
    };
    model.order.remove(position);
    let removed = model.entries.remove(&id);

    if model.selected == Some(id) {
        let opener = removed
            .and_then(|webview| webview.opener)
            .filter(|opener| model.entries.contains_key(opener));
        model.selected = opener
            .or_else(|| {
                position
                    .checked_sub(1)
                    .and_then(|previous| model.order.get(previous).copied())
            })
            .or_else(|| model.order.get(position).copied());
    }
    model
}

fn select_by_offset(mut model: NavigatorsModel, forward: bool) -> NavigatorsModel {
    let len = model.order.len();
    if len == 0 {
        return model;
    }
    let current = model
        .selected
        .and_then(|id| model.order.iter().position(|entry| *entry == id));
    let index = match (current, forward) {
        (Some(index), true) => (index + 1) % len,
        (Some(index), false) => (index + len - 1) % len,
        (None, true) => 0,
        (None, false) => len - 1,
    };
    model.selected = Some(model.order[index]);
    model
}

fn reorder(mut model: NavigatorsModel, id: WebViewId, index: usize) -> NavigatorsModel {
    let Some(position) = model.order.iter().position(|entry| *entry == id) else {
        trace!("reorder: {id} is gone");
        return model;
    };
    model.order.remove(position);
    let index = index.min(model.order.len());
    model.order.insert(index, id);
    model
}

fn submit(model: NavigatorsModel, text: &str) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    let text = text.trim();
    if text.is_empty() {
        let input = InputModel {
            is_editing: false,
            ..model.input
        };
        return (NavigatorsModel { input, ..model }, Effect::none());
    }

    let uri = normalize_address(text, &model.settings.search_uri);
    let input = InputModel {
        is_editing: false,
        value: uri.clone(),
    };
    let model = NavigatorsModel { input, ..model };
    match model.selected {
        Some(id) => modify(model, id, WebViewAction::Navigate(uri)),
        None => open(model, OpenRequest::user(uri, Disposition::Foreground)),
    }
}

fn route_selected(model: NavigatorsModel, action: WebViewAction) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    match model.selected {
        Some(id) => modify(model, id, action),
        None => (model, Effect::none()),
    }
}

fn modify(
    mut model: NavigatorsModel,
    id: WebViewId,
    action: WebViewAction,
) -> (NavigatorsModel, Effect<NavigatorsAction>) {
    let Some(webview) = model.entries.remove(&id) else {
        trace!("{id} is gone; dropping {action:?}");
        return (model, Effect::none());
    };
    let (webview, effect) = webview::update(webview, action);
    let crashed = webview.status == LoadStatus::Crashed;
    model.entries.insert(id, webview);
    let effect = effect.map(move |action| tag_webview(id, action));

    if crashed {
        // Crashed views are discarded, not kept as frozen snapshots.
        let model = remove(model, id);
        return (model, effect.and(Effect::command(HostRequest::CloseWebView(id))));
    }
    (model, effect)
}

/// Turn address-bar text into something navigable.
///
/// Absolute URIs pass through, bare host names get `http://`, and anything
/// else is sent to the search template.
pub fn normalize_address(input: &str, search_uri: &str) -> String {
    let input = input.trim();
    if let Ok(url) = Url::parse(input)
        && (input.contains("://") || OPAQUE_SCHEMES.contains(&url.scheme()))
    {
        return input.to_string();
    }
    if looks_like_host(input) {
        return format!("http://{input}");
    }
    let query: String = form_urlencoded::byte_serialize(input.as_bytes()).collect();
    if search_uri.contains("{query}") {
        search_uri.replace("{query}", &query)
    } else {
        format!("{search_uri}{query}")
    }
}

fn looks_like_host(input: &str) -> bool {
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return false;
    }
    let host = input.split(['/', '?', '#']).next().unwrap_or_default();
    let host = host.rsplit_once(':').map_or(host, |(name, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            name
        } else {
            host
        }
    });
    host == "localhost" || (host.contains('.') && !host.starts_with('.') && !host.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use browsershell_core::{Step, Timestamp, fold};
    use proptest::prelude::*;
    use rstest::rstest;

    fn open_tab(model: NavigatorsModel, uri: &str, disposition: Disposition) -> (NavigatorsModel, WebViewId) {
        let id = model.next_id();
        let (model, _) = update(
            model,
            NavigatorsAction::Open(OpenRequest::user(uri, disposition)),
        );
        (model, id)
    }

    fn three_tabs() -> (NavigatorsModel, [WebViewId; 3]) {
        let (model, a) = open_tab(NavigatorsModel::default(), "https://a.test/", Disposition::Foreground);
        let (model, b) = open_tab(model, "https://b.test/", Disposition::Foreground);
        let (model, c) = open_tab(model, "https://c.test/", Disposition::Foreground);
        (model, [a, b, c])
    }

    #[test]
    fn opener_scenario_hands_selection_back() {
        let (model, t1) = open_tab(NavigatorsModel::default(), "https://one.test/", Disposition::Foreground);
        assert_eq!(model.selected(), Some(t1));

        let t2 = model.next_id();
        let (model, effect) = update(
            model,
            NavigatorsAction::Open(OpenRequest {
                opener: Some(t1),
                ..OpenRequest::user("https://two.test/", Disposition::Background)
            }),
        );
        assert_eq!(model.selected(), Some(t1));
        assert_eq!(
            effect.requests(),
            vec![&HostRequest::CreateWebView {
                id: t2,
                uri: "https://two.test/".into(),
                name: String::new(),
                opener: Some(t1),
                background: true,
            }]
        );

        let (model, effect) = update(model, NavigatorsAction::Select(t2));
        assert_eq!(model.selected(), Some(t2));
        assert!(effect.is_none());

        let (model, effect) = update(model, NavigatorsAction::Close(t2));
        assert_eq!(model.selected(), Some(t1));
        assert_eq!(model.order(), &[t1]);
        assert_eq!(effect, Effect::command(HostRequest::CloseWebView(t2)));
    }

    #[rstest]
    #[case::first(0, Some(1))]
    #[case::middle(1, Some(0))]
    #[case::last(2, Some(1))]
    fn closing_the_selection_picks_a_neighbour(#[case] closed: usize, #[case] expected: Option<usize>) {
        let (model, ids) = three_tabs();
        let (model, _) = update(model, NavigatorsAction::Select(ids[closed]));
        let (model, _) = update(model, NavigatorsAction::Close(ids[closed]));
        assert_eq!(model.selected(), expected.map(|index| ids[index]));
    }

    #[test]
    fn closing_the_last_view_clears_the_selection() {
        let (model, id) = open_tab(NavigatorsModel::default(), "https://a.test/", Disposition::Foreground);
        let (model, _) = update(model, NavigatorsAction::CloseSelected);
        assert_eq!(model.selected(), None);
        assert!(model.is_empty());
        assert!(!model.contains(id));
    }

    #[test]
    fn selection_cycles_through_display_order() {
        let (model, [a, b, c]) = three_tabs();
        let (model, _) = update(model, NavigatorsAction::SelectNext);
        assert_eq!(model.selected(), Some(a));
        let (model, _) = update(model, NavigatorsAction::SelectPrevious);
        assert_eq!(model.selected(), Some(c));
        let (model, _) = update(model, NavigatorsAction::SelectPrevious);
        assert_eq!(model.selected(), Some(b));

        let (empty, _) = update(NavigatorsModel::default(), NavigatorsAction::SelectNext);
        assert_eq!(empty, NavigatorsModel::default());
    }

    #[test]
    fn reorder_moves_one_id_and_clamps() {
        let (model, [a, b, c]) = three_tabs();
        let (model, _) = update(model, NavigatorsAction::Reorder { id: a, index: 99 });
        assert_eq!(model.order(), &[b, c, a]);
        let (model, _) = update(model, NavigatorsAction::Reorder { id: c, index: 0 });
        assert_eq!(model.order(), &[c, b, a]);
    }

    #[test]
    fn events_for_removed_views_leave_state_untouched() {
        let (model, [a, _, _]) = three_tabs();
        let (model, _) = update(model, NavigatorsAction::Close(a));
        let before = model.clone();
        for action in [
            NavigatorsAction::Modify {
                id: a,
                action: WebViewAction::LoadStart { time: Timestamp(9) },
            },
            NavigatorsAction::Select(a),
            NavigatorsAction::Close(a),
            NavigatorsAction::Activate(a),
        ] {
            let (after, effect) = update(model.clone(), action);
            assert_eq!(after, before);
            assert!(effect.is_none());
        }
    }

    #[test]
    fn crash_reports_once_and_removes_the_view() {
        let (model, [a, b, _]) = three_tabs();
        let (model, _) = update(model, NavigatorsAction::Select(b));
        let (model, effect) = update(
            model,
            NavigatorsAction::Modify {
                id: b,
                action: WebViewAction::Crashed {
                    description: "oom".into(),
                    version: "0.0.1".into(),
                    report: "stack".into(),
                },
            },
        );
        assert!(!model.contains(b));
        assert_eq!(model.selected(), Some(a));

        let received = effect.received();
        assert_eq!(received.len(), 1);
        let NavigatorsAction::Crash(report) = received[0] else {
            panic!("expected a crash report, got {effect:?}");
        };
        assert_eq!(report.url, "https://b.test/");
        assert_eq!(effect.requests(), vec![&HostRequest::CloseWebView(b)]);
    }

    #[test]
    fn close_request_from_a_page_becomes_a_collection_close() {
        let (model, [_, b, _]) = three_tabs();
        let (_, effect) = update(
            model,
            NavigatorsAction::Modify {
                id: b,
                action: WebViewAction::CloseRequest,
            },
        );
        assert_eq!(effect, Effect::receive(NavigatorsAction::Close(b)));
    }

    #[test]
    fn submit_navigates_the_selection_or_opens_a_tab() {
        let (model, effect) = update(
            NavigatorsModel::default(),
            NavigatorsAction::SubmitInput("example.org".into()),
        );
        assert_eq!(model.len(), 1);
        assert!(!model.input.is_editing);
        assert!(matches!(
            effect.requests()[..],
            [HostRequest::CreateWebView { uri, .. }] if uri == "http://example.org"
        ));

        let id = model.selected().unwrap();
        let (model, effect) = update(model, NavigatorsAction::SubmitInput("rust lang".into()));
        assert_eq!(
            effect,
            Effect::command(HostRequest::Navigate {
                id,
                uri: "https://duckduckgo.com/?q=rust+lang".into(),
            })
        );
        assert_eq!(model.get(id).unwrap().navigation.target, "https://duckduckgo.com/?q=rust+lang");
    }

    #[rstest]
    #[case("https://example.org/a", "https://example.org/a")]
    #[case("about:blank", "about:blank")]
    #[case("example.org/path", "http://example.org/path")]
    #[case("localhost:8080", "http://localhost:8080")]
    #[case("what is rust?", "https://duckduckgo.com/?q=what+is+rust%3F")]
    #[case("  news  ", "https://duckduckgo.com/?q=news")]
    fn address_input_is_normalised(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_address(input, DEFAULT_SEARCH_URI), expected);
    }

    #[test]
    fn new_tab_opens_foreground_and_starts_editing() {
        let (model, effect) = update(NavigatorsModel::default(), NavigatorsAction::OpenNewTab);
        let webview = model.selected_webview().unwrap();
        assert_eq!(webview.navigation.target, DEFAULT_NEWTAB_URI);
        assert!(model.input.is_editing);
        insta::assert_debug_snapshot!(effect.requests(), @r###"
        [
            CreateWebView {
                id: WebViewId(
                    1,
                ),
                uri: "about:newtab",
                name: "",
                opener: None,
                background: false,
            },
        ]
        "###);
    }

    #[test]
    fn repair_moves_the_counter_and_drops_a_missing_selection() {
        let (model, [a, _, c]) = three_tabs();
        let damaged = NavigatorsModel {
            next_id: 2,
            selected: Some(WebViewId::new(999)),
            ..model
        };
        let repaired = damaged.repaired().unwrap();
        assert_eq!(repaired.next_id(), WebViewId::new(c.get() + 1));
        assert_eq!(repaired.selected(), Some(a));

        let (reopened, _) = update(
            repaired,
            NavigatorsAction::Open(OpenRequest::user("https://d.test/", Disposition::Foreground)),
        );
        assert_eq!(reopened.len(), 4);
        assert_eq!(reopened.entries.len(), 4);
    }

    #[test]
    fn repair_keeps_a_consistent_collection_unchanged() {
        let (model, _) = three_tabs();
        assert_eq!(model.clone().repaired(), Ok(model));
        assert_eq!(NavigatorsModel::default().repaired(), Ok(NavigatorsModel::default()));
    }

    #[rstest]
    #[case::duplicate(
        |model: &mut NavigatorsModel| model.order.push(WebViewId::new(1)),
        InconsistentNavigators::DuplicateTab(WebViewId::new(1))
    )]
    #[case::missing_entry(
        |model: &mut NavigatorsModel| {
            model.entries.remove(&WebViewId::new(2));
        },
        InconsistentNavigators::MissingEntry(WebViewId::new(2))
    )]
    #[case::unordered(
        |model: &mut NavigatorsModel| model.order.retain(|id| id.get() != 3),
        InconsistentNavigators::UnorderedEntry(WebViewId::new(3))
    )]
    fn unrepairable_collections_are_rejected(
        #[case] damage: fn(&mut NavigatorsModel),
        #[case] expected: InconsistentNavigators,
    ) {
        let (mut model, _) = three_tabs();
        damage(&mut model);
        assert_eq!(model.repaired(), Err(expected));
    }

    #[test]
    fn misfiled_entries_are_rejected() {
        let (mut model, [a, b, _]) = three_tabs();
        let Some(entry) = model.entries.get_mut(&b) else {
            panic!("b is open");
        };
        entry.id = a;
        assert_eq!(
            model.repaired(),
            Err(InconsistentNavigators::MisfiledEntry { key: b, id: a })
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(bool),
        OpenFrom(usize),
        Close(usize),
        Select(usize),
        Next,
        Previous,
        Reorder(usize, usize),
        Crash(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Open),
            (0usize..8).prop_map(Op::OpenFrom),
            (0usize..8).prop_map(Op::Close),
            (0usize..8).prop_map(Op::Select),
            Just(Op::Next),
            Just(Op::Previous),
            (0usize..8, 0usize..8).prop_map(|(id, index)| Op::Reorder(id, index)),
            (0usize..8).prop_map(Op::Crash),
        ]
    }

    /// Ops refer to ids by small integers so they also hit removed ids.
    fn to_action(op: Op) -> NavigatorsAction {
        let id = |raw: usize| WebViewId::new(raw as u64 + 1);
        match op {
            Op::Open(foreground) => NavigatorsAction::Open(OpenRequest::user(
                "https://p.test/",
                if foreground {
                    Disposition::Foreground
                } else {
                    Disposition::Background
                },
            )),
            Op::OpenFrom(raw) => NavigatorsAction::Modify {
                id: id(raw),
                action: WebViewAction::OpenWindow {
                    uri: "https://child.test/".into(),
                    name: String::new(),
                    disposition: Disposition::Foreground,
                    features: String::new(),
                },
            },
            Op::Close(raw) => NavigatorsAction::Close(id(raw)),
            Op::Select(raw) => NavigatorsAction::Select(id(raw)),
            Op::Next => NavigatorsAction::SelectNext,
            Op::Previous => NavigatorsAction::SelectPrevious,
            Op::Reorder(raw, index) => NavigatorsAction::Reorder { id: id(raw), index },
            Op::Crash(raw) => NavigatorsAction::Modify {
                id: id(raw),
                action: WebViewAction::Crashed {
                    description: "crash".into(),
                    version: "0".into(),
                    report: String::new(),
                },
            },
        }
    }

    /// `update`, with views opened from a page routed back into the
    /// collection the way the root dispatcher routes them.
    fn update_routed(model: NavigatorsModel, action: NavigatorsAction) -> (NavigatorsModel, Effect<NavigatorsAction>) {
        let (mut model, effect) = update(model, action);
        let mut rest = Vec::new();
        for step in effect.into_steps() {
            match step {
                Step::Receive(open @ NavigatorsAction::Open(_)) => {
                    let (next, effect) = update_routed(model, open);
                    model = next;
                    rest.push(effect);
                },
                Step::Receive(action) => rest.push(Effect::receive(action)),
                Step::Perform(task) => rest.push(Effect::Perform(task)),
            }
        }
        (model, Effect::batch(rest))
    }

    #[test]
    fn routed_open_window_creates_a_child_with_its_opener() {
        let (model, [a, _, _]) = three_tabs();
        let child = model.next_id();
        let (model, _) = update_routed(model, to_action(Op::OpenFrom(0)));
        assert_eq!(model.get(child).and_then(|webview| webview.opener), Some(a));
        assert_eq!(model.selected(), Some(child));

        let (model, _) = update_routed(model, to_action(Op::Close(child.get() as usize - 1)));
        assert_eq!(model.selected(), Some(a));
    }

    fn assert_consistent(model: &NavigatorsModel) -> Result<(), TestCaseError> {
        if let Some(selected) = model.selected() {
            prop_assert!(model.contains(selected), "dangling selection {selected}");
        }
        prop_assert_eq!(model.order().len(), model.entries.len());
        let mut ids = model.order().to_vec();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), model.order().len());
        prop_assert!(ids.iter().all(|id| id.get() < model.next_id));
        Ok(())
    }

    proptest! {
        #[test]
        fn selection_never_dangles(ops in prop::collection::vec(op_strategy(), 0..60)) {
            let mut model = NavigatorsModel::default();
            for op in ops {
                let selected = model.selected();
                let opener = model
                    .selected_webview()
                    .and_then(|webview| webview.opener)
                    .filter(|opener| model.contains(*opener));
                model = update_routed(model, to_action(op)).0;
                assert_consistent(&model)?;

                // A removed selection passes to its opener while that is open.
                if let (Some(selected), Some(opener)) = (selected, opener) {
                    if !model.contains(selected) && model.contains(opener) {
                        prop_assert_eq!(model.selected(), Some(opener));
                    }
                }
            }
        }

        #[test]
        fn openers_always_precede_their_children(ops in prop::collection::vec(op_strategy(), 0..60)) {
            let mut model = NavigatorsModel::default();
            for op in ops {
                model = update_routed(model, to_action(op)).0;
                let openers_precede = model.iter().all(|webview| {
                    webview.opener.is_none_or(|opener| opener.get() < webview.id.get())
                });
                prop_assert!(openers_precede);
            }
        }

        #[test]
        fn batches_equal_sequential_application(ops in prop::collection::vec(op_strategy(), 0..30)) {
            let actions: Vec<_> = ops.into_iter().map(to_action).collect();
            let (folded, _) = fold(update_routed, NavigatorsModel::default(), actions.clone());

            let mut sequential = NavigatorsModel::default();
            for action in actions {
                sequential = update_routed(sequential, action).0;
            }
            prop_assert_eq!(folded, sequential);
        }

        #[test]
        fn updates_are_deterministic(ops in prop::collection::vec(op_strategy(), 1..30)) {
            let mut model = NavigatorsModel::default();
            for op in ops {
                let action = to_action(op);
                let first = update(model.clone(), action.clone());
                let second = update(model, action);
                prop_assert_eq!(&first.0, &second.0);
                prop_assert_eq!(&first.1, &second.1);
                model = first.0;
            }
        }
    }
}
