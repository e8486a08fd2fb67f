/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Root browser state and the dispatcher every event enters through.
//!
//! Child components are embedded through [`Cursor`]s. Intents that touch
//! more than one child are expanded into an ordered list of narrower actions
//! and folded through [`update`], so each step stays independently pure and
//! the steps apply in the order they are listed.

use browsershell_core::{CrashReport, Cursor, Effect, HostError, HostRequest, HostResponse, WebViewId, fold, unknown};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::devtools::{self, DevtoolsAction, DevtoolsModel, ReplayAction};
use crate::model::issue_reporter::{self, IssueReporterAction, IssueReporterModel};
use crate::model::navigators::webview::{Disposition, OpenRequest, WebViewAction};
use crate::model::navigators::{self, NavigatorSettings, NavigatorsAction, NavigatorsModel, Presentation};
use crate::model::shell::{self, ShellAction, ShellModel};
use crate::model::sidebar::{self, SidebarAction, SidebarModel};

/// Everything `init` needs from the outside world, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserFlags {
    pub version: String,
    pub devtools: bool,
    pub replay: Option<String>,
    pub newtab_uri: String,
    pub search_uri: String,
    pub crash_report_endpoint: Option<String>,
    pub snapshot_publish_endpoint: Option<String>,
}

impl Default for BrowserFlags {
    fn default() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            devtools: false,
            replay: None,
            newtab_uri: navigators::DEFAULT_NEWTAB_URI.to_string(),
            search_uri: navigators::DEFAULT_SEARCH_URI.to_string(),
            crash_report_endpoint: None,
            snapshot_publish_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowserModel {
    pub version: String,
    pub shell: ShellModel,
    pub navigators: NavigatorsModel,
    pub sidebar: SidebarModel,
    pub issue_reporter: IssueReporterModel,
    pub devtools: DevtoolsModel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    GoBack,
    GoForward,
    Reload,
    Stop,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    CloseSelected,
    Quit,
    Closed(Result<(), HostError>),
    OpenNewTab,
    EditWebView,
    ShowWebView,
    ShowTabs,
    /// Toggle between the tab overview and the selected view.
    Escape,
    SelectNext,
    SelectPrevious,
    /// Release of the modifier that started a tab-switching session.
    EndSelection,
    AttachSidebar,
    DetachSidebar,
    /// A URI handed to the application by the OS.
    OpenUrl(String),
    SubmitInput(String),
    BlurInput,
    Focus,
    Blur,
    /// The host window is going away.
    Unload,
    ToggleDevtools,
    ReloadRuntime,
    Reloaded(Result<(), HostError>),
    PrintSnapshot,
    PublishSnapshot,
    SnapshotPublished(Result<String, HostError>),
    /// Replace the state tree with a deserialized snapshot.
    AdoptSnapshot(Value),
    Failure(String),
    Crash(CrashReport),
    Shell(ShellAction),
    Sidebar(SidebarAction),
    Navigators(NavigatorsAction),
    Devtools(DevtoolsAction),
    IssueReporter(IssueReporterAction),
    /// A host event of a kind this build does not know.
    Unrecognized(String),
}

impl Action {
    /// Address an action to one WebView.
    pub fn webview(id: WebViewId, action: WebViewAction) -> Self {
        Action::Navigators(NavigatorsAction::Modify { id, action })
    }
}

pub fn shell_tag(action: ShellAction) -> Action {
    Action::Shell(action)
}

pub fn navigators_tag(action: NavigatorsAction) -> Action {
    match action {
        NavigatorsAction::ShowWebView => Action::ShowWebView,
        NavigatorsAction::Crash(report) => Action::Crash(report),
        other => Action::Navigators(other),
    }
}

pub fn sidebar_tag(action: SidebarAction) -> Action {
    match action {
        SidebarAction::Attach => Action::AttachSidebar,
        SidebarAction::Detach => Action::DetachSidebar,
        SidebarAction::CreateWebView => Action::OpenNewTab,
        SidebarAction::ActivateTab(id) => Action::Navigators(NavigatorsAction::Activate(id)),
        SidebarAction::CloseTab(id) => Action::Navigators(NavigatorsAction::Close(id)),
        other => Action::Sidebar(other),
    }
}

pub fn devtools_tag(action: DevtoolsAction) -> Action {
    match action {
        DevtoolsAction::Replay(ReplayAction::Replay(snapshot)) => Action::AdoptSnapshot(snapshot),
        other => Action::Devtools(other),
    }
}

pub fn issue_reporter_tag(action: IssueReporterAction) -> Action {
    Action::IssueReporter(action)
}

const SHELL: Cursor<BrowserModel, ShellModel, Action, ShellAction> = Cursor {
    get: |model| &model.shell,
    set: |model, shell| BrowserModel { shell, ..model },
    update: shell::update,
    tag: shell_tag,
};

const NAVIGATORS: Cursor<BrowserModel, NavigatorsModel, Action, NavigatorsAction> = Cursor {
    get: |model| &model.navigators,
    set: |model, navigators| BrowserModel { navigators, ..model },
    update: navigators::update,
    tag: navigators_tag,
};

const SIDEBAR: Cursor<BrowserModel, SidebarModel, Action, SidebarAction> = Cursor {
    get: |model| &model.sidebar,
    set: |model, sidebar| BrowserModel { sidebar, ..model },
    update: sidebar::update,
    tag: sidebar_tag,
};

const DEVTOOLS: Cursor<BrowserModel, DevtoolsModel, Action, DevtoolsAction> = Cursor {
    get: |model| &model.devtools,
    set: |model, devtools| BrowserModel { devtools, ..model },
    update: devtools::update,
    tag: devtools_tag,
};

const ISSUE_REPORTER: Cursor<BrowserModel, IssueReporterModel, Action, IssueReporterAction> = Cursor {
    get: |model| &model.issue_reporter,
    set: |model, issue_reporter| BrowserModel {
        issue_reporter,
        ..model
    },
    update: issue_reporter::update,
    tag: issue_reporter_tag,
};

pub fn init(flags: BrowserFlags) -> (BrowserModel, Effect<Action>) {
    let (devtools, devtools_effect) = devtools::init(
        flags.devtools,
        flags.replay,
        flags.snapshot_publish_endpoint,
    );
    let model = BrowserModel {
        version: flags.version,
        shell: ShellModel::default(),
        navigators: NavigatorsModel::new(NavigatorSettings {
            newtab_uri: flags.newtab_uri,
            search_uri: flags.search_uri,
        }),
        sidebar: SidebarModel::default(),
        issue_reporter: IssueReporterModel::new(flags.crash_report_endpoint),
        devtools,
    };
    (model, devtools_effect.map(devtools_tag))
}

fn batch<I>(model: BrowserModel, actions: I) -> (BrowserModel, Effect<Action>)
where
    I: IntoIterator<Item = Action>,
{
    fold(update, model, actions)
}

fn show_web_view(model: BrowserModel) -> (BrowserModel, Effect<Action>) {
    batch(
        model,
        [
            Action::Sidebar(SidebarAction::Collapse),
            Action::Navigators(NavigatorsAction::Focus),
        ],
    )
}

fn show_tabs(model: BrowserModel) -> (BrowserModel, Effect<Action>) {
    batch(
        model,
        [
            Action::Sidebar(SidebarAction::Expand),
            Action::Navigators(NavigatorsAction::Expose),
        ],
    )
}

fn select_in_overview(model: BrowserModel, step: NavigatorsAction) -> (BrowserModel, Effect<Action>) {
    batch(
        model,
        [
            Action::Sidebar(SidebarAction::Expand),
            Action::Navigators(NavigatorsAction::Expose),
            Action::Navigators(step),
        ],
    )
}

fn outcome_to_unit(outcome: Result<HostResponse, HostError>) -> Result<(), HostError> {
    outcome.map(|_| ())
}

fn publish_outcome(outcome: Result<HostResponse, HostError>) -> Action {
    Action::SnapshotPublished(outcome.map(|response| match response {
        HostResponse::Published { location } => location,
        _ => String::new(),
    }))
}

fn print_snapshot(model: BrowserModel) -> (BrowserModel, Effect<Action>) {
    match serde_json::to_value(&model) {
        Ok(snapshot) => (model, Effect::command(HostRequest::PrintSnapshot(snapshot))),
        Err(error) => (model, Effect::receive(Action::Failure(format!("snapshot failed: {error}")))),
    }
}

fn publish_snapshot(model: BrowserModel) -> (BrowserModel, Effect<Action>) {
    let Some(endpoint) = model.devtools.publish_endpoint.clone() else {
        let failure = Action::Failure("no snapshot publish endpoint configured".into());
        return (model, Effect::receive(failure));
    };
    match serde_json::to_value(&model) {
        Ok(snapshot) => (
            model,
            Effect::perform(HostRequest::PublishSnapshot { endpoint, snapshot }, publish_outcome),
        ),
        Err(error) => (model, Effect::receive(Action::Failure(format!("snapshot failed: {error}")))),
    }
}

/// Swap in a replayed tree. The running version and devtools state are kept
/// so the replay panel can report what happened. The tab collection is
/// checked first; one that cannot be repaired rejects the whole tree.
fn adopt_snapshot(model: BrowserModel, snapshot: Value) -> (BrowserModel, Effect<Action>) {
    let adopted = serde_json::from_value::<BrowserModel>(snapshot)
        .map_err(|error| error.to_string())
        .and_then(|adopted| match adopted.navigators.clone().repaired() {
            Ok(navigators) => Ok(BrowserModel { navigators, ..adopted }),
            Err(error) => Err(error.to_string()),
        });
    match adopted {
        Ok(adopted) => (
            BrowserModel {
                version: model.version,
                devtools: model.devtools,
                ..adopted
            },
            Effect::none(),
        ),
        Err(error) => DEVTOOLS.apply(
            model,
            DevtoolsAction::Replay(ReplayAction::Rejected(format!(
                "Snapshot could not be adopted: {error}"
            ))),
        ),
    }
}

pub fn update(model: BrowserModel, action: Action) -> (BrowserModel, Effect<Action>) {
    match action {
        Action::GoBack => NAVIGATORS.apply(model, NavigatorsAction::GoBack),
        Action::GoForward => NAVIGATORS.apply(model, NavigatorsAction::GoForward),
        Action::Reload => NAVIGATORS.apply(model, NavigatorsAction::Reload),
        Action::Stop => NAVIGATORS.apply(model, NavigatorsAction::Stop),
        Action::ZoomIn => NAVIGATORS.apply(model, NavigatorsAction::ZoomIn),
        Action::ZoomOut => NAVIGATORS.apply(model, NavigatorsAction::ZoomOut),
        Action::ResetZoom => NAVIGATORS.apply(model, NavigatorsAction::ResetZoom),
        Action::CloseSelected => NAVIGATORS.apply(model, NavigatorsAction::CloseSelected),
        Action::Quit => (
            model,
            Effect::perform(HostRequest::Quit, |outcome| Action::Closed(outcome_to_unit(outcome))),
        ),
        Action::Closed(Ok(())) => {
            info!("host acknowledged quit");
            (model, Effect::none())
        },
        Action::Closed(Err(error)) => (model, Effect::receive(Action::Failure(format!("quit failed: {error}")))),
        Action::OpenNewTab => batch(
            model,
            [
                Action::Sidebar(SidebarAction::Collapse),
                Action::Navigators(NavigatorsAction::OpenNewTab),
            ],
        ),
        Action::EditWebView => batch(
            model,
            [
                Action::Navigators(NavigatorsAction::Focus),
                Action::Navigators(NavigatorsAction::EditInput),
            ],
        ),
        Action::ShowWebView => show_web_view(model),
        Action::ShowTabs => show_tabs(model),
        Action::Escape if model.sidebar.is_expanded => show_web_view(model),
        Action::Escape => show_tabs(model),
        Action::SelectNext => select_in_overview(model, NavigatorsAction::SelectNext),
        Action::SelectPrevious => select_in_overview(model, NavigatorsAction::SelectPrevious),
        Action::EndSelection if model.navigators.presentation == Presentation::Exposed => show_web_view(model),
        Action::EndSelection => (model, Effect::none()),
        Action::AttachSidebar => batch(
            model,
            [
                Action::Sidebar(SidebarAction::Attach),
                Action::Navigators(NavigatorsAction::Shrink),
            ],
        ),
        Action::DetachSidebar => batch(
            model,
            [
                Action::Sidebar(SidebarAction::Detach),
                Action::Navigators(NavigatorsAction::Expand),
            ],
        ),
        Action::OpenUrl(uri) => batch(
            model,
            [
                Action::Sidebar(SidebarAction::Collapse),
                Action::Navigators(NavigatorsAction::Open(OpenRequest::user(uri, Disposition::Foreground))),
            ],
        ),
        Action::SubmitInput(text) => batch(
            model,
            [
                Action::Navigators(NavigatorsAction::SubmitInput(text)),
                Action::ShowWebView,
            ],
        ),
        Action::BlurInput => NAVIGATORS.apply(model, NavigatorsAction::BlurInput),
        Action::Focus => SHELL.apply(model, ShellAction::Focus),
        Action::Blur => SHELL.apply(model, ShellAction::Blur),
        Action::Unload => {
            debug!("window unloading with {} open views", model.navigators.len());
            (model, Effect::none())
        },
        Action::ToggleDevtools => DEVTOOLS.apply(model, DevtoolsAction::Toggle),
        Action::ReloadRuntime => (
            model,
            Effect::perform(HostRequest::ReloadRuntime, |outcome| {
                Action::Reloaded(outcome_to_unit(outcome))
            }),
        ),
        Action::Reloaded(Ok(())) => (model, Effect::none()),
        Action::Reloaded(Err(error)) => (
            model,
            Effect::receive(Action::Failure(format!("runtime reload failed: {error}"))),
        ),
        Action::PrintSnapshot => print_snapshot(model),
        Action::PublishSnapshot => publish_snapshot(model),
        Action::SnapshotPublished(Ok(location)) => {
            info!("snapshot published {location}");
            (model, Effect::none())
        },
        Action::SnapshotPublished(Err(error)) => (
            model,
            Effect::receive(Action::Failure(format!("snapshot publish failed: {error}"))),
        ),
        Action::AdoptSnapshot(snapshot) => adopt_snapshot(model, snapshot),
        Action::Failure(message) => {
            error!("{message}");
            (model, Effect::command(HostRequest::ReportFailure(message)))
        },
        Action::Crash(report) => ISSUE_REPORTER.apply(model, IssueReporterAction::Create(report)),
        Action::Shell(action) => SHELL.apply(model, action),
        Action::Sidebar(action) => SIDEBAR.apply(model, action),
        Action::Navigators(action) => NAVIGATORS.apply(model, action),
        Action::Devtools(action) => DEVTOOLS.apply(model, action),
        Action::IssueReporter(action) => ISSUE_REPORTER.apply(model, action),
        action @ Action::Unrecognized(_) => unknown::update(model, action),
    }
}
