/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use browsershell::VERSION;
use browsershell::app::{Action, BrowserFlags};
use browsershell::input::{self, KeyBindings};
use browsershell::model::issue_reporter::{IssueReporterAction, Submission};
use browsershell::model::navigators::{Layout, Presentation};
use browsershell::model::sidebar::{SidebarAction, ToolbarAction};
use browsershell::model::toggle::ToggleAction;
use browsershell::test_utils::TestHarness;
use browsershell_core::{HostError, HostRequest, HostResponse};
use register_input::{Phase, Platform};
use serde_json::json;

#[test]
fn printed_snapshots_carry_the_running_version() {
    let mut harness = TestHarness::new();
    harness.open_tabs(2);
    harness.take_requests();

    harness.dispatch(Action::PrintSnapshot);
    let requests = harness.take_requests();
    let [HostRequest::PrintSnapshot(snapshot)] = &requests[..] else {
        panic!("expected one printed snapshot, got {requests:?}");
    };
    assert_eq!(snapshot["version"], VERSION);
    assert_eq!(snapshot["navigators"]["order"], json!([1, 2]));

    // An older build's tree is adopted without taking over the version.
    let mut older = snapshot.clone();
    older["version"] = json!("0.0.0-old");
    let mut fresh = TestHarness::new();
    fresh.dispatch(Action::AdoptSnapshot(older));
    assert_eq!(fresh.model.version, VERSION);
    assert_eq!(fresh.model.navigators, harness.model.navigators);
}

#[test]
fn closing_a_popup_returns_selection_to_its_opener() {
    let mut harness = TestHarness::new();
    let [a, b] = harness.open_tabs(2)[..] else {
        panic!("expected two tabs");
    };
    let popup = harness.model.navigators.next_id();
    harness.event(json!({
        "type": "open-window",
        "id": a.get(),
        "uri": "https://a.test/popup",
        "disposition": "new-window",
    }));
    assert_eq!(harness.model.navigators.order(), &[a, b, popup]);
    assert_eq!(harness.model.navigators.selected(), Some(popup));

    harness.event(json!({"type": "close-request", "id": popup.get()}));
    assert_eq!(harness.model.navigators.selected(), Some(a));
    assert_eq!(harness.requests().last(), Some(&HostRequest::CloseWebView(popup)));

    // Events still in flight for the closed popup are dropped.
    let before = harness.model.clone();
    harness.event(json!({"type": "title-change", "id": popup.get(), "title": "late"}));
    assert_eq!(harness.model, before);
}

#[test]
fn crashed_view_is_discarded_and_offered_for_submission() {
    let mut harness = TestHarness::with_flags(BrowserFlags {
        crash_report_endpoint: Some("https://crash.test/reports".into()),
        ..BrowserFlags::default()
    });
    let [a, b] = harness.open_tabs(2)[..] else {
        panic!("expected two tabs");
    };
    harness.event(json!({"type": "location-change", "id": b.get(), "uri": "https://b.test/", "time": 5}));
    harness.event(json!({
        "type": "webview-crash",
        "id": b.get(),
        "description": "renderer gone",
        "version": "1.2",
        "report": "frame#0",
    }));

    assert!(!harness.model.navigators.contains(b));
    assert_eq!(harness.model.navigators.selected(), Some(a));
    assert_eq!(harness.requests().last(), Some(&HostRequest::CloseWebView(b)));
    let Some(report) = harness.model.issue_reporter.report.clone() else {
        panic!("crash must be offered to the issue reporter");
    };
    assert_eq!(report.description, "renderer gone");
    assert_eq!(report.url, "https://b.test/");

    harness.dispatch(Action::IssueReporter(IssueReporterAction::Submit));
    assert_eq!(harness.model.issue_reporter.submission, Submission::Pending);
    assert!(matches!(
        harness.parked()[..],
        [HostRequest::SubmitCrashReport { .. }]
    ));

    harness.resolve_next(Err(HostError::HttpStatus(503)));
    assert!(matches!(harness.model.issue_reporter.submission, Submission::Failed(_)));
    assert!(harness.model.issue_reporter.report.is_some());

    harness.dispatch(Action::IssueReporter(IssueReporterAction::Submit));
    harness.resolve_next(Ok(HostResponse::Published {
        location: "https://crash.test/reports/9".into(),
    }));
    assert_eq!(
        harness.model.issue_reporter.submission,
        Submission::Submitted("https://crash.test/reports/9".into())
    );
    assert_eq!(harness.model.issue_reporter.report, None);
}

#[test]
fn pinning_the_sidebar_docks_it_beside_a_shrunk_deck() {
    let mut harness = TestHarness::new();
    let pin = Action::Sidebar(SidebarAction::Toolbar(ToolbarAction::Pin(ToggleAction::Toggle)));

    harness.dispatch(pin.clone());
    assert!(harness.model.sidebar.is_attached);
    assert!(harness.model.sidebar.toolbar.pin.is_checked);
    assert_eq!(harness.model.navigators.layout, Layout::Shrunk);
    assert!(harness.dispatched().contains(&Action::AttachSidebar));

    harness.dispatch(pin);
    assert!(!harness.model.sidebar.is_attached);
    assert!(!harness.model.sidebar.toolbar.pin.is_checked);
    assert_eq!(harness.model.navigators.layout, Layout::Expanded);
}

#[test]
fn replayed_snapshot_replaces_the_tree_but_keeps_devtools() {
    let mut recorded = TestHarness::new();
    recorded.open_tabs(3);
    recorded.dispatch(Action::ShowTabs);
    let snapshot = serde_json::to_value(&recorded.model).unwrap();

    let mut harness = TestHarness::with_flags(BrowserFlags {
        devtools: true,
        replay: Some("file:///tmp/browsershell-snapshot.json".into()),
        ..BrowserFlags::default()
    });
    assert_eq!(
        harness.parked(),
        vec![&HostRequest::FetchSnapshot {
            uri: "file:///tmp/browsershell-snapshot.json".into()
        }]
    );

    harness.resolve_next(Ok(HostResponse::Document(snapshot)));
    assert_eq!(harness.model.navigators, recorded.model.navigators);
    assert_eq!(harness.model.sidebar, recorded.model.sidebar);
    assert!(harness.model.devtools.is_active);
    assert!(harness.model.devtools.replay.replayed);
    assert_eq!(harness.model.devtools.replay.message(), None);
}

#[test]
fn unreadable_snapshot_is_reported_in_the_replay_panel() {
    let mut harness = TestHarness::with_flags(BrowserFlags {
        replay: Some("file:///tmp/browsershell-snapshot.json".into()),
        ..BrowserFlags::default()
    });
    harness.resolve_next(Ok(HostResponse::Document(json!({"navigators": 7}))));

    assert!(harness.model.navigators.is_empty());
    let Some(message) = harness.model.devtools.replay.message() else {
        panic!("rejection must be displayed");
    };
    assert!(message.starts_with("Snapshot could not be adopted"));
}

#[test]
fn keyboard_selection_session_commits_on_control_release() {
    let keyboard = input::keyboard(Platform::Linux, &KeyBindings::default());
    let mut harness = TestHarness::new();
    let tabs = harness.open_tabs(3);

    for chord in ["control shift tab", "control shift tab"] {
        let Some(action) = input::decode_descriptor(&keyboard, Phase::Down, chord) else {
            panic!("`{chord}` must be bound");
        };
        harness.dispatch(action);
        assert_eq!(harness.model.navigators.presentation, Presentation::Exposed);
        assert!(harness.model.sidebar.is_expanded);
    }
    assert_eq!(harness.model.navigators.selected(), Some(tabs[0]));

    let Some(release) = input::decode_descriptor(&keyboard, Phase::Up, "control") else {
        panic!("control release must be bound");
    };
    harness.dispatch(release.clone());
    assert_eq!(harness.model.navigators.presentation, Presentation::Focused);
    assert!(!harness.model.sidebar.is_expanded);

    // A stray release outside a selection session changes nothing.
    let before = harness.model.clone();
    harness.dispatch(release);
    assert_eq!(harness.model, before);
}

#[test]
fn unknown_host_events_are_ignored() {
    let mut harness = TestHarness::new();
    harness.open_tabs(1);
    let before = harness.model.clone();
    harness.event(json!({"type": "did-something-new", "id": 1}));
    assert_eq!(harness.model, before);
    assert_eq!(
        harness.dispatched().last(),
        Some(&Action::Unrecognized("did-something-new".into()))
    );
}
