/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Crash reports awaiting the user's decision.
//!
//! A report is held until it is dismissed or successfully submitted.
//! Submission failures are shown inline and leave the report in place.
//! Every created report gets a fresh serial; a submission result only
//! applies to the report it was sent for.

use browsershell_core::{CrashReport, Effect, HostError, HostOutcome, HostRequest, HostResponse};
use log::{info, trace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "kebab-case")]
pub enum Submission {
    #[default]
    Idle,
    Pending,
    Submitted(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueReporterModel {
    pub report: Option<CrashReport>,
    /// Serial of the held report; bumped by every `Create`.
    #[serde(default)]
    pub serial: u64,
    pub submission: Submission,
    pub endpoint: Option<String>,
}

impl IssueReporterModel {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueReporterAction {
    Create(CrashReport),
    Dismiss,
    Submit,
    Submitted {
        serial: u64,
        result: Result<String, HostError>,
    },
}

fn submitted(serial: u64, outcome: HostOutcome) -> IssueReporterAction {
    let result = outcome.map(|response| match response {
        HostResponse::Published { location } => location,
        _ => String::new(),
    });
    IssueReporterAction::Submitted { serial, result }
}

pub fn update(
    model: IssueReporterModel,
    action: IssueReporterAction,
) -> (IssueReporterModel, Effect<IssueReporterAction>) {
    match action {
        IssueReporterAction::Create(report) => (
            IssueReporterModel {
                report: Some(report),
                serial: model.serial.wrapping_add(1),
                submission: Submission::Idle,
                ..model
            },
            Effect::none(),
        ),
        IssueReporterAction::Dismiss => (
            IssueReporterModel {
                report: None,
                submission: Submission::Idle,
                ..model
            },
            Effect::none(),
        ),
        IssueReporterAction::Submit => {
            let Some(report) = model.report.clone() else {
                trace!("nothing to submit");
                return (model, Effect::none());
            };
            if model.submission == Submission::Pending {
                return (model, Effect::none());
            }
            let Some(endpoint) = model.endpoint.clone() else {
                return (
                    IssueReporterModel {
                        submission: Submission::Failed("no crash report endpoint configured".into()),
                        ..model
                    },
                    Effect::none(),
                );
            };
            let serial = model.serial;
            (
                IssueReporterModel {
                    submission: Submission::Pending,
                    ..model
                },
                Effect::perform(HostRequest::SubmitCrashReport { endpoint, report }, move |outcome| {
                    submitted(serial, outcome)
                }),
            )
        },
        IssueReporterAction::Submitted { serial, .. }
            if serial != model.serial || model.submission != Submission::Pending =>
        {
            trace!("stale submission result for report {serial} ignored");
            (model, Effect::none())
        },
        IssueReporterAction::Submitted {
            result: Ok(location), ..
        } => {
            info!("crash report submitted {location}");
            (
                IssueReporterModel {
                    report: None,
                    submission: Submission::Submitted(location),
                    ..model
                },
                Effect::none(),
            )
        },
        IssueReporterAction::Submitted {
            result: Err(error), ..
        } => (
            IssueReporterModel {
                submission: Submission::Failed(error.to_string()),
                ..model
            },
            Effect::none(),
        ),
    }
}
