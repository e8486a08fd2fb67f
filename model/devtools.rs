/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Developer tools: the devtools panel flag and snapshot replay.
//!
//! Replay fetches a serialized state tree and hands it upward; adopting it
//! is the root's job since only the root knows the tree's shape.

use browsershell_core::{Cursor, Effect, HostError, HostOutcome, HostRequest, HostResponse, unknown};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplayModel {
    pub snapshot_uri: Option<String>,
    pub error: Option<String>,
    pub replayed: bool,
}

impl ReplayModel {
    /// Status line shown while a replay is pending or has failed.
    pub fn message(&self) -> Option<String> {
        match (&self.snapshot_uri, &self.error) {
            (_, Some(error)) => Some(error.clone()),
            (Some(uri), None) if !self.replayed => Some(format!("Loading snapshot from {uri}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayAction {
    Load,
    Snapshot(Result<Value, HostError>),
    /// Upward: adopt this state tree.
    Replay(Value),
    /// The fetched tree could not be adopted.
    Rejected(String),
}

fn snapshot_outcome(outcome: HostOutcome) -> ReplayAction {
    let result = match outcome {
        Ok(HostResponse::Document(value)) => Ok(value),
        Ok(other) => Err(HostError::Decode(format!("expected a JSON document, got {other:?}"))),
        Err(error) => Err(error),
    };
    ReplayAction::Snapshot(result)
}

pub fn update_replay(model: ReplayModel, action: ReplayAction) -> (ReplayModel, Effect<ReplayAction>) {
    match action {
        ReplayAction::Load => match &model.snapshot_uri {
            Some(uri) => {
                let effect = Effect::perform(HostRequest::FetchSnapshot { uri: uri.clone() }, snapshot_outcome);
                (
                    ReplayModel {
                        error: None,
                        replayed: false,
                        ..model
                    },
                    effect,
                )
            },
            None => (model, Effect::none()),
        },
        ReplayAction::Snapshot(Ok(value)) => (
            ReplayModel {
                replayed: true,
                error: None,
                ..model
            },
            Effect::receive(ReplayAction::Replay(value)),
        ),
        ReplayAction::Snapshot(Err(error)) => {
            let uri = model.snapshot_uri.clone().unwrap_or_default();
            (
                ReplayModel {
                    error: Some(format!("Failed to fetch {uri}: {error}")),
                    replayed: false,
                    ..model
                },
                Effect::none(),
            )
        },
        ReplayAction::Rejected(message) => (
            ReplayModel {
                error: Some(message),
                replayed: false,
                ..model
            },
            Effect::none(),
        ),
        action @ ReplayAction::Replay(_) => unknown::update(model, action),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DevtoolsModel {
    pub is_active: bool,
    pub publish_endpoint: Option<String>,
    pub replay: ReplayModel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DevtoolsAction {
    Toggle,
    Replay(ReplayAction),
}

const REPLAY: Cursor<DevtoolsModel, ReplayModel, DevtoolsAction, ReplayAction> = Cursor {
    get: |model| &model.replay,
    set: |model, replay| DevtoolsModel { replay, ..model },
    update: update_replay,
    tag: DevtoolsAction::Replay,
};

pub fn init(
    is_active: bool,
    snapshot_uri: Option<String>,
    publish_endpoint: Option<String>,
) -> (DevtoolsModel, Effect<DevtoolsAction>) {
    let effect = match snapshot_uri {
        Some(_) => Effect::receive(DevtoolsAction::Replay(ReplayAction::Load)),
        None => Effect::none(),
    };
    let model = DevtoolsModel {
        is_active,
        publish_endpoint,
        replay: ReplayModel {
            snapshot_uri,
            ..ReplayModel::default()
        },
    };
    (model, effect)
}

pub fn update(model: DevtoolsModel, action: DevtoolsAction) -> (DevtoolsModel, Effect<DevtoolsAction>) {
    match action {
        DevtoolsAction::Toggle => (
            DevtoolsModel {
                is_active: !model.is_active,
                ..model
            },
            Effect::none(),
        ),
        DevtoolsAction::Replay(action) => REPLAY.apply(model, action),
    }
}
