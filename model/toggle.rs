/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Two-state switch. A click (`Toggle`) does not flip the flag itself; it
//! asks the embedding component to `Check` or `Uncheck`, which lets the
//! parent reinterpret the request before the flag changes.

use browsershell_core::Effect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToggleModel {
    pub is_checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Toggle,
    Check,
    Uncheck,
}

pub fn update(model: ToggleModel, action: ToggleAction) -> (ToggleModel, Effect<ToggleAction>) {
    match action {
        ToggleAction::Toggle => {
            let request = if model.is_checked {
                ToggleAction::Uncheck
            } else {
                ToggleAction::Check
            };
            (model, Effect::receive(request))
        },
        ToggleAction::Check => (ToggleModel { is_checked: true }, Effect::none()),
        ToggleAction::Uncheck => (ToggleModel { is_checked: false }, Effect::none()),
    }
}
