/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Window shell: focus and window-level chrome state.

use browsershell_core::{Effect, HostRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellModel {
    pub is_focused: bool,
    pub is_fullscreen: bool,
}

impl Default for ShellModel {
    fn default() -> Self {
        Self {
            is_focused: true,
            is_fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    Focus,
    Blur,
    Minimize,
    ToggleFullscreen,
}

pub fn update(model: ShellModel, action: ShellAction) -> (ShellModel, Effect<ShellAction>) {
    match action {
        ShellAction::Focus => (
            ShellModel {
                is_focused: true,
                ..model
            },
            Effect::none(),
        ),
        ShellAction::Blur => (
            ShellModel {
                is_focused: false,
                ..model
            },
            Effect::none(),
        ),
        ShellAction::Minimize => (model, Effect::command(HostRequest::MinimizeWindow)),
        ShellAction::ToggleFullscreen => {
            let is_fullscreen = !model.is_fullscreen;
            (
                ShellModel {
                    is_fullscreen,
                    ..model
                },
                Effect::command(HostRequest::SetFullscreen(is_fullscreen)),
            )
        },
    }
}
