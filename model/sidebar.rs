/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Tab sidebar.
//!
//! The sidebar owns a toolbar, which owns the pin toggle. Pinning the
//! sidebar travels upward as a request: toggle `Check` becomes toolbar
//! `Attach`, which becomes sidebar `Attach`, which the root turns into its
//! own docking batch. The flags only change when the root routes the
//! resulting `Attach` back down.

use browsershell_core::{Cursor, Effect, WebViewId};
use serde::{Deserialize, Serialize};

use crate::model::toggle::{self, ToggleAction, ToggleModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolbarModel {
    pub pin: ToggleModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Attach,
    Detach,
    Pin(ToggleAction),
}

fn pin_tag(action: ToggleAction) -> ToolbarAction {
    match action {
        ToggleAction::Check => ToolbarAction::Attach,
        ToggleAction::Uncheck => ToolbarAction::Detach,
        other => ToolbarAction::Pin(other),
    }
}

const PIN: Cursor<ToolbarModel, ToggleModel, ToolbarAction, ToggleAction> = Cursor {
    get: |model| &model.pin,
    set: |_, pin| ToolbarModel { pin },
    update: toggle::update,
    tag: pin_tag,
};

pub fn update_toolbar(model: ToolbarModel, action: ToolbarAction) -> (ToolbarModel, Effect<ToolbarAction>) {
    match action {
        ToolbarAction::Attach => PIN.apply(model, ToggleAction::Check),
        ToolbarAction::Detach => PIN.apply(model, ToggleAction::Uncheck),
        ToolbarAction::Pin(action) => PIN.apply(model, action),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SidebarModel {
    pub is_expanded: bool,
    pub is_attached: bool,
    pub toolbar: ToolbarModel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    Expand,
    Collapse,
    /// Dock the sidebar. Emitted upward when the pin is checked.
    Attach,
    Detach,
    Toolbar(ToolbarAction),
    ActivateTab(WebViewId),
    CloseTab(WebViewId),
    CreateWebView,
}

fn toolbar_tag(action: ToolbarAction) -> SidebarAction {
    match action {
        ToolbarAction::Attach => SidebarAction::Attach,
        ToolbarAction::Detach => SidebarAction::Detach,
        other => SidebarAction::Toolbar(other),
    }
}

const TOOLBAR: Cursor<SidebarModel, ToolbarModel, SidebarAction, ToolbarAction> = Cursor {
    get: |model| &model.toolbar,
    set: |model, toolbar| SidebarModel { toolbar, ..model },
    update: update_toolbar,
    tag: toolbar_tag,
};

pub fn update(model: SidebarModel, action: SidebarAction) -> (SidebarModel, Effect<SidebarAction>) {
    match action {
        SidebarAction::Expand => (
            SidebarModel {
                is_expanded: true,
                ..model
            },
            Effect::none(),
        ),
        SidebarAction::Collapse => (
            SidebarModel {
                is_expanded: false,
                ..model
            },
            Effect::none(),
        ),
        SidebarAction::Attach => {
            let (model, effect) = TOOLBAR.apply(model, ToolbarAction::Attach);
            (
                SidebarModel {
                    is_attached: true,
                    ..model
                },
                effect,
            )
        },
        SidebarAction::Detach => {
            let (model, effect) = TOOLBAR.apply(model, ToolbarAction::Detach);
            (
                SidebarModel {
                    is_attached: false,
                    ..model
                },
                effect,
            )
        },
        SidebarAction::Toolbar(action) => TOOLBAR.apply(model, action),
        // Tab strip clicks are requests for other components; hand them up.
        action @ (SidebarAction::ActivateTab(_)
        | SidebarAction::CloseTab(_)
        | SidebarAction::CreateWebView) => (model, Effect::receive(action)),
    }
}
