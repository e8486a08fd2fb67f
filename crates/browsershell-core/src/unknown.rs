/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fallback arm shared by every reducer.

use std::fmt::Debug;

use log::warn;

use crate::effect::Effect;

/// Log an action the reducer has no arm for and leave the state untouched.
pub fn update<M, A, B>(model: M, action: A) -> (M, Effect<B>)
where
    A: Debug,
{
    warn!("unhandled action {action:?}; state left unchanged");
    (model, Effect::none())
}
