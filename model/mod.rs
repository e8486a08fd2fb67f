/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Child components of the browser state tree. None of them know about the
//! root; the root embeds each through a cursor.

pub mod devtools;
pub mod issue_reporter;
pub mod navigators;
pub mod shell;
pub mod sidebar;
pub mod toggle;
