/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Portable kernel for the browsershell update engine.
//!
//! Nothing in this crate knows the shape of the browser state. It provides
//! the pieces every reducer shares: identifiers, the [`Effect`] description
//! type, the vocabulary of requests a reducer may address to the host, the
//! crash-report payload, and the [`Cursor`] combinator used to embed a child
//! reducer into its parent.

pub mod cursor;
pub mod effect;
pub mod id;
pub mod report;
pub mod request;
pub mod unknown;

pub use cursor::{Cursor, fold};
pub use effect::{Completion, Effect, Step, Task};
pub use id::{Timestamp, WebViewId};
pub use report::CrashReport;
pub use request::{HostError, HostOutcome, HostRequest, HostResponse};
