/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The boundary to the embedding runtime.
//!
//! Inbound, host events are decoded into root actions ([`events`]).
//! Outbound, the executor hands local [`HostRequest`]s to a [`HostPort`].

pub mod events;
pub mod headless;

use browsershell_core::{HostOutcome, HostRequest};

/// Something that can carry out the local (non-network) host requests.
pub trait HostPort {
    fn execute(&mut self, request: &HostRequest) -> HostOutcome;
}

impl<H: HostPort + ?Sized> HostPort for Box<H> {
    fn execute(&mut self, request: &HostRequest) -> HostOutcome {
        (**self).execute(request)
    }
}
