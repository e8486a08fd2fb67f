/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Synchronous driver for scenario tests.
//!
//! [`TestHarness`] applies actions with [`app::update`], folds `Receive`
//! effects immediately and records every performed request. Tasks that
//! expect a reply are parked until the test resolves them, so interleavings
//! of asynchronous results can be scripted exactly.

use std::collections::VecDeque;

use browsershell_core::{Effect, HostOutcome, HostRequest, HostResponse, Step, Task, WebViewId};
use serde_json::Value;

use crate::app::{self, Action, BrowserFlags, BrowserModel};
use crate::shell::desktop::host::events::{self, Inbound};

pub struct TestHarness {
    pub model: BrowserModel,
    requests: Vec<HostRequest>,
    parked: VecDeque<Task<Action>>,
    dispatched: Vec<Action>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_flags(BrowserFlags::default())
    }

    pub fn with_flags(flags: BrowserFlags) -> Self {
        let (model, effect) = app::init(flags);
        let mut harness = Self {
            model,
            requests: Vec::new(),
            parked: VecDeque::new(),
            dispatched: Vec::new(),
        };
        harness.run(effect);
        harness
    }

    /// Apply `action` and every action it synchronously receives.
    pub fn dispatch(&mut self, action: Action) -> &mut Self {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            self.dispatched.push(action.clone());
            let model = std::mem::take(&mut self.model);
            let (model, effect) = app::update(model, action);
            self.model = model;
            queue.extend(self.collect(effect));
        }
        self
    }

    pub fn dispatch_all<I: IntoIterator<Item = Action>>(&mut self, actions: I) -> &mut Self {
        for action in actions {
            self.dispatch(action);
        }
        self
    }

    /// Decode and dispatch a host event. Key chords are ignored here; use
    /// the input tables directly for those.
    pub fn event(&mut self, value: Value) -> &mut Self {
        match events::decode(value) {
            Ok(Inbound::Action(action)) => self.dispatch(action),
            Ok(Inbound::Key { .. }) | Err(_) => self,
        }
    }

    /// Open `count` foreground tabs and return their ids in order.
    pub fn open_tabs(&mut self, count: usize) -> Vec<WebViewId> {
        (0..count)
            .map(|index| {
                let id = self.model.navigators.next_id();
                self.dispatch(Action::OpenUrl(format!("https://tab{index}.test/")));
                id
            })
            .collect()
    }

    /// Requests performed so far, in order.
    pub fn requests(&self) -> &[HostRequest] {
        &self.requests
    }

    pub fn take_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Every action applied, including received ones.
    pub fn dispatched(&self) -> &[Action] {
        &self.dispatched
    }

    /// Tasks waiting for an outcome.
    pub fn parked(&self) -> Vec<&HostRequest> {
        self.parked.iter().map(Task::request).collect()
    }

    /// Resolve the oldest parked task with `outcome`. Returns its request.
    pub fn resolve_next(&mut self, outcome: HostOutcome) -> Option<HostRequest> {
        let task = self.parked.pop_front()?;
        let request = task.request().clone();
        if let Some(action) = task.complete(outcome) {
            self.dispatch(action);
        }
        Some(request)
    }

    /// Acknowledge every parked task, including any parked while doing so.
    pub fn acknowledge_all(&mut self) {
        while self.resolve_next(Ok(HostResponse::Ack)).is_some() {}
    }

    fn run(&mut self, effect: Effect<Action>) {
        let received = self.collect(effect);
        for action in received {
            self.dispatch(action);
        }
    }

    fn collect(&mut self, effect: Effect<Action>) -> Vec<Action> {
        let mut received = Vec::new();
        for step in effect.into_steps() {
            match step {
                Step::Receive(action) => received.push(action),
                Step::Perform(task) => {
                    self.requests.push(task.request().clone());
                    if task.expects_reply() {
                        self.parked.push_back(task);
                    }
                },
            }
        }
        received
    }
}
