/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Effect executor.
//!
//! Owns the root state and a FIFO of pending actions, and is the only place
//! [`app::update`] is called from. Local host requests run synchronously on
//! the [`HostPort`]; network requests run on a small tokio blocking pool and
//! their outcomes come back over a channel, to be completed and dispatched on
//! the executor thread. One action is applied at a time.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::{io, mem};

use browsershell_core::{Completion, Effect, HostError, HostOutcome, HostRequest, HostResponse, Step};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, trace, warn};

use crate::app::{self, Action, BrowserFlags, BrowserModel};
use crate::shell::desktop::host::HostPort;
use crate::shell::desktop::runtime::protocols::router::OutboundSchemeRouter;

const NETWORK_WORKERS: usize = 2;

struct Completed {
    ticket: u64,
    outcome: HostOutcome,
}

pub struct Runtime<H: HostPort> {
    model: BrowserModel,
    queue: VecDeque<Action>,
    host: H,
    router: Arc<OutboundSchemeRouter>,
    network: tokio::runtime::Runtime,
    sender: Sender<Completed>,
    receiver: Receiver<Completed>,
    /// In-flight network tasks, keyed by ticket.
    pending: HashMap<u64, Option<Completion<Action>>>,
    next_ticket: u64,
    dispatched: u64,
}

impl<H: HostPort> Runtime<H> {
    pub fn new(host: H, model: BrowserModel) -> io::Result<Self> {
        let network = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(NETWORK_WORKERS)
            .thread_name("browsershell-net")
            .enable_all()
            .build()?;
        let (sender, receiver) = unbounded();
        Ok(Self {
            model,
            queue: VecDeque::new(),
            host,
            router: Arc::new(OutboundSchemeRouter::default()),
            network,
            sender,
            receiver,
            pending: HashMap::new(),
            next_ticket: 0,
            dispatched: 0,
        })
    }

    /// Build the initial state from `flags` and run its startup effect.
    pub fn start(host: H, flags: BrowserFlags) -> io::Result<Self> {
        Self::start_with_router(host, flags, OutboundSchemeRouter::default())
    }

    pub fn start_with_router(host: H, flags: BrowserFlags, router: OutboundSchemeRouter) -> io::Result<Self> {
        let (model, effect) = app::init(flags);
        let mut runtime = Self::new(host, model)?.with_router(router);
        runtime.run(effect);
        runtime.drain();
        Ok(runtime)
    }

    pub fn with_router(self, router: OutboundSchemeRouter) -> Self {
        Self {
            router: Arc::new(router),
            ..self
        }
    }

    pub fn model(&self) -> &BrowserModel {
        &self.model
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Network tasks that have not reported back yet.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Actions applied so far, including those produced by effects.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn into_parts(self) -> (BrowserModel, H) {
        (self.model, self.host)
    }

    /// Apply `action` and everything it synchronously leads to.
    pub fn dispatch(&mut self, action: Action) {
        self.queue.push_back(action);
        self.drain();
    }

    /// Dispatch completions of network tasks that have already finished.
    /// Returns how many were handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completed) = self.receiver.try_recv() {
            self.complete(completed);
            handled += 1;
        }
        self.drain();
        handled
    }

    /// Wait until no network task is in flight, or `timeout` elapses.
    /// Returns whether everything settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completed) => {
                    self.complete(completed);
                    self.drain();
                },
                Err(RecvTimeoutError::Timeout) => {
                    warn!("{} network tasks still in flight after {timeout:?}", self.pending.len());
                    return false;
                },
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn drain(&mut self) {
        while let Some(action) = self.queue.pop_front() {
            trace!("dispatch {action:?}");
            #[cfg(feature = "tracing")]
            let _span = tracing::trace_span!("update", seq = self.dispatched).entered();
            self.dispatched += 1;
            let model = mem::take(&mut self.model);
            let (model, effect) = app::update(model, action);
            self.model = model;
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect<Action>) {
        for step in effect.into_steps() {
            match step {
                Step::Receive(action) => self.queue.push_back(action),
                Step::Perform(task) => {
                    let (request, completion) = task.into_parts();
                    if request.is_network() {
                        self.spawn(request, completion);
                        continue;
                    }
                    let outcome = self.host.execute(&request);
                    match completion {
                        Some(completion) => self.queue.push_back(completion(outcome)),
                        None => {
                            if let Err(error) = outcome {
                                debug!("{request:?} failed: {error}");
                            }
                        },
                    }
                },
            }
        }
    }

    fn spawn(&mut self, request: HostRequest, completion: Option<Completion<Action>>) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(ticket, completion);

        let router = Arc::clone(&self.router);
        let sender = self.sender.clone();
        self.network.spawn_blocking(move || {
            let outcome = perform_network(&router, request);
            if sender.send(Completed { ticket, outcome }).is_err() {
                trace!("executor gone before network task {ticket} finished");
            }
        });
    }

    fn complete(&mut self, completed: Completed) {
        let Some(completion) = self.pending.remove(&completed.ticket) else {
            warn!("completion for unknown ticket {}", completed.ticket);
            return;
        };
        match completion {
            Some(completion) => self.queue.push_back(completion(completed.outcome)),
            None => {
                if let Err(error) = completed.outcome {
                    warn!("network task {} failed: {error}", completed.ticket);
                }
            },
        }
    }
}

fn perform_network(router: &OutboundSchemeRouter, request: HostRequest) -> HostOutcome {
    match request {
        HostRequest::FetchSnapshot { uri } => router.fetch_json(&uri).map(HostResponse::Document),
        HostRequest::PublishSnapshot { endpoint, snapshot } => router
            .post_json(&endpoint, &snapshot)
            .map(|location| HostResponse::Published { location }),
        HostRequest::SubmitCrashReport { endpoint, report } => {
            let body = serde_json::to_value(&report).map_err(|error| HostError::Decode(error.to_string()))?;
            router
                .post_json(&endpoint, &body)
                .map(|location| HostResponse::Published { location })
        },
        other => Err(HostError::Unsupported(format!("{other:?}"))),
    }
}
