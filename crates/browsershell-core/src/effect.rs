/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Descriptions of deferred work.
//!
//! A reducer returns an [`Effect`] next to its new state instead of doing
//! I/O. The executor interprets it later and feeds results back in as
//! ordinary actions. Because an effect is data, two runs of the same
//! `(state, action)` pair produce equal effects, which keeps replay and
//! snapshot loading deterministic.

use std::fmt;
use std::sync::Arc;

use crate::request::{HostOutcome, HostRequest};

/// Converts the outcome of a performed request into an action.
pub type Completion<A> = Arc<dyn Fn(HostOutcome) -> A + Send + Sync>;

type Tagger<A, B> = Arc<dyn Fn(A) -> B + Send + Sync>;

/// A host request plus the optional mapping of its outcome into an action.
///
/// Tasks without a completion are fire-and-forget commands.
pub struct Task<A> {
    request: HostRequest,
    completion: Option<Completion<A>>,
}

impl<A> Task<A> {
    pub fn request(&self) -> &HostRequest {
        &self.request
    }

    pub fn expects_reply(&self) -> bool {
        self.completion.is_some()
    }

    /// Resolve the task. Returns the action to dispatch, if the task has one.
    pub fn complete(self, outcome: HostOutcome) -> Option<A> {
        self.completion.map(|completion| completion(outcome))
    }

    pub fn into_parts(self) -> (HostRequest, Option<Completion<A>>) {
        (self.request, self.completion)
    }

    fn map_shared<B>(self, tag: Tagger<A, B>) -> Task<B>
    where
        A: 'static,
        B: 'static,
    {
        let completion = self.completion.map(|completion| -> Completion<B> {
            Arc::new(move |outcome| tag(completion(outcome)))
        });
        Task {
            request: self.request,
            completion,
        }
    }
}

impl<A> Clone for Task<A> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            completion: self.completion.clone(),
        }
    }
}

impl<A> PartialEq for Task<A> {
    /// Completions are closures and cannot be compared; two tasks are equal
    /// when they describe the same request and both (or neither) reply.
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request && self.expects_reply() == other.expects_reply()
    }
}

impl<A> fmt::Debug for Task<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("request", &self.request)
            .field("reply", &self.expects_reply())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Effect<A> {
    #[default]
    None,
    /// Re-enter the dispatcher with this action without performing I/O.
    Receive(A),
    Perform(Task<A>),
    /// Run every member effect.
    Batch(Vec<Effect<A>>),
}

/// One unit of work obtained by flattening an [`Effect`].
#[derive(Debug)]
pub enum Step<A> {
    Receive(A),
    Perform(Task<A>),
}

impl<A> Effect<A> {
    pub fn none() -> Self {
        Effect::None
    }

    pub fn receive(action: A) -> Self {
        Effect::Receive(action)
    }

    /// A fire-and-forget request.
    pub fn command(request: HostRequest) -> Self {
        Effect::Perform(Task {
            request,
            completion: None,
        })
    }

    /// A request whose outcome comes back as an action.
    pub fn perform<F>(request: HostRequest, completion: F) -> Self
    where
        F: Fn(HostOutcome) -> A + Send + Sync + 'static,
    {
        Effect::Perform(Task {
            request,
            completion: Some(Arc::new(completion)),
        })
    }

    /// Combine effects, dropping empty members and flattening nested batches.
    pub fn batch<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut members = Vec::new();
        for effect in effects {
            match effect {
                Effect::None => {},
                Effect::Batch(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        match members.len() {
            0 => Effect::None,
            1 => members.pop().unwrap_or_default(),
            _ => Effect::Batch(members),
        }
    }

    pub fn and(self, other: Effect<A>) -> Self {
        Effect::batch([self, other])
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    /// Lift the effect into another action type.
    pub fn map<B, F>(self, tag: F) -> Effect<B>
    where
        A: 'static,
        B: 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.map_shared(Arc::new(tag))
    }

    fn map_shared<B>(self, tag: Tagger<A, B>) -> Effect<B>
    where
        A: 'static,
        B: 'static,
    {
        match self {
            Effect::None => Effect::None,
            Effect::Receive(action) => Effect::Receive(tag(action)),
            Effect::Perform(task) => Effect::Perform(task.map_shared(tag)),
            Effect::Batch(effects) => Effect::Batch(
                effects
                    .into_iter()
                    .map(|effect| effect.map_shared(Arc::clone(&tag)))
                    .collect(),
            ),
        }
    }

    /// Flatten into steps in declaration order.
    pub fn into_steps(self) -> Vec<Step<A>> {
        let mut steps = Vec::new();
        self.collect_steps(&mut steps);
        steps
    }

    fn collect_steps(self, steps: &mut Vec<Step<A>>) {
        match self {
            Effect::None => {},
            Effect::Receive(action) => steps.push(Step::Receive(action)),
            Effect::Perform(task) => steps.push(Step::Perform(task)),
            Effect::Batch(effects) => {
                for effect in effects {
                    effect.collect_steps(steps);
                }
            },
        }
    }

    /// Every request this effect would perform, in step order.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn requests(&self) -> Vec<&HostRequest> {
        match self {
            Effect::None | Effect::Receive(_) => Vec::new(),
            Effect::Perform(task) => vec![task.request()],
            Effect::Batch(effects) => effects.iter().flat_map(Effect::requests).collect(),
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn received(&self) -> Vec<&A> {
        match self {
            Effect::None | Effect::Perform(_) => Vec::new(),
            Effect::Receive(action) => vec![action],
            Effect::Batch(effects) => effects.iter().flat_map(Effect::received).collect(),
        }
    }
}
