/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Lens-based embedding of a child reducer into a parent reducer.
//!
//! A [`Cursor`] bundles the three functions a parent needs to host a child
//! without the child ever seeing the parent's shape: `get` reads the child
//! slice, `set` writes a new child slice back, and `tag` turns a child action
//! into a parent action. `tag` may reinterpret a child action as an entirely
//! different parent intent.

use crate::effect::Effect;

pub struct Cursor<P, C, PA, CA> {
    pub get: fn(&P) -> &C,
    pub set: fn(P, C) -> P,
    pub update: fn(C, CA) -> (C, Effect<CA>),
    pub tag: fn(CA) -> PA,
}

impl<P, C, PA, CA> Cursor<P, C, PA, CA>
where
    C: Clone,
    PA: 'static,
    CA: 'static,
{
    /// Route a child action through the child reducer and lift the result.
    pub fn apply(&self, parent: P, action: CA) -> (P, Effect<PA>) {
        let child = (self.get)(&parent).clone();
        let (child, effect) = (self.update)(child, action);
        ((self.set)(parent, child), effect.map(self.tag))
    }
}

impl<P, C, PA, CA> Clone for Cursor<P, C, PA, CA> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C, PA, CA> Copy for Cursor<P, C, PA, CA> {}

/// Fold a sequence of actions left to right through `update`, threading the
/// model and collecting every step's effect in declaration order.
pub fn fold<M, A, I>(update: fn(M, A) -> (M, Effect<A>), model: M, actions: I) -> (M, Effect<A>)
where
    I: IntoIterator<Item = A>,
{
    let mut effects = Vec::new();
    let mut model = model;
    for action in actions {
        let (next, effect) = update(model, action);
        model = next;
        effects.push(effect);
    }
    (model, Effect::batch(effects))
}
