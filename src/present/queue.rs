/*
 *  present/queue.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Two tier presenter queue with preemption and resume
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, info};

use super::{Presentable, Priority};
use crate::render::Renderer;

struct Current {
    presentable: Arc<dyn Presentable>,
    priority: Priority,
    token: u64,
}

#[derive(Default)]
struct State {
    tiers: [VecDeque<Arc<dyn Presentable>>; Priority::COUNT],
    active: Option<Current>,
    next_token: u64,
}

impl State {
    fn pop_next(&mut self) -> Option<(Arc<dyn Presentable>, Priority)> {
        Priority::DESCENDING
            .into_iter()
            .find_map(|p| self.tiers[p.index()].pop_front().map(|next| (next, p)))
    }
}

struct Inner {
    renderer: Renderer,
    state: Mutex<State>,
}

fn same<P: ?Sized>(entry: &Arc<dyn Presentable>, target: *const P) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(entry), target)
}

/// One-shot "I'm done" signal handed to [`Presentable::start`].
///
/// Carries the activation it belongs to, so a signal from a presentable that
/// has since been preempted or erased is ignored.
#[derive(Clone)]
pub struct Finished {
    queue: Weak<Inner>,
    token: u64,
}

impl fmt::Debug for Finished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finished").field("token", &self.token).finish()
    }
}

impl Finished {
    /// A signal not connected to any queue.
    pub fn detached() -> Self {
        Self { queue: Weak::new(), token: 0 }
    }

    pub fn finish(&self) {
        if let Some(inner) = self.queue.upgrade() {
            Inner::finished(&inner, self.token);
        }
    }
}

/// Decides which [`Presentable`] owns the display.
///
/// At most one presentable is active. Waiting ones sit in a FIFO per tier;
/// adding a higher tier preempts the active one, which goes back to the
/// front of its own tier and resumes before anything queued after it.
///
/// Like the renderer, the queue belongs to the main scheduler. Its own lock
/// is never held while `start` or `stop` run, so presentables may call back
/// into the queue from either.
#[derive(Clone)]
pub struct PresenterQueue {
    inner: Arc<Inner>,
}

impl fmt::Debug for PresenterQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterQueue")
            .field("active", &self.active_name())
            .field("apps", &self.queued(Priority::App))
            .field("notifications", &self.queued(Priority::Notification))
            .finish()
    }
}

impl PresenterQueue {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            inner: Arc::new(Inner { renderer, state: Mutex::new(State::default()) }),
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.inner.renderer
    }

    /// Queue `presentable` at the back of its tier, preempting the active one
    /// if it sits on a lower tier.
    pub fn add(&self, presentable: Arc<dyn Presentable>, priority: Priority) {
        let name = presentable.name().to_string();
        let (preempted, idle) = {
            let mut state = self.inner.lock();
            let preempted = match &state.active {
                Some(current) if current.priority < priority => state.active.take(),
                _ => None,
            };
            if let Some(current) = &preempted {
                state.tiers[current.priority.index()].push_front(Arc::clone(&current.presentable));
            }
            state.tiers[priority.index()].push_back(presentable);
            (preempted, state.active.is_none())
        };
        debug!("queued {} as {:?}", name, priority);

        if let Some(current) = preempted {
            info!("{} preempted by {}", current.presentable.name(), name);
            current.presentable.stop();
        }
        if idle {
            Inner::present_next(&self.inner);
        }
    }

    /// Remove every queued occurrence of `presentable`; if it is the active
    /// one it is stopped and the next candidate starts. Unknown presentables
    /// are ignored.
    pub fn erase<P: Presentable + ?Sized>(&self, presentable: &P) {
        let target: *const P = presentable;
        let (current, removed) = {
            let mut state = self.inner.lock();
            let mut removed = 0;
            for tier in state.tiers.iter_mut() {
                let before = tier.len();
                tier.retain(|entry| !same(entry, target));
                removed += before - tier.len();
            }
            let current = match &state.active {
                Some(current) if same(&current.presentable, target) => state.active.take(),
                _ => None,
            };
            (current, removed)
        };
        if current.is_none() && removed == 0 {
            return;
        }
        debug!("{} erased, {} queued dropped", presentable.name(), removed);
        if let Some(current) = &current {
            info!("{} erased while active", current.presentable.name());
            current.presentable.stop();
        }
        presentable.erased();
        if current.is_some() {
            Inner::present_next(&self.inner);
        }
    }

    /// Drop everything queued and stop the active presentable.
    pub fn clear(&self) {
        let (tiers, current) = {
            let mut state = self.inner.lock();
            (std::mem::take(&mut state.tiers), state.active.take())
        };
        let queued: usize = tiers.iter().map(VecDeque::len).sum();
        debug!("presenter cleared, {} queued dropped", queued);
        if let Some(current) = &current {
            current.presentable.stop();
        }
        let mut seen: Vec<&Arc<dyn Presentable>> = Vec::new();
        for entry in tiers.iter().flatten().chain(current.as_ref().map(|c| &c.presentable)) {
            if !seen.iter().any(|s| Arc::ptr_eq(s, entry)) {
                seen.push(entry);
                entry.erased();
            }
        }
    }

    /// Redraw soon; the active presentable's state changed.
    pub fn notify(&self) {
        self.inner.renderer.notify();
    }

    pub fn is_idle(&self) -> bool {
        self.inner.lock().active.is_none()
    }

    pub fn is_active<P: Presentable + ?Sized>(&self, presentable: &P) -> bool {
        let target: *const P = presentable;
        self.inner
            .lock()
            .active
            .as_ref()
            .is_some_and(|current| same(&current.presentable, target))
    }

    pub fn active_name(&self) -> Option<String> {
        self.inner
            .lock()
            .active
            .as_ref()
            .map(|current| current.presentable.name().to_string())
    }

    /// Waiting entries in one tier.
    pub fn queued(&self, priority: Priority) -> usize {
        self.inner.lock().tiers[priority.index()].len()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn present_next(this: &Arc<Inner>) {
        let next = {
            let mut state = this.lock();
            if state.active.is_some() {
                return;
            }
            state.pop_next().map(|(presentable, priority)| {
                state.next_token += 1;
                let token = state.next_token;
                state.active = Some(Current {
                    presentable: Arc::clone(&presentable),
                    priority,
                    token,
                });
                (presentable, token)
            })
        };

        match next {
            Some((presentable, token)) => {
                info!("presenting {}", presentable.name());
                let finished = Finished { queue: Arc::downgrade(this), token };
                presentable.start(&this.renderer, finished);
            }
            None => {
                debug!("presenter idle");
                this.renderer.notify();
            }
        }
    }

    fn finished(this: &Arc<Inner>, token: u64) {
        let done = {
            let mut state = this.lock();
            match &state.active {
                Some(current) if current.token == token => state.active.take(),
                _ => None,
            }
        };
        match done {
            Some(current) => {
                info!("{} finished", current.presentable.name());
                current.presentable.stop();
                Inner::present_next(this);
            }
            None => debug!("stale finish ignored"),
        }
    }
}
