/*
 *  sched/lifetime.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Ownership tokens that keep scheduled work wanted
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

use std::fmt;
use std::sync::{Arc, Weak};

use super::scheduler::Shared;

/// Opaque, reference counted ownership token.
///
/// Whoever holds a `Lifetime` keeps the operation it guards eligible to run.
/// Once the last clone is dropped, any occurrence of that operation that has
/// not fired yet is skipped. There is no cancel call: overwrite the handle or
/// let it go out of scope.
///
/// Two handles compare equal when they guard the same operation.
#[must_use = "dropping a Lifetime cancels the work it guards"]
#[derive(Clone)]
pub struct Lifetime {
    sentinel: Arc<Sentinel>,
}

/// Weak view of a [`Lifetime`], held by the operation itself.
#[derive(Clone)]
pub struct Watch {
    sentinel: Weak<Sentinel>,
}

struct Sentinel {
    // set for handles issued by a scheduler so that releasing them wakes its loop
    scheduler: Option<Arc<Shared>>,
}

impl Drop for Sentinel {
    fn drop(&mut self) {
        if let Some(shared) = self.scheduler.take() {
            shared.wake();
        }
    }
}

impl Lifetime {
    /// A handle that is not bound to any scheduler.
    ///
    /// Presentables use these as their "still wanted" flag for render
    /// callbacks.
    pub fn detached() -> Self {
        Self { sentinel: Arc::new(Sentinel { scheduler: None }) }
    }

    pub(crate) fn for_scheduler(shared: Arc<Shared>) -> Self {
        Self { sentinel: Arc::new(Sentinel { scheduler: Some(shared) }) }
    }

    /// Weak reference used by the guarded operation to check liveness when it fires.
    pub fn watch(&self) -> Watch {
        Watch { sentinel: Arc::downgrade(&self.sentinel) }
    }
}

impl PartialEq for Lifetime {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sentinel, &other.sentinel)
    }
}

impl Eq for Lifetime {}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifetime")
            .field("id", &Arc::as_ptr(&self.sentinel))
            .field("owners", &Arc::strong_count(&self.sentinel))
            .finish()
    }
}

impl Watch {
    /// True while at least one owner of the lifetime remains.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.sentinel.strong_count() > 0
    }

    /// True once every owner has released the lifetime.
    #[inline]
    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch").field("alive", &self.is_alive()).finish()
    }
}
