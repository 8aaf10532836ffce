/*
 *  present/mod.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Presentables and the priority queue that arbitrates the display
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

mod queue;

pub use queue::{Finished, PresenterQueue};

use crate::render::Renderer;

/// Priority tier. `Notification` preempts `App`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    App = 0,
    Notification = 1,
}

impl Priority {
    pub const COUNT: usize = 2;

    /// Highest first.
    pub const DESCENDING: [Priority; Self::COUNT] = [Priority::Notification, Priority::App];

    fn index(self) -> usize {
        self as usize
    }
}

/// Something that competes for exclusive use of the display.
///
/// The queue guarantees `start` and `stop` alternate: `start` is only called
/// on an idle presentable and `stop` only on a started one. Both are called
/// from the main scheduler. Implementations keep their state behind interior
/// mutability, as they are shared as `Arc<dyn Presentable>`.
pub trait Presentable: Send + Sync {
    /// Take over the display, normally by adding render callbacks.
    ///
    /// Call `finished.finish()` once done; the queue then stops this
    /// presentable and moves on.
    fn start(&self, renderer: &Renderer, finished: Finished);

    /// Give the display up. Render callbacks must stop drawing from the next
    /// tick on.
    fn stop(&self);

    /// Removed from the queue by `erase` or `clear`, after any `stop`. State
    /// kept for activations that will now never happen can be dropped here.
    fn erased(&self) {}

    /// Name used in log lines.
    fn name(&self) -> &str {
        "presentable"
    }
}
