/*
 *  apps/mod.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Concrete presentables that compete for the matrix
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

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::render::Renderer;
use crate::sched::{Lifetime, Watch};

pub mod auth;
pub mod banner;
pub mod bitmap;
pub mod now_playing;
pub mod rolling;
pub mod settings;
pub mod weather;

pub use auth::AuthPrompt;
pub use banner::{Message, TextBanner};
pub use bitmap::BitmapDisplay;
pub use now_playing::{Levels, NowPlayingView};
pub use settings::SettingsDisplay;
pub use weather::{Condition, Forecast, WeatherView};

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Between `start` and `stop`: the token that keeps this presentable's render
/// callbacks wanted, and the renderer they were added to.
#[derive(Default)]
pub(crate) struct Session {
    slot: Mutex<Option<(Lifetime, Renderer)>>,
}

impl Session {
    /// Open a session; render callbacks check the returned watch every frame.
    pub(crate) fn begin(&self, renderer: &Renderer) -> Watch {
        let alive = Lifetime::detached();
        let watch = alive.watch();
        *lock(&self.slot) = Some((alive, renderer.clone()));
        watch
    }

    /// Close the session and let the renderer drop the dead callbacks now.
    pub(crate) fn end(&self) {
        let previous = lock(&self.slot).take();
        if let Some((alive, renderer)) = previous {
            drop(alive);
            renderer.notify();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Ask for a redraw if started.
    pub(crate) fn notify(&self) {
        let renderer = lock(&self.slot).as_ref().map(|(_, renderer)| renderer.clone());
        if let Some(renderer) = renderer {
            renderer.notify();
        }
    }
}
