/*
 *  render/mod.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame tick multiplexer for concurrently active render callbacks
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
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::display::{BoxedDriver, Brightness, Frame};
use crate::sched::{Lifetime, Options, Scheduler};

/// Upper bound on the gap between two ticks while callbacks are active.
pub const MAX_FRAME_DELAY: Duration = Duration::from_secs(60);

/// Draws into the shared frame and returns how long until it wants to draw
/// again. `elapsed` counts from the moment the callback was registered.
/// Returning [`Duration::ZERO`] unregisters it.
pub type RenderCallback = Box<dyn FnMut(&mut Frame, Duration) -> Duration + Send + 'static>;

struct Active {
    callback: RenderCallback,
    since: Instant,
}

struct Stage {
    frame: Frame,
    driver: BoxedDriver,
    active: Vec<Active>,
}

struct Inner {
    scheduler: Scheduler,
    brightness: Brightness,
    pending: Mutex<VecDeque<RenderCallback>>,
    stage: Mutex<Stage>,
    next_tick: Mutex<Option<Lifetime>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Merges every active render callback into one frame per tick and pushes
/// that frame to the LED driver.
///
/// Ticks always run on the scheduler passed to [`Renderer::new`] (the main
/// scheduler); `add` and `notify` only post work to it. Cloning yields another
/// handle on the same renderer.
///
/// Callbacks run while the renderer holds its frame, so a callback must not
/// call [`active`](Renderer::active) on the same renderer.
#[derive(Clone)]
pub struct Renderer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("pending", &lock(&self.inner.pending).len())
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn new(scheduler: Scheduler, driver: BoxedDriver, brightness: Brightness) -> Self {
        let caps = driver.capabilities().clone();
        let frame = Frame::new(caps.width, caps.height, caps.logo_leds);
        debug!("renderer {}x{} logo {}", caps.width, caps.height, caps.logo_leds);
        Self {
            inner: Arc::new(Inner {
                scheduler,
                brightness,
                pending: Mutex::new(VecDeque::new()),
                stage: Mutex::new(Stage { frame, driver, active: Vec::new() }),
                next_tick: Mutex::new(None),
            }),
        }
    }

    /// Register `callback` and ask for a tick as soon as possible.
    pub fn add<F>(&self, callback: F)
    where
        F: FnMut(&mut Frame, Duration) -> Duration + Send + 'static,
    {
        lock(&self.inner.pending).push_back(Box::new(callback));
        self.notify();
    }

    /// Ask for a tick as soon as possible without registering anything.
    pub fn notify(&self) {
        Inner::request_tick(&self.inner, Duration::ZERO);
    }

    pub fn brightness(&self) -> &Brightness {
        &self.inner.brightness
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Callbacks that took part in the last tick and asked for another.
    pub fn active(&self) -> usize {
        lock(&self.inner.stage).active.len()
    }

    /// Callbacks added since the last tick.
    pub fn pending(&self) -> usize {
        lock(&self.inner.pending).len()
    }
}

impl Inner {
    fn request_tick(this: &Arc<Inner>, delay: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(this);
        let lifetime = this.scheduler.schedule(
            move || {
                if let Some(inner) = weak.upgrade() {
                    Inner::tick(&inner);
                }
            },
            Options::delay(delay),
        );
        // replacing the slot cancels whatever tick was queued before
        let previous = lock(&this.next_tick).replace(lifetime);
        drop(previous);
    }

    fn tick(this: &Arc<Inner>) {
        let now = Instant::now();
        let tint = this.brightness.tint();

        let mut stage = lock(&this.stage);
        {
            let mut pending = lock(&this.pending);
            stage
                .active
                .extend(pending.drain(..).map(|callback| Active { callback, since: now }));
        }

        let Stage { frame, driver, active } = &mut *stage;
        frame.set_tint(tint);
        frame.clear();

        let mut delay = MAX_FRAME_DELAY;
        active.retain_mut(|entry| {
            let next = (entry.callback)(frame, now.saturating_duration_since(entry.since));
            if next.is_zero() {
                false
            } else {
                delay = delay.min(next);
                true
            }
        });

        if let Err(e) = driver.show(frame) {
            warn!("frame not shown: {}", e);
        }
        let running = active.len();
        drop(stage);

        trace!("tick: {} callback(s), next in {:?}", running, delay);

        // callbacks may have added more while the frame was being drawn
        if !lock(&this.pending).is_empty() {
            Inner::request_tick(this, Duration::ZERO);
        } else if running > 0 {
            Inner::request_tick(this, delay);
        }
    }
}
