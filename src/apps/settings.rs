/*
 *  apps/settings.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Brightness and hue change feedback
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

use std::sync::Mutex;
use std::time::Duration;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use log::info;

use super::{Session, lock};
use crate::display::{Brightness, Frame};
use crate::present::{Finished, Presentable};
use crate::render::Renderer;

pub const SHOW_FOR: Duration = Duration::from_secs(2);

const BAR_ROWS: [i32; 2] = [8, 9];

/// Columns of the level bar for `level` on a matrix `width` wide. Anything
/// above zero lights at least one column.
pub fn bar_len(level: u8, width: u32) -> i32 {
    if level == 0 {
        return 0;
    }
    let n = (u32::from(level) * width).div_ceil(255);
    n.max(1) as i32
}

fn draw_bar(frame: &mut Frame, level: u8) {
    frame.set_logo(Rgb888::WHITE);
    for x in 0..bar_len(level, frame.width()) {
        for y in BAR_ROWS {
            frame.set(x, y, Rgb888::WHITE);
        }
    }
}

/// Applies a new brightness/hue and shows the level for a moment.
pub struct SettingsDisplay {
    brightness: Brightness,
    requested: Mutex<Option<(u8, u8)>>,
    session: Session,
}

impl SettingsDisplay {
    pub fn new(brightness: Brightness) -> Self {
        Self {
            brightness,
            requested: Mutex::new(None),
            session: Session::default(),
        }
    }

    /// Remember a change; it takes effect when this display starts.
    pub fn request(&self, level: u8, hue: u8) {
        *lock(&self.requested) = Some((level, hue));
    }

    pub fn brightness(&self) -> &Brightness {
        &self.brightness
    }
}

impl Presentable for SettingsDisplay {
    fn start(&self, renderer: &Renderer, finished: Finished) {
        if let Some((level, hue)) = lock(&self.requested).take() {
            info!("brightness {} hue {}", level, hue);
            self.brightness.set(level, hue);
        }
        let level = self.brightness.level();
        let watch = self.session.begin(renderer);
        renderer.add(move |frame, elapsed| {
            if watch.is_dead() {
                return Duration::ZERO;
            }
            if elapsed >= SHOW_FOR {
                finished.finish();
                return Duration::ZERO;
            }
            draw_bar(frame, level);
            SHOW_FOR - elapsed
        });
    }

    fn stop(&self) {
        self.session.end();
    }

    fn name(&self) -> &str {
        "settings"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MockDriver;
    use crate::present::{Priority, PresenterQueue};
    use crate::sched::Scheduler;
    use std::sync::Arc;

    #[test]
    fn test_bar_len() {
        assert_eq!(bar_len(0, 23), 0);
        assert_eq!(bar_len(1, 23), 1);
        assert_eq!(bar_len(255, 23), 23);
        assert_eq!(bar_len(128, 23), 12);
    }

    #[test]
    fn test_start_applies_request() {
        let scheduler = Scheduler::new();
        let driver = MockDriver::matrix();
        let brightness = Brightness::new(10, 10, false);
        let renderer = Renderer::new(scheduler.clone(), Box::new(driver.clone()), brightness.clone());
        let queue = PresenterQueue::new(renderer);
        let display = Arc::new(SettingsDisplay::new(brightness.clone()));

        display.request(255, 255);
        assert_eq!(brightness.level(), 10);
        queue.add(display.clone(), Priority::Notification);
        assert_eq!(brightness.level(), 255);
        assert_eq!(brightness.hue(), 255);

        scheduler.run_pending();
        let frame = driver.last_frame().unwrap();
        assert_eq!(frame.lit(), 2 * 23);
        assert_eq!(frame.get(0, 8), Some(Rgb888::WHITE));
        assert!(queue.is_active(&*display));
    }
}
