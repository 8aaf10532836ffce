/*
 *  apps/now_playing.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Now playing level bars
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

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;

use super::{Session, lock};
use crate::display::frame::MATRIX_WIDTH;
use crate::display::{Frame, color};
use crate::present::{Finished, Presentable};
use crate::render::Renderer;

pub const COLUMNS: usize = MATRIX_WIDTH as usize;

/// Bars are mirrored around this row.
pub const CENTER_ROW: i32 = 8;

const REFRESH: Duration = Duration::from_secs(5);

/// Spotify green, used for the logo.
pub const LOGO_COLOR: Rgb888 = Rgb888::new(0x1e, 0xd7, 0x60);

/// Per column bar lengths above (`up`) and below (`down`) the centre row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Levels {
    pub up: [u8; COLUMNS],
    pub down: [u8; COLUMNS],
}

impl Levels {
    /// Same length above and below.
    pub fn symmetric(levels: [u8; COLUMNS]) -> Self {
        Self { up: levels, down: levels }
    }

    pub fn draw(&self, frame: &mut Frame, c: Rgb888) {
        let half = CENTER_ROW;
        for col in 0..COLUMNS {
            let start = CENTER_ROW - i32::from(self.up[col]).min(half);
            let end = CENTER_ROW + i32::from(self.down[col]).min(half);
            for y in start..end {
                frame.set(col as i32, y, c);
            }
        }
    }
}

/// Scannable now-playing bars. Never finishes on its own; it stays on the
/// App tier until erased.
pub struct NowPlayingView {
    levels: Arc<Mutex<Levels>>,
    session: Session,
    color: Rgb888,
}

impl Default for NowPlayingView {
    fn default() -> Self {
        Self::new()
    }
}

impl NowPlayingView {
    pub fn new() -> Self {
        Self {
            levels: Arc::new(Mutex::new(Levels::default())),
            session: Session::default(),
            color: color::WHITE,
        }
    }

    /// Replace the bars and redraw if on screen.
    pub fn update(&self, levels: Levels) {
        *lock(&self.levels) = levels;
        self.session.notify();
    }

    pub fn levels(&self) -> Levels {
        *lock(&self.levels)
    }

    pub fn is_started(&self) -> bool {
        self.session.is_running()
    }
}

impl Presentable for NowPlayingView {
    fn start(&self, renderer: &Renderer, _finished: Finished) {
        let watch = self.session.begin(renderer);
        let levels = Arc::clone(&self.levels);
        let c = self.color;
        renderer.add(move |frame, _| {
            if watch.is_dead() {
                return Duration::ZERO;
            }
            frame.set_logo(LOGO_COLOR);
            lock(&levels).draw(frame, c);
            REFRESH
        });
    }

    fn stop(&self) {
        self.session.end();
    }

    fn name(&self) -> &str {
        "now-playing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Brightness, MockDriver};
    use crate::present::{Priority, PresenterQueue};
    use crate::sched::Scheduler;

    #[test]
    fn test_levels_draw_around_center() {
        let mut levels = Levels::default();
        levels.up[0] = 2;
        levels.down[0] = 3;
        levels.up[22] = 20;
        let mut frame = Frame::default();
        levels.draw(&mut frame, color::WHITE);

        let lit: Vec<i32> = (0..16).filter(|&y| frame.get(0, y) != Some(color::BLACK)).collect();
        assert_eq!(lit, vec![6, 7, 8, 9, 10]);
        // clamped at the top edge
        assert_eq!(frame.get(22, 0), Some(color::WHITE));
        assert_eq!(frame.get(22, 8), Some(color::BLACK));
    }

    #[test]
    fn test_update_redraws_while_started() {
        let scheduler = Scheduler::new();
        let driver = MockDriver::matrix();
        let renderer = Renderer::new(
            scheduler.clone(),
            Box::new(driver.clone()),
            Brightness::new(255, 255, false),
        );
        let queue = PresenterQueue::new(renderer);
        let view = Arc::new(NowPlayingView::new());

        view.update(Levels::symmetric([1; COLUMNS]));
        assert_eq!(scheduler.pending(), 0);

        queue.add(view.clone(), Priority::App);
        assert!(view.is_started());
        scheduler.run_pending();
        assert_eq!(driver.last_frame().unwrap().lit(), 2 * COLUMNS);
        assert_eq!(driver.last_frame().unwrap().logo()[0], LOGO_COLOR);

        view.update(Levels::symmetric([2; COLUMNS]));
        scheduler.run_pending();
        assert_eq!(driver.last_frame().unwrap().lit(), 4 * COLUMNS);

        queue.erase(&*view);
        assert!(!view.is_started());
        scheduler.run_pending();
        assert_eq!(driver.last_frame().unwrap().lit(), 0);
    }
}
