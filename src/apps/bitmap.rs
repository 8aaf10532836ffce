/*
 *  apps/bitmap.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Remotely supplied RGBA bitmaps with scroll and wave effects
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

use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use super::{Session, lock};
use crate::display::frame::{MATRIX_HEIGHT, MATRIX_WIDTH};
use crate::display::{Frame, color};
use crate::present::{Finished, Presentable};
use crate::render::Renderer;

const ANIMATED: Duration = Duration::from_millis(50);
const STILL: Duration = Duration::from_secs(1);

/// RGBA pixels, column-major: byte `4 * (x * height + y)` starts pixel (x, y).
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub bytes: Vec<u8>,
    /// Declared width; the scroll wraps over `max(width, 23)`
    pub width: u32,
    /// Column height, 0 means 16
    pub height: u32,
    /// Horizontal scroll in pixels per second, 0 is static
    pub xscroll: i32,
    /// Wave speed, 0 is flat
    pub wave: f64,
    pub logo: Rgb888,
}

impl Default for Bitmap {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            width: 0,
            height: 0,
            xscroll: 0,
            wave: 0.0,
            logo: Rgb888::WHITE,
        }
    }
}

impl Bitmap {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, ..Default::default() }
    }

    pub fn is_animated(&self) -> bool {
        self.xscroll != 0 || self.wave != 0.0
    }

    fn column_height(&self) -> i64 {
        if self.height == 0 { i64::from(MATRIX_HEIGHT) } else { i64::from(self.height) }
    }

    /// Matrix position of source pixel `i` after `elapsed`.
    pub fn place(&self, i: usize, elapsed: Duration) -> (i32, i32) {
        let h = self.column_height();
        let w = i64::from(self.width.max(MATRIX_WIDTH));
        let ms = elapsed.as_millis() as i64;
        let t = if self.xscroll != 0 { i64::from(self.xscroll) * ms / 1000 } else { 0 };

        let sx = i as i64 / h;
        let x = if self.xscroll != 0 { i64::from(MATRIX_WIDTH) + (sx - t) % w } else { sx };
        let mut y = i as i64 % h;

        if self.wave != 0.0 {
            let phase = -PI * (sx as f64 * FRAC_PI_2 / f64::from(MATRIX_WIDTH)).sin()
                + self.wave * (ms as f64 * FRAC_2_PI) / 1000.0;
            y += ((7.5 - y as f64) * 0.5 * (1.0 + phase.sin())).trunc() as i64;
        }
        (x as i32, y as i32)
    }

    pub fn draw(&self, frame: &mut Frame, elapsed: Duration) {
        frame.set_logo(self.logo);
        for (i, px) in self.bytes.chunks_exact(4).enumerate() {
            let (x, y) = self.place(i, elapsed);
            let c = color::dim(Rgb888::new(px[0], px[1], px[2]), f32::from(px[3]) / 255.0);
            frame.blend(x, y, c);
        }
    }
}

/// Shows whatever bitmap was last pushed. Never finishes by itself; whoever
/// feeds it erases it from the queue.
#[derive(Default)]
pub struct BitmapDisplay {
    bitmap: Arc<Mutex<Bitmap>>,
    session: Session,
}

impl BitmapDisplay {
    pub fn new(bitmap: Bitmap) -> Self {
        Self { bitmap: Arc::new(Mutex::new(bitmap)), session: Session::default() }
    }
}

impl Presentable for BitmapDisplay {
    fn start(&self, renderer: &Renderer, _finished: Finished) {
        let watch = self.session.begin(renderer);
        let bitmap = Arc::clone(&self.bitmap);
        renderer.add(move |frame, elapsed| {
            if watch.is_dead() {
                return Duration::ZERO;
            }
            let bitmap = lock(&bitmap);
            bitmap.draw(frame, elapsed);
            if bitmap.is_animated() { ANIMATED } else { STILL }
        });
    }

    fn stop(&self) {
        self.session.end();
    }

    fn name(&self) -> &str {
        "bitmap"
    }
}
