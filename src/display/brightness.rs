/*
 *  display/brightness.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared brightness and hue setting with a time of day curve
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

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::{Local, Timelike};
use embedded_graphics::pixelcolor::Rgb888;

use super::color::{hue_factor, tint};

pub const DEFAULT_LEVEL: u8 = 0x3F;
pub const DEFAULT_HUE: u8 = 0xFF;

/// `sin³(π·hour/24)`: dark around midnight, full at noon.
pub fn time_of_day_factor(hour: u32) -> f64 {
    (PI * f64::from(hour) / 24.0).sin().powi(3)
}

/// Level after the time of day curve. Off stays off, anything else keeps at least 1.
pub fn time_of_day_level(level: u8, hour: u32) -> u8 {
    if level == 0 {
        return 0;
    }
    let scaled = f64::from(level) * time_of_day_factor(hour) + 1.0;
    scaled.min(f64::from(level)) as u8
}

/// Tint colour for `level` and `hue` as the matrix should show it.
pub fn tint_for(level: u8, hue: u8) -> Rgb888 {
    tint(Rgb888::new(level, level, level), hue_factor(hue))
}

struct Levels {
    level: AtomicU8,
    hue: AtomicU8,
    time_of_day: AtomicBool,
}

/// Brightness/hue shared by the renderer and the settings display.
///
/// Cloning gives another handle on the same setting.
#[derive(Clone)]
pub struct Brightness {
    levels: Arc<Levels>,
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL, DEFAULT_HUE, true)
    }
}

impl fmt::Debug for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Brightness")
            .field("level", &self.level())
            .field("hue", &self.hue())
            .field("time_of_day", &self.time_of_day())
            .finish()
    }
}

impl Brightness {
    pub fn new(level: u8, hue: u8, time_of_day: bool) -> Self {
        Self {
            levels: Arc::new(Levels {
                level: AtomicU8::new(level),
                hue: AtomicU8::new(hue),
                time_of_day: AtomicBool::new(time_of_day),
            }),
        }
    }

    pub fn level(&self) -> u8 {
        self.levels.level.load(Ordering::Relaxed)
    }

    pub fn hue(&self) -> u8 {
        self.levels.hue.load(Ordering::Relaxed)
    }

    pub fn time_of_day(&self) -> bool {
        self.levels.time_of_day.load(Ordering::Relaxed)
    }

    pub fn set(&self, level: u8, hue: u8) {
        self.levels.level.store(level, Ordering::Relaxed);
        self.levels.hue.store(hue, Ordering::Relaxed);
    }

    pub fn set_time_of_day(&self, enabled: bool) {
        self.levels.time_of_day.store(enabled, Ordering::Relaxed);
    }

    /// Level in effect right now.
    pub fn effective_level(&self) -> u8 {
        self.effective_level_at(Local::now().hour())
    }

    pub fn effective_level_at(&self, hour: u32) -> u8 {
        if self.time_of_day() {
            time_of_day_level(self.level(), hour)
        } else {
            self.level()
        }
    }

    /// Tint the renderer loads at the start of every frame.
    pub fn tint(&self) -> Rgb888 {
        self.tint_at(Local::now().hour())
    }

    pub fn tint_at(&self, hour: u32) -> Rgb888 {
        tint_for(self.effective_level_at(hour), self.hue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    #[test]
    fn test_time_of_day_curve() {
        assert_eq!(time_of_day_level(0, 12), 0);
        assert_eq!(time_of_day_level(1, 0), 1);
        assert_eq!(time_of_day_level(128, 12), 128);
        assert_eq!(time_of_day_level(128, 0), 1);
        assert_eq!(time_of_day_level(64, 6), 23);
        assert_eq!(time_of_day_level(240, 9), 190);
    }

    #[test]
    fn test_tint_full_white() {
        assert_eq!(tint_for(255, 255), Rgb888::WHITE);
        assert_eq!(tint_for(0, 255), Rgb888::BLACK);
    }

    #[test]
    fn test_warm_hue_reduces_blue() {
        let t = tint_for(255, 0);
        assert_eq!(t, Rgb888::new(155, 41, 72));
    }

    #[test]
    fn test_shared_handles() {
        let a = Brightness::new(10, 20, false);
        let b = a.clone();
        b.set(200, 255);
        assert_eq!(a.level(), 200);
        assert_eq!(a.effective_level_at(0), 200);
        a.set_time_of_day(true);
        assert_eq!(b.effective_level_at(0), 1);
        assert_eq!(b.tint_at(12), Rgb888::new(200, 200, 200));
    }
}
