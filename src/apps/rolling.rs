/*
 *  apps/rolling.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Right to left rolling text
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

use std::time::Duration;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii::FONT_5X8};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::display::Frame;

/// Pixels per millisecond.
pub const DEFAULT_SPEED: f64 = 0.005;

pub const FONT: &MonoFont<'static> = &FONT_5X8;

/// Width of `text` in the rolling font.
pub fn text_width(text: &str) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 {
        return 0;
    }
    let glyph = FONT.character_size.width as i32;
    let spacing = FONT.character_spacing as i32;
    n * glyph + (n - 1) * spacing
}

/// Left edge of the text after `elapsed`: enters on the right, leaves on
/// the left, then wraps around.
pub fn scroll_x(width: i32, text_width: i32, speed: f64, elapsed: Duration) -> i32 {
    let travelled = (speed * elapsed.as_millis() as f64) as i64;
    let span = i64::from((width + text_width).max(1));
    width - (travelled % span) as i32
}

/// Draw `text` vertically centred at its rolling position.
pub fn draw_rolling(frame: &mut Frame, text: &str, color: Rgb888, speed: f64, elapsed: Duration) {
    let width = frame.width() as i32;
    let x = scroll_x(width, text_width(text), speed, elapsed);
    let y = (frame.height() as i32 - FONT.character_size.height as i32) / 2;
    draw_text(frame, text, Point::new(x, y), color);
}

pub fn draw_text(frame: &mut Frame, text: &str, top_left: Point, color: Rgb888) {
    let style = MonoTextStyle::new(FONT, color);
    // drawing into a Frame cannot fail
    let _ = Text::with_baseline(text, top_left, style, Baseline::Top).draw(frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("A"), 5);
        assert_eq!(text_width("ABC"), 15);
    }

    #[test]
    fn test_scroll_wraps() {
        let tw = text_width("HI");
        assert_eq!(scroll_x(23, tw, 0.005, Duration::ZERO), 23);
        assert_eq!(scroll_x(23, tw, 0.005, Duration::from_millis(1100)), 18);
        // a full cycle (33px) brings the text back to the right edge
        assert_eq!(scroll_x(23, tw, 0.005, Duration::from_millis(6700)), 23);
        assert_eq!(scroll_x(23, tw, 0.005, Duration::from_millis(6500)), -9);
    }

    #[test]
    fn test_draw_rolling_starts_offscreen() {
        let mut frame = Frame::default();
        draw_rolling(&mut frame, "HELLO", Rgb888::WHITE, DEFAULT_SPEED, Duration::ZERO);
        assert_eq!(frame.lit(), 0);

        draw_rolling(&mut frame, "HELLO", Rgb888::WHITE, DEFAULT_SPEED, Duration::from_secs(3));
        assert!(frame.lit() > 0);
        // font rows stay within the centred band
        assert!(frame.row(0).unwrap().iter().all(|&c| c == Rgb888::BLACK));
        assert!(frame.row(15).unwrap().iter().all(|&c| c == Rgb888::BLACK));
    }
}
