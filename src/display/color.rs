/*
 *  display/color.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Colour maths for the LED matrix: tint scaling and warm hue
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

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

pub const BLACK: Rgb888 = Rgb888::BLACK;
pub const WHITE: Rgb888 = Rgb888::WHITE;

/// Warm-white ramp used for the hue setting, index 0 is the warmest.
pub const WARM: [Rgb888; 6] = [
    Rgb888::new(155, 41, 72),
    Rgb888::new(255, 114, 81),
    Rgb888::new(255, 202, 123),
    Rgb888::new(255, 205, 116),
    Rgb888::new(255, 237, 191),
    Rgb888::new(255, 255, 255),
];

/// Scale one channel by `factor / 255`.
///
/// Zero stays zero, anything else is kept at 1 or above so that dim
/// colours never vanish completely.
#[inline]
pub fn scale_channel(value: u8, factor: u8) -> u8 {
    if value == 0 || factor == 0 {
        return 0;
    }
    let scaled = (u16::from(value) * u16::from(factor)) / 255;
    scaled.max(1) as u8
}

/// Channel-wise product of `color` and `tint`, see [`scale_channel`].
pub fn tint(color: Rgb888, tint: Rgb888) -> Rgb888 {
    Rgb888::new(
        scale_channel(color.r(), tint.r()),
        scale_channel(color.g(), tint.g()),
        scale_channel(color.b(), tint.b()),
    )
}

/// Multiply every channel by a plain factor in 0.0..=1.0 (same floor of 1).
pub fn dim(color: Rgb888, factor: f32) -> Rgb888 {
    let f = |c: u8| -> u8 {
        if c == 0 || factor <= 0.0 {
            0
        } else {
            ((f32::from(c) * factor.min(1.0)) as u8).max(1)
        }
    };
    Rgb888::new(f(color.r()), f(color.g()), f(color.b()))
}

/// Saturating per-channel sum.
pub fn add(lhs: Rgb888, rhs: Rgb888) -> Rgb888 {
    Rgb888::new(
        lhs.r().saturating_add(rhs.r()),
        lhs.g().saturating_add(rhs.g()),
        lhs.b().saturating_add(rhs.b()),
    )
}

/// Interpolate across [`WARM`] by `hue / 255`.
pub fn hue_factor(hue: u8) -> Rgb888 {
    let last = WARM.len() - 1;
    let s = f32::from(hue) / 255.0 * last as f32;
    let i = (s as usize).min(last);
    if i == last {
        return WARM[last];
    }
    let t = s - i as f32;
    let lerp = |a: u8, b: u8| -> u8 {
        (f32::from(a) + t * (f32::from(b) - f32::from(a))).round().clamp(0.0, 255.0) as u8
    };
    let (a, b) = (WARM[i], WARM[i + 1]);
    Rgb888::new(lerp(a.r(), b.r()), lerp(a.g(), b.g()), lerp(a.b(), b.b()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_channel_keeps_floor() {
        assert_eq!(scale_channel(0, 255), 0);
        assert_eq!(scale_channel(200, 0), 0);
        assert_eq!(scale_channel(1, 1), 1);
        assert_eq!(scale_channel(255, 255), 255);
        assert_eq!(scale_channel(255, 128), 128);
    }

    #[test]
    fn test_tint_white_is_identity() {
        let c = Rgb888::new(10, 20, 30);
        assert_eq!(tint(c, WHITE), c);
        assert_eq!(tint(c, BLACK), BLACK);
    }

    #[test]
    fn test_add_saturates() {
        let c = add(Rgb888::new(200, 10, 0), Rgb888::new(100, 10, 0));
        assert_eq!(c, Rgb888::new(255, 20, 0));
    }

    #[test]
    fn test_hue_factor_endpoints() {
        assert_eq!(hue_factor(0), WARM[0]);
        assert_eq!(hue_factor(255), WHITE);
        // midway between entries 2 and 3, blue channel goes down
        let mid = hue_factor(127);
        assert!(mid.b() <= 123 && mid.b() >= 116);
    }

    #[test]
    fn test_dim() {
        assert_eq!(dim(Rgb888::new(100, 1, 0), 0.5), Rgb888::new(50, 1, 0));
        assert_eq!(dim(WHITE, 0.0), BLACK);
    }
}
