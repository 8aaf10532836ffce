/*
 *  display/frame.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared RGB frame: LED matrix plus logo strip
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

use core::convert::Infallible;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use super::color::{self, BLACK, WHITE};

pub const MATRIX_WIDTH: u32 = 23;
pub const MATRIX_HEIGHT: u32 = 16;
pub const LOGO_LEDS: u32 = 19;

/// The one frame buffer the renderer hands to its callbacks.
///
/// Every colour written through `Frame` (directly or as an embedded-graphics
/// `DrawTarget`) is multiplied by the current tint, which the renderer loads
/// from the brightness setting at the start of each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    w: usize,
    h: usize,
    pixels: Vec<Rgb888>,
    logo: Vec<Rgb888>,
    tint: Rgb888,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(MATRIX_WIDTH, MATRIX_HEIGHT, LOGO_LEDS)
    }
}

impl Frame {
    pub fn new(width: u32, height: u32, logo_leds: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self {
            w,
            h,
            pixels: vec![BLACK; w * h],
            logo: vec![BLACK; logo_leds as usize],
            tint: WHITE,
        }
    }

    pub fn width(&self) -> u32 { self.w as u32 }
    pub fn height(&self) -> u32 { self.h as u32 }
    pub fn logo_len(&self) -> usize { self.logo.len() }

    pub fn tint(&self) -> Rgb888 {
        self.tint
    }

    pub fn set_tint(&mut self, tint: Rgb888) {
        self.tint = tint;
    }

    /// Blank the matrix and the logo. The tint is left alone.
    pub fn clear(&mut self) {
        self.pixels.fill(BLACK);
        self.logo.fill(BLACK);
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 {
            let (x, y) = (x as usize, y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }

    /// Set one pixel; coordinates outside the matrix are ignored.
    pub fn set(&mut self, x: i32, y: i32, c: Rgb888) {
        if let Some(i) = self.idx(x, y) {
            self.pixels[i] = color::tint(c, self.tint);
        }
    }

    /// Add `c` on top of what is already there (saturating).
    pub fn blend(&mut self, x: i32, y: i32, c: Rgb888) {
        if let Some(i) = self.idx(x, y) {
            self.pixels[i] = color::add(self.pixels[i], color::tint(c, self.tint));
        }
    }

    /// Stored (already tinted) value.
    pub fn get(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.idx(x, y).map(|i| self.pixels[i])
    }

    /// Light the whole logo strip in one colour.
    pub fn set_logo(&mut self, c: Rgb888) {
        let c = color::tint(c, self.tint);
        self.logo.fill(c);
    }

    pub fn logo(&self) -> &[Rgb888] {
        &self.logo
    }

    /// Row-major matrix pixels.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// Number of matrix pixels that are not black.
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != BLACK).count()
    }

    /// Matrix row `y` as a slice.
    pub fn row(&self, y: u32) -> Option<&[Rgb888]> {
        let y = y as usize;
        if y < self.h {
            Some(&self.pixels[y * self.w..(y + 1) * self.w])
        } else {
            None
        }
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            self.set(p.x, p.y, c);
        }
        Ok(())
    }

    fn clear(&mut self, c: Self::Color) -> Result<(), Self::Error> {
        let c = color::tint(c, self.tint);
        self.pixels.fill(c);
        Ok(())
    }
}
