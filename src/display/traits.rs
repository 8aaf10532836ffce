/*
 *  display/traits.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  LED driver abstraction
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

use crate::display::error::DisplayError;
use crate::display::frame::Frame;

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Matrix width in pixels
    pub width: u32,

    /// Matrix height in pixels
    pub height: u32,

    /// Number of LEDs in the logo strip (0 if there is none)
    pub logo_leds: u32,
}

impl DisplayCapabilities {
    pub fn matrix(width: u32, height: u32, logo_leds: u32) -> Self {
        Self { width, height, logo_leds }
    }
}

/// Output end of the renderer.
///
/// The renderer owns the driver and calls [`show`](LedDriver::show) once per
/// tick, always from the main scheduler.
pub trait LedDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Push a finished frame to the hardware.
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Check a frame matches the geometry this driver was built for.
    fn check_frame(&self, frame: &Frame) -> Result<(), DisplayError> {
        let caps = self.capabilities();
        if frame.width() != caps.width || frame.height() != caps.height {
            return Err(DisplayError::FrameSizeMismatch {
                expected_w: caps.width,
                expected_h: caps.height,
                actual_w: frame.width(),
                actual_h: frame.height(),
            });
        }
        Ok(())
    }
}
