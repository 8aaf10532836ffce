/*
 *  display/error.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the display subsystem
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

use thiserror::Error;

/// Errors raised by LED drivers and the driver factory.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Frame geometry does not match what the driver was built for
    #[error("frame size mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}")]
    FrameSizeMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    /// Invalid configuration
    #[error("invalid display configuration: {0}")]
    InvalidConfiguration(String),

    /// Output stream failure (console driver)
    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Write rejected by the device
    #[error("show failed: {0}")]
    ShowFailed(String),
}
