/*
 *  display/factory.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Builds the configured LED driver
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

use log::info;

use crate::config::{DisplayConfig, DriverKind};
use crate::display::drivers::{ConsoleDriver, MockDriver};
use crate::display::error::DisplayError;
use crate::display::traits::LedDriver;

/// Type alias for boxed LED driver trait objects
pub type BoxedDriver = Box<dyn LedDriver>;

/// Factory for creating LED drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create the driver named by `config.driver`, falling back to the
    /// terminal emulation when none is given.
    pub fn create_from_config(config: &DisplayConfig) -> Result<BoxedDriver, DisplayError> {
        let kind = config.driver.unwrap_or_default();
        let (width, height, logo) = config.geometry();
        info!("display driver {:?} {}x{} + {} logo LEDs", kind, width, height, logo);
        match kind {
            DriverKind::Mock => Ok(Box::new(MockDriver::new(config)?)),
            DriverKind::Console => Ok(Box::new(ConsoleDriver::new(config)?)),
        }
    }
}
