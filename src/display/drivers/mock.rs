/*
 *  display/drivers/mock.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock LED driver for running without hardware
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

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::frame::Frame;
use crate::display::traits::{DisplayCapabilities, LedDriver};

/// Mock LED driver
///
/// Records every frame it is shown instead of talking to hardware. Used by
/// the unit and integration tests and by `driver: mock` for headless runs.
/// Clones share the same recorded state.
#[derive(Debug, Clone)]
pub struct MockDriver {
    capabilities: DisplayCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of successful show() calls
    pub show_count: usize,

    /// Number of show() calls that were rejected
    pub failed_shows: usize,

    /// Copy of the most recent frame shown
    pub last_frame: Option<Frame>,

    /// Lit pixel count of every frame shown, oldest first
    pub lit_history: Vec<usize>,

    /// Simulate failures (for error testing)
    pub simulate_show_failure: bool,
}

impl MockDriver {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let (width, height, logo) = config.geometry();
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "mock display needs a non-empty matrix, got {}x{}",
                width, height
            )));
        }
        Ok(Self::with_capabilities(DisplayCapabilities::matrix(width, height, logo)))
    }

    /// Driver for the standard 23x16 matrix
    pub fn matrix() -> Self {
        Self::with_capabilities(DisplayCapabilities::matrix(
            crate::display::frame::MATRIX_WIDTH,
            crate::display::frame::MATRIX_HEIGHT,
            crate::display::frame::LOGO_LEDS,
        ))
    }

    fn with_capabilities(capabilities: DisplayCapabilities) -> Self {
        Self {
            capabilities,
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockDriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn show_count(&self) -> usize {
        self.lock().show_count
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.lock().last_frame.clone()
    }
}

impl LedDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.check_frame(frame)?;
        let mut state = self.lock();
        if state.simulate_show_failure {
            state.failed_shows += 1;
            return Err(DisplayError::ShowFailed("simulated show failure".to_string()));
        }
        state.show_count += 1;
        state.lit_history.push(frame.lit());
        state.last_frame = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

    #[test]
    fn test_mock_driver_creation() {
        let driver = MockDriver::new(&DisplayConfig::default()).unwrap();
        assert_eq!(driver.capabilities().width, 23);
        assert_eq!(driver.capabilities().height, 16);
        assert_eq!(driver.capabilities().logo_leds, 19);
        assert_eq!(driver.show_count(), 0);
    }

    #[test]
    fn test_mock_driver_rejects_empty_matrix() {
        let config = DisplayConfig { width: Some(0), ..Default::default() };
        assert!(MockDriver::new(&config).is_err());
    }

    #[test]
    fn test_mock_driver_records_frames() {
        let mut driver = MockDriver::matrix();
        let mut frame = Frame::default();
        frame.set(1, 1, Rgb888::RED);
        driver.show(&frame).unwrap();
        frame.clear();
        driver.show(&frame).unwrap();

        let state = driver.state();
        let state = state.lock().unwrap();
        assert_eq!(state.show_count, 2);
        assert_eq!(state.lit_history, vec![1, 0]);
        assert_eq!(state.last_frame.as_ref().map(Frame::lit), Some(0));
    }

    #[test]
    fn test_mock_driver_size_mismatch() {
        let mut driver = MockDriver::matrix();
        assert!(matches!(
            driver.show(&Frame::new(8, 8, 0)),
            Err(DisplayError::FrameSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_mock_driver_simulated_failure() {
        let mut driver = MockDriver::matrix();
        driver.state().lock().unwrap().simulate_show_failure = true;
        assert!(driver.show(&Frame::default()).is_err());

        driver.state().lock().unwrap().simulate_show_failure = false;
        assert!(driver.show(&Frame::default()).is_ok());
        assert_eq!(driver.state().lock().unwrap().failed_shows, 1);
        assert_eq!(driver.show_count(), 1);
    }
}
