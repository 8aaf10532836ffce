/*
 *  display/drivers/console.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Terminal emulation of the LED matrix using ANSI true colour
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

use std::io::{self, Stdout, Write};

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::frame::Frame;
use crate::display::traits::{DisplayCapabilities, LedDriver};

const CURSOR_HOME: &str = "\x1b[H";
const CLEAR_SCREEN: &str = "\x1b[2J";
const RESET: &str = "\x1b[0m";
const LED: &str = "\u{25cf} ";

/// Draws each frame into a terminal, two cells per LED.
///
/// The logo strip is drawn as one line above the matrix.
pub struct ConsoleDriver<W: Write + Send = Stdout> {
    capabilities: DisplayCapabilities,
    out: W,
    first: bool,
}

impl ConsoleDriver<Stdout> {
    pub fn new(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let (width, height, logo) = config.geometry();
        Ok(Self::with_writer(io::stdout(), DisplayCapabilities::matrix(width, height, logo)))
    }
}

impl<W: Write + Send> ConsoleDriver<W> {
    pub fn with_writer(out: W, capabilities: DisplayCapabilities) -> Self {
        Self { capabilities, out, first: true }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn led(buf: &mut String, c: Rgb888) {
        if c == Rgb888::BLACK {
            buf.push_str("  ");
        } else {
            buf.push_str(&format!("\x1b[38;2;{};{};{}m{}", c.r(), c.g(), c.b(), LED));
        }
    }

    fn render(&self, frame: &Frame) -> String {
        let mut buf = String::with_capacity(frame.pixels().len() * 24);
        buf.push_str(CURSOR_HOME);
        for &c in frame.logo() {
            Self::led(&mut buf, c);
        }
        buf.push_str(RESET);
        buf.push_str("\x1b[K\r\n");
        for y in 0..frame.height() {
            if let Some(row) = frame.row(y) {
                for &c in row {
                    Self::led(&mut buf, c);
                }
            }
            buf.push_str(RESET);
            buf.push_str("\r\n");
        }
        buf
    }
}

impl<W: Write + Send> LedDriver for ConsoleDriver<W> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.check_frame(frame)?;
        let text = self.render(frame);
        if self.first {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
            self.first = false;
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
