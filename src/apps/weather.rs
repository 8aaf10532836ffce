/*
 *  apps/weather.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather icon and temperature
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

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_4X6};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use super::{Session, lock};
use crate::display::Frame;
use crate::present::{Finished, Presentable};
use crate::render::Renderer;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);

const SUN: Rgb888 = Rgb888::new(255, 255, 0);
const RAIN: Rgb888 = Rgb888::new(0, 0, 255);

/// Icon left edge and the column the temperature starts at.
const ICON_X: i32 = 0;
const TEXT_X: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Sun,
    Cloud,
    Rain,
}

impl Condition {
    /// Map a weather code (`1` sun, `2` cloud, anything else rain).
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Condition::Sun,
            2 => Condition::Cloud,
            _ => Condition::Rain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forecast {
    pub condition: Condition,
    /// Degrees
    pub temperature: i32,
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}°", self.condition, self.temperature)
    }
}

fn draw_cloud(frame: &mut Frame, origin: Point) {
    let style = PrimitiveStyle::with_fill(Rgb888::WHITE);
    let _ = Circle::new(origin + Point::new(0, 3), 5).into_styled(style).draw(frame);
    let _ = Circle::new(origin + Point::new(3, 1), 6).into_styled(style).draw(frame);
    let _ = Rectangle::new(origin + Point::new(2, 4), Size::new(7, 4))
        .into_styled(style)
        .draw(frame);
}

fn draw_icon(frame: &mut Frame, condition: Condition, origin: Point) {
    match condition {
        Condition::Sun => {
            let rays = PrimitiveStyle::with_stroke(SUN, 1);
            let c = origin + Point::new(4, 5);
            for (dx, dy) in [(4, 0), (0, 4), (3, 3), (3, -3)] {
                let _ = Line::new(c - Point::new(dx, dy), c + Point::new(dx, dy))
                    .into_styled(rays)
                    .draw(frame);
            }
            let _ = Circle::with_center(c, 5)
                .into_styled(PrimitiveStyle::with_fill(SUN))
                .draw(frame);
        }
        Condition::Cloud => draw_cloud(frame, origin),
        Condition::Rain => {
            draw_cloud(frame, origin);
            for x in [2, 4, 6] {
                frame.set(origin.x + x, origin.y + 9, RAIN);
                frame.set(origin.x + x, origin.y + 10, RAIN);
            }
        }
    }
}

fn draw_degrees(frame: &mut Frame, at: Point) {
    for (x, y) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
        frame.set(at.x + x, at.y + y, Rgb888::WHITE);
    }
}

/// Draw the whole forecast page.
pub fn draw_forecast(frame: &mut Frame, forecast: &Forecast) {
    draw_icon(frame, forecast.condition, Point::new(ICON_X, 2));
    let text = forecast.temperature.to_string();
    let style = MonoTextStyle::new(&FONT_4X6, Rgb888::WHITE);
    let end = Text::with_baseline(&text, Point::new(TEXT_X, 5), style, Baseline::Top)
        .draw(frame)
        .unwrap_or(Point::new(TEXT_X, 5));
    draw_degrees(frame, Point::new(end.x, 3));
}

/// Shows the latest forecast for a fixed time, then finishes.
pub struct WeatherView {
    forecast: Arc<Mutex<Option<Forecast>>>,
    duration: Duration,
    session: Session,
}

impl Default for WeatherView {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl WeatherView {
    pub fn new(duration: Duration) -> Self {
        Self {
            forecast: Arc::new(Mutex::new(None)),
            duration,
            session: Session::default(),
        }
    }

    pub fn set_forecast(&self, forecast: Forecast) {
        *lock(&self.forecast) = Some(forecast);
        self.session.notify();
    }

    pub fn forecast(&self) -> Option<Forecast> {
        *lock(&self.forecast)
    }
}

impl Presentable for WeatherView {
    fn start(&self, renderer: &Renderer, finished: Finished) {
        if self.forecast().is_none() {
            finished.finish();
            return;
        }
        let watch = self.session.begin(renderer);
        let forecast = Arc::clone(&self.forecast);
        let duration = self.duration;
        renderer.add(move |frame, elapsed| {
            if watch.is_dead() {
                return Duration::ZERO;
            }
            if elapsed >= duration {
                finished.finish();
                return Duration::ZERO;
            }
            if let Some(forecast) = *lock(&forecast) {
                draw_forecast(frame, &forecast);
            }
            duration - elapsed
        });
    }

    fn stop(&self) {
        self.session.end();
    }

    fn name(&self) -> &str {
        "weather"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Brightness, MockDriver};
    use crate::present::{Priority, PresenterQueue};
    use crate::sched::Scheduler;

    #[test]
    fn test_condition_codes() {
        assert_eq!(Condition::from_code(1), Condition::Sun);
        assert_eq!(Condition::from_code(2), Condition::Cloud);
        assert_eq!(Condition::from_code(9), Condition::Rain);
    }

    #[test]
    fn test_icons_differ() {
        let draw = |condition| {
            let mut frame = Frame::default();
            draw_forecast(&mut frame, &Forecast { condition, temperature: 7 });
            frame
        };
        let sun = draw(Condition::Sun);
        let cloud = draw(Condition::Cloud);
        let rain = draw(Condition::Rain);
        assert!(sun.pixels().contains(&SUN));
        assert!(!cloud.pixels().contains(&RAIN));
        assert!(rain.pixels().contains(&RAIN));
        assert_ne!(sun, cloud);
        // temperature drawn right of the icon
        assert!((TEXT_X..23).any(|x| (0..16).any(|y| cloud.get(x, y) == Some(Rgb888::WHITE))));
    }

    #[test]
    fn test_without_forecast_finishes_at_once() {
        let scheduler = Scheduler::new();
        let renderer = Renderer::new(scheduler, Box::new(MockDriver::matrix()), Brightness::default());
        let queue = PresenterQueue::new(renderer);
        let view = Arc::new(WeatherView::default());
        queue.add(view.clone(), Priority::App);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_finishes_after_duration() {
        let scheduler = Scheduler::new();
        let driver = MockDriver::matrix();
        let renderer = Renderer::new(
            scheduler.clone(),
            Box::new(driver.clone()),
            Brightness::new(255, 255, false),
        );
        let queue = PresenterQueue::new(renderer);
        let view = Arc::new(WeatherView::new(Duration::from_millis(20)));
        view.set_forecast(Forecast { condition: Condition::Sun, temperature: 21 });

        queue.add(view.clone(), Priority::App);
        scheduler.run_pending();
        assert!(driver.last_frame().unwrap().lit() > 0);
        std::thread::sleep(Duration::from_millis(30));
        scheduler.run_pending();
        assert!(queue.is_idle());
    }
}
