/*
 *  apps/banner.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scrolling text notifications
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

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use log::debug;

use super::rolling::{self, draw_rolling};
use super::{Session, lock};
use crate::present::{Finished, Presentable};
use crate::render::Renderer;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_FRAME: Duration = Duration::from_millis(100);

/// One queued banner.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub timeout: Duration,
    /// Pixels per millisecond
    pub speed: f64,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timeout: DEFAULT_TIMEOUT,
            speed: rolling::DEFAULT_SPEED,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}

/// Text notifications, one message per activation.
///
/// Every [`push`](TextBanner::push) is meant to be followed by one
/// `PresenterQueue::add(banner, Priority::Notification)`; each start pops
/// and shows the oldest message.
pub struct TextBanner {
    messages: Mutex<VecDeque<Message>>,
    session: Session,
    timeout: Duration,
    speed: f64,
    color: Rgb888,
}

impl Default for TextBanner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, rolling::DEFAULT_SPEED)
    }
}

impl TextBanner {
    /// `timeout` and `speed` are the defaults for [`push`](TextBanner::push).
    pub fn new(timeout: Duration, speed: f64) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            session: Session::default(),
            timeout,
            speed,
            color: Rgb888::WHITE,
        }
    }

    pub fn push(&self, text: impl Into<String>) {
        let message = Message::new(text).with_timeout(self.timeout).with_speed(self.speed);
        self.push_message(message);
    }

    pub fn push_message(&self, message: Message) {
        lock(&self.messages).push_back(message);
    }

    /// Messages not yet shown.
    pub fn queued(&self) -> usize {
        lock(&self.messages).len()
    }
}

impl Presentable for TextBanner {
    fn start(&self, renderer: &Renderer, finished: Finished) {
        let next = lock(&self.messages).pop_front();
        let Some(message) = next else {
            finished.finish();
            return;
        };
        let text = message.text.to_uppercase();
        debug!("banner \"{}\" for {:?}", text, message.timeout);

        let watch = self.session.begin(renderer);
        let color = self.color;
        renderer.add(move |frame, elapsed| {
            if watch.is_dead() {
                return Duration::ZERO;
            }
            if elapsed >= message.timeout {
                finished.finish();
                return Duration::ZERO;
            }
            frame.set_logo(color);
            draw_rolling(frame, &text, color, message.speed, elapsed);
            (message.timeout - elapsed).min(MAX_FRAME)
        });
    }

    fn stop(&self) {
        self.session.end();
    }

    // every queued activation is gone, so are the messages they would show
    fn erased(&self) {
        let dropped = std::mem::take(&mut *lock(&self.messages));
        if !dropped.is_empty() {
            debug!("banner dropped {} unshown message(s)", dropped.len());
        }
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Brightness, MockDriver};
    use crate::present::{Priority, PresenterQueue};
    use crate::sched::Scheduler;
    use std::sync::Arc;

    fn setup() -> (Scheduler, MockDriver, PresenterQueue) {
        let scheduler = Scheduler::new();
        let driver = MockDriver::matrix();
        let renderer = Renderer::new(
            scheduler.clone(),
            Box::new(driver.clone()),
            Brightness::new(255, 255, false),
        );
        (scheduler, driver, PresenterQueue::new(renderer))
    }

    #[test]
    fn test_message_defaults() {
        let m = Message::new("hi");
        assert_eq!(m.timeout, DEFAULT_TIMEOUT);
        assert_eq!(m.speed, rolling::DEFAULT_SPEED);
    }

    #[test]
    fn test_start_without_message_finishes() {
        let (_scheduler, _driver, queue) = setup();
        let banner = Arc::new(TextBanner::default());
        queue.add(banner.clone(), Priority::Notification);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_banner_rolls_then_finishes() {
        let (scheduler, driver, queue) = setup();
        let banner = Arc::new(TextBanner::new(Duration::from_millis(30), 1.0));
        banner.push("hey");
        queue.add(banner.clone(), Priority::Notification);
        assert!(queue.is_active(&*banner));
        assert_eq!(banner.queued(), 0);

        scheduler.run_pending();
        // logo lit, text still entering from the right edge
        let frame = driver.last_frame().unwrap();
        assert!(frame.logo().iter().all(|&c| c == Rgb888::WHITE));

        std::thread::sleep(Duration::from_millis(40));
        scheduler.run_pending();
        assert!(queue.is_idle());
        scheduler.run_pending();
        assert_eq!(driver.last_frame().unwrap().lit(), 0);
    }

    #[test]
    fn test_frame_delay_capped_by_timeout() {
        let (scheduler, _driver, queue) = setup();
        let banner = Arc::new(TextBanner::default());
        banner.push_message(Message::new("x").with_timeout(Duration::from_millis(50)));
        queue.add(banner.clone(), Priority::Notification);

        let start = std::time::Instant::now();
        scheduler.run_pending();
        let due = scheduler.next_due().unwrap();
        assert!(due <= start + Duration::from_millis(50) + Duration::from_millis(20));
    }

    #[test]
    fn test_messages_show_in_order() {
        let (scheduler, driver, queue) = setup();
        let banner = Arc::new(TextBanner::new(Duration::from_millis(10), 1.0));
        banner.push("a");
        queue.add(banner.clone(), Priority::Notification);
        banner.push("b");
        queue.add(banner.clone(), Priority::Notification);
        assert_eq!(banner.queued(), 1);

        scheduler.run_pending();
        std::thread::sleep(Duration::from_millis(15));
        scheduler.run_pending();
        // first message done, second started straight away
        assert!(queue.is_active(&*banner));
        assert_eq!(banner.queued(), 0);
        assert!(driver.show_count() >= 2);
    }

    #[test]
    fn test_erase_stops_drawing() {
        let (scheduler, driver, queue) = setup();
        let banner = Arc::new(TextBanner::new(Duration::from_secs(10), 1.0));
        banner.push("long");
        queue.add(banner.clone(), Priority::Notification);
        scheduler.run_pending();

        queue.erase(&*banner);
        scheduler.run_pending();
        assert_eq!(driver.last_frame().unwrap().lit(), 0);
        assert!(driver.last_frame().unwrap().logo().iter().all(|&c| c == Rgb888::BLACK));
        assert_eq!(queue.renderer().active(), 0);
    }

    #[test]
    fn test_erase_forgets_unshown_messages() {
        let (_scheduler, _driver, queue) = setup();
        let banner = Arc::new(TextBanner::new(Duration::from_secs(10), 1.0));
        banner.push("old one");
        queue.add(banner.clone(), Priority::Notification);
        banner.push("old two");
        queue.add(banner.clone(), Priority::Notification);
        assert_eq!(banner.queued(), 1);

        queue.erase(&*banner);
        assert_eq!(banner.queued(), 0);
        assert!(queue.is_idle());

        banner.push("new");
        queue.add(banner.clone(), Priority::Notification);
        assert!(queue.is_active(&*banner));
        assert_eq!(banner.queued(), 0);
    }
}
