/*
 *  apps/auth.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Device authorisation prompt
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

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;

use super::now_playing::LOGO_COLOR;
use super::rolling::{DEFAULT_SPEED, draw_rolling};
use super::{Session, lock};
use crate::present::{Finished, Presentable};
use crate::render::Renderer;

const FRAME: Duration = Duration::from_millis(100);

/// Rolls the user code of a pending device login until the login completes.
#[derive(Default)]
pub struct AuthPrompt {
    code: Arc<Mutex<String>>,
    finished: Mutex<Option<Finished>>,
    session: Session,
}

impl AuthPrompt {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Arc::new(Mutex::new(code.into())),
            ..Default::default()
        }
    }

    /// New user code, e.g. after the previous one expired.
    pub fn set_code(&self, code: impl Into<String>) {
        *lock(&self.code) = code.into();
        self.session.notify();
    }

    pub fn code(&self) -> String {
        lock(&self.code).clone()
    }

    /// Login went through; give the display back.
    pub fn complete(&self) {
        let finished = lock(&self.finished).take();
        if let Some(finished) = finished {
            info!("authorisation complete");
            finished.finish();
        }
    }
}

impl Presentable for AuthPrompt {
    fn start(&self, renderer: &Renderer, finished: Finished) {
        *lock(&self.finished) = Some(finished);
        let watch = self.session.begin(renderer);
        let code = Arc::clone(&self.code);
        renderer.add(move |frame, elapsed| {
            if watch.is_dead() {
                return Duration::ZERO;
            }
            frame.set_logo(LOGO_COLOR);
            let text = lock(&code).to_uppercase();
            draw_rolling(frame, &text, LOGO_COLOR, DEFAULT_SPEED, elapsed);
            FRAME
        });
    }

    fn stop(&self) {
        self.session.end();
    }

    fn name(&self) -> &str {
        "auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Brightness, MockDriver};
    use crate::present::{Priority, PresenterQueue};
    use crate::sched::Scheduler;

    #[test]
    fn test_complete_releases_display() {
        let scheduler = Scheduler::new();
        let driver = MockDriver::matrix();
        let renderer = Renderer::new(
            scheduler.clone(),
            Box::new(driver.clone()),
            Brightness::new(255, 255, false),
        );
        let queue = PresenterQueue::new(renderer);
        let prompt = Arc::new(AuthPrompt::new("abcd-efgh"));

        // completing before the prompt is shown does nothing
        prompt.complete();
        queue.add(prompt.clone(), Priority::Notification);
        assert!(queue.is_active(&*prompt));
        scheduler.run_pending();
        assert_eq!(driver.last_frame().unwrap().logo()[0], LOGO_COLOR);

        prompt.set_code("wxyz");
        assert_eq!(prompt.code(), "wxyz");
        prompt.complete();
        assert!(queue.is_idle());
        scheduler.run_pending();
        assert_eq!(queue.renderer().active(), 0);
    }
}
