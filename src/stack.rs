/*
 *  stack.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Wires renderer, presenter queue and apps together
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use crate::apps::bitmap::Bitmap;
use crate::apps::now_playing::COLUMNS;
use crate::apps::{
    AuthPrompt, BitmapDisplay, Condition, Forecast, Levels, Message, NowPlayingView,
    SettingsDisplay, TextBanner, WeatherView,
};
use crate::config::Config;
use crate::display::{BoxedDriver, Brightness, DisplayDriverFactory, DisplayError};
use crate::present::{Presentable, PresenterQueue, Priority};
use crate::render::Renderer;
use crate::sched::{Lifetime, Options, Scheduler};

pub const FEED_PERIOD: Duration = Duration::from_millis(200);

// demo playback: 30 s of music, then 10 s of silence
const DEMO_CYCLE: u32 = 200;
const DEMO_PLAYING: u32 = 150;

/// Everything that draws on the matrix. Lives on, and must only be driven
/// from, the scheduler passed to [`Stack::build`].
pub struct Stack {
    queue: PresenterQueue,
    brightness: Brightness,
    banner: Arc<TextBanner>,
    now_playing: Arc<NowPlayingView>,
    weather: Arc<WeatherView>,
    settings: Arc<SettingsDisplay>,
    playing: AtomicBool,
}

impl Stack {
    /// Build the driver named by the config and everything above it.
    pub fn build(config: &Config, main: Scheduler) -> Result<Arc<Self>, DisplayError> {
        let driver = DisplayDriverFactory::create_from_config(&config.display())?;
        Ok(Self::with_driver(config, main, driver))
    }

    pub fn with_driver(config: &Config, main: Scheduler, driver: BoxedDriver) -> Arc<Self> {
        let display = config.display();
        let brightness = Brightness::new(display.brightness(), display.hue(), display.time_of_day());
        let renderer = Renderer::new(main, driver, brightness.clone());
        info!(
            "stack up, brightness {} hue {} time of day {}",
            brightness.level(),
            brightness.hue(),
            brightness.time_of_day()
        );
        Arc::new(Self {
            queue: PresenterQueue::new(renderer),
            banner: Arc::new(TextBanner::new(config.banner_timeout(), config.banner_speed())),
            now_playing: Arc::new(NowPlayingView::new()),
            weather: Arc::new(WeatherView::new(config.weather_duration())),
            settings: Arc::new(SettingsDisplay::new(brightness.clone())),
            brightness,
            playing: AtomicBool::new(false),
        })
    }

    pub fn queue(&self) -> &PresenterQueue {
        &self.queue
    }

    pub fn brightness(&self) -> &Brightness {
        &self.brightness
    }

    pub fn now_playing(&self) -> &Arc<NowPlayingView> {
        &self.now_playing
    }

    /// One banner activation per message.
    pub fn show_text(&self, text: impl Into<String>) {
        self.show_message(Message::new(text));
    }

    pub fn show_message(&self, message: Message) {
        self.banner.push_message(message);
        self.queue.add(self.banner.clone(), Priority::Notification);
    }

    /// New levels; the view is queued the first time after a pause.
    pub fn play(&self, levels: Levels) {
        self.now_playing.update(levels);
        if !self.playing.swap(true, Ordering::AcqRel) {
            info!("playback started");
            self.queue.add(self.now_playing.clone(), Priority::App);
        }
    }

    pub fn pause(&self) {
        if self.playing.swap(false, Ordering::AcqRel) {
            info!("playback paused");
            self.queue.erase(&*self.now_playing);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Queue the forecast, replacing one that has not been shown yet.
    pub fn show_weather(&self, forecast: Forecast) {
        debug!("weather {}", forecast);
        self.weather.set_forecast(forecast);
        if !self.queue.is_active(&*self.weather) {
            self.queue.erase(&*self.weather);
            self.queue.add(self.weather.clone(), Priority::App);
        }
    }

    pub fn adjust(&self, level: u8, hue: u8) {
        self.settings.request(level, hue);
        self.queue.add(self.settings.clone(), Priority::Notification);
    }

    /// Returns the prompt; call [`AuthPrompt::complete`] once authorised.
    pub fn authorize(&self, code: impl Into<String>) -> Arc<AuthPrompt> {
        let prompt = Arc::new(AuthPrompt::new(code));
        self.queue.add(prompt.clone(), Priority::Notification);
        prompt
    }

    /// Show a picture until it is erased from the queue.
    pub fn show_bitmap(&self, bitmap: Bitmap, priority: Priority) -> Arc<BitmapDisplay> {
        let display = Arc::new(BitmapDisplay::new(bitmap));
        self.queue.add(display.clone(), priority);
        display
    }

    pub fn erase(&self, presentable: &dyn Presentable) {
        self.queue.erase(presentable);
    }

    /// Stop the active presentable and forget the rest.
    pub fn shutdown(&self) {
        self.playing.store(false, Ordering::Release);
        self.queue.clear();
        info!("stack down");
    }

    /// Synthetic feeds: levels from `feed` every [`FEED_PERIOD`], forecasts
    /// on `main` every `weather_interval`. Both stop when the returned
    /// lifetimes are dropped.
    pub fn start_demo(
        self: &Arc<Self>,
        main: &Scheduler,
        feed: &Scheduler,
        weather_interval: Duration,
    ) -> Vec<Lifetime> {
        let stack = Arc::clone(self);
        let target = main.clone();
        let mut tick: u32 = 0;
        let mut posted: Option<Lifetime> = None;
        let levels = feed.schedule(
            move || {
                let phase = tick % DEMO_CYCLE;
                tick = tick.wrapping_add(1);
                let stack = Arc::clone(&stack);
                posted = if phase < DEMO_PLAYING {
                    let levels = random_levels();
                    Some(target.schedule(move || stack.play(levels), Options::default()))
                } else if phase == DEMO_PLAYING {
                    Some(target.schedule(move || stack.pause(), Options::default()))
                } else {
                    posted.take()
                };
            },
            Options::period(FEED_PERIOD),
        );

        let stack = Arc::clone(self);
        let weather = main.schedule(move || stack.show_weather(random_forecast()), Options::period(weather_interval));
        info!("demo feeds running, weather every {}s", weather_interval.as_secs());
        vec![levels, weather]
    }
}

fn random_levels() -> Levels {
    let mut rng = rand::rng();
    let mut up = [0u8; COLUMNS];
    for v in up.iter_mut() {
        *v = rng.random_range(0..=7);
    }
    Levels::symmetric(up)
}

fn random_forecast() -> Forecast {
    let mut rng = rand::rng();
    Forecast {
        condition: Condition::from_code(rng.random_range(0..3)),
        temperature: rng.random_range(-5..=30),
    }
}
