/*
 *  main.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  SpotiLED matrix daemon
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

use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use spotiled::config::{self, Cli};
use spotiled::sched::Thread;
use spotiled::signals::SignalCatcher;
use spotiled::stack::Stack;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

const CALL_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let main = Thread::spawn("main")?;
    let feed = Thread::spawn("feed")?;

    let built = {
        let cfg = cfg.clone();
        let scheduler = main.scheduler().clone();
        main.call(move || Stack::build(&cfg, scheduler), CALL_TIMEOUT)
    };
    let stack = built.ok_or_else(|| anyhow!("main thread did not answer"))??;

    {
        let stack = stack.clone();
        let texts = cli.text.clone();
        main.call(
            move || {
                for text in texts {
                    stack.show_text(text);
                }
            },
            CALL_TIMEOUT,
        );
    }

    let demo = if cfg.demo() {
        stack.start_demo(main.scheduler(), feed.scheduler(), cfg.weather_interval())
    } else {
        Vec::new()
    };

    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let catcher = SignalCatcher::install(main.scheduler().clone(), move |signal| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(signal);
        }
    })?;

    match rx.recv() {
        Ok(signal) => info!("{} - shutting down", signal),
        Err(_) => warn!("signal channel closed - shutting down"),
    }

    drop(catcher);
    drop(demo);
    // level updates the feed posted to main are cancelled with it
    drop(feed);
    let torn_down = {
        let stack = stack.clone();
        main.call(move || stack.shutdown(), CALL_TIMEOUT)
    };
    if torn_down.is_none() {
        warn!("main thread did not tear down in time");
    }
    drop(stack);
    drop(main);
    info!("bye");
    Ok(())
}
