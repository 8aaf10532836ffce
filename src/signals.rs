/*
 *  signals.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bridges OS signals onto a scheduler
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
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use log::{debug, error, info};
use thiserror::Error;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;

use crate::sched::{Lifetime, Options, Scheduler};

static INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Interrupt,
    Terminate,
    Hangup,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("a signal catcher is already installed")]
    AlreadyInstalled,
    #[error("signal registration failed: {0}")]
    Registration(#[from] io::Error),
    #[error("signal thread exited during start up")]
    BridgeLost,
}

type Callback = Arc<dyn Fn(Signal) + Send + Sync + 'static>;

/// Catches SIGINT, SIGTERM and SIGHUP and runs a callback for each on the
/// given scheduler.
///
/// At most one catcher exists per process; a second `install` fails until
/// the first one is dropped. Dropping it stops the signal thread.
pub struct SignalCatcher {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SignalCatcher {
    pub fn install<F>(scheduler: Scheduler, callback: F) -> Result<Self, SignalError>
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        if INSTALLED.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(SignalError::AlreadyInstalled);
        }
        Self::spawn(scheduler, Arc::new(callback)).inspect_err(|_| {
            INSTALLED.store(false, Ordering::Release);
        })
    }

    fn spawn(scheduler: Scheduler, callback: Callback) -> Result<Self, SignalError> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || bridge(scheduler, callback, shutdown_rx, ready_tx))?;

        let started = match ready_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SignalError::Registration(e)),
            Err(_) => Err(SignalError::BridgeLost),
        };
        if let Err(e) = started {
            let _ = handle.join();
            return Err(e);
        }
        debug!("signal catcher installed");
        Ok(Self { shutdown: Some(shutdown_tx), handle: Some(handle) })
    }
}

impl Drop for SignalCatcher {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("signal thread panicked");
            }
        }
        INSTALLED.store(false, Ordering::Release);
        debug!("signal catcher removed");
    }
}

fn bridge(
    scheduler: Scheduler,
    callback: Callback,
    mut shutdown: oneshot::Receiver<()>,
    ready: mpsc::Sender<io::Result<()>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    runtime.block_on(async move {
        let streams = (|| -> io::Result<_> {
            Ok((
                signal(SignalKind::interrupt())?,
                signal(SignalKind::terminate())?,
                signal(SignalKind::hangup())?,
            ))
        })();
        let (mut sigint, mut sigterm, mut sighup) = match streams {
            Ok(streams) => streams,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        // a newer signal supersedes an undelivered one
        let mut delivery: Option<Lifetime> = None;
        loop {
            let received = tokio::select! {
                _ = &mut shutdown => break,
                Some(()) = sigint.recv() => Signal::Interrupt,
                Some(()) = sigterm.recv() => Signal::Terminate,
                Some(()) = sighup.recv() => Signal::Hangup,
            };
            info!("{} received", received);
            let callback = Arc::clone(&callback);
            delivery = Some(scheduler.schedule(move || callback(received), Options::default()));
        }
        drop(delivery);
    });
}
