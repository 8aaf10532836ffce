/*
 *  sched/thread.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Named worker thread owning one scheduler loop
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

use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use super::lifetime::Lifetime;
use super::scheduler::{Options, Scheduler};

/// OS thread dedicated to running one [`Scheduler`].
///
/// Dropping the handle stops the loop and joins the thread, so tasks still
/// queued at that point never run.
pub struct Thread {
    name: String,
    scheduler: Scheduler,
    handle: Option<JoinHandle<()>>,
}

impl Thread {
    /// Start a named thread whose body is the scheduler's `run` loop.
    pub fn spawn(name: &str) -> io::Result<Self> {
        let scheduler = Scheduler::new();
        let worker = scheduler.clone();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            worker.run();
        })?;
        info!("thread {} started", name);
        Ok(Self {
            name: name.to_string(),
            scheduler,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to this thread's queue; clone it freely.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Shorthand for `self.scheduler().schedule(..)`.
    pub fn schedule<F>(&self, task: F, options: Options) -> Lifetime
    where
        F: FnMut() + Send + 'static,
    {
        self.scheduler.schedule(task, options)
    }

    /// Run `task` on this thread and block until it has finished.
    ///
    /// Returns `None` if the thread stopped before the task got to run or
    /// `timeout` elapsed first. Never call this from the thread itself.
    pub fn call<F, R>(&self, task: F, timeout: Duration) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let slot: Arc<(Mutex<Option<R>>, Condvar)> = Arc::new((Mutex::new(None), Condvar::new()));
        let reply = Arc::clone(&slot);
        let mut task = Some(task);
        let _lifetime = self.scheduler.schedule(
            move || {
                if let Some(task) = task.take() {
                    let value = task();
                    let (lock, cv) = &*reply;
                    if let Ok(mut result) = lock.lock() {
                        *result = Some(value);
                    }
                    cv.notify_all();
                }
            },
            Options::default(),
        );

        let (lock, cv) = &*slot;
        let guard = lock.lock().ok()?;
        let (mut guard, _) = cv.wait_timeout_while(guard, timeout, |r| r.is_none()).ok()?;
        guard.take()
    }

    /// Stop the loop without joining; `drop` still joins.
    pub fn stop(&self) {
        self.scheduler.stop();
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        self.scheduler.stop();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // a join from inside would deadlock; the loop exits on its own once
            // this task returns
            warn!("thread {} dropped from itself, detaching", self.name);
            return;
        }
        match handle.join() {
            Ok(()) => debug!("thread {} joined", self.name),
            Err(_) => error!("thread {} terminated by a panicking task", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn test_task_runs_on_named_thread() {
        let worker = Thread::spawn("sched-test").unwrap();
        let name = worker.call(|| thread::current().name().map(str::to_string), Duration::from_secs(5));
        assert_eq!(name.flatten().as_deref(), Some("sched-test"));
        assert_eq!(worker.name(), "sched-test");
    }

    #[test]
    fn test_delayed_task_waits() {
        let worker = Thread::spawn("sched-delay").unwrap();
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        let _lifetime = worker.schedule(
            move || {
                let _ = tx.send(Instant::now());
            },
            Options::delay(Duration::from_millis(50)),
        );
        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired.duration_since(start) >= Duration::from_millis(50));
    }

    #[test]
    fn test_released_lifetime_never_runs() {
        let worker = Thread::spawn("sched-cancel").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let task_count = Arc::clone(&count);
        let lifetime = worker.schedule(
            move || {
                task_count.fetch_add(1, Ordering::SeqCst);
            },
            Options::delay(Duration::from_millis(100)),
        );
        drop(lifetime);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(worker.scheduler().pending(), 0);
    }

    #[test]
    fn test_periodic_task_repeats() {
        let worker = Thread::spawn("sched-period").unwrap();
        let (tx, rx) = mpsc::channel();
        let lifetime = worker.schedule(
            move || {
                let _ = tx.send(());
            },
            Options::period(Duration::from_millis(10)),
        );
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        drop(lifetime);
    }

    #[test]
    fn test_drop_discards_queued_work() {
        let count = Arc::new(AtomicUsize::new(0));
        let lifetime;
        {
            let worker = Thread::spawn("sched-drop").unwrap();
            let task_count = Arc::clone(&count);
            lifetime = worker.schedule(
                move || {
                    task_count.fetch_add(1, Ordering::SeqCst);
                },
                Options::delay(Duration::from_secs(60)),
            );
        }
        drop(lifetime);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_call_after_stop_returns_none() {
        let worker = Thread::spawn("sched-stopped").unwrap();
        worker.stop();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(worker.call(|| 1, Duration::from_millis(50)), None);
    }
}
