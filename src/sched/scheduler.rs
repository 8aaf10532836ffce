/*
 *  sched/scheduler.rs
 *
 *  SpotiLED - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Time ordered task queue with a blocking dispatch loop
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

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, trace};

use super::lifetime::{Lifetime, Watch};

/// Delays and periods beyond this are clamped; such a task is due "never"
/// for any practical purpose.
pub const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `base + delay` without overflowing `Instant`.
fn due_after(base: Instant, delay: Duration) -> Instant {
    base.checked_add(delay.min(FAR_FUTURE))
        .or_else(|| base.checked_add(Duration::from_secs(24 * 60 * 60)))
        .unwrap_or(base)
}

/// Work accepted by [`Scheduler::schedule`].
pub type Task = Box<dyn FnMut() + Send + 'static>;

/// When, and how often, a task should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Delay before the first run; zero means as soon as possible.
    pub delay: Duration,

    /// Re-run interval. `None` (or a zero duration) runs the task once.
    pub period: Option<Duration>,
}

impl Options {
    pub fn delay(delay: Duration) -> Self {
        Self { delay, period: None }
    }

    pub fn period(period: Duration) -> Self {
        Self { delay: Duration::ZERO, period: Some(period) }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }
}

// queue ordering: due time first, then submission order
type Key = (Instant, u64);

struct Entry {
    task: Task,
    watch: Watch,
    due: Instant,
    period: Option<Duration>,
}

#[derive(Default)]
struct Queue {
    entries: BTreeMap<Key, Entry>,
    next_seq: u64,
}

impl Queue {
    fn push(&mut self, entry: Entry) {
        let key = (entry.due, self.next_seq);
        self.next_seq += 1;
        self.entries.insert(key, entry);
    }

    fn next_due(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(due, _)| *due)
    }
}

/// State shared between scheduler handles, lifetimes and the dispatch loop.
pub(crate) struct Shared {
    queue: Mutex<Queue>,
    cv: Condvar,
    stopping: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wake(&self) {
        self.cv.notify_all();
    }
}

/// Result of processing one detached batch outside the lock.
#[derive(Default)]
struct Pass {
    executed: usize,
    kept: Vec<(Key, Entry)>,
    repeat: Vec<Entry>,
}

/// Cloneable handle to one task queue.
///
/// [`schedule`](Scheduler::schedule) is the only thread-safe entry point and
/// may be called from anywhere, including from inside a running task. The
/// queue is drained by exactly one thread at a time, either the blocking
/// [`run`](Scheduler::run) loop (see [`Thread`](super::Thread)) or manual
/// [`run_pending`](Scheduler::run_pending) passes.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("stopping", &self.shared.stopping.load(Ordering::Acquire))
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue::default()),
                cv: Condvar::new(),
                stopping: AtomicBool::new(false),
            }),
        }
    }

    /// Queue `task` and return the handle that keeps it wanted.
    ///
    /// The task only runs while the returned [`Lifetime`] (or a clone of it)
    /// is alive at the moment it comes due. Periodic tasks are re-queued with
    /// `due += period` after each run, so they never overlap with themselves.
    pub fn schedule<F>(&self, task: F, options: Options) -> Lifetime
    where
        F: FnMut() + Send + 'static,
    {
        let lifetime = Lifetime::for_scheduler(Arc::clone(&self.shared));
        let entry = Entry {
            task: Box::new(task),
            watch: lifetime.watch(),
            due: due_after(Instant::now(), options.delay),
            period: options.period.filter(|p| !p.is_zero()),
        };
        self.shared.lock().push(entry);
        self.shared.wake();
        lifetime
    }

    /// Number of queued entries, dead ones included until the next pass.
    pub fn pending(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Due time of the earliest queued entry.
    pub fn next_due(&self) -> Option<Instant> {
        self.shared.lock().next_due()
    }

    /// Run one pass on the calling thread: everything due now whose lifetime
    /// is alive executes, dead entries are discarded, the rest stays queued.
    ///
    /// Returns the number of tasks executed. Meant for driving a scheduler
    /// that has no thread of its own; never call it while `run` is active.
    pub fn run_pending(&self) -> usize {
        let batch = std::mem::take(&mut self.shared.lock().entries);
        let pass = Self::process(batch, Instant::now());
        let executed = pass.executed;
        self.merge(pass);
        executed
    }

    /// Blocking dispatch loop. Returns after [`stop`](Scheduler::stop);
    /// whatever is still queued at that point is dropped without running,
    /// including tasks that are already due.
    pub fn run(&self) {
        debug!("scheduler loop starting");
        let mut queue = self.shared.lock();
        loop {
            if self.is_stopping() {
                break;
            }
            queue = match queue.next_due() {
                None => self
                    .shared
                    .cv
                    .wait_while(queue, |q| q.entries.is_empty() && !self.is_stopping())
                    .unwrap_or_else(PoisonError::into_inner),
                Some(due) => {
                    let timeout = due.saturating_duration_since(Instant::now());
                    if timeout.is_zero() {
                        queue
                    } else {
                        self.shared
                            .cv
                            .wait_timeout(queue, timeout)
                            .map(|(guard, _)| guard)
                            .unwrap_or_else(|e| e.into_inner().0)
                    }
                }
            };
            if self.is_stopping() {
                break;
            }

            let batch = std::mem::take(&mut queue.entries);
            drop(queue);

            let pass = Self::process(batch, Instant::now());
            if pass.executed > 0 {
                trace!("scheduler ran {} task(s)", pass.executed);
            }

            queue = self.shared.lock();
            Self::merge_into(&mut queue, pass);
        }

        let leftover = std::mem::take(&mut queue.entries);
        drop(queue);
        if !leftover.is_empty() {
            debug!("scheduler stopped with {} entries dropped", leftover.len());
        }
        // tasks may own lifetimes or handles whose drop touches the queue, so
        // release them with the lock already gone
        drop(leftover);
        debug!("scheduler loop exited");
    }

    /// Ask the loop to exit at its next wake-up.
    pub fn stop(&self) {
        {
            // taking the lock orders the flag against the loop's predicate check
            let _queue = self.shared.lock();
            self.shared.stopping.store(true, Ordering::Release);
        }
        self.shared.wake();
    }

    fn is_stopping(&self) -> bool {
        self.shared.stopping.load(Ordering::Acquire)
    }

    fn process(batch: BTreeMap<Key, Entry>, now: Instant) -> Pass {
        let mut pass = Pass::default();
        for (key, mut entry) in batch {
            if entry.watch.is_dead() {
                continue;
            }
            if entry.due > now {
                pass.kept.push((key, entry));
                continue;
            }
            (entry.task)();
            pass.executed += 1;
            if let Some(period) = entry.period {
                // the task may have released its own lifetime while running
                if entry.watch.is_alive() {
                    entry.due = due_after(entry.due, period);
                    pass.repeat.push(entry);
                }
            }
        }
        pass
    }

    fn merge(&self, pass: Pass) {
        let mut queue = self.shared.lock();
        Self::merge_into(&mut queue, pass);
    }

    fn merge_into(queue: &mut Queue, pass: Pass) {
        queue.entries.extend(pass.kept);
        for entry in pass.repeat {
            queue.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_runs_due_task_once() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let _lifetime = scheduler.schedule(task, Options::default());

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_dropped_lifetime_skips_task() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        drop(scheduler.schedule(task, Options::default()));

        assert_eq!(scheduler.pending(), 1, "dead entries linger until a pass");
        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_future_task_is_kept() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let before = Instant::now();
        let _lifetime = scheduler.schedule(task, Options::delay(Duration::from_secs(30)));

        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 1);
        let due = scheduler.next_due().unwrap();
        assert!(due >= before + Duration::from_secs(30));
    }

    #[test]
    fn test_periodic_task_is_requeued() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let lifetime = scheduler.schedule(task, Options::period(Duration::from_secs(10)));

        let first_due = scheduler.next_due().unwrap();
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due().unwrap(), first_due + Duration::from_secs(10));

        drop(lifetime);
        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_period_runs_once() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let _lifetime = scheduler.schedule(task, Options::period(Duration::ZERO));

        scheduler.run_pending();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_equal_due_runs_in_submission_order() {
        let scheduler = Scheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut lifetimes = Vec::new();
        for i in 0..5 {
            let order = Arc::clone(&order);
            lifetimes.push(scheduler.schedule(
                move || order.lock().unwrap().push(i),
                Options::default(),
            ));
        }
        scheduler.run_pending();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_task_scheduled_from_task_waits_for_next_pass() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let slot: Arc<Mutex<Option<Lifetime>>> = Arc::new(Mutex::new(None));

        let inner_scheduler = scheduler.clone();
        let inner_slot = Arc::clone(&slot);
        let mut task = Some(task);
        let _outer = scheduler.schedule(
            move || {
                if let Some(task) = task.take() {
                    let lifetime = inner_scheduler.schedule(task, Options::default());
                    *inner_slot.lock().unwrap() = Some(lifetime);
                }
            },
            Options::default(),
        );

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_task_releasing_own_lifetime_stops_period() {
        let scheduler = Scheduler::new();
        let slot: Arc<Mutex<Option<Lifetime>>> = Arc::new(Mutex::new(None));
        let runs = Arc::new(AtomicUsize::new(0));

        let task_slot = Arc::clone(&slot);
        let task_runs = Arc::clone(&runs);
        let lifetime = scheduler.schedule(
            move || {
                task_runs.fetch_add(1, Ordering::SeqCst);
                task_slot.lock().unwrap().take();
            },
            Options::period(Duration::from_millis(1)),
        );
        *slot.lock().unwrap() = Some(lifetime);

        scheduler.run_pending();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_huge_delay_is_clamped() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let before = Instant::now();
        let _lifetime = scheduler.schedule(task, Options::delay(Duration::MAX));

        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(scheduler.next_due().unwrap() > before + Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_huge_period_requeues_without_overflow() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let _lifetime = scheduler.schedule(task, Options::period(Duration::MAX));
        let _other = scheduler.schedule(|| {}, Options::period(Duration::from_millis(1)));

        assert_eq!(scheduler.run_pending(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 2);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(scheduler.run_pending(), 1, "the short period keeps running");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_drops_due_tasks() {
        let scheduler = Scheduler::new();
        let (count, task) = counter();
        let _lifetime = scheduler.schedule(task, Options::default());
        scheduler.stop();
        scheduler.run();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_options_builders() {
        let options = Options::delay(Duration::from_millis(5)).with_period(Duration::from_millis(7));
        assert_eq!(options.delay, Duration::from_millis(5));
        assert_eq!(options.period, Some(Duration::from_millis(7)));
        assert_eq!(Options::default().period, None);
    }
}
