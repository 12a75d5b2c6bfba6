use snafu::Snafu;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Work to run once a timer elapses.
pub type TimerTask = Box<dyn FnOnce()>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchedulerError {
    #[snafu(display("SchedulerError: Could not schedule timer: {message}"))]
    Backend { message: String },
}

/// Runs one-shot tasks after a delay.
pub trait TimerScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, SchedulerError>;
}

/// Handle to a scheduled timer.
///
/// Dropping the handle leaves the timer running. Call [`TimerHandle::cancel`] to stop it.
pub struct TimerHandle {
    cancel: Box<dyn FnOnce()>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Stop the timer. Does nothing if it already fired.
    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl Debug for TimerHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("TimerHandle")
    }
}

type CurrentLeg = Rc<RefCell<Option<TimerHandle>>>;

/// Schedule `task` on a backend that can wait at most `limit` at once.
///
/// Longer delays are covered by re-arming in legs of at most `limit` until the full delay passed.
/// The returned handle cancels whichever leg is pending.
pub fn schedule_in_legs<S>(
    scheduler: S,
    limit: Duration,
    delay: Duration,
    task: TimerTask,
) -> Result<TimerHandle, SchedulerError>
where
    S: TimerScheduler + Clone + 'static,
{
    let current = CurrentLeg::default();
    arm_leg(scheduler, limit, delay, task, current.clone())?;
    Ok(TimerHandle::new(move || {
        let pending = current.borrow_mut().take();
        if let Some(handle) = pending {
            handle.cancel();
        }
    }))
}

fn arm_leg<S>(
    scheduler: S,
    limit: Duration,
    delay: Duration,
    task: TimerTask,
    current: CurrentLeg,
) -> Result<(), SchedulerError>
where
    S: TimerScheduler + Clone + 'static,
{
    // A zero limit would never make progress.
    let leg = delay.min(limit.max(Duration::from_millis(1)));
    let remaining = delay - leg;
    let next: TimerTask = if remaining.is_zero() {
        task
    } else {
        let scheduler = scheduler.clone();
        let current = current.clone();
        Box::new(move || {
            tracing::trace!(?remaining, "Re-arming timer");
            if let Err(err) = arm_leg(scheduler, limit, remaining, task, current) {
                tracing::warn!(%err, "Could not re-arm timer");
            }
        })
    };
    let handle = scheduler.schedule(leg, next)?;
    *current.borrow_mut() = Some(handle);
    Ok(())
}

type TimerKey = (Duration, u64);

#[derive(Default)]
struct ManualTimers {
    elapsed: Duration,
    next_id: u64,
    pending: BTreeMap<TimerKey, TimerTask>,
}

/// A scheduler whose time only moves when told to. Clones share the same timers.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Rc<RefCell<ManualTimers>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().pending.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.timers.borrow().elapsed
    }

    /// Move time forward, running every task that became due, earliest first.
    /// Tasks scheduled by running tasks are run as well if they fall into the window.
    pub fn advance(&self, by: Duration) {
        let target = self.timers.borrow().elapsed + by;
        loop {
            let due = {
                let mut timers = self.timers.borrow_mut();
                match timers.pending.first_key_value() {
                    Some((key, _)) if key.0 <= target => {
                        let key = *key;
                        timers.elapsed = key.0;
                        timers.pending.remove(&key)
                    }
                    _ => None,
                }
            };
            match due {
                Some(task) => task(),
                None => break,
            }
        }
        self.timers.borrow_mut().elapsed = target;
    }
}

impl TimerScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, SchedulerError> {
        let key = {
            let mut timers = self.timers.borrow_mut();
            let key = (timers.elapsed + delay, timers.next_id);
            timers.next_id += 1;
            timers.pending.insert(key, task);
            key
        };
        let timers: Weak<RefCell<ManualTimers>> = Rc::downgrade(&self.timers);
        Ok(TimerHandle::new(move || {
            if let Some(timers) = timers.upgrade() {
                timers.borrow_mut().pending.remove(&key);
            }
        }))
    }
}

impl Debug for ManualScheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let timers = self.timers.borrow();
        f.debug_struct("ManualScheduler")
            .field("elapsed", &timers.elapsed)
            .field("pending", &timers.pending.len())
            .finish()
    }
}
