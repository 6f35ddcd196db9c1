//! Host event-loop seam for delayed work.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub type Task = Box<dyn FnOnce()>;

/// Runs a task once after `delay` on the host's single-threaded loop.
///
/// Implementations must never run the task synchronously inside `schedule`.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Task);
}

struct PendingTask {
    due: Duration,
    sequence: u64,
    task: Task,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_sequence: u64,
    pending: Vec<PendingTask>,
}

/// Virtual-clock scheduler driven explicitly by [`ManualScheduler::advance`].
///
/// Tasks run in due-time order, ties in scheduling order. Tasks scheduled
/// while advancing run in the same call if they fall due before the target.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Rc<RefCell<ManualClock>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.pending.len())
            .finish()
    }
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.clock.borrow().pending.len()
    }

    /// Moves the clock forward by `by`, running every task that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        while let Some(task) = self.pop_due(target) {
            task();
        }
        self.clock.borrow_mut().now = target;
    }

    /// Runs pending tasks until none remain, bounded by `max_elapsed` of
    /// virtual time.
    pub fn run_until_idle(&self, max_elapsed: Duration) {
        let limit = self.now() + max_elapsed;
        while let Some(task) = self.pop_due(limit) {
            task();
        }
    }

    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut clock = self.clock.borrow_mut();
        let index = clock
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= target)
            .min_by_key(|(_, pending)| (pending.due, pending.sequence))
            .map(|(index, _)| index)?;
        let pending = clock.pending.swap_remove(index);
        clock.now = clock.now.max(pending.due);
        Some(pending.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut clock = self.clock.borrow_mut();
        let sequence = clock.next_sequence;
        clock.next_sequence += 1;
        let due = clock.now + delay;
        clock.pending.push(PendingTask {
            due,
            sequence,
            task,
        });
    }
}
