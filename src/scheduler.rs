//! Execution contexts for timed and re-dispatched work.
//!
//! A [`Scheduler`] orders tasks on some context: the pumped main loop, the
//! shared background worker, a dedicated thread, or the virtual-time
//! [`ManualScheduler`] for tests. Operators hold schedulers as trait
//! objects, so the trait is object safe and tasks arrive boxed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::subscription::SubscriptionLike;

mod main_loop;
mod manual;
mod worker;

pub use main_loop::{main_loop, MainLoop, MainScheduler, TickerId};
pub use manual::ManualScheduler;
pub use worker::{NewThreadScheduler, WorkerScheduler};

pub type Task = Box<dyn FnOnce() + Send>;
/// Repeating tasks receive their invocation index, starting at 0.
pub type RepeatingTask = Box<dyn FnMut(usize) + Send>;

pub type ArcScheduler = Arc<dyn Scheduler>;

/// Cancel token for scheduled work.
///
/// Cancelling does not interrupt a task already running; it prevents runs
/// that have not started yet. The handle is a subscription, so it can be
/// attached to the chain's [`crate::subscription::Subscription`] and torn
/// down with it. A one-shot task's handle also reads closed once the task
/// has run, so spent handles are pruned from teardown lists.
#[derive(Clone, Debug, Default)]
pub struct TaskHandle(Arc<AtomicBool>);

impl TaskHandle {
  pub fn new() -> Self { Self::default() }
}

/// Wraps a one-shot task so its handle closes when the run finishes.
pub(crate) fn close_after_run(task: Task, handle: &TaskHandle) -> Task {
  let mut done = handle.clone();
  Box::new(move || {
    task();
    done.unsubscribe();
  })
}

impl SubscriptionLike for TaskHandle {
  fn unsubscribe(&mut self) { self.0.store(true, Ordering::Relaxed); }

  fn is_closed(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

pub trait Scheduler: Send + Sync {
  /// Run `task` once on this context, after `delay` when given.
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle;

  /// Run `task` every `period` on this context, first run one period from
  /// now.
  fn schedule_repeating(
    &self,
    task: RepeatingTask,
    period: Duration,
  ) -> TaskHandle;

  /// The context one chain activation binds to.
  ///
  /// Shared-context schedulers hand out themselves; the new-thread
  /// scheduler hands out a fresh dedicated worker, so each activation
  /// gets its own thread while keeping in-order delivery within the
  /// chain.
  fn for_chain(&self) -> ArcScheduler;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    (**self).schedule(task, delay)
  }

  fn schedule_repeating(
    &self,
    task: RepeatingTask,
    period: Duration,
  ) -> TaskHandle {
    (**self).schedule_repeating(task, period)
  }

  fn for_chain(&self) -> ArcScheduler { (**self).for_chain() }
}

/// Returns a Scheduler that gives every activation chain its own thread.
pub fn new_thread() -> NewThreadScheduler { NewThreadScheduler::new() }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn task_handle_cancels() {
    let mut handle = TaskHandle::new();
    assert!(!handle.is_closed());
    handle.unsubscribe();
    assert!(handle.is_closed());
    let mut clone = handle.clone();
    clone.unsubscribe();
    assert!(clone.is_closed());
  }
}
