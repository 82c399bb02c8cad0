//! Virtual-time scheduler.
//!
//! Nothing runs until the test advances the fake clock and asks for a run,
//! so timed operators can be driven deterministically. A task is due once
//! the clock reaches its fire time; repeating tasks catch up with one
//! invocation per elapsed period.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::scheduler::{
  close_after_run, ArcScheduler, RepeatingTask, Scheduler, Task, TaskHandle,
};
use crate::subscription::SubscriptionLike;

#[derive(Clone)]
pub struct ManualScheduler {
  clock: Arc<RwLock<FakeClock>>,
  repeating_tasks: Arc<Mutex<Vec<RepeatingEntry>>>,
  oneshot_tasks: Arc<Mutex<Vec<OneshotEntry>>>,
}

struct FakeClock {
  current_time: Instant,
}

struct OneshotEntry {
  task: Option<Task>,
  due: Instant,
  cancel: TaskHandle,
}

struct RepeatingEntry {
  task: RepeatingTask,
  period: Duration,
  last_time: Instant,
  invokes: usize,
  cancel: TaskHandle,
}

impl ManualScheduler {
  pub fn new(now: Instant) -> ManualScheduler {
    ManualScheduler {
      clock: Arc::new(RwLock::new(FakeClock { current_time: now })),
      repeating_tasks: Arc::new(Mutex::new(vec![])),
      oneshot_tasks: Arc::new(Mutex::new(vec![])),
    }
  }

  pub fn now() -> ManualScheduler { ManualScheduler::new(Instant::now()) }

  pub fn advance(&self, time: Duration) {
    let mut clock = self.clock.write().unwrap();
    clock.current_time += time;
  }

  pub fn advance_and_run(&self, advance_by: Duration, times: usize) {
    for _ in 0..times {
      self.advance(advance_by);
      self.run_tasks();
    }
  }

  /// Run everything due at the current clock. Tasks scheduled while
  /// running land in the queue and wait for the next call.
  pub fn run_tasks(&self) {
    let now = self.clock.read().unwrap().current_time;

    let mut due = Vec::new();
    {
      let mut oneshots = self.oneshot_tasks.lock().unwrap();
      oneshots.retain_mut(|entry| {
        if entry.cancel.is_closed() {
          return false;
        }
        if entry.due <= now {
          if let Some(task) = entry.task.take() {
            due.push(task);
          }
          false
        } else {
          true
        }
      });
    }
    for task in due {
      task();
    }

    let mut repeats =
      std::mem::take(&mut *self.repeating_tasks.lock().unwrap());
    repeats.retain(|entry| !entry.cancel.is_closed());
    for entry in &mut repeats {
      while !entry.period.is_zero()
        && entry.last_time + entry.period <= now
        && !entry.cancel.is_closed()
      {
        (entry.task)(entry.invokes);
        entry.invokes += 1;
        entry.last_time += entry.period;
      }
    }
    let mut guard = self.repeating_tasks.lock().unwrap();
    repeats.append(&mut guard);
    *guard = repeats;
  }
}

impl Scheduler for ManualScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let now = self.clock.read().unwrap().current_time;
    self.oneshot_tasks.lock().unwrap().push(OneshotEntry {
      task: Some(close_after_run(task, &handle)),
      due: now + delay.unwrap_or(Duration::ZERO),
      cancel: handle.clone(),
    });
    handle
  }

  fn schedule_repeating(
    &self,
    task: RepeatingTask,
    period: Duration,
  ) -> TaskHandle {
    let handle = TaskHandle::new();
    let now = self.clock.read().unwrap().current_time;
    self.repeating_tasks.lock().unwrap().push(RepeatingEntry {
      task,
      period,
      last_time: now,
      invokes: 0,
      cancel: handle.clone(),
    });
    handle
  }

  fn for_chain(&self) -> ArcScheduler { Arc::new(self.clone()) }
}
