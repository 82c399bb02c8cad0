//! Thread-backed schedulers.
//!
//! A [`WorkerScheduler`] owns one worker thread and runs everything handed
//! to it there: undelayed tasks strictly FIFO, delayed and repeating tasks
//! from a timer heap. The thread spawns on first use and exits again once
//! it has sat idle past a short linger, so churned chains do not pin
//! threads for the life of the process.
//! [`WorkerScheduler::shared`] is the process-wide background worker;
//! [`NewThreadScheduler`] hands a fresh worker to every activation chain.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::scheduler::{
  close_after_run, ArcScheduler, RepeatingTask, Scheduler, Task, TaskHandle,
};
use crate::subscription::SubscriptionLike;

static SHARED: Lazy<WorkerScheduler> = Lazy::new(WorkerScheduler::new);

// How long an idle worker thread lingers for new work before exiting.
// `ensure_started` respawns it on demand.
const IDLE_LINGER: Duration = Duration::from_millis(100);

enum TimerKind {
  Oneshot(Task),
  Repeating { task: RepeatingTask, invokes: usize },
}

struct TimerEntry {
  due: Instant,
  seq: u64,
  period: Option<Duration>,
  kind: TimerKind,
  handle: TaskHandle,
}

impl PartialEq for TimerEntry {
  fn eq(&self, other: &Self) -> bool {
    self.due == other.due && self.seq == other.seq
  }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
    Some(self.cmp(other))
  }
}

impl Ord for TimerEntry {
  // Reversed so the BinaryHeap pops the earliest due entry; seq keeps
  // entries with equal due times in schedule order.
  fn cmp(&self, other: &Self) -> CmpOrdering {
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct WorkerState {
  ready: VecDeque<(Task, TaskHandle)>,
  timers: BinaryHeap<TimerEntry>,
  next_seq: u64,
  started: bool,
}

struct WorkerCore {
  state: Mutex<WorkerState>,
  wakeup: Condvar,
}

/// One serialized worker thread.
#[derive(Clone)]
pub struct WorkerScheduler {
  core: Arc<WorkerCore>,
}

impl WorkerScheduler {
  pub fn new() -> Self {
    WorkerScheduler {
      core: Arc::new(WorkerCore {
        state: Mutex::new(WorkerState::default()),
        wakeup: Condvar::new(),
      }),
    }
  }

  /// The process-wide background worker. Timed sources default to it.
  pub fn shared() -> &'static WorkerScheduler { &SHARED }

  pub(crate) fn schedule_with_handle(
    &self,
    task: Task,
    delay: Option<Duration>,
    handle: TaskHandle,
  ) {
    let mut state = self.core.state.lock().unwrap();
    match delay {
      Some(delay) if !delay.is_zero() => {
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(TimerEntry {
          due: Instant::now() + delay,
          seq,
          period: None,
          kind: TimerKind::Oneshot(task),
          handle,
        });
      }
      _ => {
        state.ready.push_back((task, handle));
      }
    }
    self.ensure_started(&mut state);
    drop(state);
    self.core.wakeup.notify_one();
  }

  pub(crate) fn schedule_repeating_with_handle(
    &self,
    task: RepeatingTask,
    period: Duration,
    handle: TaskHandle,
  ) {
    let mut state = self.core.state.lock().unwrap();
    let seq = state.next_seq;
    state.next_seq += 1;
    state.timers.push(TimerEntry {
      due: Instant::now() + period,
      seq,
      period: Some(period),
      kind: TimerKind::Repeating { task, invokes: 0 },
      handle,
    });
    self.ensure_started(&mut state);
    drop(state);
    self.core.wakeup.notify_one();
  }

  fn ensure_started(&self, state: &mut WorkerState) {
    if !state.started {
      state.started = true;
      let core = self.core.clone();
      debug!("worker thread starting");
      thread::spawn(move || Self::run(core));
    }
  }

  fn run(core: Arc<WorkerCore>) {
    let mut state = core.state.lock().unwrap();
    loop {
      // Ready tasks first, strictly in enqueue order.
      if let Some((task, handle)) = state.ready.pop_front() {
        drop(state);
        if !handle.is_closed() {
          task();
        }
        state = core.state.lock().unwrap();
        continue;
      }

      // Then the earliest due timer.
      let now = Instant::now();
      let next_due = state.timers.peek().map(|t| t.due);
      match next_due {
        Some(due) if due <= now => {
          let entry = match state.timers.pop() {
            Some(entry) => entry,
            None => continue,
          };
          if entry.handle.is_closed() {
            continue;
          }
          let TimerEntry { due, seq, period, kind, handle } = entry;
          match kind {
            TimerKind::Oneshot(task) => {
              drop(state);
              task();
              state = core.state.lock().unwrap();
            }
            TimerKind::Repeating { mut task, mut invokes } => {
              drop(state);
              task(invokes);
              invokes += 1;
              state = core.state.lock().unwrap();
              if !handle.is_closed() {
                if let Some(period) = period {
                  state.timers.push(TimerEntry {
                    due: due + period,
                    seq,
                    period: Some(period),
                    kind: TimerKind::Repeating { task, invokes },
                    handle,
                  });
                }
              }
            }
          }
        }
        Some(due) => {
          let wait = due - now;
          let (guard, _) =
            core.wakeup.wait_timeout(state, wait).unwrap();
          state = guard;
        }
        None => {
          let (guard, timeout) =
            core.wakeup.wait_timeout(state, IDLE_LINGER).unwrap();
          state = guard;
          if timeout.timed_out()
            && state.ready.is_empty()
            && state.timers.is_empty()
          {
            state.started = false;
            debug!("worker thread idle, exiting");
            return;
          }
        }
      }
    }
  }
}

impl Default for WorkerScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for WorkerScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    self.schedule_with_handle(
      close_after_run(task, &handle),
      delay,
      handle.clone(),
    );
    handle
  }

  fn schedule_repeating(
    &self,
    task: RepeatingTask,
    period: Duration,
  ) -> TaskHandle {
    let handle = TaskHandle::new();
    self.schedule_repeating_with_handle(task, period, handle.clone());
    handle
  }

  fn for_chain(&self) -> ArcScheduler { Arc::new(self.clone()) }
}

/// Scheduler that dedicates a thread to every unit of work it is asked to
/// place, and a fresh worker to every activation chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewThreadScheduler;

impl NewThreadScheduler {
  pub fn new() -> Self { NewThreadScheduler }
}

impl Scheduler for NewThreadScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut h = handle.clone();
    thread::spawn(move || {
      if let Some(delay) = delay {
        thread::sleep(delay);
      }
      if !h.is_closed() {
        task();
      }
      h.unsubscribe();
    });
    handle
  }

  fn schedule_repeating(
    &self,
    mut task: RepeatingTask,
    period: Duration,
  ) -> TaskHandle {
    let handle = TaskHandle::new();
    let h = handle.clone();
    thread::spawn(move || {
      let mut invokes = 0;
      let mut due = Instant::now() + period;
      loop {
        let now = Instant::now();
        if due > now {
          thread::sleep(due - now);
        }
        if h.is_closed() {
          break;
        }
        task(invokes);
        invokes += 1;
        due += period;
      }
    });
    handle
  }

  fn for_chain(&self) -> ArcScheduler { Arc::new(WorkerScheduler::new()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn worker_runs_tasks_in_order() {
    let scheduler = WorkerScheduler::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for i in 0..10 {
      let s = seen.clone();
      scheduler.schedule(Box::new(move || s.lock().unwrap().push(i)), None);
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
  }

  #[test]
  fn worker_respects_delay_and_cancel() {
    let scheduler = WorkerScheduler::new();
    let ran = Arc::new(Mutex::new(false));
    let r = ran.clone();
    let mut handle = scheduler.schedule(
      Box::new(move || *r.lock().unwrap() = true),
      Some(Duration::from_millis(40)),
    );
    handle.unsubscribe();
    thread::sleep(Duration::from_millis(80));
    assert!(!*ran.lock().unwrap());
  }

  #[test]
  fn worker_repeats_until_cancelled() {
    let scheduler = WorkerScheduler::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let mut handle = scheduler.schedule_repeating(
      Box::new(move |i| s.lock().unwrap().push(i)),
      Duration::from_millis(10),
    );
    thread::sleep(Duration::from_millis(55));
    handle.unsubscribe();
    let count = seen.lock().unwrap().len();
    assert!(count >= 2, "expected a few repeats, got {count}");
    thread::sleep(Duration::from_millis(40));
    assert_eq!(seen.lock().unwrap().len(), count);
    let firsts: Vec<_> = seen.lock().unwrap().iter().take(2).copied().collect();
    assert_eq!(firsts, vec![0, 1]);
  }

  #[test]
  fn idle_worker_thread_exits_and_respawns() {
    let scheduler = WorkerScheduler::new();
    scheduler.schedule(Box::new(|| {}), None);
    thread::sleep(IDLE_LINGER + Duration::from_millis(100));
    // The run loop held the only other Arc to the core; once it returns
    // we are the sole owner and `started` is clear again.
    assert_eq!(Arc::strong_count(&scheduler.core), 1);
    assert!(!scheduler.core.state.lock().unwrap().started);
    let ran = Arc::new(Mutex::new(false));
    let r = ran.clone();
    scheduler.schedule(Box::new(move || *r.lock().unwrap() = true), None);
    thread::sleep(Duration::from_millis(50));
    assert!(*ran.lock().unwrap());
  }

  #[test]
  fn new_thread_runs_off_caller() {
    let scheduler = NewThreadScheduler::new();
    let caller = thread::current().id();
    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    scheduler.schedule(
      Box::new(move || *s.lock().unwrap() = Some(thread::current().id())),
      None,
    );
    thread::sleep(Duration::from_millis(50));
    let ran_on = seen.lock().unwrap().take();
    assert!(ran_on.is_some());
    assert_ne!(ran_on, Some(caller));
  }
}
