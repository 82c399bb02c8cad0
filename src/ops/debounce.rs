use std::sync::Arc;
use std::time::Duration;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDerefMut};
use crate::scheduler::{ArcScheduler, Scheduler, TaskHandle, WorkerScheduler};
use crate::subscription::{Subscription, SubscriptionLike};
use crate::value::Value;

impl Observable {
  /// Emits only the latest item once the source has stayed quiet for
  /// `period`.
  ///
  /// Every new item restarts the quiet window and replaces the pending
  /// one. Completion flushes a pending item before completing; an error
  /// discards it. Timing runs on the shared background worker.
  pub fn debounce(&self, period: Duration) -> Observable {
    self.debounce_on(period, WorkerScheduler::shared().clone())
  }

  /// [`Observable::debounce`] with an explicit timing scheduler.
  pub fn debounce_on(
    &self,
    period: Duration,
    scheduler: impl Scheduler + 'static,
  ) -> Observable {
    let scheduler: ArcScheduler = Arc::new(scheduler);
    Observable::stage(self.clone(), move |upstream, down| {
      let chain = down.subscription().clone();
      let observer = DebounceObserver {
        slot: MutArc::own(Some(down)),
        trailing: MutArc::own(None),
        timer: MutArc::own(None),
        chain: chain.clone(),
        scheduler: scheduler.for_chain(),
        period,
      };
      upstream.activate(Subscriber::new(Box::new(observer), chain));
    })
  }
}

struct DebounceObserver {
  slot: MutArc<Option<Subscriber>>,
  trailing: MutArc<Option<Value>>,
  timer: MutArc<Option<TaskHandle>>,
  chain: Subscription,
  scheduler: ArcScheduler,
  period: Duration,
}

impl DebounceObserver {
  fn cancel_timer(&self) {
    if let Some(mut timer) = self.timer.rc_deref_mut().take() {
      timer.unsubscribe();
    }
  }
}

impl Observer for DebounceObserver {
  fn next(&mut self, value: Value) {
    *self.trailing.rc_deref_mut() = Some(value);
    self.cancel_timer();
    let trailing = self.trailing.clone();
    let mut slot = self.slot.clone();
    let handle = self.scheduler.schedule(
      Box::new(move || {
        if let Some(value) = trailing.rc_deref_mut().take() {
          slot.next(value);
        }
      }),
      Some(self.period),
    );
    *self.timer.rc_deref_mut() = Some(handle.clone());
    self.chain.add(handle);
  }

  fn error(&mut self, err: StreamError) {
    self.cancel_timer();
    self.trailing.rc_deref_mut().take();
    self.slot.error(err);
  }

  fn complete(&mut self) {
    self.cancel_timer();
    let pending = self.trailing.rc_deref_mut().take();
    if let Some(value) = pending {
      self.slot.next(value);
    }
    self.slot.complete();
  }

  fn is_closed(&self) -> bool { self.slot.is_closed() }
}
