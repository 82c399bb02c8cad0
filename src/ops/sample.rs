use std::sync::Arc;
use std::time::Duration;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDerefMut};
use crate::scheduler::{ArcScheduler, Scheduler, WorkerScheduler};
use crate::value::Value;

impl Observable {
  /// Emits the source's latest item once per `period` tick.
  ///
  /// A tick with no new item since the previous tick emits nothing.
  /// Completion ends the chain at once; an item that arrived after the
  /// last tick is dropped, not flushed. Timing runs on the shared
  /// background worker.
  pub fn sample(&self, period: Duration) -> Observable {
    self.sample_on(period, WorkerScheduler::shared().clone())
  }

  /// [`Observable::sample`] with an explicit timing scheduler.
  pub fn sample_on(
    &self,
    period: Duration,
    scheduler: impl Scheduler + 'static,
  ) -> Observable {
    let scheduler: ArcScheduler = Arc::new(scheduler);
    Observable::stage(self.clone(), move |upstream, down| {
      let chain = down.subscription().clone();
      let slot = MutArc::own(Some(down));
      let latest = MutArc::own(None::<Value>);

      let tick_latest = latest.clone();
      let tick_slot = slot.clone();
      let timer = scheduler.for_chain().schedule_repeating(
        Box::new(move |_| {
          let mut slot = tick_slot.clone();
          if let Some(value) = tick_latest.rc_deref_mut().take() {
            slot.next(value);
          }
        }),
        period,
      );
      chain.add(timer);

      let observer = SampleObserver { slot, latest };
      upstream.activate(Subscriber::new(Box::new(observer), chain));
    })
  }
}

struct SampleObserver {
  slot: MutArc<Option<Subscriber>>,
  latest: MutArc<Option<Value>>,
}

impl Observer for SampleObserver {
  fn next(&mut self, value: Value) {
    *self.latest.rc_deref_mut() = Some(value);
  }

  fn error(&mut self, err: StreamError) {
    self.latest.rc_deref_mut().take();
    self.slot.error(err);
  }

  fn complete(&mut self) {
    self.latest.rc_deref_mut().take();
    self.slot.complete();
  }

  fn is_closed(&self) -> bool { self.slot.is_closed() }
}
