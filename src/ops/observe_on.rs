use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::MutArc;
use crate::scheduler::{ArcScheduler, Scheduler};
use crate::subscription::Subscription;
use crate::value::Value;

impl Observable {
  /// Re-dispatches every downstream notification through `scheduler`,
  /// preserving enqueue order.
  ///
  /// Each activation binds its own chain context via
  /// [`Scheduler::for_chain`], so a new-thread scheduler gives every
  /// subscription a dedicated thread. Pending notifications are cancelled
  /// when the chain is disposed.
  pub fn observe_on(&self, scheduler: impl Scheduler + 'static) -> Observable {
    let scheduler: ArcScheduler = Arc::new(scheduler);
    Observable::stage(self.clone(), move |upstream, down| {
      let chain = down.subscription().clone();
      let observer = ObserveOnObserver {
        slot: MutArc::own(Some(down)),
        chain: chain.clone(),
        scheduler: scheduler.for_chain(),
      };
      // The upstream's synchronous terminal must not tear the chain down
      // before the re-dispatched notifications have run, so it gets its
      // own subscription.
      let leg = Subscription::new();
      chain.add(leg.clone());
      upstream.activate(Subscriber::new(Box::new(observer), leg));
    })
  }
}

struct ObserveOnObserver {
  slot: MutArc<Option<Subscriber>>,
  chain: Subscription,
  scheduler: ArcScheduler,
}

impl Observer for ObserveOnObserver {
  fn next(&mut self, value: Value) {
    let mut slot = self.slot.clone();
    let handle =
      self.scheduler.schedule(Box::new(move || slot.next(value)), None);
    self.chain.add(handle);
  }

  fn error(&mut self, err: StreamError) {
    let mut slot = self.slot.clone();
    let handle =
      self.scheduler.schedule(Box::new(move || slot.error(err)), None);
    self.chain.add(handle);
  }

  fn complete(&mut self) {
    let mut slot = self.slot.clone();
    let handle =
      self.scheduler.schedule(Box::new(move || slot.complete()), None);
    self.chain.add(handle);
  }

  fn is_closed(&self) -> bool { self.slot.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::ManualScheduler;
  use crate::subscription::SubscriptionLike;
  use crate::test_support::{feed, EventBuffer};

  #[test]
  fn notifications_wait_for_the_scheduler() {
    let scheduler = ManualScheduler::now();
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.observe_on(scheduler.clone()));
    input.next(1);
    input.next(2);
    assert!(events.numbers().is_empty());
    scheduler.run_tasks();
    assert_eq!(events.numbers(), vec![1.0, 2.0]);
  }

  #[test]
  fn terminal_is_re_dispatched_in_order() {
    let scheduler = ManualScheduler::now();
    let events = EventBuffer::new();
    let (input, source) = feed();
    events.subscribe_to(&source.observe_on(scheduler.clone()));
    input.next(1);
    input.complete();
    assert_eq!(events.completes(), 0);
    scheduler.run_tasks();
    assert_eq!(events.numbers(), vec![1.0]);
    assert_eq!(events.completes(), 1);
  }

  #[test]
  fn disposal_cancels_pending_notifications() {
    let scheduler = ManualScheduler::now();
    let events = EventBuffer::new();
    let (input, source) = feed();
    let mut subscription =
      events.subscribe_to(&source.observe_on(scheduler.clone()));
    input.next(1);
    subscription.unsubscribe();
    scheduler.run_tasks();
    assert!(events.numbers().is_empty());
  }

  #[test]
  fn synchronous_source_stays_intact_across_the_hop() {
    let scheduler = ManualScheduler::now();
    let events = EventBuffer::new();
    let source = crate::observable::from_iter([1, 2, 3]);
    events.subscribe_to(&source.observe_on(scheduler.clone()));
    scheduler.run_tasks();
    assert_eq!(events.numbers(), vec![1.0, 2.0, 3.0]);
    assert!(events.is_completed());
  }
}
