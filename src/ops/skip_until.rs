use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::{Subscription, SubscriptionLike};
use crate::value::Value;

impl Observable {
  /// Drops source items until `trigger` emits anything, then forwards the
  /// rest.
  ///
  /// A trigger that completes without emitting never opens the gate, so
  /// only the source's terminal events reach downstream. Terminal events
  /// pass the gate regardless.
  pub fn skip_until(&self, trigger: &Observable) -> Observable {
    Observable::joining(
      vec![self.clone(), trigger.clone()],
      |upstream, down| {
        let chain = down.subscription().clone();
        let open = Arc::new(AtomicBool::new(false));
        let slot = MutArc::own(Some(down));

        let gate_leg = Subscription::new();
        chain.add(gate_leg.clone());
        let opener = GateOpener {
          slot: slot.clone(),
          open: open.clone(),
          gate_leg: gate_leg.clone(),
        };
        upstream[1].activate(Subscriber::new(Box::new(opener), gate_leg));

        let observer = SkipUntilObserver { slot, open };
        upstream[0].activate(Subscriber::new(Box::new(observer), chain));
      },
    )
  }
}

struct GateOpener {
  slot: MutArc<Option<Subscriber>>,
  open: Arc<AtomicBool>,
  gate_leg: Subscription,
}

impl Observer for GateOpener {
  fn next(&mut self, _: Value) {
    self.open.store(true, Ordering::SeqCst);
    // The trigger has served its purpose; detach it.
    self.gate_leg.unsubscribe();
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut down) = self.slot.rc_deref_mut().take() {
      down.error(err);
    }
  }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool {
    self.open.load(Ordering::SeqCst)
      || self.slot.rc_deref().as_ref().is_none_or(Subscriber::is_closed)
  }
}

struct SkipUntilObserver {
  slot: MutArc<Option<Subscriber>>,
  open: Arc<AtomicBool>,
}

impl Observer for SkipUntilObserver {
  fn next(&mut self, value: Value) {
    if self.open.load(Ordering::SeqCst) {
      self.slot.next(value);
    }
  }

  fn error(&mut self, err: StreamError) { self.slot.error(err) }

  fn complete(&mut self) { self.slot.complete() }

  fn is_closed(&self) -> bool { self.slot.is_closed() }
}
