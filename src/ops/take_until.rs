use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::Subscription;
use crate::value::Value;

impl Observable {
  /// Forwards the source until `trigger` emits anything, then completes.
  ///
  /// The trigger merely completing is not a cutoff; only a value (or an
  /// error, which propagates) ends the chain. The trigger is activated
  /// before the source, so a trigger firing synchronously at subscribe
  /// ends the chain before the source emits at all.
  pub fn take_until(&self, trigger: &Observable) -> Observable {
    Observable::joining(
      vec![self.clone(), trigger.clone()],
      |upstream, down| {
        let chain = down.subscription().clone();
        let slot = MutArc::own(Some(down));

        let trigger_leg = Subscription::new();
        chain.add(trigger_leg.clone());
        let cutoff = Cutoff { slot: slot.clone() };
        upstream[1].activate(Subscriber::new(Box::new(cutoff), trigger_leg));

        if !slot.is_closed() {
          upstream[0].activate(Subscriber::new(Box::new(slot), chain));
        }
      },
    )
  }
}

struct Cutoff {
  slot: MutArc<Option<Subscriber>>,
}

impl Observer for Cutoff {
  fn next(&mut self, _: Value) {
    if let Some(mut down) = self.slot.rc_deref_mut().take() {
      down.complete();
    }
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut down) = self.slot.rc_deref_mut().take() {
      down.error(err);
    }
  }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool {
    self.slot.rc_deref().as_ref().is_none_or(Subscriber::is_closed)
  }
}
