use crate::convert;
use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::{Subscription, SubscriptionLike};
use crate::value::Value;

impl Observable {
  /// Treats each upstream item as an observable and forwards only the
  /// most recent one.
  ///
  /// Items are unboxed through the converter registry, so upstream must
  /// emit values produced from [`Observable`]s; anything else is a stream
  /// error. A new inner observable detaches the previous inner before it
  /// is activated. The chain completes after the upstream has completed
  /// and the final inner has too.
  pub fn switch_on_next(&self) -> Observable {
    Observable::stage(self.clone(), |upstream, down| {
      let chain = down.subscription().clone();
      let state = MutArc::own(SwitchState {
        down: Some(down),
        inner_leg: None,
        inner_active: false,
        outer_done: false,
      });
      let outer_leg = Subscription::new();
      chain.add(outer_leg.clone());
      let observer = SwitchOuter { state: state.clone(), chain };
      upstream.activate(Subscriber::new(Box::new(observer), outer_leg));
    })
  }
}

struct SwitchState {
  down: Option<Subscriber>,
  inner_leg: Option<Subscription>,
  inner_active: bool,
  outer_done: bool,
}

struct SwitchOuter {
  state: MutArc<SwitchState>,
  chain: Subscription,
}

impl Observer for SwitchOuter {
  fn next(&mut self, value: Value) {
    let inner = match convert::from_value::<Observable>(&value) {
      Ok(inner) => inner,
      Err(err) => {
        if let Some(mut down) = self.state.rc_deref_mut().down.take() {
          down.error(StreamError::from(err));
        }
        return;
      }
    };
    let leg = Subscription::new();
    let previous = {
      let mut state = self.state.rc_deref_mut();
      if state.down.is_none() {
        return;
      }
      state.inner_active = true;
      state.inner_leg.replace(leg.clone())
    };
    // Detaching the old inner closes its subscriber, so anything it still
    // emits is gated out.
    if let Some(mut previous) = previous {
      previous.unsubscribe();
    }
    self.chain.add(leg.clone());
    let observer = SwitchInner { state: self.state.clone() };
    inner.activate(Subscriber::new(Box::new(observer), leg));
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut down) = self.state.rc_deref_mut().down.take() {
      down.error(err);
    }
  }

  fn complete(&mut self) {
    let mut state = self.state.rc_deref_mut();
    state.outer_done = true;
    if state.inner_active {
      return;
    }
    if let Some(mut down) = state.down.take() {
      down.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref().down.as_ref().is_none_or(Subscriber::is_closed)
  }
}

struct SwitchInner {
  state: MutArc<SwitchState>,
}

impl Observer for SwitchInner {
  fn next(&mut self, value: Value) {
    if let Some(down) = self.state.rc_deref_mut().down.as_mut() {
      down.next(value);
    }
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut down) = self.state.rc_deref_mut().down.take() {
      down.error(err);
    }
  }

  fn complete(&mut self) {
    let mut state = self.state.rc_deref_mut();
    state.inner_active = false;
    if !state.outer_done {
      return;
    }
    if let Some(mut down) = state.down.take() {
      down.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref().down.as_ref().is_none_or(Subscriber::is_closed)
  }
}
