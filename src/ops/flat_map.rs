use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::Subscription;
use crate::value::Value;

impl Observable {
  /// Maps each item to an observable via `f` and interleaves all of them.
  ///
  /// Inner observables run concurrently; their items forward in arrival
  /// order. The chain completes once the upstream and every inner have
  /// completed. Any error, from `f`, the upstream, or an inner, terminates
  /// everything.
  pub fn flat_map(
    &self,
    f: impl Fn(Value) -> Result<Observable, StreamError>
      + Send
      + Sync
      + 'static,
  ) -> Observable {
    let f = Arc::new(f);
    Observable::stage(self.clone(), move |upstream, down| {
      let chain = down.subscription().clone();
      let state = MutArc::own(FlatMapState {
        down: Some(down),
        active: 0,
        outer_done: false,
      });
      let outer_leg = Subscription::new();
      chain.add(outer_leg.clone());
      let observer =
        FlatMapOuter { state: state.clone(), chain, f: f.clone() };
      upstream.activate(Subscriber::new(Box::new(observer), outer_leg));
    })
  }
}

struct FlatMapState {
  down: Option<Subscriber>,
  active: usize,
  outer_done: bool,
}

struct FlatMapOuter<F> {
  state: MutArc<FlatMapState>,
  chain: Subscription,
  f: Arc<F>,
}

impl<F> Observer for FlatMapOuter<F>
where
  F: Fn(Value) -> Result<Observable, StreamError> + Send + Sync + 'static,
{
  fn next(&mut self, value: Value) {
    let inner = match (self.f)(value) {
      Ok(inner) => inner,
      Err(err) => {
        if let Some(mut down) = self.state.rc_deref_mut().down.take() {
          down.error(err);
        }
        return;
      }
    };
    {
      let mut state = self.state.rc_deref_mut();
      if state.down.is_none() {
        return;
      }
      state.active += 1;
    }
    let leg = Subscription::new();
    self.chain.add(leg.clone());
    let observer = FlatMapInner { state: self.state.clone() };
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
    if state.active > 0 {
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

struct FlatMapInner {
  state: MutArc<FlatMapState>,
}

impl Observer for FlatMapInner {
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
    state.active -= 1;
    if state.active > 0 || !state.outer_done {
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
