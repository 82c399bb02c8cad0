use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::Subscription;
use crate::value::Value;

type Join = Arc<dyn Fn(&[Value]) -> Result<Value, StreamError> + Send + Sync>;

/// Combines the most recent item of every source.
///
/// Stays silent until each source has emitted at least once; from then on
/// every new item from any source re-emits `join` over the current row of
/// latest values, in source order. Completes once every source has
/// completed. Any arity from one up.
pub fn combine_latest(
  sources: impl IntoIterator<Item = Observable>,
  join: impl Fn(&[Value]) -> Result<Value, StreamError> + Send + Sync + 'static,
) -> Observable {
  let join: Join = Arc::new(join);
  let sources: Vec<Observable> = sources.into_iter().collect();
  Observable::joining(sources, move |upstream, mut down| {
    if upstream.is_empty() {
      down.complete();
      return;
    }
    let chain = down.subscription().clone();
    let state = MutArc::own(CombineState {
      down: Some(down),
      latest: vec![None; upstream.len()],
      remaining: upstream.len(),
      join: join.clone(),
    });
    for (index, source) in upstream.iter().enumerate() {
      let leg = Subscription::new();
      chain.add(leg.clone());
      let observer = CombineLeg { index, state: state.clone() };
      source.activate(Subscriber::new(Box::new(observer), leg));
    }
  })
}

impl Observable {
  /// Combines this stream's latest item with `other`'s. See
  /// [`combine_latest`].
  pub fn combine_latest_with(
    &self,
    other: &Observable,
    join: impl Fn(&[Value]) -> Result<Value, StreamError>
      + Send
      + Sync
      + 'static,
  ) -> Observable {
    combine_latest([self.clone(), other.clone()], join)
  }
}

struct CombineState {
  down: Option<Subscriber>,
  latest: Vec<Option<Value>>,
  remaining: usize,
  join: Join,
}

struct CombineLeg {
  index: usize,
  state: MutArc<CombineState>,
}

impl Observer for CombineLeg {
  fn next(&mut self, value: Value) {
    let mut state = self.state.rc_deref_mut();
    if state.down.is_none() {
      return;
    }
    state.latest[self.index] = Some(value);
    let row: Vec<Value> =
      state.latest.iter().filter_map(|slot| slot.clone()).collect();
    if row.len() < state.latest.len() {
      return;
    }
    match (state.join)(&row) {
      Ok(joined) => {
        if let Some(down) = state.down.as_mut() {
          down.next(joined);
        }
      }
      Err(err) => {
        if let Some(mut down) = state.down.take() {
          down.error(err);
        }
      }
    }
  }

  fn error(&mut self, err: StreamError) {
    if let Some(mut down) = self.state.rc_deref_mut().down.take() {
      down.error(err);
    }
  }

  fn complete(&mut self) {
    let mut state = self.state.rc_deref_mut();
    state.remaining -= 1;
    if state.remaining > 0 {
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
