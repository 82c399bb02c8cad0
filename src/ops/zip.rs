use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::{MutArc, RcDeref, RcDerefMut};
use crate::subscription::Subscription;
use crate::value::Value;

type Join = Arc<dyn Fn(&[Value]) -> Result<Value, StreamError> + Send + Sync>;

/// Pairs sources index-for-index: the nth emission of every source forms
/// one row, handed to `join` in source order.
///
/// Items wait in per-source FIFO buffers until the row is full, so sources
/// may run at different speeds. The chain completes once any completed
/// source has an empty buffer, because no further row can fill.
pub fn zip(
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
    let state = MutArc::own(ZipState {
      down: Some(down),
      buffers: vec![VecDeque::new(); upstream.len()],
      done: vec![false; upstream.len()],
      join: join.clone(),
    });
    for (index, source) in upstream.iter().enumerate() {
      let leg = Subscription::new();
      chain.add(leg.clone());
      let observer = ZipLeg { index, state: state.clone() };
      source.activate(Subscriber::new(Box::new(observer), leg));
    }
  })
}

impl Observable {
  /// Zips this stream with `other`. See [`zip`].
  pub fn zip_with(
    &self,
    other: &Observable,
    join: impl Fn(&[Value]) -> Result<Value, StreamError>
      + Send
      + Sync
      + 'static,
  ) -> Observable {
    zip([self.clone(), other.clone()], join)
  }
}

struct ZipState {
  down: Option<Subscriber>,
  buffers: Vec<VecDeque<Value>>,
  done: Vec<bool>,
  join: Join,
}

impl ZipState {
  /// A row can never fill again once a finished source has nothing
  /// buffered.
  fn exhausted(&self) -> bool {
    self
      .done
      .iter()
      .zip(&self.buffers)
      .any(|(done, buffer)| *done && buffer.is_empty())
  }
}

struct ZipLeg {
  index: usize,
  state: MutArc<ZipState>,
}

impl Observer for ZipLeg {
  fn next(&mut self, value: Value) {
    let mut state = self.state.rc_deref_mut();
    if state.down.is_none() {
      return;
    }
    state.buffers[self.index].push_back(value);
    if state.buffers.iter().any(VecDeque::is_empty) {
      return;
    }
    let row: Vec<Value> =
      state.buffers.iter_mut().filter_map(VecDeque::pop_front).collect();
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
        return;
      }
    }
    if state.exhausted() {
      if let Some(mut down) = state.down.take() {
        down.complete();
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
    state.done[self.index] = true;
    if state.buffers[self.index].is_empty() {
      if let Some(mut down) = state.down.take() {
        down.complete();
      }
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref().down.as_ref().is_none_or(Subscriber::is_closed)
  }
}
