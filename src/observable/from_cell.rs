//! Bridging externally owned cells into streams.

use crate::cell::{EngineRef, ListenerId, ValueCell};
use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::{Subscription, SubscriptionLike};
use crate::watch::{watcher_pool, LifetimeWatcher};

/// Streams the writes of `cell`.
///
/// Each subscription synchronously receives the cell's current value and
/// then the per-tick change notifications, so writes landing within one
/// tick arrive as a single last-write-wins emission. The bridge holds no
/// external reference of its own: a [`LifetimeWatcher`] polls liveness,
/// and once the subscription is disposed or nothing outside the engine
/// still holds the cell, the bridge is reaped on the next sweep. A dead
/// cell ends the stream silently, with no terminal event.
pub fn from_cell(cell: &ValueCell) -> Observable {
  let source_ref = EngineRef::new(cell);
  Observable::source(move |mut subscriber| {
    subscriber.next(source_ref.load());
    if subscriber.is_closed() {
      return;
    }
    let subscription = subscriber.subscription().clone();
    let cell_ref = source_ref.clone();
    let listener = cell_ref
      .subscribe_changes(move |value| subscriber.next(value.clone()));
    watcher_pool().add(CellBridge { cell_ref, listener, subscription });
  })
}

struct CellBridge {
  cell_ref: EngineRef,
  listener: ListenerId,
  subscription: Subscription,
}

impl LifetimeWatcher for CellBridge {
  fn is_expired(&self) -> bool {
    self.subscription.is_closed() || !self.cell_ref.is_externally_held()
  }
}

impl Drop for CellBridge {
  fn drop(&mut self) {
    // Dropping the listener entry also drops the chain's subscriber.
    self.cell_ref.unsubscribe_changes(self.listener);
  }
}
