//! Mutable cells with coalesced change notification.
//!
//! A [`ValueCell`] is a thread-safe slot the host writes at any rate.
//! Reads see the latest write immediately; change listeners are notified
//! on the main context at most once per tick, with whatever value the
//! cell holds when the tick runs. Intermediate writes within a tick are
//! never observed through the listener path.
//!
//! [`crate::observable::from_cell`] turns a cell into a stream of those
//! notifications.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::scheduler::main_loop;
use crate::value::Value;

/// Identifies one change listener on one cell. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

pub struct ValueCell {
  inner: Arc<CellInner>,
}

struct CellInner {
  value: Mutex<Value>,
  listeners: Mutex<ListenerTable>,
  /// How many of the `Arc<CellInner>` holders are the engine's own
  /// bridges. The cell is externally held while the strong count
  /// exceeds this.
  bridges: AtomicUsize,
  /// Set between a write and the flush it posted.
  dirty: AtomicBool,
}

struct ListenerTable {
  entries: Vec<ListenerEntry>,
  /// Ids unsubscribed while their entry was out in a running flush.
  pending_removals: Vec<ListenerId>,
  next_id: u64,
}

struct ListenerEntry {
  id: ListenerId,
  f: Box<dyn FnMut(&Value) + Send>,
}

impl ValueCell {
  pub fn new(initial: impl Into<Value>) -> Self {
    ValueCell {
      inner: Arc::new(CellInner {
        value: Mutex::new(initial.into()),
        listeners: Mutex::new(ListenerTable {
          entries: Vec::new(),
          pending_removals: Vec::new(),
          next_id: 0,
        }),
        bridges: AtomicUsize::new(0),
        dirty: AtomicBool::new(false),
      }),
    }
  }

  /// The value as of the latest `store`, from any thread.
  pub fn load(&self) -> Value { self.inner.load() }

  /// Replace the value. Visible to `load` immediately; listeners hear
  /// about it on the next tick, coalesced with any other writes that
  /// land before the tick runs.
  pub fn store(&self, value: impl Into<Value>) {
    *self.inner.value.lock().unwrap() = value.into();
    if !self.inner.dirty.swap(true, Ordering::SeqCst) {
      let weak = Arc::downgrade(&self.inner);
      main_loop().post(move || {
        // The cell may be gone by flush time; nothing to tell anyone
        // about then.
        if let Some(inner) = weak.upgrade() {
          inner.flush();
        }
      });
    }
  }

  /// Register a change listener, called on the main context.
  pub fn subscribe_changes(
    &self,
    f: impl FnMut(&Value) + Send + 'static,
  ) -> ListenerId {
    self.inner.subscribe(Box::new(f))
  }

  pub fn unsubscribe_changes(&self, id: ListenerId) {
    self.inner.unsubscribe(id);
  }

  pub fn listener_count(&self) -> usize {
    self.inner.listeners.lock().unwrap().entries.len()
  }
}

impl Clone for ValueCell {
  fn clone(&self) -> Self { ValueCell { inner: self.inner.clone() } }
}

impl CellInner {
  fn load(&self) -> Value { self.value.lock().unwrap().clone() }

  fn subscribe(&self, f: Box<dyn FnMut(&Value) + Send>) -> ListenerId {
    let mut table = self.listeners.lock().unwrap();
    let id = ListenerId(table.next_id);
    table.next_id += 1;
    table.entries.push(ListenerEntry { id, f });
    id
  }

  fn unsubscribe(&self, id: ListenerId) {
    let mut table = self.listeners.lock().unwrap();
    let before = table.entries.len();
    table.entries.retain(|entry| entry.id != id);
    if table.entries.len() == before {
      // The entry is out in a running flush; drop it at the merge.
      table.pending_removals.push(id);
    }
  }

  fn flush(&self) {
    self.dirty.store(false, Ordering::SeqCst);
    let value = self.load();
    // Listeners run with no cell lock held, so they may store back into
    // the cell or change the listener set without deadlocking.
    let mut batch =
      mem::take(&mut self.listeners.lock().unwrap().entries);
    for entry in &mut batch {
      (entry.f)(&value);
    }
    let mut table = self.listeners.lock().unwrap();
    if !table.pending_removals.is_empty() {
      let removed = mem::take(&mut table.pending_removals);
      batch.retain(|entry| !removed.contains(&entry.id));
    }
    batch.append(&mut table.entries);
    table.entries = batch;
  }
}

/// The engine's own handle to a cell. Counted in `bridges`, so holding
/// any number of these never makes the cell look externally held.
pub(crate) struct EngineRef {
  inner: Arc<CellInner>,
}

impl EngineRef {
  pub(crate) fn new(cell: &ValueCell) -> Self {
    // Count after cloning and uncount before dropping, so a racing
    // liveness check errs toward "still held".
    let inner = cell.inner.clone();
    inner.bridges.fetch_add(1, Ordering::SeqCst);
    EngineRef { inner }
  }

  pub(crate) fn load(&self) -> Value { self.inner.load() }

  pub(crate) fn subscribe_changes(
    &self,
    f: impl FnMut(&Value) + Send + 'static,
  ) -> ListenerId {
    self.inner.subscribe(Box::new(f))
  }

  pub(crate) fn unsubscribe_changes(&self, id: ListenerId) {
    self.inner.unsubscribe(id);
  }

  /// True while some handle other than the engine's own still points at
  /// the cell.
  pub(crate) fn is_externally_held(&self) -> bool {
    Arc::strong_count(&self.inner)
      > self.inner.bridges.load(Ordering::SeqCst)
  }
}

impl Clone for EngineRef {
  fn clone(&self) -> Self {
    let inner = self.inner.clone();
    inner.bridges.fetch_add(1, Ordering::SeqCst);
    EngineRef { inner }
  }
}

impl Drop for EngineRef {
  fn drop(&mut self) {
    self.inner.bridges.fetch_sub(1, Ordering::SeqCst);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::main_guard;

  #[test]
  fn load_sees_stores_immediately() {
    let cell = ValueCell::new(3.0);
    assert_eq!(cell.load(), Value::Number(3.0));
    cell.store(4.0);
    assert_eq!(cell.load(), Value::Number(4.0));
  }

  #[test]
  fn stores_coalesce_to_one_notification_per_tick() {
    let _guard = main_guard();
    let cell = ValueCell::new(0.0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    cell.subscribe_changes(move |v| s.lock().unwrap().push(v.clone()));
    for i in 1..=5 {
      cell.store(i as f64);
    }
    main_loop().pump();
    assert_eq!(*seen.lock().unwrap(), vec![Value::Number(5.0)]);
    main_loop().pump();
    assert_eq!(seen.lock().unwrap().len(), 1);
  }

  #[test]
  fn unsubscribed_listener_hears_nothing() {
    let _guard = main_guard();
    let cell = ValueCell::new(0.0);
    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    let id = cell.subscribe_changes(move |_| *c.lock().unwrap() += 1);
    assert_eq!(cell.listener_count(), 1);
    cell.unsubscribe_changes(id);
    assert_eq!(cell.listener_count(), 0);
    cell.store(1.0);
    main_loop().pump();
    assert_eq!(*count.lock().unwrap(), 0);
  }

  #[test]
  fn listener_may_store_back_into_the_cell() {
    let _guard = main_guard();
    let cell = ValueCell::new(0.0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let c2 = cell.clone();
    cell.subscribe_changes(move |v| {
      s.lock().unwrap().push(v.clone());
      if *v == Value::Number(1.0) {
        c2.store(2.0);
      }
    });
    cell.store(1.0);
    main_loop().pump();
    assert_eq!(*seen.lock().unwrap(), vec![Value::Number(1.0)]);
    main_loop().pump();
    assert_eq!(
      *seen.lock().unwrap(),
      vec![Value::Number(1.0), Value::Number(2.0)]
    );
  }

  #[test]
  fn listener_may_unsubscribe_itself_mid_notification() {
    let _guard = main_guard();
    let cell = ValueCell::new(0.0);
    let count = Arc::new(Mutex::new(0));
    let id_slot: Arc<Mutex<Option<ListenerId>>> =
      Arc::new(Mutex::new(None));
    let c = count.clone();
    let c2 = cell.clone();
    let slot = id_slot.clone();
    let id = cell.subscribe_changes(move |_| {
      *c.lock().unwrap() += 1;
      if let Some(id) = slot.lock().unwrap().take() {
        c2.unsubscribe_changes(id);
      }
    });
    *id_slot.lock().unwrap() = Some(id);
    cell.store(1.0);
    main_loop().pump();
    assert_eq!(*count.lock().unwrap(), 1);
    cell.store(2.0);
    main_loop().pump();
    assert_eq!(*count.lock().unwrap(), 1);
  }

  #[test]
  fn dropping_the_cell_discards_the_pending_flush() {
    let _guard = main_guard();
    let count = Arc::new(Mutex::new(0));
    let cell = ValueCell::new(0.0);
    let c = count.clone();
    cell.subscribe_changes(move |_| *c.lock().unwrap() += 1);
    cell.store(1.0);
    drop(cell);
    main_loop().pump();
    assert_eq!(*count.lock().unwrap(), 0);
  }

  #[test]
  fn engine_refs_do_not_count_as_external_holders() {
    let cell = ValueCell::new(0.0);
    let bridge = EngineRef::new(&cell);
    assert!(bridge.is_externally_held());
    let second = bridge.clone();
    assert!(second.is_externally_held());
    drop(cell);
    assert!(!bridge.is_externally_held());
    drop(second);
    assert!(!bridge.is_externally_held());
  }

  #[test]
  fn cell_clones_count_as_external_holders() {
    let cell = ValueCell::new(0.0);
    let bridge = EngineRef::new(&cell);
    let clone = cell.clone();
    drop(cell);
    assert!(bridge.is_externally_held());
    drop(clone);
    assert!(!bridge.is_externally_held());
  }
}
