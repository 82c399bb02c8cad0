//! Asynchronous lifetime watchers.
//!
//! A [`LifetimeWatcher`] ties a bridge between the engine and an external
//! resource to that resource's lifetime. The pool polls every watcher once
//! per tick on the main context and drops the expired ones there, so
//! teardown never runs on whatever thread happened to release the last
//! external reference.

use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::scheduler::{main_loop, MainLoop, TickerId};

/// An entry in the watcher pool.
///
/// `is_expired` is polled once per tick on the main context and must stay
/// cheap. Cleanup belongs in `Drop`; the pool guarantees the watcher is
/// dropped exactly once, during the sweep that sees it expired.
pub trait LifetimeWatcher: Send {
  fn is_expired(&self) -> bool;
}

static POOL: Lazy<LifetimeWatcherPool> =
  Lazy::new(|| LifetimeWatcherPool::new(main_loop()));

/// The process-wide pool.
pub fn watcher_pool() -> &'static LifetimeWatcherPool { &POOL }

pub struct LifetimeWatcherPool {
  main: &'static MainLoop,
  inner: Mutex<PoolInner>,
}

struct PoolInner {
  watchers: Vec<Box<dyn LifetimeWatcher>>,
  ticker: Option<TickerId>,
}

impl LifetimeWatcherPool {
  fn new(main: &'static MainLoop) -> Self {
    LifetimeWatcherPool {
      main,
      inner: Mutex::new(PoolInner { watchers: Vec::new(), ticker: None }),
    }
  }

  /// Hand a watcher to the pool. Callable from any thread; the pool lock
  /// serializes this against a sweep already running on the main context.
  ///
  /// The sweep ticker is registered lazily with the first watcher and
  /// deregistered again when the pool drains, so an idle pool costs the
  /// main loop nothing.
  pub fn add(&'static self, watcher: impl LifetimeWatcher + 'static) {
    let mut inner = self.inner.lock().unwrap();
    inner.watchers.push(Box::new(watcher));
    if inner.ticker.is_none() {
      inner.ticker = Some(self.main.add_ticker(move || self.sweep()));
      trace!("watcher pool sweep started");
    }
  }

  pub fn watcher_count(&self) -> usize {
    self.inner.lock().unwrap().watchers.len()
  }

  fn sweep(&self) {
    let mut inner = self.inner.lock().unwrap();
    let before = inner.watchers.len();
    inner.watchers.retain(|watcher| !watcher.is_expired());
    let reaped = before - inner.watchers.len();
    if reaped > 0 {
      trace!(reaped, remaining = inner.watchers.len(), "watchers reaped");
    }
    if inner.watchers.is_empty() {
      if let Some(ticker) = inner.ticker.take() {
        self.main.remove_ticker(ticker);
        trace!("watcher pool sweep stopped");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;

  struct TestWatcher {
    expired: Arc<AtomicBool>,
    drops: Arc<Mutex<u32>>,
  }

  impl LifetimeWatcher for TestWatcher {
    fn is_expired(&self) -> bool { self.expired.load(Ordering::Relaxed) }
  }

  impl Drop for TestWatcher {
    fn drop(&mut self) { *self.drops.lock().unwrap() += 1; }
  }

  fn leaked_pool() -> (&'static MainLoop, &'static LifetimeWatcherPool) {
    let main: &'static MainLoop = Box::leak(Box::new(MainLoop::new()));
    let pool = Box::leak(Box::new(LifetimeWatcherPool::new(main)));
    (main, pool)
  }

  #[test]
  fn live_watchers_survive_sweeps() {
    let (main, pool) = leaked_pool();
    let expired = Arc::new(AtomicBool::new(false));
    let drops = Arc::new(Mutex::new(0));
    pool.add(TestWatcher { expired, drops: drops.clone() });
    main.pump();
    main.pump();
    assert_eq!(pool.watcher_count(), 1);
    assert_eq!(*drops.lock().unwrap(), 0);
  }

  #[test]
  fn expired_watcher_reaped_on_next_sweep_exactly_once() {
    let (main, pool) = leaked_pool();
    let expired = Arc::new(AtomicBool::new(false));
    let drops = Arc::new(Mutex::new(0));
    pool.add(TestWatcher {
      expired: expired.clone(),
      drops: drops.clone(),
    });
    main.pump();
    assert_eq!(pool.watcher_count(), 1);
    expired.store(true, Ordering::Relaxed);
    // Expiry is only observed at the sweep, not at the flip itself.
    assert_eq!(pool.watcher_count(), 1);
    main.pump();
    assert_eq!(pool.watcher_count(), 0);
    assert_eq!(*drops.lock().unwrap(), 1);
    main.pump();
    assert_eq!(*drops.lock().unwrap(), 1);
  }

  #[test]
  fn sweep_ticker_registers_and_clears_with_the_pool() {
    let (main, pool) = leaked_pool();
    assert_eq!(main.ticker_count(), 0);
    let expired = Arc::new(AtomicBool::new(false));
    let drops = Arc::new(Mutex::new(0));
    pool.add(TestWatcher {
      expired: expired.clone(),
      drops: drops.clone(),
    });
    assert_eq!(main.ticker_count(), 1);
    expired.store(true, Ordering::Relaxed);
    main.pump();
    assert_eq!(main.ticker_count(), 0);
    // A fresh watcher restarts the sweep.
    pool.add(TestWatcher {
      expired: Arc::new(AtomicBool::new(false)),
      drops,
    });
    assert_eq!(main.ticker_count(), 1);
  }

  #[test]
  fn only_expired_watchers_are_removed() {
    let (main, pool) = leaked_pool();
    let drops = Arc::new(Mutex::new(0));
    let flags: Vec<_> =
      (0..3).map(|_| Arc::new(AtomicBool::new(false))).collect();
    for flag in &flags {
      pool.add(TestWatcher { expired: flag.clone(), drops: drops.clone() });
    }
    flags[1].store(true, Ordering::Relaxed);
    main.pump();
    assert_eq!(pool.watcher_count(), 2);
    assert_eq!(*drops.lock().unwrap(), 1);
  }
}
