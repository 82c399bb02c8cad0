//! One import for the usual working set.
//!
//! `use freshet::prelude::*;` brings in the observable surface, the
//! payload and error types, the subject family, the schedulers, and the
//! subscription handles.

pub use crate::cell::ValueCell;
pub use crate::convert;
pub use crate::error::{RangeError, StreamError, UnwrapError};
pub use crate::observable::{self, Observable, StreamEmitter};
pub use crate::observer::Observer;
pub use crate::scheduler::{
  self, main_loop, MainLoop, MainScheduler, ManualScheduler,
  NewThreadScheduler, Scheduler, TaskHandle, WorkerScheduler,
};
pub use crate::subject::{BehaviorSubject, PublishSubject, ReplaySubject};
pub use crate::subscription::{
  DisposeBag, Subscription, SubscriptionGuard, SubscriptionLike,
};
pub use crate::value::Value;
pub use crate::watch::{watcher_pool, LifetimeWatcher, LifetimeWatcherPool};
