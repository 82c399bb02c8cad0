//! # freshet: a push-based reactive stream engine
//!
//! Streams carry dynamically typed [`Value`] payloads through lazy
//! [`Observable`] pipelines. Nothing runs until a subscription activates
//! the chain, and every subscription gets fresh operator state.
//!
//! ## Quick start
//!
//! ```rust
//! use freshet::prelude::*;
//!
//! observable::from_iter(1..=6)
//!   .filter(|item| Ok(item.as_number().unwrap_or(0.0) % 2.0 == 0.0))
//!   .map(|item| Ok(Value::from(item.as_number().unwrap_or(0.0) * 10.0)))
//!   .subscribe(|item| println!("{item:?}"));
//! ```
//!
//! ## Key concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A lazy stream description; subscribing activates it |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Value`] | The dynamically typed payload every stream carries |
//! | [`Subscription`] | Handle that detaches the chain and cancels its work |
//! | [`PublishSubject`] / [`BehaviorSubject`] / [`ReplaySubject`] | Multicast bridges between imperative code and streams |
//! | [`Scheduler`] | Execution context for timed and re-dispatched work |
//!
//! Items flow as [`Value`]; arbitrary payload types ride along through the
//! [`convert`] registry. The main loop in [`scheduler::main_loop`] is the
//! engine's cooperative dispatch context and must be pumped by the host.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Value`]: value::Value
//! [`Subscription`]: subscription::Subscription
//! [`PublishSubject`]: subject::PublishSubject
//! [`BehaviorSubject`]: subject::BehaviorSubject
//! [`ReplaySubject`]: subject::ReplaySubject
//! [`Scheduler`]: scheduler::Scheduler

pub mod cell;
pub mod convert;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;
pub mod value;
pub mod watch;

mod test_support;

pub use prelude::*;

// Keeps the README's examples compiling.
#[cfg(doctest)]
mod readme_doctests {
  #![doc = include_str!("../README.md")]
}
