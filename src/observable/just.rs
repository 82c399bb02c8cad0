use crate::observable::Observable;
use crate::observer::Observer;

/// Creates an observable that emits `value` once per subscription, then
/// completes. Emission is synchronous inside `subscribe`.
pub fn just(value: impl Into<crate::value::Value>) -> Observable {
  let value = value.into();
  Observable::source(move |mut subscriber| {
    subscriber.next(value.clone());
    subscriber.complete();
  })
}
