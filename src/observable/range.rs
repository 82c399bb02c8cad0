use crate::error::RangeError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::value::Value;

/// Creates an observable emitting `first, first + step, …` strictly
/// increasing, with `last` forced as the final item when the steps do not
/// land on it exactly.
///
/// `range(a, a, step)` emits exactly `[a]`. Invalid input (`first > last`
/// or a non-positive `step`) is rejected here, before any stream exists.
pub fn range(
  first: f64,
  last: f64,
  step: f64,
) -> Result<Observable, RangeError> {
  if step <= 0.0 || first > last {
    return Err(RangeError { first, last, step });
  }
  Ok(Observable::source(move |mut subscriber| {
    let mut current = first;
    while current < last {
      if subscriber.is_closed() {
        return;
      }
      subscriber.next(Value::Number(current));
      current += step;
    }
    subscriber.next(Value::Number(last));
    subscriber.complete();
  }))
}
