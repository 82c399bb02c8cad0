use crate::observable::Observable;
use crate::observer::Observer;
use crate::value::Value;

/// Creates an observable that emits the elements of `iter` in order,
/// synchronously, then completes.
///
/// The collection is cloned per subscription, so every subscriber sees the
/// full sequence. Emission stops early once the chain is closed (a `take`
/// further down, or disposal from a callback).
pub fn from_iter<I>(iter: I) -> Observable
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::Item: Into<Value>,
{
  Observable::source(move |mut subscriber| {
    for item in iter.clone() {
      if subscriber.is_closed() {
        return;
      }
      subscriber.next(item.into());
    }
    subscriber.complete();
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};

  #[test]
  fn emits_in_order_then_completes() {
    let values = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(Mutex::new(false));
    let (v, c) = (values.clone(), completed.clone());
    from_iter(vec![1, 2, 3]).subscribe_complete(
      move |value| v.lock().unwrap().push(value),
      move || *c.lock().unwrap() = true,
    );
    assert_eq!(
      *values.lock().unwrap(),
      vec![Value::from(1), Value::from(2), Value::from(3)]
    );
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn empty_collection_just_completes() {
    let completed = Arc::new(Mutex::new(false));
    let c = completed.clone();
    from_iter(Vec::<i32>::new())
      .subscribe_complete(|_| {}, move || *c.lock().unwrap() = true);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn mixed_payloads() {
    let values = Arc::new(Mutex::new(Vec::new()));
    let v = values.clone();
    from_iter(["a", "b"]).subscribe(move |value| v.lock().unwrap().push(value));
    assert_eq!(
      *values.lock().unwrap(),
      vec![Value::from("a"), Value::from("b")]
    );
  }
}
