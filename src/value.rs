//! The uniform payload type carried by every stream.
//!
//! Pipelines are assembled at runtime, so items are not generic over a
//! static element type; every notification carries a [`Value`]. Typed data
//! crosses the boundary through the converter registry in
//! [`crate::convert`], which boxes arbitrary `T`s into [`Value::Handle`]
//! and unboxes them back.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, reference-counted payload for values that have no structural
/// representation.
///
/// Handles compare by pointer identity, not by content: two handles are
/// equal only when they share the same allocation. Cloning a handle clones
/// the `Arc`, never the payload.
#[derive(Clone)]
pub struct Handle(pub(crate) Arc<dyn Any + Send + Sync>);

impl Handle {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self { Handle(Arc::new(value)) }

  /// Borrow the payload as a `T`, if that is what the handle holds.
  pub fn downcast_ref<T: Any>(&self) -> Option<&T> { self.0.downcast_ref() }

  pub fn is<T: Any>(&self) -> bool { self.0.is::<T>() }
}

impl PartialEq for Handle {
  fn eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl fmt::Debug for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Handle({:p})", Arc::as_ptr(&self.0))
  }
}

/// The closed union of payload shapes a stream can carry.
///
/// Structural variants (`Bool`, `Number`, `String`, `List`) compare by
/// content; `Handle` compares by identity. `Number` is always `f64`, the
/// single numeric representation of the engine; integer sources convert
/// on the way in.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  /// The unit payload. Streams of pure events carry `Void`.
  Void,
  Bool(bool),
  Number(f64),
  String(String),
  List(Vec<Value>),
  /// An opaque boxed payload, produced by the converter registry.
  Handle(Handle),
}

impl Value {
  pub fn is_void(&self) -> bool { matches!(self, Value::Void) }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_handle(&self) -> Option<&Handle> {
    match self {
      Value::Handle(h) => Some(h),
      _ => None,
    }
  }

  /// A short tag naming the variant, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Value::Void => "void",
      Value::Bool(_) => "bool",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::List(_) => "list",
      Value::Handle(_) => "handle",
    }
  }
}

impl Default for Value {
  fn default() -> Self { Value::Void }
}

impl From<()> for Value {
  fn from(_: ()) -> Self { Value::Void }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self { Value::Number(n) }
}

impl From<f32> for Value {
  fn from(n: f32) -> Self { Value::Number(n as f64) }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self { Value::Number(n as f64) }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self { Value::Number(n as f64) }
}

impl From<u32> for Value {
  fn from(n: u32) -> Self { Value::Number(n as f64) }
}

impl From<usize> for Value {
  fn from(n: usize) -> Self { Value::Number(n as f64) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::String(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::String(s) }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self { Value::List(items) }
}

impl From<Handle> for Value {
  fn from(h: Handle) -> Self { Value::Handle(h) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn structural_equality() {
    assert_eq!(Value::from(2), Value::Number(2.0));
    assert_eq!(Value::from("abc"), Value::String("abc".to_owned()));
    assert_eq!(
      Value::List(vec![Value::from(1), Value::from(true)]),
      Value::List(vec![Value::Number(1.0), Value::Bool(true)])
    );
    assert_ne!(Value::from(1), Value::from(2));
    assert_ne!(Value::Void, Value::Bool(false));
  }

  #[test]
  fn handle_identity_equality() {
    let h = Handle::new(String::from("payload"));
    let same = Value::Handle(h.clone());
    let also_same = Value::Handle(h);
    // Same allocation compares equal, a fresh allocation of equal content
    // does not.
    assert_eq!(same, also_same);
    let other = Value::Handle(Handle::new(String::from("payload")));
    assert_ne!(same, other);
  }

  #[test]
  fn handle_downcast() {
    let h = Handle::new(42_u8);
    assert!(h.is::<u8>());
    assert_eq!(h.downcast_ref::<u8>(), Some(&42));
    assert_eq!(h.downcast_ref::<u16>(), None);
  }

  #[test]
  fn accessors() {
    assert_eq!(Value::from(3.5).as_number(), Some(3.5));
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    assert!(Value::Void.is_void());
    assert_eq!(Value::from("x").as_number(), None);
    assert_eq!(Value::from(1).kind(), "number");
  }
}
