//! Type-indexed converter registry.
//!
//! All boxing in and out of [`Value`] goes through here, explicitly. A
//! codec for a `T` is a pair of plain function pointers resolved when the
//! type is registered; lookups afterwards are a `TypeId` map hit, with no
//! reflection at emission time.
//!
//! Structural types (`bool`, `f64`, `i64`, `String`, `Vec<Value>`, `()`)
//! and [`Observable`] are pre-registered. Everything else opts in through
//! [`register`], which stores the value behind an opaque [`Value::Handle`].
//! Unboxing a handle clones the payload, so non-`Clone` types should be
//! registered as `Arc<T>`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::error::UnwrapError;
use crate::observable::Observable;
use crate::value::{Handle, Value};

type ErasedBox = Box<dyn Any + Send + Sync>;

#[derive(Clone, Copy)]
struct Codec {
  encode: fn(ErasedBox) -> Result<Value, UnwrapError>,
  decode: fn(&Value) -> Result<ErasedBox, UnwrapError>,
}

static REGISTRY: Lazy<RwLock<HashMap<TypeId, Codec>>> =
  Lazy::new(|| RwLock::new(builtins()));

/// Register a handle codec for `T`.
///
/// Idempotent; registering a type twice keeps the latest codec, which is
/// behaviorally identical. May be called from any thread.
pub fn register<T: Any + Clone + Send + Sync>() {
  REGISTRY
    .write()
    .unwrap()
    .insert(TypeId::of::<T>(), handle_codec::<T>());
}

pub fn is_registered<T: Any>() -> bool {
  REGISTRY.read().unwrap().contains_key(&TypeId::of::<T>())
}

/// Box a `T` into a [`Value`] through its registered codec.
pub fn to_value<T: Any + Send + Sync>(value: T) -> Result<Value, UnwrapError> {
  let codec = lookup::<T>()?;
  (codec.encode)(Box::new(value))
}

/// Unbox a `T` from a [`Value`] through its registered codec.
pub fn from_value<T: Any>(value: &Value) -> Result<T, UnwrapError> {
  let codec = lookup::<T>()?;
  let boxed = (codec.decode)(value)?;
  boxed.downcast::<T>().map(|b| *b).map_err(|_| mismatch::<T>(value))
}

fn lookup<T: Any>() -> Result<Codec, UnwrapError> {
  REGISTRY
    .read()
    .unwrap()
    .get(&TypeId::of::<T>())
    .copied()
    .ok_or(UnwrapError::NotRegistered { type_name: type_name::<T>() })
}

fn mismatch<T: Any>(value: &Value) -> UnwrapError {
  UnwrapError::Mismatch { type_name: type_name::<T>(), actual: value.kind() }
}

fn handle_codec<T: Any + Clone + Send + Sync>() -> Codec {
  Codec { encode: encode_handle::<T>, decode: decode_handle::<T> }
}

fn encode_handle<T: Any + Send + Sync>(
  boxed: ErasedBox,
) -> Result<Value, UnwrapError> {
  match boxed.downcast::<T>() {
    Ok(t) => {
      let arc: Arc<T> = Arc::from(t);
      Ok(Value::Handle(Handle(arc)))
    }
    Err(_) => Err(UnwrapError::Mismatch {
      type_name: type_name::<T>(),
      actual: "opaque",
    }),
  }
}

fn decode_handle<T: Any + Clone + Send + Sync>(
  value: &Value,
) -> Result<ErasedBox, UnwrapError> {
  value
    .as_handle()
    .and_then(|h| h.downcast_ref::<T>())
    .map(|t| Box::new(t.clone()) as ErasedBox)
    .ok_or_else(|| mismatch::<T>(value))
}

// Structural codecs go through the plain `From`/accessor surface of
// `Value` instead of a handle allocation.
macro_rules! structural_codec {
  ($encode:ident, $decode:ident, $ty:ty, |$v:ident| $enc:expr, |$val:ident| $dec:expr) => {
    fn $encode(boxed: ErasedBox) -> Result<Value, UnwrapError> {
      match boxed.downcast::<$ty>() {
        Ok(b) => {
          let $v = *b;
          Ok($enc)
        }
        Err(_) => Err(UnwrapError::Mismatch {
          type_name: type_name::<$ty>(),
          actual: "opaque",
        }),
      }
    }

    fn $decode($val: &Value) -> Result<ErasedBox, UnwrapError> {
      $dec.map(|t: $ty| Box::new(t) as ErasedBox).ok_or_else(|| mismatch::<$ty>($val))
    }
  };
}

structural_codec!(encode_unit, decode_unit, (), |v| {
  let _ = v;
  Value::Void
}, |val| val.is_void().then_some(()));
structural_codec!(encode_bool, decode_bool, bool, |v| Value::Bool(v), |val| {
  val.as_bool()
});
structural_codec!(encode_f64, decode_f64, f64, |v| Value::Number(v), |val| {
  val.as_number()
});
// Numbers are stored as f64; the i64 codec truncates on unbox.
structural_codec!(encode_i64, decode_i64, i64, |v| Value::Number(v as f64), |val| {
  val.as_number().map(|n| n as i64)
});
structural_codec!(encode_string, decode_string, String, |v| Value::String(v), |val| {
  val.as_str().map(str::to_owned)
});
structural_codec!(encode_list, decode_list, Vec<Value>, |v| Value::List(v), |val| {
  val.as_list().map(<[Value]>::to_vec)
});
structural_codec!(encode_value, decode_value, Value, |v| v, |val| {
  Some(val.clone())
});

fn builtins() -> HashMap<TypeId, Codec> {
  let mut map = HashMap::new();
  map.insert(
    TypeId::of::<()>(),
    Codec { encode: encode_unit, decode: decode_unit },
  );
  map.insert(
    TypeId::of::<bool>(),
    Codec { encode: encode_bool, decode: decode_bool },
  );
  map.insert(
    TypeId::of::<f64>(),
    Codec { encode: encode_f64, decode: decode_f64 },
  );
  map.insert(
    TypeId::of::<i64>(),
    Codec { encode: encode_i64, decode: decode_i64 },
  );
  map.insert(
    TypeId::of::<String>(),
    Codec { encode: encode_string, decode: decode_string },
  );
  map.insert(
    TypeId::of::<Vec<Value>>(),
    Codec { encode: encode_list, decode: decode_list },
  );
  map.insert(
    TypeId::of::<Value>(),
    Codec { encode: encode_value, decode: decode_value },
  );
  map.insert(TypeId::of::<Observable>(), handle_codec::<Observable>());
  map
}
