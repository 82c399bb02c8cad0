//! Error types of the engine.
//!
//! Failures inside a running pipeline travel through the `error` channel of
//! the chain as a [`StreamError`]; they never unwind across the subscribe
//! boundary. Construction-time misuse ([`RangeError`]) and converter
//! failures ([`UnwrapError`]) are synchronous and surface at the call site.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// The terminal error of a stream.
///
/// Delivered at most once per subscription, after which the chain is torn
/// down. Cloning is cheap; the payload is shared, so a multicast source can
/// hand the same error to every subscriber.
#[derive(Clone)]
pub struct StreamError(Arc<Repr>);

struct Repr {
  message: String,
  source: Option<Box<dyn Error + Send + Sync>>,
}

impl StreamError {
  pub fn new(message: impl Into<String>) -> Self {
    StreamError(Arc::new(Repr { message: message.into(), source: None }))
  }

  pub fn with_source(
    message: impl Into<String>,
    source: impl Error + Send + Sync + 'static,
  ) -> Self {
    StreamError(Arc::new(Repr {
      message: message.into(),
      source: Some(Box::new(source)),
    }))
  }

  pub fn message(&self) -> &str { &self.0.message }
}

impl fmt::Display for StreamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.message)
  }
}

impl fmt::Debug for StreamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StreamError")
      .field("message", &self.0.message)
      .field("source", &self.0.source.as_ref().map(|e| e.to_string()))
      .finish()
  }
}

impl Error for StreamError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    self.0.source.as_deref().map(|e| e as _)
  }
}

impl From<&str> for StreamError {
  fn from(message: &str) -> Self { StreamError::new(message) }
}

impl From<String> for StreamError {
  fn from(message: String) -> Self { StreamError::new(message) }
}

impl From<UnwrapError> for StreamError {
  fn from(err: UnwrapError) -> Self {
    StreamError::with_source(err.to_string(), err)
  }
}

/// Rejected `range` construction.
///
/// The sequence must be strictly increasing, so `first > last` and
/// non-positive steps are refused before any stream exists.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeError {
  pub first: f64,
  pub last: f64,
  pub step: f64,
}

impl fmt::Display for RangeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.step <= 0.0 {
      write!(f, "range step must be positive, got {}", self.step)
    } else {
      write!(
        f,
        "range first must not exceed last, got first {} last {}",
        self.first, self.last
      )
    }
  }
}

impl Error for RangeError {}

/// Failed unboxing through the converter registry.
#[derive(Clone, Debug, PartialEq)]
pub enum UnwrapError {
  /// No codec has been registered for the requested type.
  NotRegistered { type_name: &'static str },
  /// The payload does not hold the requested type.
  Mismatch {
    type_name: &'static str,
    actual: &'static str,
  },
}

impl fmt::Display for UnwrapError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UnwrapError::NotRegistered { type_name } => {
        write!(f, "no converter registered for {type_name}")
      }
      UnwrapError::Mismatch { type_name, actual } => {
        write!(f, "value does not hold a {type_name}, found {actual}")
      }
    }
  }
}

impl Error for UnwrapError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stream_error_shares_payload() {
    let err = StreamError::new("boom");
    let cloned = err.clone();
    assert_eq!(err.message(), "boom");
    assert_eq!(cloned.to_string(), "boom");
  }

  #[test]
  fn stream_error_keeps_source() {
    let cause = UnwrapError::NotRegistered { type_name: "Widget" };
    let err = StreamError::from(cause);
    assert!(err.source().is_some());
    assert!(err.to_string().contains("Widget"));
  }

  #[test]
  fn range_error_display() {
    let err = RangeError { first: 10.0, last: 9.0, step: 1.0 };
    assert!(err.to_string().contains("first"));
    let err = RangeError { first: 0.0, last: 9.0, step: 0.0 };
    assert!(err.to_string().contains("step"));
  }
}
