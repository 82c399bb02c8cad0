use crate::observable::Observable;
use crate::observer::Observer;
use crate::value::Value;

impl Observable {
  /// Emits `prefix` in order before anything from the source.
  pub fn start_with(
    &self,
    prefix: impl IntoIterator<Item = impl Into<Value>>,
  ) -> Observable {
    let prefix: Vec<Value> =
      prefix.into_iter().map(Into::into).collect();
    Observable::stage(self.clone(), move |upstream, mut down| {
      for value in &prefix {
        if down.is_closed() {
          return;
        }
        down.next(value.clone());
      }
      if !down.is_closed() {
        upstream.activate(down);
      }
    })
  }
}
