use std::sync::{Arc, Mutex};

use crate::error::StreamError;
use crate::observable::{Observable, Subscriber};
use crate::observer::Observer;
use crate::rc::MutArc;
use crate::subscription::Subscription;
use crate::value::Value;

/// Runs sources back to back: source k+1 is activated only after source k
/// completes.
///
/// An error from the running source terminates the chain; the sources
/// behind it are never activated. Completes after the last source does.
pub fn concat(sources: impl IntoIterator<Item = Observable>) -> Observable {
  let sources: Vec<Observable> = sources.into_iter().collect();
  Observable::joining(sources, |upstream, down| {
    let chain = down.subscription().clone();
    let slot = MutArc::own(Some(down));
    let queue = Arc::new(Mutex::new(Queue {
      sources: upstream.to_vec(),
      index: 0,
    }));
    advance(&slot, &queue, &chain);
  })
}

impl Observable {
  /// Appends `other` after this stream completes. See [`concat`].
  pub fn concat_with(&self, other: &Observable) -> Observable {
    concat([self.clone(), other.clone()])
  }
}

struct Queue {
  sources: Vec<Observable>,
  index: usize,
}

/// Activate the next queued source, outside the queue lock. Out of
/// sources means the whole concat is done.
fn advance(
  slot: &MutArc<Option<Subscriber>>,
  queue: &Arc<Mutex<Queue>>,
  chain: &Subscription,
) {
  let next = {
    let mut queue = queue.lock().unwrap();
    let source = queue.sources.get(queue.index).cloned();
    queue.index += 1;
    source
  };
  match next {
    Some(source) => {
      let leg = Subscription::new();
      chain.add(leg.clone());
      let observer = ConcatLeg {
        slot: slot.clone(),
        queue: queue.clone(),
        chain: chain.clone(),
      };
      source.activate(Subscriber::new(Box::new(observer), leg));
    }
    None => slot.clone().complete(),
  }
}

struct ConcatLeg {
  slot: MutArc<Option<Subscriber>>,
  queue: Arc<Mutex<Queue>>,
  chain: Subscription,
}

impl Observer for ConcatLeg {
  fn next(&mut self, value: Value) { self.slot.next(value) }

  fn error(&mut self, err: StreamError) { self.slot.error(err) }

  fn complete(&mut self) { advance(&self.slot, &self.queue, &self.chain) }

  fn is_closed(&self) -> bool { self.slot.is_closed() }
}
