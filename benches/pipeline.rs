use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bencher::{benchmark_group, benchmark_main, Bencher};
use freshet::prelude::*;

fn map_filter_chain(bench: &mut Bencher) {
  bench.iter(|| {
    observable::from_iter(0..256)
      .map(|item| Ok(Value::from(item.as_number().unwrap_or(0.0) * 2.0)))
      .filter(|item| Ok(item.as_number().unwrap_or(0.0) % 3.0 > 0.0))
      .collect_blocking()
      .unwrap()
      .len()
  });
}

fn scan_chain(bench: &mut Bencher) {
  bench.iter(|| {
    observable::from_iter(0..256)
      .scan(0, |acc, item| {
        let sum =
          acc.as_number().unwrap_or(0.0) + item.as_number().unwrap_or(0.0);
        Ok(Value::from(sum))
      })
      .collect_blocking()
      .unwrap()
      .len()
  });
}

fn subject_fan_out(bench: &mut Bencher) {
  bench.iter(|| {
    let subject = PublishSubject::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let mut bag = DisposeBag::new();
    for _ in 0..8 {
      let delivered = delivered.clone();
      bag.insert(subject.subscribe(move |_| {
        delivered.fetch_add(1, Ordering::Relaxed);
      }));
    }
    for n in 0..64 {
      subject.clone().next(Value::from(n));
    }
    delivered.load(Ordering::Relaxed)
  });
}

benchmark_group!(benches, map_filter_chain, scan_chain, subject_fan_out);
benchmark_main!(benches);
