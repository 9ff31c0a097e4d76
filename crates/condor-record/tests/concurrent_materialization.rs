//! Integration test: many readers racing on the first access of an
//! interval.
//!
//! Readers share one `&RecordImpl` through scoped threads. Under the
//! exclusive policy the producer runs exactly once; under the racing
//! policy every reader still observes the same published value.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use condor_core::{RecordKey, TransitionId};
use condor_proxy::MaterializePolicy;
use condor_record::{RecordConfig, RecordImpl};
use condor_test_utils::{interval, provider, SlowProducer};

const READERS: usize = 16;
const T0: TransitionId = TransitionId(0);

fn record_with(policy: MaterializePolicy) -> (RecordImpl, Arc<AtomicUsize>) {
    let config = RecordConfig {
        materialize: policy,
        ..RecordConfig::default()
    };
    let mut rec = RecordImpl::with_config(RecordKey::new("R"), config).unwrap();
    let producer = SlowProducer::new(vec![1_u32, 2, 3], Duration::from_millis(20));
    let calls = producer.counter();
    rec.add_proxy("table", provider("Slow", "", producer)).unwrap();
    (rec, calls)
}

#[test]
fn exclusive_policy_materializes_once_under_contention() {
    let (mut rec, calls) = record_with(MaterializePolicy::Exclusive);
    let token = rec.consumes::<Vec<u32>>(T0, "table").unwrap();
    rec.set_validity_interval(interval(1, 100)).unwrap();

    let record = rec.record(T0).unwrap();
    let barrier = Barrier::new(READERS);
    let addresses: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let value = record.get(&token).get().unwrap();
                    assert_eq!(value, &vec![1, 2, 3]);
                    value as *const Vec<u32> as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn racing_policy_publishes_one_value() {
    let (mut rec, calls) = record_with(MaterializePolicy::Racing);
    let token = rec.consumes::<Vec<u32>>(T0, "table").unwrap();
    rec.set_validity_interval(interval(1, 100)).unwrap();

    let record = rec.record(T0).unwrap();
    let barrier = Barrier::new(READERS);
    let addresses: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let value = record.get(&token).get().unwrap();
                    value as *const Vec<u32> as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let n = calls.load(Ordering::SeqCst);
    assert!((1..=READERS).contains(&n), "calls = {n}");
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(rec.record(T0).unwrap().get(&token).get(), Ok(&vec![1, 2, 3]));
}

#[test]
fn every_interval_materializes_once() {
    let (mut rec, calls) = record_with(MaterializePolicy::Exclusive);
    let token = rec.consumes::<Vec<u32>>(T0, "table").unwrap();

    for round in 0..3_u64 {
        rec.set_validity_interval(interval(round * 10, round * 10 + 9))
            .unwrap();
        let record = rec.record(T0).unwrap();
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert!(record.get(&token).is_valid()));
            }
        });
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
