//! Reusable producer test fixtures.
//!
//! - [`ConstProducer`] returns a clone of a fixed value.
//! - [`CountingProducer`] returns a fixed value and counts its calls
//!   through a shared counter that outlives the provider.
//! - [`FailingProducer`] fails deterministically after N successful calls.
//! - [`SlowProducer`] sleeps before returning, to widen race windows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use condor_core::ProducerError;
use condor_proxy::{Produce, ProduceContext};

/// Returns a clone of `value` on every call.
pub struct ConstProducer<T> {
    pub value: T,
}

impl<T> ConstProducer<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + Send + Sync + 'static> Produce for ConstProducer<T> {
    type Output = T;

    fn produce(&self, _ctx: &ProduceContext<'_>) -> Result<T, ProducerError> {
        Ok(self.value.clone())
    }
}

/// Returns `value` and counts invocations.
///
/// The counter is an `Arc<AtomicUsize>` so a test can keep observing it
/// after the producer has been moved into a provider.
pub struct CountingProducer<T> {
    pub value: T,
    calls: Arc<AtomicUsize>,
}

impl<T> CountingProducer<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// How many times `produce()` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Clone + Send + Sync + 'static> Produce for CountingProducer<T> {
    type Output = T;

    fn produce(&self, _ctx: &ProduceContext<'_>) -> Result<T, ProducerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.clone())
    }
}

/// Fails deterministically after a configurable number of successful calls.
///
/// Successful calls return the zero-based call index.
pub struct FailingProducer {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingProducer {
    /// Create a producer that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// A producer that always fails.
    pub fn always() -> Self {
        Self::new(0)
    }

    /// How many times `produce()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Produce for FailingProducer {
    type Output = usize;

    fn produce(&self, _ctx: &ProduceContext<'_>) -> Result<usize, ProducerError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(ProducerError::failed(format!(
                "deliberate failure after {} successful calls",
                self.succeed_count
            )));
        }
        Ok(n)
    }
}

/// Sleeps for `delay`, then returns `value` and counts the call.
pub struct SlowProducer<T> {
    pub value: T,
    pub delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl<T> SlowProducer<T> {
    pub fn new(value: T, delay: Duration) -> Self {
        Self {
            value,
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl<T: Clone + Send + Sync + 'static> Produce for SlowProducer<T> {
    type Output = T;

    fn produce(&self, _ctx: &ProduceContext<'_>) -> Result<T, ProducerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        Ok(self.value.clone())
    }
}
