//! The [`Produce`] trait and its type-erased form.
//!
//! Producers are written against a concrete output type. The record keeps
//! heterogeneous producers in one arena, so each is stored behind
//! [`ErasedProduce`], which boxes the output as a `dyn Any`. The concrete
//! type is recovered at the caller through a typed token, never through
//! an unchecked cast.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use condor_core::{DataKey, ProducerError, RecordKey, ResolveError, TypeTag, ValidityInterval};

use crate::proxy::ErasedValue;

/// Read access to the other data of the record a producer belongs to.
///
/// Implemented by the record registry. Lookups are non-transient and
/// materialize the requested datum if it is not cached yet.
pub trait DataSource {
    /// Resolve `key`, or explain why it is unavailable.
    fn lookup(&self, key: &DataKey) -> Result<&(dyn Any + Send + Sync), ResolveError>;
}

/// What a producer is told about the request it is serving.
#[derive(Clone, Copy)]
pub struct ProduceContext<'a> {
    record: &'a RecordKey,
    key: &'a DataKey,
    interval: &'a ValidityInterval,
    source: Option<&'a dyn DataSource>,
}

impl<'a> ProduceContext<'a> {
    /// Build a context for materializing `key` in `record` over `interval`.
    /// The context has no [`DataSource`]; every [`get`](Self::get) fails
    /// with `NoProvider`.
    pub fn new(record: &'a RecordKey, key: &'a DataKey, interval: &'a ValidityInterval) -> Self {
        Self {
            record,
            key,
            interval,
            source: None,
        }
    }

    /// Attach the record the datum belongs to.
    pub fn with_source(mut self, source: &'a dyn DataSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Read another datum of the same record.
    ///
    /// An unavailable input becomes [`ProducerError::Dependency`], so a
    /// producer can forward it with `?`. A producer must not request its
    /// own datum, directly or through a cycle of producers.
    pub fn get<T: 'static>(&self, label: &str) -> Result<&'a T, ProducerError> {
        let key = DataKey::of::<T>(label);
        let Some(source) = self.source else {
            return Err(ResolveError::NoProvider {
                record: self.record.clone(),
                key,
            }
            .into());
        };
        source.lookup(&key)?.downcast_ref::<T>().ok_or_else(|| {
            ProducerError::failed(format!("{key} resolved to a value of another type"))
        })
    }

    /// Record kind the datum belongs to.
    pub fn record(&self) -> &'a RecordKey {
        self.record
    }

    /// Identity being materialized.
    pub fn key(&self) -> &'a DataKey {
        self.key
    }

    /// Interval the value will be cached for.
    pub fn interval(&self) -> &'a ValidityInterval {
        self.interval
    }
}

impl fmt::Debug for ProduceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProduceContext")
            .field("record", self.record)
            .field("key", self.key)
            .field("interval", self.interval)
            .field("attached", &self.source.is_some())
            .finish()
    }
}

/// Logic that computes one typed datum on demand.
///
/// # Contract
///
/// - `produce()` is called at most once per validity interval under
///   [`MaterializePolicy::Exclusive`](crate::MaterializePolicy::Exclusive),
///   possibly more under `Racing`. It must be safe to call concurrently
///   and its result must depend only on the context and the producer's
///   own immutable configuration.
/// - Inputs from the same record are read through
///   [`ProduceContext::get`]; a missing input is a
///   [`ProducerError::Dependency`].
/// - A returned error is cached for the rest of the interval.
///
/// # Examples
///
/// ```
/// use condor_core::{DataKey, ProducerError, RecordKey, ValidityInterval, SyncValue};
/// use condor_proxy::{Produce, ProduceContext};
///
/// struct Pedestal(f32);
///
/// impl Produce for Pedestal {
///     type Output = f32;
///     fn produce(&self, _ctx: &ProduceContext<'_>) -> Result<f32, ProducerError> {
///         Ok(self.0)
///     }
/// }
///
/// let record = RecordKey::new("CalibRecord");
/// let key = DataKey::unlabeled::<f32>();
/// let iov = ValidityInterval::open_ended(SyncValue(1));
/// let ctx = ProduceContext::new(&record, &key, &iov);
/// assert_eq!(Pedestal(2.5).produce(&ctx), Ok(2.5));
/// ```
pub trait Produce: Send + Sync + 'static {
    /// The datum type this producer makes.
    type Output: Send + Sync + 'static;

    /// Compute the datum.
    fn produce(&self, ctx: &ProduceContext<'_>) -> Result<Self::Output, ProducerError>;
}

/// Object-safe form of [`Produce`], implemented for every producer.
pub trait ErasedProduce: Send + Sync {
    /// Tag of the type `produce_erased` boxes.
    fn output_type(&self) -> TypeTag;

    /// Compute the datum and box it.
    fn produce_erased(&self, ctx: &ProduceContext<'_>) -> Result<ErasedValue, ProducerError>;
}

impl<P: Produce> ErasedProduce for P {
    fn output_type(&self) -> TypeTag {
        TypeTag::of::<P::Output>()
    }

    fn produce_erased(&self, ctx: &ProduceContext<'_>) -> Result<ErasedValue, ProducerError> {
        self.produce(ctx)
            .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
    }
}

/// A [`Produce`] implementation backed by a closure.
pub struct FnProducer<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> Produce for FnProducer<F, T>
where
    F: Fn(&ProduceContext<'_>) -> Result<T, ProducerError> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    type Output = T;

    fn produce(&self, ctx: &ProduceContext<'_>) -> Result<T, ProducerError> {
        (self.f)(ctx)
    }
}

/// Wrap a closure as a producer.
pub fn from_fn<T, F>(f: F) -> FnProducer<F, T>
where
    F: Fn(&ProduceContext<'_>) -> Result<T, ProducerError> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    FnProducer {
        f,
        _output: PhantomData,
    }
}
