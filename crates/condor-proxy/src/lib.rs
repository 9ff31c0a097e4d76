//! Lazily materialized data providers for the Condor record engine.
//!
//! A [`DataProxy`] is one slot in a record's provider arena. It owns the
//! producer logic for exactly one typed datum and at most one cached
//! outcome (value or failure) for the current validity interval.
//!
//! # Architecture
//!
//! ```text
//! DataProxy
//! ├── ComponentDescription (provenance, Arc-shared with handles' errors)
//! ├── Box<dyn ErasedProduce> (typed Produce impl behind a type-erased seam)
//! └── OnceLock<Materialized> (publish-once cell, cleared only via &mut)
//! ```
//!
//! # Publication
//!
//! The cached outcome is published at most once per interval. Under
//! [`MaterializePolicy::Exclusive`] the first claimant runs the producer
//! and concurrent readers of the same slot observe its result. Under
//! [`MaterializePolicy::Racing`] every reader that finds the slot empty
//! computes, the first to publish wins, and losers drop their result.
//! Either way no reader observes a partially built value.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod policy;
pub mod producer;
pub mod proxy;

pub use policy::MaterializePolicy;
pub use producer::{from_fn, DataSource, ErasedProduce, FnProducer, Produce, ProduceContext};
pub use proxy::{DataProxy, ErasedValue};
