//! Record registry, typed tokens and handles for the Condor record engine.
//!
//! A [`RecordImpl`] owns every provider for one record kind, the
//! per-transition indirection tables, and the current validity interval.
//! Consumers mint [`Token`]s at setup time, bind a [`Record`] view per
//! transition once the interval is set, and request data through it.
//! Every request returns a [`Handle`]: a borrowed value plus provenance,
//! or a deferred failure that is only built if dereferenced.
//!
//! # Threading
//!
//! Setup and interval changes need `&mut RecordImpl`. Requests need only
//! `&RecordImpl`, so any number of reader threads can share one record
//! (see `std::thread::scope`). Values are materialized at most once per
//! interval; [`RecordConfig::materialize`] chooses how concurrent first
//! accesses coordinate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod deferred;
pub mod handle;
pub mod indices;
pub mod record;
pub mod record_impl;
pub mod token;

pub use config::RecordConfig;
pub use deferred::DeferredError;
pub use handle::Handle;
pub use indices::{IndirectionTable, SlotLookup};
pub use record::Record;
pub use record_impl::{RecordImpl, RecordState, Resolution};
pub use token::Token;
