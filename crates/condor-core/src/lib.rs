//! Core types for the Condor record engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identities every other layer speaks in: data keys, record keys,
//! transition and slot indices, cache identifiers, validity intervals,
//! provenance descriptions, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod description;
pub mod error;
pub mod id;
pub mod interval;
pub mod key;

pub use description::{ComponentDescription, InputTag};
pub use error::{ConfigError, ProducerError, RegistryError, ResolveError};
pub use id::{CacheIdentifier, ProxyIndex, TokenIndex, TransitionId};
pub use interval::{SyncValue, ValidityInterval};
pub use key::{DataKey, RecordKey, TypeTag};
