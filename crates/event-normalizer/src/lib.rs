//! Event Normalizer
//!
//! Turns alarm notifications into transition events (+1 entering failure,
//! -1 recovering) and decides when nothing should be written.

mod error;
mod lookup;
mod normalizer;

pub use error::LookupError;
pub use lookup::{derive_resource_id, FallbackLookup, HistoryLookup, PriorStateLookup, StoreLookup};
pub use normalizer::{normalize, Normalizer, PriorBoundary, PriorSource};
