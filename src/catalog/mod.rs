//! The product catalog, subject of the observer pattern.
//!
//! Subscribers are kept both by name and in registration order. Publishing
//! walks the registration order and hands the payload to every subscriber
//! whose flag is set; the rest are skipped, with no queueing or retry.

mod manager;

pub use manager::{Catalog, CatalogConfig, DuplicatePolicy};
