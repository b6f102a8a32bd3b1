//! Catalogue service access with on-disk fallback.

/// Response snapshots used when the service is unreachable.
pub mod cache;
/// HTTP client for the catalogue service.
pub mod client;

pub use cache::{CachedResponse, ResponseCache};
pub use client::{CatalogueClient, DEFAULT_API_URL};
