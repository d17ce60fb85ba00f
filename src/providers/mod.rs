//! Search provider adapters
//!
//! Each adapter turns a query into a provider-native HTTP request and
//! normalizes the provider's reply into [`ProviderResults`](crate::results::ProviderResults).

pub mod brave;
pub mod duckduckgo;
mod registry;
pub mod serpapi;
pub mod serper;
mod traits;
pub mod wikipedia;

pub use registry::ProviderRegistry;
pub use traits::*;
