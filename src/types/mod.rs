//! Public types for the relaygate API.

mod request;
mod result;

pub use request::GenerationRequest;
pub use result::{GenerationResult, Granularity, ProviderStats};
