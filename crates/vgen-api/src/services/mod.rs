//! Business logic services.

pub mod generation;

pub use generation::{GenerationError, GenerationJob};
