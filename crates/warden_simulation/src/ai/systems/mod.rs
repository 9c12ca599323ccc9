//! AI systems (decision layer)

pub mod tick;

// Re-export all systems
pub use tick::*;
