//! AI components

pub mod agent;
pub mod brain;
pub mod patrol;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod brain_tests;

// Re-export all components
pub use agent::*;
pub use brain::*;
pub use patrol::*;
