//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: здоровье, player marker, player bundle

pub mod actor;

// Re-exports для удобного импорта
pub use actor::*;
