//! AI systems

pub mod brain;

// Re-export all systems
pub use brain::*;
