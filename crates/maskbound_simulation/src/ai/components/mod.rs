//! AI components

pub mod brain;


// Re-export all components
pub use brain::*;
