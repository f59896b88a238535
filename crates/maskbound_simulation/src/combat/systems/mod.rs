//! Combat systems (ECS glue around ActionStateMachine)

pub mod effects;
pub mod hits;
pub mod intents;
pub mod masks;
pub mod movement;
pub mod publish;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod hits_tests;

// Re-export all systems
pub use effects::*;
pub use hits::*;
pub use intents::*;
pub use masks::*;
pub use movement::*;
pub use publish::*;
