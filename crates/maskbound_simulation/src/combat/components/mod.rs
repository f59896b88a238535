//! Combat components

pub mod animation;
pub mod combo;
pub mod hit_volume;
pub mod locomotion;
pub mod lunge;
pub mod mask;
pub mod pickup;
pub mod state;


// Re-export all components
pub use animation::*;
pub use combo::*;
pub use hit_volume::*;
pub use locomotion::*;
pub use lunge::*;
pub use mask::*;
pub use pickup::*;
pub use state::*;
