/// The book itself
///
/// This module handles:
/// - The spring integrator shared by page and cover (spring.rs)
/// - Physical dimensions and stack heights (layout.rs)
/// - The Idle / Turning state machine (animator.rs)
/// - Bending the turning sheet every frame (surface.rs)
/// - Mapping keys, wheel and pointer to intents (input.rs)
/// - Tying it all together per frame (controller.rs)

pub mod animator;
pub mod controller;
pub mod input;
pub mod layout;
pub mod spring;
pub mod surface;

pub use animator::Direction;
pub use controller::Book;
pub use input::{InputAdapter, Intent};
