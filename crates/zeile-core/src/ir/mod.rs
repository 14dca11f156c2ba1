pub mod action;
pub mod story;

pub use action::{Position, PositionBase, StepAction};
pub use story::{Locale, Story};
