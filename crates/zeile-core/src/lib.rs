pub mod diagnostic;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod project;
