pub mod backend;
pub mod frontend;

pub use backend::Backend;
pub use frontend::{Frontend, FrontendInput, FrontendOutput};
