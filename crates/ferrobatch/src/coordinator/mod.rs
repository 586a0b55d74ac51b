mod batcher;
mod builder;
mod state;
mod submission;

pub use batcher::*;
pub use builder::*;
pub use submission::*;
