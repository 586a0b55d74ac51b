mod cancellable;
mod sleep_provider;

pub use cancellable::*;
pub use sleep_provider::*;
