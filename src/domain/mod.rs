//! Domain - plain data shared across services

mod navigation;
mod selection;

pub use navigation::*;
pub use selection::*;
