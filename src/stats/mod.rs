//! Relay metrics and their log formatting

mod collector;
mod formatter;

pub use collector::*;
pub use formatter::*;
