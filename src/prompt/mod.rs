//! Prompt construction from structured writing parameters

mod formatter;
mod style;

pub use formatter::*;
pub use style::*;
