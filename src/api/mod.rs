//! Wire types: provider request payloads, relay envelopes, and the
//! writing/polish request and response shapes

mod relay;
mod wire;
mod writing;

pub use relay::*;
pub use wire::*;
pub use writing::*;
