//! Relay of generation and model-list calls to upstream providers

mod decompress;
mod forward;
mod models;
mod redact;

pub use decompress::{decompress_body, DecompressError};
pub use forward::{RelayError, RelayOptions, RelayService, TransportFailure};
pub use models::{normalize_model_list, tags_url, ModelListError, ModelLister, MODEL_LIST_TIMEOUT};
pub use redact::{redact, redact_headers, truncate_for_log, REDACTED};
