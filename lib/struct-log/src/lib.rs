//! Structured logging setup: human-readable output by default, one JSON
//! object per event when `JSON_LOG=true`, with sensitive fields redacted.

mod builder;
mod error;
mod formatting_layer;
mod storage;

pub use builder::StructLogBuilder;
pub use error::SetupError;
pub use formatting_layer::{JsonLogLayer, DEFAULT_SENSITIVE_FIELDS, REDACTED};
pub use storage::{SpanFieldsStorage, StorageLayer};
