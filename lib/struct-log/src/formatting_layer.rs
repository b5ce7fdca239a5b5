use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use time::format_description::well_known::Rfc3339;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::storage::SpanFieldsStorage;

const DATE: &str = "date";
const RUNTIME: &str = "runtime";
const APPLICATION: &str = "application";
const LEVEL: &str = "level";
const HOSTNAME: &str = "container_id";
const MESSAGE: &str = "message";
const LOGGER: &str = "logger";
const LINENO: &str = "lineno";
const FILE: &str = "file";
const VERSION: &str = "version";
const SPAN: &str = "span";

const RESERVED_FIELDS: [&str; 11] = [
    DATE,
    RUNTIME,
    APPLICATION,
    LEVEL,
    HOSTNAME,
    MESSAGE,
    LOGGER,
    LINENO,
    FILE,
    VERSION,
    SPAN,
];

pub const REDACTED: &str = "[REDACTED]";

/// Field names whose values never reach the output
pub const DEFAULT_SENSITIVE_FIELDS: [&str; 6] = [
    "password",
    "token",
    "secret",
    "secret_id",
    "client_token",
    "authorization",
];

/// Writes one JSON object per event, with the fields of the current span merged in.
pub struct JsonLogLayer<W: for<'a> MakeWriter<'a> + 'static> {
    make_writer: W,
    hostname: String,
    version: String,
    application: String,
    sensitive: Vec<String>,
}

impl<W: for<'a> MakeWriter<'a> + 'static> JsonLogLayer<W> {
    pub fn new(application: String, version: String, make_writer: W) -> Self {
        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        Self::with_hostname(application, version, hostname, make_writer)
    }

    pub fn with_hostname(
        application: String,
        version: String,
        hostname: String,
        make_writer: W,
    ) -> Self {
        Self {
            make_writer,
            application,
            version,
            hostname,
            sensitive: DEFAULT_SENSITIVE_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Adds field names to redact, matched case-insensitively
    pub fn redact<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive
            .extend(fields.into_iter().map(|f| f.into().to_lowercase()));
        self
    }

    /// `password`, `db_password` and `vault_token` are all sensitive when
    /// `password` and `token` are listed.
    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive.iter().any(|s| {
            key == *s
                || key
                    .strip_suffix(s.as_str())
                    .is_some_and(|prefix| prefix.ends_with('_'))
        })
    }

    fn serialize_field(
        &self,
        map_serializer: &mut impl SerializeMap<Error = serde_json::Error>,
        key: &str,
        value: &Value,
    ) -> Result<(), serde_json::Error> {
        if self.is_sensitive(key) {
            map_serializer.serialize_entry(key, REDACTED)
        } else {
            map_serializer.serialize_entry(key, value)
        }
    }

    fn serialize_core_fields(
        &self,
        map_serializer: &mut impl SerializeMap<Error = serde_json::Error>,
        message: &str,
        event: &Event,
    ) -> Result<(), serde_json::Error> {
        map_serializer.serialize_entry(RUNTIME, "rust")?;
        map_serializer.serialize_entry(APPLICATION, &self.application)?;
        map_serializer.serialize_entry(VERSION, &self.version)?;
        map_serializer.serialize_entry(HOSTNAME, &self.hostname)?;
        if let Ok(date) = &time::OffsetDateTime::now_utc().format(&Rfc3339) {
            map_serializer.serialize_entry(DATE, date)?;
        }
        map_serializer.serialize_entry(
            LEVEL,
            &event.metadata().level().to_string().to_lowercase(),
        )?;
        map_serializer.serialize_entry(LOGGER, event.metadata().target())?;
        map_serializer.serialize_entry(LINENO, &event.metadata().line())?;
        map_serializer.serialize_entry(FILE, &event.metadata().file())?;
        map_serializer.serialize_entry(MESSAGE, message)?;
        Ok(())
    }

    fn emit(&self, mut buffer: Vec<u8>) -> Result<(), std::io::Error> {
        buffer.write_all(b"\n")?;
        self.make_writer.make_writer().write_all(&buffer)
    }
}

impl<S, W> Layer<S> for JsonLogLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut event_fields = SpanFieldsStorage::default();
        event.record(&mut event_fields);
        let current_span = ctx.lookup_current();

        let format = || -> Result<Vec<u8>, serde_json::Error> {
            let mut buffer = Vec::new();
            let mut serializer = serde_json::Serializer::new(&mut buffer);
            let mut map_serializer = serializer.serialize_map(None)?;

            let message = event_message(event, event_fields.values());
            self.serialize_core_fields(&mut map_serializer, &message, event)?;

            for (key, value) in event_fields
                .values()
                .iter()
                .filter(|(key, _)| !RESERVED_FIELDS.contains(*key))
            {
                self.serialize_field(&mut map_serializer, key, value)?;
            }

            if let Some(span) = &current_span {
                map_serializer.serialize_entry(SPAN, span.name())?;
                let extensions = span.extensions();
                if let Some(storage) = extensions.get::<SpanFieldsStorage>() {
                    for (key, value) in storage.values() {
                        if !RESERVED_FIELDS.contains(key) && !event_fields.values().contains_key(key) {
                            self.serialize_field(&mut map_serializer, key, value)?;
                        }
                    }
                }
            }

            map_serializer.end()?;
            Ok(buffer)
        };

        if let Ok(formatted) = format() {
            let _ = self.emit(formatted);
        }
    }
}

// The "message" field, falling back to the event target.
fn event_message(event: &Event, fields: &HashMap<&'static str, Value>) -> String {
    match fields.get(MESSAGE) {
        Some(Value::String(s)) => s.clone(),
        _ => event.metadata().target().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> JsonLogLayer<fn() -> std::io::Sink> {
        JsonLogLayer::with_hostname(
            "app".to_string(),
            "1.0".to_string(),
            "host".to_string(),
            std::io::sink as fn() -> std::io::Sink,
        )
    }

    #[test]
    fn test_sensitive_field_matching() {
        let layer = layer();
        assert!(layer.is_sensitive("password"));
        assert!(layer.is_sensitive("DB_PASSWORD"));
        assert!(layer.is_sensitive("vault_token"));
        assert!(!layer.is_sensitive("user"));
        assert!(!layer.is_sensitive("tokens_issued"));
        assert!(!layer.is_sensitive("lease_secs"));
    }

    #[test]
    fn test_extra_sensitive_fields() {
        let layer = layer().redact(["Role_Id"]);
        assert!(layer.is_sensitive("role_id"));
        assert!(layer.is_sensitive("vault_role_id"));
    }
}
