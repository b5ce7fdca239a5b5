use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Normalized contents of one secret: field name to string value
pub type SecretDocument = HashMap<String, String>;

/// KV secrets engine version, decides the literal request path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KvEngine {
    V1,
    #[default]
    V2,
}

impl KvEngine {
    pub fn from_version(version: u8) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}

/// Logical location of a secret inside a KV mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPath {
    pub mount: String,
    pub sub_path: String,
    pub engine: KvEngine,
}

impl SecretPath {
    pub fn new(mount: impl Into<String>, sub_path: impl Into<String>, engine: KvEngine) -> Self {
        Self {
            mount: mount.into(),
            sub_path: sub_path.into(),
            engine,
        }
    }

    pub fn kv1(mount: impl Into<String>, sub_path: impl Into<String>) -> Self {
        Self::new(mount, sub_path, KvEngine::V1)
    }

    pub fn kv2(mount: impl Into<String>, sub_path: impl Into<String>) -> Self {
        Self::new(mount, sub_path, KvEngine::V2)
    }

    /// Path below `/v1/` as sent to Vault
    pub fn resolve(&self) -> String {
        let mount = self.mount.trim_start_matches('/').trim_end_matches('/');
        let sub_path = self.sub_path.trim_start_matches('/');
        match self.engine {
            KvEngine::V1 => format!("{}/{}", mount, sub_path),
            KvEngine::V2 => format!("{}/data/{}", mount, sub_path),
        }
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resolve())
    }
}

/// Unwraps `{data: {data: {...}}}` (KV v2) or `{data: {...}}` (KV v1).
///
/// Any other shape yields an empty document; callers asking for a field then
/// get `FieldNotFound` rather than a parse error.
pub fn unwrap_envelope(body: Value) -> SecretDocument {
    let Value::Object(mut root) = body else {
        return SecretDocument::new();
    };
    let Some(Value::Object(mut data)) = root.remove("data") else {
        return SecretDocument::new();
    };

    let fields = match data.remove("data") {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            // v1 secret that happens to carry a non-object field named "data"
            data.insert("data".to_string(), other);
            data
        }
        None => data,
    };

    fields
        .into_iter()
        .map(|(key, value)| (key, value_to_string(value)))
        .collect()
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_paths() {
        let path = SecretPath::kv2("qa-automation/", "/DB_CREDS/PAPI_E");
        assert_eq!(path.resolve(), "qa-automation/data/DB_CREDS/PAPI_E");

        let path = SecretPath::kv1("secret", "db/oracle");
        assert_eq!(path.resolve(), "secret/db/oracle");
    }

    #[test]
    fn test_unwrap_kv2() {
        let doc = unwrap_envelope(json!({
            "data": {
                "data": {"username": "alice", "password": "p"},
                "metadata": {"version": 3}
            }
        }));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["username"], "alice");
        assert_eq!(doc["password"], "p");
    }

    #[test]
    fn test_unwrap_kv1() {
        let doc = unwrap_envelope(json!({"data": {"username": "bob"}}));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["username"], "bob");
    }

    #[test]
    fn test_unwrap_kv1_with_scalar_data_field() {
        let doc = unwrap_envelope(json!({"data": {"data": "raw", "user": "u"}}));
        assert_eq!(doc["data"], "raw");
        assert_eq!(doc["user"], "u");
    }

    #[test]
    fn test_unwrap_unknown_shape_is_empty() {
        assert!(unwrap_envelope(json!({"errors": []})).is_empty());
        assert!(unwrap_envelope(json!({"data": "nope"})).is_empty());
        assert!(unwrap_envelope(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_non_string_values_rendered() {
        let doc = unwrap_envelope(json!({
            "data": {"data": {"port": 1521, "tls": true, "note": null, "tags": ["a"]}}
        }));
        assert_eq!(doc["port"], "1521");
        assert_eq!(doc["tls"], "true");
        assert_eq!(doc["note"], "");
        assert_eq!(doc["tags"], r#"["a"]"#);
    }

    #[test]
    fn test_engine_from_version() {
        assert_eq!(KvEngine::from_version(1), Some(KvEngine::V1));
        assert_eq!(KvEngine::from_version(2), Some(KvEngine::V2));
        assert_eq!(KvEngine::from_version(3), None);
    }
}
