use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Verified claim set of a bearer token, kept exactly as the issuer signed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenPayload(Map<String, Value>);

impl TokenPayload {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.get("exp")?.as_i64()?;
        Utc.timestamp_opt(exp, 0).single()
    }

    /// Capability strings carried by the `permissions` claim, `None` when the claim is absent.
    ///
    /// Arrays contribute their string elements; a plain string is read as a space-delimited list.
    pub fn permissions(&self) -> Option<Vec<&str>> {
        let claim = self.get("permissions")?;
        let values = match claim {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            Value::String(raw) => raw.split_whitespace().collect(),
            _ => Vec::new(),
        };
        Some(values)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions()
            .map(|granted| granted.iter().any(|value| *value == permission))
            .unwrap_or(false)
    }
}
