//! Remote identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Fault;

/// Identifier assigned by the remote system to a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(i64);

impl RemoteId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Read an id out of a remote value (`create` results, `id` fields).
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().filter(|id| *id > 0).map(Self)
    }
}

impl core::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for RemoteId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<RemoteId> for i64 {
    fn from(value: RemoteId) -> Self {
        value.0
    }
}

impl From<RemoteId> for Value {
    fn from(value: RemoteId) -> Self {
        Value::from(value.0)
    }
}

impl FromStr for RemoteId {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| Fault::validation(format!("RemoteId: {e}")))?;
        Ok(Self(id))
    }
}

/// Reference to another record as the remote returns it: `[id, "display name"]`.
///
/// An unset reference comes back as `false`, which maps to `None` in
/// [`Many2One::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Many2One {
    pub id: RemoteId,
    pub name: String,
}

impl Many2One {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(pair) => {
                let id = pair.first().and_then(RemoteId::from_value)?;
                let name = pair
                    .get(1)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(Self { id, name })
            }
            // Some remotes answer with a bare id when the display name is not requested.
            Value::Number(_) => RemoteId::from_value(value).map(|id| Self {
                id,
                name: String::new(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn many2one_parses_pair_and_false() {
        let m = Many2One::from_value(&json!([12, "WH/Stock"])).unwrap();
        assert_eq!(m.id, RemoteId::new(12));
        assert_eq!(m.name, "WH/Stock");

        assert!(Many2One::from_value(&json!(false)).is_none());
        assert_eq!(
            Many2One::from_value(&json!(7)).map(|m| m.id),
            Some(RemoteId::new(7))
        );
    }

    #[test]
    fn remote_id_rejects_non_positive_values() {
        assert!(RemoteId::from_value(&json!(0)).is_none());
        assert!(RemoteId::from_value(&json!(false)).is_none());
        assert_eq!(RemoteId::from_value(&json!(3)), Some(RemoteId::new(3)));
        assert!("abc".parse::<RemoteId>().is_err());
    }
}
