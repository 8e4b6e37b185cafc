//! Keyword options passed alongside positional arguments of a remote call.

use serde_json::{Map, Value};

/// Recognized keyword options of a remote method call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Restrict returned records to these fields.
    pub fields: Option<Vec<String>>,
    /// Maximum number of records.
    pub limit: Option<usize>,
    /// Field attributes requested from `fields_get`.
    pub attributes: Option<Vec<String>>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Wire form: the `kwargs` object of `execute_kw`.
    pub fn to_kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        if let Some(fields) = &self.fields {
            kwargs.insert("fields".into(), Value::from(fields.clone()));
        }
        if let Some(limit) = self.limit {
            kwargs.insert("limit".into(), Value::from(limit));
        }
        if let Some(attributes) = &self.attributes {
            kwargs.insert("attributes".into(), Value::from(attributes.clone()));
        }
        kwargs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_options_serialize_to_empty_object() {
        assert!(CallOptions::new().to_kwargs().is_empty());
    }

    #[test]
    fn set_options_appear_in_kwargs() {
        let kwargs = CallOptions::new().fields(["id", "name"]).limit(1).to_kwargs();
        assert_eq!(Value::Object(kwargs), json!({"fields": ["id", "name"], "limit": 1}));
    }

    #[test]
    fn every_recognized_key_is_sent() {
        let kwargs = CallOptions::new()
            .fields(["type"])
            .limit(5)
            .attributes(["string", "selection"])
            .to_kwargs();
        let mut keys: Vec<_> = kwargs.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["attributes", "fields", "limit"]);
        assert_eq!(kwargs["attributes"], json!(["string", "selection"]));
    }
}
