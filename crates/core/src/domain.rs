//! Search domains: the filter language of remote `search`/`search_read`.
//!
//! A domain is a list of `[field, operator, value]` triples combined with an
//! implicit AND. Only the implicit-AND form is built here.

use serde_json::Value;

/// One `[field, operator, value]` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.field.clone()),
            Value::String(self.operator.clone()),
            self.value.clone(),
        ])
    }

    /// Parse a triple back out of its wire form.
    pub fn from_value(value: &Value) -> Option<Self> {
        let parts = value.as_array()?;
        if parts.len() != 3 {
            return None;
        }
        Some(Self {
            field: parts[0].as_str()?.to_string(),
            operator: parts[1].as_str()?.to_string(),
            value: parts[2].clone(),
        })
    }
}

/// Implicit-AND list of conditions. The empty domain matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchDomain {
    conditions: Vec<Condition>,
}

impl SearchDomain {
    /// Domain matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition::new(field, operator, value));
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, "=", value)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.conditions.iter().map(Condition::to_value).collect())
    }

    /// Parse a domain sent over the wire; `None` when it is not a list of triples.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let conditions = items
            .iter()
            .map(Condition::from_value)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { conditions })
    }
}

impl From<SearchDomain> for Value {
    fn from(domain: SearchDomain) -> Self {
        domain.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_wire_form() {
        let domain = SearchDomain::all()
            .eq("product_id", 4)
            .with("quantity", ">", 0);
        assert_eq!(
            domain.to_value(),
            json!([["product_id", "=", 4], ["quantity", ">", 0]])
        );
        assert_eq!(SearchDomain::all().to_value(), json!([]));
    }

    #[test]
    fn parses_back_and_rejects_malformed() {
        let wire = json!([["state", "in", ["sale", "done"]]]);
        let parsed = SearchDomain::from_value(&wire).unwrap();
        assert_eq!(parsed.conditions()[0].operator, "in");
        assert_eq!(parsed.to_value(), wire);

        assert!(SearchDomain::from_value(&json!([["only", "two"]])).is_none());
        assert!(SearchDomain::from_value(&json!("nope")).is_none());
    }
}
