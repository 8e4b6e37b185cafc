//! Session-scoped field catalog.
//!
//! Remote schemas differ by install and version, so a payload may only name
//! fields the model actually has. The catalog asks `fields_get` once per
//! model and answers presence questions for the rest of the session.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use erplink_core::{CallOptions, Fault, RemoteResult};

use crate::gateway::Gateway;

/// Attributes requested for every catalog entry.
pub const CATALOG_ATTRIBUTES: [&str; 6] =
    ["string", "help", "type", "selection", "required", "relation"];

/// Description of one field as the remote reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub label: Option<String>,
    pub field_type: Option<String>,
    pub help: Option<String>,
    pub required: bool,
    pub relation: Option<String>,
    /// `(value, label)` pairs of a selection field.
    pub selection: Vec<(String, String)>,
}

impl FieldInfo {
    pub fn from_value(name: &str, value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            name: name.to_string(),
            label: text("string"),
            field_type: text("type"),
            help: text("help"),
            required: value.get("required").and_then(Value::as_bool).unwrap_or(false),
            relation: text("relation"),
            selection: parse_selection(value.get("selection")),
        }
    }
}

/// Parse `[[value, label], ...]`. Anything else yields no options.
pub fn parse_selection(value: Option<&Value>) -> Vec<(String, String)> {
    value
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|option| {
                    let pair = option.as_array()?;
                    let key = pair.first()?.as_str()?.to_string();
                    let label = pair.get(1).and_then(Value::as_str).unwrap_or(&key).to_string();
                    Some((key, label))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The fields one model has in this remote install.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFields {
    model: String,
    fields: BTreeMap<String, FieldInfo>,
}

impl ModelFields {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldInfo> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Per-session cache of [`ModelFields`], keyed by model name.
#[derive(Debug, Default)]
pub struct FieldCatalog {
    models: RefCell<HashMap<String, Rc<ModelFields>>>,
}

impl FieldCatalog {
    /// Return the catalog entry for `model`, calling `fields_get` on first use.
    ///
    /// Faults are not cached; a later call asks the remote again.
    pub fn resolve<G: Gateway + ?Sized>(
        &self,
        gateway: &G,
        model: &str,
    ) -> RemoteResult<Rc<ModelFields>> {
        if let Some(cached) = self.models.borrow().get(model) {
            return Ok(cached.clone());
        }

        let options = CallOptions::new().attributes(CATALOG_ATTRIBUTES);
        let value = gateway.invoke(model, "fields_get", vec![], &options)?;
        let Value::Object(map) = value else {
            return Err(Fault::validation(format!("{model}.fields_get returned {value}")));
        };

        let fields = map
            .iter()
            .map(|(name, info)| (name.clone(), FieldInfo::from_value(name, info)))
            .collect::<BTreeMap<_, _>>();
        debug!(model, fields = fields.len(), "field catalog loaded");

        let entry = Rc::new(ModelFields {
            model: model.to_string(),
            fields,
        });
        self.models.borrow_mut().insert(model.to_string(), entry.clone());
        Ok(entry)
    }

    pub fn is_cached(&self, model: &str) -> bool {
        self.models.borrow().contains_key(model)
    }
}
