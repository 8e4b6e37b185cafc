//! In-memory ERP implementing [`Gateway`].
//!
//! Models are declared with [`ModelSpec`]; records live in memory. The
//! generic methods (`search`, `search_read`, `search_count`, `read`,
//! `create`, `write`, `fields_get`) are built in, anything else must be
//! registered with [`InMemoryErp::on`]. Unknown models and methods fail the
//! way a real install does ([`Fault::CapabilityAbsent`]), unknown fields fail
//! with [`Fault::RemoteValidation`]. Every call is recorded for assertions.
//!
//! Intended for tests and local experiments, not for production use.

mod fixture;

pub use fixture::standard_install;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::{Map, Value};

use erplink_core::{CallOptions, Condition, Fault, RemoteId, RemoteResult, SearchDomain};

use crate::gateway::Gateway;

/// Custom method implementation.
pub type MethodHandler = Rc<dyn Fn(&mut ErpState, &[Value]) -> RemoteResult<Value>>;

/// One call as the gateway received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub options: CallOptions,
}

/// Field types understood by the in-memory schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Char,
    Integer,
    Float,
    Boolean,
    Datetime,
    Selection(Vec<(String, String)>),
    Many2One(String),
    /// Stored and read back as a list of ids.
    Many2Many(String),
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Char => "char",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Datetime => "datetime",
            FieldKind::Selection(_) => "selection",
            FieldKind::Many2One(_) => "many2one",
            FieldKind::Many2Many(_) => "many2many",
        }
    }

    fn default_value(&self) -> Value {
        match self {
            FieldKind::Integer => Value::from(0),
            FieldKind::Float => Value::from(0.0),
            FieldKind::Many2Many(_) => Value::Array(Vec::new()),
            _ => Value::Bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSpec {
    kind: FieldKind,
    label: String,
    help: Option<String>,
    required: bool,
}

/// Declarative schema of one in-memory model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    name: String,
    fields: BTreeMap<String, FieldSpec>,
    sequences: BTreeMap<String, String>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            sequences: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        let label = name
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.fields.insert(
            name.to_string(),
            FieldSpec {
                kind,
                label,
                help: None,
                required: false,
            },
        );
        self
    }

    pub fn char(self, name: &str) -> Self {
        self.field(name, FieldKind::Char)
    }

    pub fn integer(self, name: &str) -> Self {
        self.field(name, FieldKind::Integer)
    }

    pub fn float(self, name: &str) -> Self {
        self.field(name, FieldKind::Float)
    }

    pub fn boolean(self, name: &str) -> Self {
        self.field(name, FieldKind::Boolean)
    }

    pub fn datetime(self, name: &str) -> Self {
        self.field(name, FieldKind::Datetime)
    }

    pub fn selection(self, name: &str, options: &[(&str, &str)]) -> Self {
        let options = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.field(name, FieldKind::Selection(options))
    }

    pub fn many2one(self, name: &str, relation: &str) -> Self {
        self.field(name, FieldKind::Many2One(relation.to_string()))
    }

    pub fn many2many(self, name: &str, relation: &str) -> Self {
        self.field(name, FieldKind::Many2Many(relation.to_string()))
    }

    /// Mark an already declared field as required on `create`.
    pub fn required(mut self, name: &str) -> Self {
        if let Some(spec) = self.fields.get_mut(name) {
            spec.required = true;
        }
        self
    }

    pub fn help(mut self, name: &str, text: &str) -> Self {
        if let Some(spec) = self.fields.get_mut(name) {
            spec.help = Some(text.to_string());
        }
        self
    }

    /// Fill `field` with `{prefix}{id:05}` when `create` does not supply it.
    pub fn sequence(mut self, field: &str, prefix: &str) -> Self {
        self.sequences.insert(field.to_string(), prefix.to_string());
        self
    }
}

#[derive(Debug)]
struct Table {
    spec: ModelSpec,
    records: BTreeMap<i64, Map<String, Value>>,
    next_id: i64,
}

/// Record storage shared by built-in methods and custom handlers.
#[derive(Debug, Default)]
pub struct ErpState {
    tables: BTreeMap<String, Table>,
}

impl ErpState {
    pub fn has_model(&self, model: &str) -> bool {
        self.tables.contains_key(model)
    }

    fn table(&self, model: &str) -> RemoteResult<&Table> {
        self.tables
            .get(model)
            .ok_or_else(|| Fault::absent(format!("Object {model} doesn't exist")))
    }

    fn table_mut(&mut self, model: &str) -> RemoteResult<&mut Table> {
        self.tables
            .get_mut(model)
            .ok_or_else(|| Fault::absent(format!("Object {model} doesn't exist")))
    }

    fn checked_values(
        &self,
        model: &str,
        values: &Map<String, Value>,
    ) -> RemoteResult<Map<String, Value>> {
        let table = self.table(model)?;
        let mut stored = Map::new();
        for (field, value) in values {
            let spec = table
                .spec
                .fields
                .get(field)
                .ok_or_else(|| invalid_field(model, field))?;
            let value = match (&spec.kind, value) {
                (FieldKind::Many2One(_), Value::Array(pair)) => {
                    pair.first().cloned().unwrap_or(Value::Bool(false))
                }
                (FieldKind::Many2Many(_), Value::Array(items)) => Value::Array(
                    many2many_ids(items).into_iter().map(Value::from).collect(),
                ),
                (FieldKind::Selection(options), Value::String(key)) => {
                    if !options.iter().any(|(k, _)| k == key) {
                        return Err(Fault::validation(format!(
                            "Wrong value for {model}.{field}: '{key}'"
                        )));
                    }
                    value.clone()
                }
                _ => value.clone(),
            };
            stored.insert(field.clone(), value);
        }
        Ok(stored)
    }

    pub fn create(&mut self, model: &str, values: &Map<String, Value>) -> RemoteResult<RemoteId> {
        let mut stored = self.checked_values(model, values)?;
        let table = self.table_mut(model)?;

        let missing = table
            .spec
            .fields
            .iter()
            .filter(|(name, spec)| spec.required && !stored.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Fault::validation(format!(
                "The following required fields are missing on {model}: {}",
                missing.join(", ")
            )));
        }

        let id = table.next_id;
        table.next_id += 1;
        for (field, prefix) in &table.spec.sequences {
            if !stored.contains_key(field) {
                stored.insert(field.clone(), Value::from(format!("{prefix}{id:05}")));
            }
        }
        table.records.insert(id, stored);
        Ok(RemoteId::new(id))
    }

    pub fn write(
        &mut self,
        model: &str,
        ids: &[RemoteId],
        values: &Map<String, Value>,
    ) -> RemoteResult<()> {
        let stored = self.checked_values(model, values)?;
        let table = self.table_mut(model)?;
        if let Some(missing) = ids.iter().find(|id| !table.records.contains_key(&id.get())) {
            return Err(Fault::validation(format!(
                "Record does not exist or has been deleted. ({model}({missing}))"
            )));
        }
        for id in ids {
            if let Some(record) = table.records.get_mut(&id.get()) {
                for (field, value) in &stored {
                    record.insert(field.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    pub fn search(&self, model: &str, domain: &SearchDomain) -> RemoteResult<Vec<RemoteId>> {
        let table = self.table(model)?;
        for condition in domain.conditions() {
            if condition.field != "id" && !table.spec.fields.contains_key(&condition.field) {
                return Err(invalid_field(model, &condition.field));
            }
            if !SUPPORTED_OPERATORS.contains(&condition.operator.as_str()) {
                return Err(Fault::validation(format!(
                    "Invalid search operator '{}'",
                    condition.operator
                )));
            }
        }

        Ok(table
            .records
            .iter()
            .filter(|(id, record)| {
                domain
                    .conditions()
                    .iter()
                    .all(|c| condition_holds(table, **id, record, c))
            })
            .map(|(id, _)| RemoteId::new(*id))
            .collect())
    }

    /// Read `ids` with `fields` (all declared fields when `None`/empty).
    pub fn read(
        &self,
        model: &str,
        ids: &[RemoteId],
        fields: Option<&[String]>,
    ) -> RemoteResult<Vec<Value>> {
        let table = self.table(model)?;
        let names: Vec<String> = match fields {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => table.spec.fields.keys().cloned().collect(),
        };
        for name in &names {
            if name != "id" && name != "display_name" && !table.spec.fields.contains_key(name) {
                return Err(invalid_field(model, name));
            }
        }

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(record) = table.records.get(&id.get()) else {
                continue;
            };
            let mut row = Map::new();
            row.insert("id".into(), Value::from(*id));
            for name in &names {
                if name == "id" {
                    continue;
                }
                if name == "display_name" {
                    row.insert(name.clone(), Value::from(self.display_name(model, id.get())));
                    continue;
                }
                let spec = &table.spec.fields[name];
                let stored = record.get(name).cloned().unwrap_or_else(|| spec.kind.default_value());
                let value = match &spec.kind {
                    FieldKind::Many2One(relation) => match stored.as_i64() {
                        Some(target) => Value::Array(vec![
                            Value::from(target),
                            Value::from(self.display_name(relation, target)),
                        ]),
                        None => Value::Bool(false),
                    },
                    _ => stored,
                };
                row.insert(name.clone(), value);
            }
            out.push(Value::Object(row));
        }
        Ok(out)
    }

    /// Stored (raw) values of one record.
    pub fn record(&self, model: &str, id: RemoteId) -> Option<Map<String, Value>> {
        self.tables.get(model)?.records.get(&id.get()).cloned()
    }

    pub fn fields_get(
        &self,
        model: &str,
        only: &[String],
        attributes: Option<&[String]>,
    ) -> RemoteResult<Map<String, Value>> {
        let table = self.table(model)?;
        let wanted = |attr: &str| {
            attributes.is_none_or(|list| list.is_empty() || list.iter().any(|a| a == attr))
        };

        let mut out = Map::new();
        for (name, spec) in &table.spec.fields {
            if !only.is_empty() && !only.contains(name) {
                continue;
            }
            let mut info = Map::new();
            if wanted("string") {
                info.insert("string".into(), Value::from(spec.label.clone()));
            }
            if wanted("type") {
                info.insert("type".into(), Value::from(spec.kind.type_name()));
            }
            if wanted("required") {
                info.insert("required".into(), Value::from(spec.required));
            }
            if wanted("help") {
                if let Some(help) = &spec.help {
                    info.insert("help".into(), Value::from(help.clone()));
                }
            }
            if wanted("selection") {
                if let FieldKind::Selection(options) = &spec.kind {
                    let pairs = options
                        .iter()
                        .map(|(k, v)| {
                            Value::Array(vec![Value::from(k.clone()), Value::from(v.clone())])
                        })
                        .collect();
                    info.insert("selection".into(), Value::Array(pairs));
                }
            }
            if wanted("relation") {
                if let FieldKind::Many2One(relation) | FieldKind::Many2Many(relation) = &spec.kind {
                    info.insert("relation".into(), Value::from(relation.clone()));
                }
            }
            out.insert(name.clone(), Value::Object(info));
        }
        Ok(out)
    }

    fn display_name(&self, model: &str, id: i64) -> String {
        self.tables
            .get(model)
            .and_then(|t| t.records.get(&id))
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{model},{id}"))
    }
}

const SUPPORTED_OPERATORS: [&str; 11] = [
    "=", "==", "!=", "<>", ">", ">=", "<", "<=", "in", "not in", "ilike",
];

fn invalid_field(model: &str, field: &str) -> Fault {
    Fault::validation(format!("Invalid field '{field}' on model '{model}'"))
}

fn condition_holds(
    table: &Table,
    id: i64,
    record: &Map<String, Value>,
    condition: &Condition,
) -> bool {
    let actual = if condition.field == "id" {
        Value::from(id)
    } else {
        record.get(&condition.field).cloned().unwrap_or_else(|| {
            table.spec.fields[&condition.field].kind.default_value()
        })
    };
    let expected = &condition.value;

    match condition.operator.as_str() {
        "=" | "==" => loosely_equal(&actual, expected),
        "!=" | "<>" => !loosely_equal(&actual, expected),
        ">" | ">=" | "<" | "<=" => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => match condition.operator.as_str() {
                ">" => a > b,
                ">=" => a >= b,
                "<" => a < b,
                _ => a <= b,
            },
            _ => false,
        },
        "in" => expected
            .as_array()
            .is_some_and(|xs| xs.iter().any(|x| loosely_equal(&actual, x))),
        "not in" => !expected
            .as_array()
            .is_some_and(|xs| xs.iter().any(|x| loosely_equal(&actual, x))),
        "ilike" => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(b)) => a.to_lowercase().contains(&b.to_lowercase()),
            _ => false,
        },
        _ => false,
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Plain ids, or `(6, 0, ids)` / `(4, id)` commands.
fn many2many_ids(items: &[Value]) -> Vec<i64> {
    let mut ids = Vec::new();
    for item in items {
        match item {
            Value::Number(n) => ids.extend(n.as_i64()),
            Value::Array(command) => match command.first().and_then(Value::as_i64) {
                Some(6) => ids = plain_ids(command.get(2)),
                Some(4) => ids.extend(command.get(1).and_then(Value::as_i64)),
                _ => {}
            },
            _ => {}
        }
    }
    ids
}

fn plain_ids(value: Option<&Value>) -> Vec<i64> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

fn ids_arg(value: Option<&Value>) -> RemoteResult<Vec<RemoteId>> {
    match value {
        Some(Value::Array(items)) => Ok(items.iter().filter_map(RemoteId::from_value).collect()),
        Some(single @ Value::Number(_)) => Ok(RemoteId::from_value(single).into_iter().collect()),
        other => Err(Fault::validation(format!("expected record ids, got {other:?}"))),
    }
}

fn object_arg<'a>(value: Option<&'a Value>, method: &str) -> RemoteResult<&'a Map<String, Value>> {
    value
        .and_then(Value::as_object)
        .ok_or_else(|| Fault::validation(format!("{method} expects a values dictionary")))
}

fn domain_arg(value: Option<&Value>) -> RemoteResult<SearchDomain> {
    match value {
        None => Ok(SearchDomain::all()),
        Some(v) => SearchDomain::from_value(v)
            .ok_or_else(|| Fault::validation(format!("Invalid domain {v}"))),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// In-memory stand-in for a remote ERP install.
#[derive(Default)]
pub struct InMemoryErp {
    state: RefCell<ErpState>,
    handlers: RefCell<HashMap<(String, String), MethodHandler>>,
    faults: RefCell<HashMap<(String, String), Fault>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl InMemoryErp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(self, spec: ModelSpec) -> Self {
        self.add_model(spec);
        self
    }

    pub fn add_model(&self, spec: ModelSpec) {
        self.state.borrow_mut().tables.insert(
            spec.name.clone(),
            Table {
                spec,
                records: BTreeMap::new(),
                next_id: 1,
            },
        );
    }

    pub fn remove_model(&self, model: &str) {
        self.state.borrow_mut().tables.remove(model);
    }

    /// Register a custom method (or override a built-in) for `model`.
    pub fn on<F>(&self, model: &str, method: &str, handler: F)
    where
        F: Fn(&mut ErpState, &[Value]) -> RemoteResult<Value> + 'static,
    {
        self.handlers
            .borrow_mut()
            .insert((model.to_string(), method.to_string()), Rc::new(handler));
    }

    /// Make every call to `model.method` fail with `fault`. `method` may be `"*"`.
    pub fn fail(&self, model: &str, method: &str, fault: Fault) {
        self.faults
            .borrow_mut()
            .insert((model.to_string(), method.to_string()), fault);
    }

    pub fn clear_fault(&self, model: &str, method: &str) {
        self.faults
            .borrow_mut()
            .remove(&(model.to_string(), method.to_string()));
    }

    /// Seed a record directly, bypassing the call log.
    pub fn insert(&self, model: &str, values: Value) -> RemoteResult<RemoteId> {
        let values = object_arg(Some(&values), "insert")?.clone();
        self.state.borrow_mut().create(model, &values)
    }

    pub fn record(&self, model: &str, id: RemoteId) -> Option<Map<String, Value>> {
        self.state.borrow().record(model, id)
    }

    /// Stored records of `model` in id order.
    pub fn records(&self, model: &str) -> Vec<(RemoteId, Map<String, Value>)> {
        self.state
            .borrow()
            .tables
            .get(model)
            .map(|t| {
                t.records
                    .iter()
                    .map(|(id, r)| (RemoteId::new(*id), r.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, model: &str, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.model == model && c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn injected_fault(&self, model: &str, method: &str) -> Option<Fault> {
        let faults = self.faults.borrow();
        faults
            .get(&(model.to_string(), method.to_string()))
            .or_else(|| faults.get(&(model.to_string(), "*".to_string())))
            .cloned()
    }

    fn dispatch(
        &self,
        model: &str,
        method: &str,
        args: &[Value],
        options: &CallOptions,
    ) -> RemoteResult<Value> {
        let mut state = self.state.borrow_mut();
        state.table(model)?;

        match method {
            "search" | "search_read" | "search_count" => {
                let domain = domain_arg(args.first())?;
                let mut ids = state.search(model, &domain)?;
                if let Some(limit) = options.limit {
                    ids.truncate(limit);
                }
                match method {
                    "search" => Ok(Value::Array(ids.into_iter().map(Value::from).collect())),
                    "search_count" => Ok(Value::from(ids.len())),
                    _ => Ok(Value::Array(state.read(model, &ids, options.fields.as_deref())?)),
                }
            }
            "read" => {
                let ids = ids_arg(args.first())?;
                let from_args = string_list(args.get(1));
                let fields = options.fields.clone().unwrap_or(from_args);
                Ok(Value::Array(state.read(model, &ids, Some(&fields))?))
            }
            "create" => {
                let values = object_arg(args.first(), "create")?.clone();
                Ok(Value::from(state.create(model, &values)?))
            }
            "write" => {
                let ids = ids_arg(args.first())?;
                let values = object_arg(args.get(1), "write")?.clone();
                state.write(model, &ids, &values)?;
                Ok(Value::Bool(true))
            }
            "fields_get" => {
                let only = string_list(args.first());
                Ok(Value::Object(state.fields_get(model, &only, options.attributes.as_deref())?))
            }
            _ => Err(Fault::absent(format!(
                "type object '{model}' has no attribute '{method}'"
            ))),
        }
    }
}

impl Gateway for InMemoryErp {
    fn invoke(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        options: &CallOptions,
    ) -> RemoteResult<Value> {
        self.calls.borrow_mut().push(RecordedCall {
            model: model.to_string(),
            method: method.to_string(),
            args: args.clone(),
            options: options.clone(),
        });

        if let Some(fault) = self.injected_fault(model, method) {
            return Err(fault);
        }

        let handler = self
            .handlers
            .borrow()
            .get(&(model.to_string(), method.to_string()))
            .cloned();
        if let Some(handler) = handler {
            let mut state = self.state.borrow_mut();
            return handler(&mut *state, args.as_slice());
        }

        self.dispatch(model, method, &args, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn erp() -> InMemoryErp {
        InMemoryErp::new()
            .with_model(ModelSpec::new("product.product").char("name").required("name"))
            .with_model(
                ModelSpec::new("stock.quant")
                    .many2one("product_id", "product.product")
                    .float("quantity")
                    .required("product_id"),
            )
    }

    #[test]
    fn many2one_reads_back_as_id_name_pair() {
        let erp = erp();
        let product = erp.insert("product.product", json!({"name": "Gin"})).unwrap();
        let quant = erp
            .insert("stock.quant", json!({"product_id": product.get(), "quantity": 3.0}))
            .unwrap();

        let rows = erp
            .invoke(
                "stock.quant",
                "read",
                vec![json!([quant.get()])],
                &CallOptions::new().fields(["product_id", "quantity"]),
            )
            .unwrap();
        assert_eq!(
            rows,
            json!([{"id": quant.get(), "product_id": [product.get(), "Gin"], "quantity": 3.0}])
        );
    }

    #[test]
    fn many2many_accepts_ids_and_set_commands() {
        let erp = InMemoryErp::new()
            .with_model(ModelSpec::new("res.groups").char("name"))
            .with_model(
                ModelSpec::new("res.users")
                    .char("name")
                    .many2many("groups_id", "res.groups"),
            );
        let plain = erp.insert("res.users", json!({"name": "a", "groups_id": [1, 2]})).unwrap();
        let set = erp
            .insert("res.users", json!({"name": "b", "groups_id": [[6, 0, [3]], [4, 7]]}))
            .unwrap();
        let none = erp.insert("res.users", json!({"name": "c"})).unwrap();

        let rows = erp
            .invoke(
                "res.users",
                "read",
                vec![json!([plain.get(), set.get(), none.get()])],
                &CallOptions::new().fields(["groups_id"]),
            )
            .unwrap();
        let groups: Vec<_> = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["groups_id"].clone())
            .collect();
        assert_eq!(groups, vec![json!([1, 2]), json!([3, 7]), json!([])]);
    }

    #[test]
    fn unknown_model_method_and_field_fail_like_a_remote() {
        let erp = erp();
        let opts = CallOptions::new();
        assert!(matches!(
            erp.invoke("stock.inventory", "search", vec![json!([])], &opts),
            Err(Fault::CapabilityAbsent(_))
        ));
        assert!(matches!(
            erp.invoke("stock.quant", "action_apply_inventory", vec![json!([1])], &opts),
            Err(Fault::CapabilityAbsent(_))
        ));
        assert!(matches!(
            erp.invoke("stock.quant", "search", vec![json!([["lot_id", "=", 1]])], &opts),
            Err(Fault::RemoteValidation(_))
        ));
        assert!(matches!(
            erp.invoke("stock.quant", "create", vec![json!({"quantity": 1.0})], &opts),
            Err(Fault::RemoteValidation(_))
        ));
    }

    #[test]
    fn injected_faults_and_handlers_take_precedence() {
        let erp = erp();
        erp.on("stock.quant", "action_apply_inventory", |_, _| Ok(json!(true)));
        assert_eq!(
            erp.invoke("stock.quant", "action_apply_inventory", vec![], &CallOptions::new()),
            Ok(json!(true))
        );

        erp.fail("stock.quant", "*", Fault::transport("boom"));
        assert!(matches!(
            erp.invoke("stock.quant", "search", vec![json!([])], &CallOptions::new()),
            Err(Fault::Transport(_))
        ));
        assert_eq!(erp.calls().len(), 2);
    }
}
