//! Session bootstrap and the per-session call surface.

use std::rc::Rc;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tracing::info;

use erplink_core::{CallOptions, Fault, Record, RemoteId, RemoteResult, SearchDomain};

use crate::fields::{FieldCatalog, ModelFields};
use crate::gateway::Gateway;
use crate::http::{JsonRpcClient, JsonRpcGateway};
use crate::jsonrpc::COMMON_SERVICE;

/// Connection parameters, read once from configuration.
#[derive(Clone)]
pub struct ConnectionParams {
    pub endpoint: String,
    pub database: String,
    pub username: String,
    pub secret: String,
    pub timeout: Duration,
}

impl core::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("endpoint", &self.endpoint)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Authenticated session credential. Read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct RemoteHandle {
    pub uid: RemoteId,
    pub server_version: Option<String>,
    pub params: ConnectionParams,
}

impl core::fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "Connected to {} (server version: {})",
            self.params.endpoint,
            self.server_version.as_deref().unwrap_or("unknown")
        )?;
        write!(
            f,
            "Authenticated as {} (user ID: {})",
            self.params.username, self.uid
        )
    }
}

/// Authenticate once and return a session bound to the production gateway.
///
/// Fails with [`Fault::Auth`] when the server answers `false` to
/// `authenticate`.
pub fn connect(params: ConnectionParams) -> RemoteResult<Session<JsonRpcGateway>> {
    info!(endpoint = %params.endpoint, database = %params.database, "connecting");
    let client = JsonRpcClient::new(&params.endpoint, params.timeout)?;

    let version = client.call(COMMON_SERVICE, "version", vec![])?;
    let server_version = version
        .get("server_version")
        .and_then(Value::as_str)
        .map(str::to_string);
    info!(server_version = server_version.as_deref().unwrap_or("unknown"), "connected");

    info!(username = %params.username, "authenticating");
    let uid = client.call(
        COMMON_SERVICE,
        "authenticate",
        vec![
            Value::from(params.database.clone()),
            Value::from(params.username.clone()),
            Value::from(params.secret.clone()),
            json!({}),
        ],
    )?;
    let uid = RemoteId::from_value(&uid)
        .ok_or_else(|| Fault::auth(format!("credentials rejected for {}", params.username)))?;
    info!(uid = %uid, "authenticated");

    let handle = RemoteHandle {
        uid,
        server_version,
        params,
    };
    Ok(Session::new(JsonRpcGateway::new(client, handle), uid))
}

/// Everything a façade needs for one run of the program: the gateway, the
/// authenticated user id and the session's field catalog.
///
/// The session never caches record state; only schema field presence is
/// remembered, and only for the session's lifetime.
pub struct Session<G> {
    gateway: G,
    uid: RemoteId,
    fields: FieldCatalog,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: G, uid: RemoteId) -> Self {
        Self {
            gateway,
            uid,
            fields: FieldCatalog::default(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn uid(&self) -> RemoteId {
        self.uid
    }

    pub fn invoke(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        options: &CallOptions,
    ) -> RemoteResult<Value> {
        self.gateway.invoke(model, method, args, options)
    }

    pub fn search(
        &self,
        model: &str,
        domain: &SearchDomain,
        limit: Option<usize>,
    ) -> RemoteResult<Vec<RemoteId>> {
        let mut options = CallOptions::new();
        options.limit = limit;
        let value = self.invoke(model, "search", vec![domain.to_value()], &options)?;
        ids_from(model, &value)
    }

    pub fn search_read(
        &self,
        model: &str,
        domain: &SearchDomain,
        options: &CallOptions,
    ) -> RemoteResult<Vec<Record>> {
        let value = self.invoke(model, "search_read", vec![domain.to_value()], options)?;
        records_from(model, value)
    }

    pub fn read(
        &self,
        model: &str,
        ids: &[RemoteId],
        fields: &[&str],
    ) -> RemoteResult<Vec<Record>> {
        let options = CallOptions::new().fields(fields.iter().copied());
        let value = self.invoke(model, "read", vec![id_list(ids)], &options)?;
        records_from(model, value)
    }

    pub fn create(&self, model: &str, values: Map<String, Value>) -> RemoteResult<RemoteId> {
        let value = self.invoke(model, "create", vec![Value::Object(values)], &CallOptions::new())?;
        RemoteId::from_value(&value)
            .ok_or_else(|| Fault::validation(format!("{model}.create returned {value}")))
    }

    pub fn write(
        &self,
        model: &str,
        ids: &[RemoteId],
        values: Map<String, Value>,
    ) -> RemoteResult<()> {
        self.invoke(
            model,
            "write",
            vec![id_list(ids), Value::Object(values)],
            &CallOptions::new(),
        )?;
        Ok(())
    }

    /// Call a recordset method such as `action_confirm` on `ids`.
    pub fn call_on(&self, model: &str, method: &str, ids: &[RemoteId]) -> RemoteResult<Value> {
        self.invoke(model, method, vec![id_list(ids)], &CallOptions::new())
    }

    /// Field catalog entry for `model`, fetched once per session.
    pub fn model_fields(&self, model: &str) -> RemoteResult<Rc<ModelFields>> {
        self.fields.resolve(&self.gateway, model)
    }

    pub fn has_field(&self, model: &str, field: &str) -> RemoteResult<bool> {
        Ok(self.model_fields(model)?.contains(field))
    }

    /// Keep only the `wanted` fields that `model` actually has, in order.
    pub fn known_fields<'a>(&self, model: &str, wanted: &[&'a str]) -> RemoteResult<Vec<&'a str>> {
        let fields = self.model_fields(model)?;
        Ok(wanted.iter().copied().filter(|f| fields.contains(f)).collect())
    }
}

fn id_list(ids: &[RemoteId]) -> Value {
    Value::Array(ids.iter().map(|id| Value::from(*id)).collect())
}

fn ids_from(model: &str, value: &Value) -> RemoteResult<Vec<RemoteId>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(RemoteId::from_value).collect())
        .ok_or_else(|| Fault::validation(format!("{model}.search returned {value}")))
}

fn records_from(model: &str, value: Value) -> RemoteResult<Vec<Record>> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect()),
        other => Err(Fault::validation(format!("{model} returned {other} instead of records"))),
    }
}
