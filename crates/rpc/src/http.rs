//! Blocking HTTP transport for the JSON-RPC surface.

use std::cell::Cell;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use erplink_core::{CallOptions, Fault, RemoteResult};

use crate::gateway::Gateway;
use crate::jsonrpc::{self, OBJECT_SERVICE};
use crate::session::RemoteHandle;

/// Low-level client: posts call envelopes to `{endpoint}/jsonrpc`.
pub struct JsonRpcClient {
    http: reqwest::blocking::Client,
    url: String,
    next_id: Cell<u64>,
}

impl JsonRpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> RemoteResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Fault::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: format!("{}{}", endpoint.trim_end_matches('/'), jsonrpc::ENDPOINT_PATH),
            next_id: Cell::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` on `service` with positional `args`.
    pub fn call(&self, service: &str, method: &str, args: Vec<Value>) -> RemoteResult<Value> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let body = jsonrpc::encode_request(id, service, method, args);
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| Fault::transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Fault::transport(format!("HTTP {status} from {}", self.url)));
        }

        let text = resp.text().map_err(|e| Fault::transport(e.to_string()))?;
        jsonrpc::decode_response(&text)
    }
}

/// Production gateway: `execute_kw` on the `object` service.
pub struct JsonRpcGateway {
    client: JsonRpcClient,
    handle: RemoteHandle,
}

impl JsonRpcGateway {
    pub fn new(client: JsonRpcClient, handle: RemoteHandle) -> Self {
        Self { client, handle }
    }

    pub fn handle(&self) -> &RemoteHandle {
        &self.handle
    }
}

impl Gateway for JsonRpcGateway {
    fn invoke(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        options: &CallOptions,
    ) -> RemoteResult<Value> {
        let params = &self.handle.params;
        let envelope = vec![
            Value::from(params.database.clone()),
            Value::from(self.handle.uid),
            Value::from(params.secret.clone()),
            Value::from(model),
            Value::from(method),
            Value::Array(args),
            Value::Object(options.to_kwargs()),
        ];

        debug!(model, method, "remote call");
        let result = self.client.call(OBJECT_SERVICE, "execute_kw", envelope);
        if let Err(fault) = &result {
            debug!(model, method, kind = %fault.kind(), error = %fault, "remote call failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_is_normalized() {
        let client =
            JsonRpcClient::new("https://erp.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url(), "https://erp.example.com/jsonrpc");
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_fault() {
        // Port 9 (discard) on loopback is not expected to speak HTTP.
        let client = JsonRpcClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.call("common", "version", vec![]).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, Fault::Transport(_)));
    }
}
