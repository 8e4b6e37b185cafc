//! JSON-RPC wire codec.
//!
//! Every request is `POST {endpoint}/jsonrpc` with a `call` envelope naming a
//! service (`common` or `object`), a method and positional arguments. The
//! response carries either `result` or a structured `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use erplink_core::{Fault, RemoteResult};

/// Path of the JSON-RPC endpoint relative to the server URL.
pub const ENDPOINT_PATH: &str = "/jsonrpc";

/// Authentication/version service.
pub const COMMON_SERVICE: &str = "common";

/// Generic model method invocation service.
pub const OBJECT_SERVICE: &str = "object";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: u64,
}

#[derive(Debug, Serialize)]
struct RpcParams<'a> {
    service: &'a str,
    method: &'a str,
    args: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Structured error payload of a failed call.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorData {
    /// Fully qualified exception name, e.g. `odoo.exceptions.AccessDenied`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Build the request body for one call.
pub fn encode_request(id: u64, service: &str, method: &str, args: Vec<Value>) -> Value {
    let request = RpcRequest {
        jsonrpc: "2.0",
        method: "call",
        params: RpcParams {
            service,
            method,
            args,
        },
        id,
    };
    // Serializing plain strings and JSON values cannot fail.
    serde_json::to_value(request).unwrap_or(Value::Null)
}

/// Decode a response body into the call's result or a classified fault.
pub fn decode_response(body: &str) -> RemoteResult<Value> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| Fault::transport(format!("undecodable response: {e}")))?;

    match response.error {
        Some(error) => Err(classify(&error)),
        None => Ok(response.result),
    }
}

/// Map a remote error payload onto the fault taxonomy.
pub fn classify(error: &RpcError) -> Fault {
    let name = error
        .data
        .as_ref()
        .and_then(|d| d.name.as_deref())
        .unwrap_or_default();
    let message = error
        .data
        .as_ref()
        .and_then(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| error.message.clone());

    if name.ends_with("AccessDenied") || name.ends_with("SessionExpiredException") {
        Fault::auth(message)
    } else if name.ends_with("KeyError")
        || name.ends_with("AttributeError")
        || names_missing_capability(&message)
    {
        Fault::absent(message)
    } else {
        Fault::validation(message)
    }
}

fn names_missing_capability(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    (m.contains("doesn't exist") && (m.contains("object") || m.contains("model")))
        || m.contains("has no attribute")
        || (m.contains("does not exist") && m.contains("method"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_body(name: &str, message: &str) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": name, "message": message}
            }
        })
        .to_string()
    }

    #[test]
    fn request_envelope_names_service_and_method() {
        let body = encode_request(7, OBJECT_SERVICE, "execute_kw", vec![json!("db"), json!(2)]);
        assert_eq!(
            body,
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {"service": "object", "method": "execute_kw", "args": ["db", 2]},
                "id": 7
            })
        );
    }

    #[test]
    fn result_is_returned_including_false() {
        let ok = decode_response(r#"{"jsonrpc":"2.0","id":1,"result":[1,2]}"#).unwrap();
        assert_eq!(ok, json!([1, 2]));

        let uid = decode_response(r#"{"jsonrpc":"2.0","id":1,"result":false}"#).unwrap();
        assert_eq!(uid, json!(false));
    }

    #[test]
    fn faults_are_classified() {
        let denied = decode_response(&error_body("odoo.exceptions.AccessDenied", "Access Denied"));
        assert!(matches!(denied, Err(Fault::Auth(_))));

        let unknown_model = decode_response(&error_body("builtins.KeyError", "'stock.inventory'"));
        assert!(matches!(unknown_model, Err(Fault::CapabilityAbsent(_))));

        let unknown_method = decode_response(&error_body(
            "builtins.AttributeError",
            "type object 'stock.quant' has no attribute 'action_apply'",
        ));
        assert!(matches!(unknown_method, Err(Fault::CapabilityAbsent(_))));

        let legacy = decode_response(&error_body("", "Object stock.scrap doesn't exist"));
        assert!(matches!(legacy, Err(Fault::CapabilityAbsent(_))));

        let invalid = decode_response(&error_body(
            "builtins.ValueError",
            "Invalid field 'customer_rank' on model 'res.partner'",
        ));
        assert_eq!(
            invalid,
            Err(Fault::validation("Invalid field 'customer_rank' on model 'res.partner'"))
        );

        let missing = decode_response(&error_body(
            "odoo.exceptions.MissingError",
            "Record does not exist or has been deleted.",
        ));
        assert!(matches!(missing, Err(Fault::RemoteValidation(_))));
    }

    #[test]
    fn garbage_is_a_transport_fault() {
        assert!(matches!(decode_response("<html>502</html>"), Err(Fault::Transport(_))));
    }
}
