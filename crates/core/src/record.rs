//! Typed access to loosely-shaped remote records.
//!
//! Records come back as JSON objects holding whatever fields the remote
//! schema returned. Unset values are `false` on the wire.

use serde_json::{Map, Value};

use crate::id::{Many2One, RemoteId};

/// A record as returned by `read`/`search_read`.
pub type Record = Map<String, Value>;

/// Field accessors that treat `false`/missing uniformly as "unset".
pub trait RecordExt {
    fn id(&self) -> Option<RemoteId>;
    fn text(&self, field: &str) -> Option<&str>;
    fn number(&self, field: &str) -> Option<f64>;
    fn flag(&self, field: &str) -> bool;
    fn reference(&self, field: &str) -> Option<Many2One>;
}

impl RecordExt for Record {
    fn id(&self) -> Option<RemoteId> {
        self.get("id").and_then(RemoteId::from_value)
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    fn flag(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    fn reference(&self, field: &str) -> Option<Many2One> {
        self.get(field).and_then(Many2One::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn false_reads_as_unset() {
        let r = record(json!({
            "id": 3,
            "default_code": false,
            "lot_stock_id": false,
            "quantity": 4.5,
        }));
        assert_eq!(r.id(), Some(RemoteId::new(3)));
        assert_eq!(r.text("default_code"), None);
        assert!(r.reference("lot_stock_id").is_none());
        assert_eq!(r.number("quantity"), Some(4.5));
        assert!(!r.flag("sale_ok"));
    }
}
