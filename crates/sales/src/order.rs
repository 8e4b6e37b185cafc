//! Sale order creation: header, then one line, then best-effort confirmation.

use std::fmt;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use erplink_core::{Fault, RecordExt, RemoteId};
use erplink_rpc::{Gateway, Session};

use crate::availability::{SALE_ORDER_MODEL, check_sales_available};
use crate::error::SalesError;

const ORDER_LINE_MODEL: &str = "sale.order.line";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sell `quantity` of `product` to `customer`, optionally from `warehouse`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleRequest {
    pub product: RemoteId,
    pub customer: RemoteId,
    pub warehouse: Option<RemoteId>,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleOrderReceipt {
    pub order: RemoteId,
    pub line: RemoteId,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: f64,
    /// Why confirmation failed; `None` when the order was confirmed.
    pub confirm_error: Option<Fault>,
    /// Read back after creation; `None` when the read-back failed.
    pub reference: Option<String>,
    pub state: Option<String>,
    pub amount_total: Option<f64>,
}

impl SaleOrderReceipt {
    pub fn is_confirmed(&self) -> bool {
        self.confirm_error.is_none()
    }
}

impl fmt::Display for SaleOrderReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sale order created with ID: {} ({} units of '{}' at {:.2} per unit)",
            self.order, self.quantity, self.product_name, self.unit_price
        )?;
        match &self.confirm_error {
            None => writeln!(f, "Sale order confirmed")?,
            Some(fault) => writeln!(f, "Warning: Could not confirm sale order: {fault}")?,
        }
        match (&self.reference, &self.state, self.amount_total) {
            (Some(reference), state, total) => write!(
                f,
                "Order: {}, State: {}, Total: {:.2}",
                reference,
                state.as_deref().unwrap_or("unknown"),
                total.unwrap_or(0.0)
            ),
            _ => write!(f, "(order details could not be read back)"),
        }
    }
}

/// Create header and line, then try to confirm.
///
/// Confirmation and read-back failures are logged and reported on the
/// receipt; the order id is returned regardless. A rejected line is reported
/// with the id of the header that was already created.
pub fn create_sale_order<G: Gateway>(
    session: &Session<G>,
    request: &SaleRequest,
) -> Result<SaleOrderReceipt, SalesError> {
    if !request.quantity.is_finite() || request.quantity <= 0.0 {
        return Err(SalesError::InvalidQuantity(request.quantity.to_string()));
    }
    let availability = check_sales_available(session)?;
    if !availability.is_available() {
        return Err(SalesError::Unavailable(availability));
    }

    let product = session
        .read("product.product", &[request.product], &["name", "list_price"])?
        .into_iter()
        .next()
        .ok_or(SalesError::ProductNotFound(request.product))?;
    let product_name = product.text("name").unwrap_or_default().to_string();
    let unit_price = product.number("list_price").unwrap_or(0.0);
    info!(
        product = %request.product,
        quantity = request.quantity,
        unit_price,
        "creating sale order"
    );

    let mut header = Map::new();
    header.insert("partner_id".into(), Value::from(request.customer));
    header.insert(
        "date_order".into(),
        Value::from(Utc::now().format(DATE_FORMAT).to_string()),
    );
    if let Some(warehouse) = request.warehouse {
        header.insert("warehouse_id".into(), Value::from(warehouse));
    }
    let order = session
        .create(SALE_ORDER_MODEL, header)
        .map_err(|fault| match fault {
            f if f.is_fatal() => SalesError::Remote(f),
            f => SalesError::OrderRejected(f),
        })?;

    let mut line = Map::new();
    line.insert("order_id".into(), Value::from(order));
    line.insert("product_id".into(), Value::from(request.product));
    line.insert("product_uom_qty".into(), Value::from(request.quantity));
    line.insert("price_unit".into(), Value::from(unit_price));
    let line = session
        .create(ORDER_LINE_MODEL, line)
        .map_err(|fault| match fault {
            f if f.is_fatal() => SalesError::Remote(f),
            fault => SalesError::LineRejected { order, fault },
        })?;
    info!(order = %order, line = %line, "sale order created");

    let confirm_error = match session.call_on(SALE_ORDER_MODEL, "action_confirm", &[order]) {
        Ok(_) => {
            info!(order = %order, "sale order confirmed");
            None
        }
        Err(fault) => {
            warn!(order = %order, error = %fault, "could not confirm sale order");
            Some(fault)
        }
    };

    let read_back = session.read(SALE_ORDER_MODEL, &[order], &["name", "state", "amount_total"]);
    let details = match read_back {
        Ok(rows) => rows.into_iter().next(),
        Err(fault) => {
            warn!(order = %order, error = %fault, "could not read back sale order");
            None
        }
    };

    Ok(SaleOrderReceipt {
        order,
        line,
        product_name,
        unit_price,
        quantity: request.quantity,
        confirm_error,
        reference: details.as_ref().and_then(|d| d.text("name").map(str::to_string)),
        state: details.as_ref().and_then(|d| d.text("state").map(str::to_string)),
        amount_total: details.as_ref().and_then(|d| d.number("amount_total")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use erplink_rpc::InMemoryErp;
    use erplink_rpc::in_memory::standard_install;
    use serde_json::json;

    fn shop() -> (Session<InMemoryErp>, SaleRequest) {
        let erp = standard_install();
        let customer = erp
            .insert("res.partner", json!({"name": "Acme", "customer_rank": 1}))
            .unwrap();
        let product = erp
            .insert("product.product", json!({"name": "Premium Whiskey", "list_price": 45.99}))
            .unwrap();
        let warehouse = erp.insert("stock.warehouse", json!({"name": "Main"})).unwrap();
        let request = SaleRequest {
            product,
            customer,
            warehouse: Some(warehouse),
            quantity: 5.0,
        };
        (Session::new(erp, RemoteId::new(2)), request)
    }

    #[test]
    fn header_then_line_then_confirmation() {
        let (session, request) = shop();

        let receipt = create_sale_order(&session, &request).unwrap();

        assert!(receipt.is_confirmed());
        assert_eq!(receipt.reference.as_deref(), Some("S00001"));
        assert_eq!(receipt.state.as_deref(), Some("sale"));
        assert!((receipt.amount_total.unwrap() - 229.95).abs() < 1e-9);

        let order = session.gateway().record("sale.order", receipt.order).unwrap();
        assert_eq!(order["warehouse_id"], json!(request.warehouse.unwrap().get()));
        let date = order["date_order"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(date, DATE_FORMAT).is_ok());

        let methods: Vec<_> = session
            .gateway()
            .calls()
            .into_iter()
            .filter(|c| c.model.starts_with("sale.order"))
            .map(|c| format!("{}.{}", c.model, c.method))
            .collect();
        assert_eq!(
            methods,
            vec![
                "sale.order.search",
                "sale.order.create",
                "sale.order.line.create",
                "sale.order.action_confirm",
                "sale.order.read",
            ]
        );
    }

    #[test]
    fn failed_confirmation_still_returns_the_order() {
        let (session, request) = shop();
        session
            .gateway()
            .fail("sale.order", "action_confirm", Fault::validation("Missing pricelist"));

        let receipt = create_sale_order(&session, &request).unwrap();

        assert!(!receipt.is_confirmed());
        assert_ne!(receipt.state.as_deref(), Some("sale"));
        assert!(session.gateway().record("sale.order", receipt.order).is_some());
        assert!(receipt.to_string().contains("Could not confirm sale order"));
    }

    #[test]
    fn rejected_line_names_the_created_header() {
        let (session, request) = shop();
        session
            .gateway()
            .fail("sale.order.line", "create", Fault::validation("product not saleable"));

        match create_sale_order(&session, &request) {
            Err(SalesError::LineRejected { order, .. }) => {
                assert!(session.gateway().record("sale.order", order).is_some());
            }
            other => panic!("expected rejected line, got {other:?}"),
        }
    }

    #[test]
    fn unknown_product_is_reported_before_any_write() {
        let (session, mut request) = shop();
        request.product = RemoteId::new(99);
        assert_eq!(
            create_sale_order(&session, &request),
            Err(SalesError::ProductNotFound(RemoteId::new(99)))
        );
        assert_eq!(session.gateway().call_count("sale.order", "create"), 0);
    }

    #[test]
    fn quantity_must_be_positive() {
        let (session, mut request) = shop();
        request.quantity = 0.0;
        assert!(matches!(
            create_sale_order(&session, &request),
            Err(SalesError::InvalidQuantity(_))
        ));
    }
}
