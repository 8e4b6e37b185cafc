//! A typical modern install: products, stock, partners and sales.

use serde_json::{Map, Value, json};

use erplink_core::{Fault, RemoteId, RemoteResult, SearchDomain};

use super::{ErpState, InMemoryErp, ModelSpec, ids_arg};

/// Build an [`InMemoryErp`] with the models a stock-and-sales install exposes.
///
/// No records are seeded. Besides the generic methods it implements
/// `stock.change.product.qty.change_product_qty`, `stock.scrap.action_validate`,
/// `sale.order.action_confirm`, and a `sale.order.line.create` that keeps
/// `price_subtotal` and the order's `amount_total` up to date.
pub fn standard_install() -> InMemoryErp {
    let erp = InMemoryErp::new()
        .with_model(ModelSpec::new("res.company").char("name"))
        .with_model(ModelSpec::new("ir.module.category").char("name"))
        .with_model(
            ModelSpec::new("res.groups")
                .char("name")
                .many2one("category_id", "ir.module.category"),
        )
        .with_model(
            ModelSpec::new("res.users")
                .char("name")
                .many2one("partner_id", "res.partner")
                .many2many("groups_id", "res.groups"),
        )
        .with_model(
            ModelSpec::new("res.partner")
                .char("name")
                .char("email")
                .char("phone")
                .integer("customer_rank")
                .required("name"),
        )
        .with_model(
            ModelSpec::new("product.category")
                .char("name")
                .char("complete_name"),
        )
        .with_model(ModelSpec::new("uom.uom").char("name"))
        .with_model(
            ModelSpec::new("product.product")
                .char("name")
                .char("default_code")
                .selection(
                    "type",
                    &[
                        ("consu", "Consumable"),
                        ("service", "Service"),
                        ("product", "Storable Product"),
                    ],
                )
                .many2one("categ_id", "product.category")
                .float("list_price")
                .float("standard_price")
                .boolean("sale_ok")
                .boolean("purchase_ok")
                .many2one("uom_id", "uom.uom")
                .many2one("uom_po_id", "uom.uom")
                .required("name")
                .help("list_price", "Price at which the product is sold to customers."),
        )
        .with_model(
            ModelSpec::new("stock.location")
                .char("name")
                .char("complete_name")
                .selection(
                    "usage",
                    &[
                        ("view", "View"),
                        ("internal", "Internal Location"),
                        ("customer", "Customer Location"),
                        ("supplier", "Vendor Location"),
                        ("inventory", "Inventory Loss"),
                    ],
                )
                .many2one("location_id", "stock.location"),
        )
        .with_model(
            ModelSpec::new("stock.warehouse")
                .char("name")
                .char("code")
                .many2one("lot_stock_id", "stock.location"),
        )
        .with_model(
            ModelSpec::new("stock.quant")
                .many2one("product_id", "product.product")
                .many2one("location_id", "stock.location")
                .float("quantity")
                .many2one("company_id", "res.company")
                .many2one("owner_id", "res.partner")
                .required("product_id")
                .required("location_id"),
        )
        .with_model(
            ModelSpec::new("stock.change.product.qty")
                .many2one("product_id", "product.product")
                .many2one("location_id", "stock.location")
                .float("new_quantity")
                .required("product_id"),
        )
        .with_model(
            ModelSpec::new("stock.scrap")
                .many2one("product_id", "product.product")
                .float("scrap_qty")
                .many2one("location_id", "stock.location")
                .many2one("scrap_location_id", "stock.location")
                .selection("state", &[("draft", "Draft"), ("done", "Done")])
                .required("product_id"),
        )
        .with_model(
            ModelSpec::new("sale.order")
                .char("name")
                .many2one("partner_id", "res.partner")
                .datetime("date_order")
                .many2one("warehouse_id", "stock.warehouse")
                .selection(
                    "state",
                    &[
                        ("draft", "Quotation"),
                        ("sent", "Quotation Sent"),
                        ("sale", "Sales Order"),
                        ("done", "Locked"),
                        ("cancel", "Cancelled"),
                    ],
                )
                .float("amount_total")
                .required("partner_id")
                .sequence("name", "S"),
        )
        .with_model(
            ModelSpec::new("sale.order.line")
                .many2one("order_id", "sale.order")
                .many2one("product_id", "product.product")
                .float("product_uom_qty")
                .float("price_unit")
                .float("price_subtotal")
                .float("margin")
                .required("order_id")
                .required("product_id"),
        );

    erp.on("stock.change.product.qty", "change_product_qty", |state, args| {
        for wizard in ids_arg(args.first())? {
            let record = state
                .record("stock.change.product.qty", wizard)
                .ok_or_else(|| Fault::validation(format!("wizard {wizard} does not exist")))?;
            let product = reference(&record, "product_id")?;
            let location = reference(&record, "location_id")?;
            let quantity = record.get("new_quantity").and_then(Value::as_f64).unwrap_or(0.0);
            set_quantity(state, product, location, |_| quantity)?;
        }
        Ok(Value::Bool(true))
    });

    erp.on("stock.scrap", "action_validate", |state, args| {
        for scrap in ids_arg(args.first())? {
            let record = state
                .record("stock.scrap", scrap)
                .ok_or_else(|| Fault::validation(format!("scrap {scrap} does not exist")))?;
            let product = reference(&record, "product_id")?;
            let location = reference(&record, "location_id")?;
            let scrapped = record.get("scrap_qty").and_then(Value::as_f64).unwrap_or(0.0);
            set_quantity(state, product, location, |current| current - scrapped)?;
            state.write("stock.scrap", &[scrap], &object(json!({"state": "done"})))?;
        }
        Ok(Value::Bool(true))
    });

    erp.on("sale.order", "action_confirm", |state, args| {
        let orders = ids_arg(args.first())?;
        for order in &orders {
            let record = state
                .record("sale.order", *order)
                .ok_or_else(|| Fault::validation(format!("sale.order {order} does not exist")))?;
            let current = record.get("state").and_then(Value::as_str).unwrap_or("draft");
            if !matches!(current, "draft" | "sent") {
                return Err(Fault::validation(format!(
                    "It is not allowed to confirm an order in the following states: {current}"
                )));
            }
        }
        state.write("sale.order", &orders, &object(json!({"state": "sale"})))?;
        Ok(Value::Bool(true))
    });

    erp.on("sale.order.line", "create", |state, args| {
        let mut values = args
            .first()
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| Fault::validation("create expects a values dictionary"))?;
        let qty = values.get("product_uom_qty").and_then(Value::as_f64).unwrap_or(0.0);
        let price = values.get("price_unit").and_then(Value::as_f64).unwrap_or(0.0);
        values.insert("price_subtotal".into(), json!(qty * price));
        let line = state.create("sale.order.line", &values)?;

        let order = reference(&values, "order_id")?;
        let total = state
            .record("sale.order", order)
            .and_then(|r| r.get("amount_total").and_then(Value::as_f64))
            .unwrap_or(0.0);
        state.write("sale.order", &[order], &object(json!({"amount_total": total + qty * price})))?;
        Ok(Value::from(line))
    });

    erp
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn reference(record: &Map<String, Value>, field: &str) -> RemoteResult<RemoteId> {
    record
        .get(field)
        .and_then(RemoteId::from_value)
        .ok_or_else(|| Fault::validation(format!("missing {field}")))
}

fn set_quantity(
    state: &mut ErpState,
    product: RemoteId,
    location: RemoteId,
    next: impl Fn(f64) -> f64,
) -> RemoteResult<()> {
    let domain = SearchDomain::all()
        .eq("product_id", product)
        .eq("location_id", location);
    match state.search("stock.quant", &domain)?.first() {
        Some(quant) => {
            let current = state
                .record("stock.quant", *quant)
                .and_then(|r| r.get("quantity").and_then(Value::as_f64))
                .unwrap_or(0.0);
            state.write("stock.quant", &[*quant], &object(json!({"quantity": next(current)})))
        }
        None => {
            state.create(
                "stock.quant",
                &object(json!({
                    "product_id": product.get(),
                    "location_id": location.get(),
                    "quantity": next(0.0),
                })),
            )?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Gateway;
    use erplink_core::CallOptions;

    #[test]
    fn order_lines_roll_up_into_order_total() {
        let erp = standard_install();
        let partner = erp.insert("res.partner", json!({"name": "Ada"})).unwrap();
        let product = erp.insert("product.product", json!({"name": "Gin"})).unwrap();
        let order = erp
            .insert("sale.order", json!({"partner_id": partner.get(), "state": "draft"}))
            .unwrap();

        erp.invoke(
            "sale.order.line",
            "create",
            vec![json!({
                "order_id": order.get(),
                "product_id": product.get(),
                "product_uom_qty": 2.0,
                "price_unit": 10.5,
            })],
            &CallOptions::new(),
        )
        .unwrap();

        let stored = erp.record("sale.order", order).unwrap();
        assert_eq!(stored["amount_total"], json!(21.0));
        assert_eq!(stored["name"], json!("S00001"));
    }
}
