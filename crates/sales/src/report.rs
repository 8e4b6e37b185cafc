//! Sales report, falling back to the inventory report.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::{info, warn};

use erplink_core::{CallOptions, RecordExt, RemoteId, RemoteResult, SearchDomain};
use erplink_inventory::{InventoryReport, inventory_report};
use erplink_rpc::{Gateway, Session};

use crate::availability::{SALE_ORDER_MODEL, check_sales_available};
use crate::error::SalesError;

const CONFIRMED_STATES: [&str; 2] = ["sale", "done"];
const ORDER_FIELDS: [&str; 6] = [
    "id",
    "name",
    "warehouse_id",
    "amount_total",
    "date_order",
    "partner_id",
];
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub warehouse: String,
    pub order: String,
    pub customer: String,
    pub date: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub product: String,
    pub quantity: f64,
    pub revenue: f64,
    /// Only when the remote tracks margins.
    pub profit: Option<f64>,
}

/// Confirmed orders grouped by warehouse, plus totals and a product breakdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesReport {
    /// Rows grouped by warehouse, groups in first-seen order.
    pub rows: Vec<OrderRow>,
    pub total: f64,
    pub products: Vec<ProductSales>,
    /// Set when the per-product breakdown could not be read.
    pub breakdown_error: Option<String>,
}

impl SalesReport {
    pub fn order_count(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "No confirmed sales orders found");
        }
        let rule = "-".repeat(100);
        writeln!(f, "Location-wise Sales Report:")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "{:<20} {:<15} {:<25} {:<20} {:<10}",
            "Warehouse", "Order", "Customer", "Date", "Total"
        )?;
        writeln!(f, "{rule}")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<20} {:<15} {:<25} {:<20} {:<10.2}",
                row.warehouse, row.order, row.customer, row.date, row.amount
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Consolidated Sales Report:")?;
        writeln!(f, "{}", "-".repeat(50))?;
        writeln!(f, "Total number of orders: {}", self.order_count())?;
        writeln!(f, "Total sales amount: {:.2}", self.total)?;

        let rule = "-".repeat(70);
        writeln!(f)?;
        writeln!(f, "Sales Breakdown by Product:")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<30} {:<10} {:<15} {:<15}", "Product", "Quantity", "Revenue", "Profit")?;
        writeln!(f, "{rule}")?;
        if let Some(error) = &self.breakdown_error {
            return writeln!(f, "Could not generate product breakdown: {error}");
        }
        for product in &self.products {
            let profit = product
                .profit
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "N/A".into());
            writeln!(
                f,
                "{:<30} {:<10.2} {:<15.2} {:<15}",
                product.product, product.quantity, product.revenue, profit
            )?;
        }
        Ok(())
    }
}

/// What [`generate_sales_report`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SalesReportOutcome {
    Sales(SalesReport),
    /// Sales was unavailable or its report failed; stock is shown instead.
    InventoryFallback {
        reason: String,
        inventory: InventoryReport,
    },
}

impl fmt::Display for SalesReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalesReportOutcome::Sales(report) => write!(f, "{report}"),
            SalesReportOutcome::InventoryFallback { reason, inventory } => {
                writeln!(f, "Cannot generate sales report: {reason}")?;
                writeln!(f, "Generating inventory report as an alternative...")?;
                writeln!(f)?;
                write!(f, "{inventory}")
            }
        }
    }
}

/// Sales report when sales works, otherwise the inventory report.
///
/// Transport and auth faults are errors in both cases.
pub fn generate_sales_report<G: Gateway>(
    session: &Session<G>,
) -> Result<SalesReportOutcome, SalesError> {
    let availability = check_sales_available(session)?;
    let reason = if availability.is_available() {
        match build_sales_report(session) {
            Ok(report) => {
                info!(orders = report.order_count(), total = report.total, "built sales report");
                return Ok(SalesReportOutcome::Sales(report));
            }
            Err(fault) if fault.is_fatal() => return Err(fault.into()),
            Err(fault) => {
                warn!(error = %fault, "sales report failed, falling back to inventory");
                format!("error generating sales report: {fault}")
            }
        }
    } else {
        availability.note().to_string()
    };
    Ok(SalesReportOutcome::InventoryFallback {
        reason,
        inventory: inventory_report(session)?,
    })
}

fn build_sales_report<G: Gateway>(session: &Session<G>) -> RemoteResult<SalesReport> {
    let warehouses: HashMap<RemoteId, String> = session
        .search_read(
            "stock.warehouse",
            &SearchDomain::all(),
            &CallOptions::new().fields(["id", "name"]),
        )?
        .iter()
        .filter_map(|w| Some((w.id()?, w.text("name").unwrap_or_default().to_string())))
        .collect();

    let fields = session.known_fields(SALE_ORDER_MODEL, &ORDER_FIELDS)?;
    let domain = SearchDomain::all().with("state", "in", Value::from(CONFIRMED_STATES.to_vec()));
    let orders =
        session.search_read(SALE_ORDER_MODEL, &domain, &CallOptions::new().fields(fields))?;

    // Group by warehouse, keeping the order in which warehouses first appear.
    let mut groups: Vec<(Option<RemoteId>, Vec<OrderRow>)> = Vec::new();
    let mut total = 0.0;
    let mut order_ids = Vec::with_capacity(orders.len());
    for order in &orders {
        order_ids.extend(order.id());
        let warehouse_id = order.reference("warehouse_id").map(|w| w.id);
        let amount = order.number("amount_total").unwrap_or(0.0);
        total += amount;
        let row = OrderRow {
            warehouse: warehouse_id
                .and_then(|id| warehouses.get(&id).cloned())
                .unwrap_or_else(|| UNKNOWN.into()),
            order: order.text("name").unwrap_or_default().to_string(),
            customer: order
                .reference("partner_id")
                .map(|p| p.name)
                .unwrap_or_else(|| UNKNOWN.into()),
            date: order.text("date_order").unwrap_or(UNKNOWN).to_string(),
            amount,
        };
        match groups.iter_mut().find(|(id, _)| *id == warehouse_id) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((warehouse_id, vec![row])),
        }
    }
    let rows = groups.into_iter().flat_map(|(_, rows)| rows).collect();

    let (products, breakdown_error) = if order_ids.is_empty() {
        (Vec::new(), None)
    } else {
        match product_breakdown(session, &order_ids) {
            Ok(products) => (products, None),
            Err(fault) if fault.is_fatal() => return Err(fault),
            Err(fault) => {
                warn!(error = %fault, "could not generate product breakdown");
                (Vec::new(), Some(fault.to_string()))
            }
        }
    };

    Ok(SalesReport {
        rows,
        total,
        products,
        breakdown_error,
    })
}

fn product_breakdown<G: Gateway>(
    session: &Session<G>,
    orders: &[RemoteId],
) -> RemoteResult<Vec<ProductSales>> {
    let fields = session.known_fields(
        "sale.order.line",
        &["product_id", "product_uom_qty", "price_subtotal", "margin"],
    )?;
    let with_margin = fields.contains(&"margin");
    let ids: Vec<Value> = orders.iter().map(|id| Value::from(*id)).collect();
    let lines = session.search_read(
        "sale.order.line",
        &SearchDomain::all().with("order_id", "in", ids),
        &CallOptions::new().fields(fields),
    )?;

    let mut products: Vec<(Option<RemoteId>, ProductSales)> = Vec::new();
    for line in &lines {
        let product = line.reference("product_id");
        let key = product.as_ref().map(|p| p.id);
        let index = match products.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                let name = match &product {
                    Some(p) if !p.name.is_empty() => p.name.clone(),
                    Some(p) => format!("Product {}", p.id),
                    None => format!("Product {UNKNOWN}"),
                };
                products.push((
                    key,
                    ProductSales {
                        product: name,
                        quantity: 0.0,
                        revenue: 0.0,
                        profit: with_margin.then_some(0.0),
                    },
                ));
                products.len() - 1
            }
        };
        let entry = &mut products[index].1;
        entry.quantity += line.number("product_uom_qty").unwrap_or(0.0);
        entry.revenue += line.number("price_subtotal").unwrap_or(0.0);
        if let Some(profit) = entry.profit.as_mut() {
            *profit += line.number("margin").unwrap_or(0.0);
        }
    }
    Ok(products.into_iter().map(|(_, p)| p).collect())
}
