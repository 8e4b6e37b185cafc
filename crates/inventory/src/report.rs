//! Location-wise and consolidated stock report.

use std::fmt;

use tracing::info;

use erplink_core::{CallOptions, Many2One, RecordExt, SearchDomain};
use erplink_rpc::{Gateway, Session};

use crate::error::InventoryError;
use crate::warehouse::list_warehouses;

#[derive(Debug, Clone, PartialEq)]
pub struct StockLine {
    pub product: String,
    pub quantity: f64,
}

/// Positive stock held at one warehouse's stock location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationStock {
    pub warehouse: String,
    pub location: Many2One,
    pub lines: Vec<StockLine>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryReport {
    pub locations: Vec<LocationStock>,
}

impl InventoryReport {
    /// Quantity per product across every location, in first-seen order.
    pub fn totals(&self) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> = Vec::new();
        for line in self.locations.iter().flat_map(|l| &l.lines) {
            match totals.iter_mut().find(|(name, _)| *name == line.product) {
                Some((_, total)) => *total += line.quantity,
                None => totals.push((line.product.clone(), line.quantity)),
            }
        }
        totals
    }
}

impl fmt::Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(80);
        writeln!(f, "Location-wise Inventory Report:")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<30} {:<30} {:<10}", "Location", "Product", "Quantity")?;
        writeln!(f, "{rule}")?;
        for location in &self.locations {
            if location.lines.is_empty() {
                let label = format!("{} ({})", location.location.name, location.warehouse);
                writeln!(f, "{label:<30} No inventory")?;
                continue;
            }
            for line in &location.lines {
                writeln!(
                    f,
                    "{:<30} {:<30} {:<10.2}",
                    location.location.name, line.product, line.quantity
                )?;
            }
        }

        let rule = "-".repeat(50);
        writeln!(f)?;
        writeln!(f, "Consolidated Inventory Report:")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<30} {:<10}", "Product", "Total Quantity")?;
        writeln!(f, "{rule}")?;
        for (product, quantity) in self.totals() {
            writeln!(f, "{product:<30} {quantity:<10.2}")?;
        }
        Ok(())
    }
}

/// Positive quants at every warehouse stock location.
///
/// Warehouses without a stock location are left out.
pub fn inventory_report<G: Gateway>(
    session: &Session<G>,
) -> Result<InventoryReport, InventoryError> {
    let mut locations = Vec::new();
    for warehouse in list_warehouses(session)? {
        let Some(location) = warehouse.stock_location else {
            continue;
        };
        let domain = SearchDomain::all()
            .eq("location_id", location.id)
            .with("quantity", ">", 0);
        let quants = session.search_read(
            "stock.quant",
            &domain,
            &CallOptions::new().fields(["product_id", "quantity"]),
        )?;
        let lines = quants
            .iter()
            .filter_map(|quant| {
                let product = quant.reference("product_id")?;
                let name = if product.name.is_empty() {
                    format!("Unknown ({})", product.id)
                } else {
                    product.name
                };
                Some(StockLine {
                    product: name,
                    quantity: quant.number("quantity").unwrap_or(0.0),
                })
            })
            .collect();
        locations.push(LocationStock {
            warehouse: warehouse.name,
            location,
            lines,
        });
    }
    info!(locations = locations.len(), "built inventory report");
    Ok(InventoryReport { locations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use erplink_core::{Fault, RemoteId};
    use erplink_rpc::in_memory::standard_install;
    use serde_json::json;

    #[test]
    fn reports_positive_stock_per_warehouse_and_in_total() {
        let erp = standard_install();
        let gin = erp.insert("product.product", json!({"name": "Gin"})).unwrap();
        let rum = erp.insert("product.product", json!({"name": "Rum"})).unwrap();
        let mut stocks = Vec::new();
        for (name, code) in [("Main", "WH"), ("Annex", "AX"), ("Depot", "DP")] {
            let location = erp
                .insert(
                    "stock.location",
                    json!({"name": format!("{code}/Stock"), "usage": "internal"}),
                )
                .unwrap();
            erp.insert(
                "stock.warehouse",
                json!({"name": name, "code": code, "lot_stock_id": location.get()}),
            )
            .unwrap();
            stocks.push(location);
        }
        for (product, location, quantity) in [
            (gin, stocks[0], 15.0),
            (rum, stocks[0], 0.0),
            (gin, stocks[1], 20.0),
            (rum, stocks[1], 4.5),
        ] {
            erp.insert(
                "stock.quant",
                json!({
                    "product_id": product.get(),
                    "location_id": location.get(),
                    "quantity": quantity,
                }),
            )
            .unwrap();
        }
        let session = Session::new(erp, RemoteId::new(2));

        let report = inventory_report(&session).unwrap();

        assert_eq!(report.locations.len(), 3);
        assert_eq!(report.locations[0].lines.len(), 1);
        assert!(report.locations[2].lines.is_empty());
        assert_eq!(report.totals(), vec![("Gin".to_string(), 35.0), ("Rum".to_string(), 4.5)]);
        let text = report.to_string();
        assert!(text.contains("DP/Stock (Depot)"));
        assert!(text.contains("No inventory"));
        assert!(text.contains("35.00"));
    }

    #[test]
    fn quant_read_failure_is_an_error() {
        let erp = standard_install();
        let location = erp.insert("stock.location", json!({"name": "WH/Stock"})).unwrap();
        erp.insert("stock.warehouse", json!({"name": "Main", "lot_stock_id": location.get()}))
            .unwrap();
        erp.fail(
            "stock.quant",
            "search_read",
            Fault::validation("Access to stock.quant restricted"),
        );
        let session = Session::new(erp, RemoteId::new(2));
        assert!(matches!(
            inventory_report(&session),
            Err(InventoryError::Remote(Fault::RemoteValidation(_)))
        ));
    }
}
