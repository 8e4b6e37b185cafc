//! Menu option 8: create a product, stock it everywhere, sell some, report.

use std::io::{self, BufRead, Write};

use tracing::info;

use erplink_inventory::list_warehouses;
use erplink_rpc::Gateway;
use erplink_sales::{CustomerTemplate, SaleRequest, check_sales_available, resolve_customer};

use crate::shell::Shell;

/// Cycled over warehouses in listing order.
const WAREHOUSE_QUANTITIES: [f64; 3] = [15.0, 20.0, 25.0];
const SALE_QUANTITY: f64 = 5.0;

impl<G: Gateway, R: BufRead, W: Write> Shell<'_, G, R, W> {
    pub(crate) fn complete_process(&mut self) -> io::Result<()> {
        self.console.say("\n--- RUNNING COMPLETE PROCESS ---")?;

        let Some(product) = self.create_product()? else {
            return self.console.say("Failed to create product. Aborting process.");
        };

        let warehouses = match list_warehouses(self.session) {
            Ok(warehouses) if !warehouses.is_empty() => warehouses,
            Ok(_) => return self.console.say("No warehouses found. Aborting process."),
            Err(err) => {
                self.report_error("listing warehouses", err)?;
                return self.console.say("Aborting process.");
            }
        };

        for (i, warehouse) in warehouses.iter().enumerate() {
            let Some(location) = &warehouse.stock_location else {
                continue;
            };
            let quantity = WAREHOUSE_QUANTITIES[i % WAREHOUSE_QUANTITIES.len()];
            self.console
                .say(format_args!("Adding {quantity} units to {}...", warehouse.name))?;
            self.stock(product, location.id, quantity)?;
        }

        let sales_available = match check_sales_available(self.session) {
            Ok(availability) if availability.is_available() => true,
            Ok(availability) => {
                self.console.say(availability.note())?;
                self.console
                    .say("Skipping sales process since sales module is not available.")?;
                false
            }
            Err(err) => {
                self.report_error("checking sales availability", err)?;
                false
            }
        };

        if sales_available {
            match resolve_customer(self.session, &CustomerTemplate::default()) {
                Ok(resolution) => {
                    self.console.say(&resolution)?;
                    let warehouse = &warehouses[0];
                    self.console
                        .say(format_args!("Creating sale in warehouse: {}", warehouse.name))?;
                    self.sell(SaleRequest {
                        product,
                        customer: resolution.customer,
                        warehouse: Some(warehouse.id),
                        quantity: SALE_QUANTITY,
                    })?;
                }
                Err(err) => self.report_error("finding a customer", err)?,
            }
        }

        self.inventory_report()?;
        if sales_available {
            self.sales_report()?;
        }

        info!(product = %product, "complete process finished");
        self.console.say("\n--- COMPLETE PROCESS FINISHED ---")
    }
}
