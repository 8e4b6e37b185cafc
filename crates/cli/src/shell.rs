//! The numbered menu loop.
//!
//! Every façade error is printed and the menu comes back; only end of input
//! or `0` leaves the loop.

use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use erplink_core::RemoteId;
use erplink_inventory::{
    add_product_to_location, check_permissions, create_locations, internal_locations,
    inventory_report, list_warehouses,
};
use erplink_products::{NewProduct, create_product, inspect_fields, list_products};
use erplink_rpc::{Gateway, Session};
use erplink_sales::{
    CustomerTemplate, SaleRequest, create_sale_order, generate_sales_report, resolve_customer,
};

use crate::config::ProductDefaults;
use crate::console::Console;

const DEFAULT_SALE_QUANTITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    InspectProducts,
    InspectProductFields,
    CreateProduct,
    AddToWarehouses,
    ProcessSale,
    InventoryReport,
    SalesReport,
    CompleteProcess,
    CreateLocations,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        Some(match input.trim() {
            "1" => MenuChoice::InspectProducts,
            "2" => MenuChoice::InspectProductFields,
            "3" => MenuChoice::CreateProduct,
            "4" => MenuChoice::AddToWarehouses,
            "5" => MenuChoice::ProcessSale,
            "6" => MenuChoice::InventoryReport,
            "7" => MenuChoice::SalesReport,
            "8" => MenuChoice::CompleteProcess,
            "9" => MenuChoice::CreateLocations,
            "0" => MenuChoice::Exit,
            _ => return None,
        })
    }
}

const MENU: &str = "\
1. Inspect existing products
2. Inspect product fields and valid values
3. Create new product
4. Add product to warehouses
5. Process a sale
6. Generate inventory report
7. Generate sales report
8. Run complete process (steps 3-7)
9. Create stock locations
0. Exit";

pub struct Shell<'s, G, R, W> {
    pub(crate) session: &'s Session<G>,
    pub(crate) defaults: ProductDefaults,
    pub(crate) console: Console<R, W>,
}

impl<'s, G: Gateway, R: BufRead, W: Write> Shell<'s, G, R, W> {
    pub fn new(session: &'s Session<G>, defaults: ProductDefaults, input: R, output: W) -> Self {
        Self {
            session,
            defaults,
            console: Console::new(input, output),
        }
    }

    /// Show the menu until the operator exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let rule = "=".repeat(60);
            self.console
                .say(format_args!("\n{rule}\nERPLINK PRODUCT MANAGER\n{rule}\n{MENU}"))?;
            let Some(answer) = self.console.ask("\nEnter your choice (0-9): ")? else {
                info!("input closed, leaving menu");
                return Ok(());
            };
            match MenuChoice::parse(&answer) {
                Some(MenuChoice::Exit) => {
                    self.console.say("\nExiting. Thank you!")?;
                    return Ok(());
                }
                Some(choice) => self.dispatch(choice)?,
                None => self.console.say("\nInvalid choice. Please try again.")?,
            }
        }
    }

    fn dispatch(&mut self, choice: MenuChoice) -> io::Result<()> {
        info!(?choice, "menu choice");
        match choice {
            MenuChoice::InspectProducts => self.inspect_products().map(drop),
            MenuChoice::InspectProductFields => self.inspect_product_fields(),
            MenuChoice::CreateProduct => self.create_product().map(drop),
            MenuChoice::AddToWarehouses => self.add_to_warehouses(),
            MenuChoice::ProcessSale => self.process_sale(),
            MenuChoice::InventoryReport => self.inventory_report(),
            MenuChoice::SalesReport => self.sales_report(),
            MenuChoice::CompleteProcess => self.complete_process(),
            MenuChoice::CreateLocations => self.create_stock_locations(),
            MenuChoice::Exit => Ok(()),
        }
    }

    pub(crate) fn report_error(
        &mut self,
        context: &str,
        error: impl std::fmt::Display,
    ) -> io::Result<()> {
        warn!(context, error = %error, "operation failed");
        self.console.say(format_args!("Error {context}: {error}"))
    }

    /// Print every product and return `(id, name)` pairs for selection.
    fn inspect_products(&mut self) -> io::Result<Vec<(RemoteId, String)>> {
        self.console.say("\n--- INSPECTING EXISTING PRODUCTS ---")?;
        let products = match list_products(self.session) {
            Ok(products) => products,
            Err(err) => {
                self.report_error("inspecting products", err)?;
                return Ok(Vec::new());
            }
        };
        if products.is_empty() {
            self.console.say("No products found in the system.")?;
            return Ok(Vec::new());
        }
        self.console.say(format_args!("Found {} products:", products.len()))?;
        for product in &products {
            self.console.say(format_args!("\n{}\n{product}", "-".repeat(50)))?;
        }
        Ok(products.into_iter().map(|p| (p.id, p.name)).collect())
    }

    fn inspect_product_fields(&mut self) -> io::Result<()> {
        self.console.say("\n--- INSPECTING PRODUCT FIELDS ---")?;
        match inspect_fields(self.session) {
            Ok(report) => self.console.say(report),
            Err(err) => self.report_error("inspecting product fields", err),
        }
    }

    /// Prompt for product details and create it.
    pub(crate) fn create_product(&mut self) -> io::Result<Option<RemoteId>> {
        self.console.say("\n--- CREATING NEW PRODUCT ---")?;
        let defaults = self.defaults.clone();
        let name = self.console.text_or(
            &format!("Enter product name (or press Enter for '{}'): ", defaults.name),
            &defaults.name,
        )?;
        let code = self.console.text_or(
            &format!("Enter product code (or press Enter for '{}'): ", defaults.code),
            &defaults.code,
        )?;
        let sales = self.console.number(&format!(
            "Enter sales price (or press Enter for {:.2}): ",
            defaults.sales_price
        ))?;
        let cost = self.console.number(&format!(
            "Enter cost price (or press Enter for {:.2}): ",
            defaults.cost_price
        ))?;
        let (sales_price, cost_price) = match (sales, cost) {
            (Ok(sales), Ok(cost)) => (
                sales.unwrap_or(defaults.sales_price),
                cost.unwrap_or(defaults.cost_price),
            ),
            _ => {
                self.console.say("Invalid price format. Using default values.")?;
                (defaults.sales_price, defaults.cost_price)
            }
        };

        let product = NewProduct {
            name,
            code,
            sales_price,
            cost_price,
        };
        match create_product(self.session, &product) {
            Ok(created) => {
                self.console.say(&created)?;
                Ok(Some(created.id))
            }
            Err(err) => {
                self.report_error("creating product", err)?;
                Ok(None)
            }
        }
    }

    fn add_to_warehouses(&mut self) -> io::Result<()> {
        let warehouses = match list_warehouses(self.session) {
            Ok(warehouses) if warehouses.is_empty() => {
                return self.console.say("No warehouses found");
            }
            Ok(warehouses) => warehouses,
            Err(err) => return self.report_error("listing warehouses", err),
        };
        self.console.say("\nAvailable warehouses:")?;
        for warehouse in &warehouses {
            self.console.say(format_args!("  - {warehouse}"))?;
        }
        match internal_locations(self.session) {
            Ok(locations) => {
                self.console.say("\nAvailable stock locations:")?;
                for location in &locations {
                    self.console.say(format_args!("  - {location}"))?;
                }
            }
            Err(err) => self.report_error("listing stock locations", err)?,
        }

        let products = self.inspect_products()?;
        if products.is_empty() {
            return self.console.say("No products found");
        }
        let labels: Vec<String> = products
            .iter()
            .map(|(id, name)| format!("{name} (ID: {id})"))
            .collect();
        let Some(index) = self.console.select(
            "Select a product to add to warehouses:",
            &labels,
            "Enter product number: ",
        )?
        else {
            return Ok(());
        };
        let product = products[index].0;

        for warehouse in &warehouses {
            let Some(location) = &warehouse.stock_location else {
                continue;
            };
            let default = self.defaults.stock_quantity;
            let prompt = format!(
                "Enter quantity to add to {} (leave empty for {default}): ",
                warehouse.name
            );
            let quantity = self.console.quantity_or(&prompt, default)?;
            self.stock(product, location.id, quantity)?;
        }
        Ok(())
    }

    /// Add stock at one location and print the attempt diagnostics.
    pub(crate) fn stock(
        &mut self,
        product: RemoteId,
        location: RemoteId,
        quantity: f64,
    ) -> io::Result<bool> {
        match add_product_to_location(self.session, product, location, quantity) {
            Ok(report) => {
                self.console.say(&report)?;
                Ok(report.is_success())
            }
            Err(err) => {
                self.report_error("adding inventory", err)?;
                Ok(false)
            }
        }
    }

    fn process_sale(&mut self) -> io::Result<()> {
        let products = self.inspect_products()?;
        if products.is_empty() {
            return self.console.say("No products found");
        }
        let labels: Vec<String> = products
            .iter()
            .map(|(id, name)| format!("{name} (ID: {id})"))
            .collect();
        let Some(index) = self
            .console
            .select("Select a product to sell:", &labels, "Enter product number: ")?
        else {
            return Ok(());
        };
        let product = products[index].0;

        let customer = match resolve_customer(self.session, &CustomerTemplate::default()) {
            Ok(resolution) => {
                self.console.say(&resolution)?;
                resolution.customer
            }
            Err(err) => {
                self.report_error("finding a customer", err)?;
                return self.console.say("Could not create or find a customer");
            }
        };

        let warehouses = match list_warehouses(self.session) {
            Ok(warehouses) if warehouses.is_empty() => {
                return self.console.say("No warehouses found");
            }
            Ok(warehouses) => warehouses,
            Err(err) => return self.report_error("listing warehouses", err),
        };
        let labels: Vec<String> = warehouses
            .iter()
            .map(|w| format!("{} (ID: {})", w.name, w.id))
            .collect();
        let Some(index) = self.console.select(
            "Select a warehouse for the sale:",
            &labels,
            "Enter warehouse number: ",
        )?
        else {
            return Ok(());
        };

        let quantity = self.console.quantity_or(
            &format!("Enter quantity to sell (leave empty for {DEFAULT_SALE_QUANTITY}): "),
            DEFAULT_SALE_QUANTITY,
        )?;
        self.sell(SaleRequest {
            product,
            customer,
            warehouse: Some(warehouses[index].id),
            quantity,
        })
    }

    pub(crate) fn sell(&mut self, request: SaleRequest) -> io::Result<()> {
        self.console.say(format_args!(
            "\n--- CREATING SALE ORDER FOR PRODUCT (ID: {}) ---",
            request.product
        ))?;
        match create_sale_order(self.session, &request) {
            Ok(receipt) => self.console.say(&receipt),
            Err(err) => self.report_error("creating sale order", err),
        }
    }

    /// Check the user's rights, then create internal locations from a
    /// comma-separated list of names.
    fn create_stock_locations(&mut self) -> io::Result<()> {
        self.console.say("\n--- CREATING STOCK LOCATIONS ---")?;
        match check_permissions(self.session) {
            Ok(check) => self.console.say(check)?,
            Err(err) => self.report_error("checking permissions", err)?,
        }
        let Some(answer) = self
            .console
            .ask("Enter location names, separated by commas: ")?
        else {
            return Ok(());
        };
        let names: Vec<&str> = answer
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return self.console.say("No location names given.");
        }

        match create_locations(self.session, &names) {
            Ok(batch) => {
                for created in &batch.created {
                    self.console.say(format_args!("\n{created}"))?;
                }
                self.console.say(format_args!("\n{batch}"))?;
            }
            Err(err) => return self.report_error("creating stock locations", err),
        }
        match internal_locations(self.session) {
            Ok(locations) => {
                self.console
                    .say(format_args!("\nFound {} internal stock locations:", locations.len()))?;
                for location in &locations {
                    self.console.say(format_args!("  - {location}"))?;
                }
                Ok(())
            }
            Err(err) => self.report_error("listing stock locations", err),
        }
    }

    pub(crate) fn inventory_report(&mut self) -> io::Result<()> {
        self.console.say("\n--- GENERATING INVENTORY REPORT ---")?;
        match inventory_report(self.session) {
            Ok(report) => self.console.say(report),
            Err(err) => self.report_error("generating inventory report", err),
        }
    }

    pub(crate) fn sales_report(&mut self) -> io::Result<()> {
        self.console.say("\n--- GENERATING SALES REPORT ---")?;
        match generate_sales_report(self.session) {
            Ok(outcome) => self.console.say(outcome),
            Err(err) => self.report_error("generating sales report", err),
        }
    }
}
