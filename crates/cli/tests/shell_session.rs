use erplink_cli::{ProductDefaults, Shell};
use erplink_core::{Fault, RemoteId};
use erplink_rpc::in_memory::standard_install;
use erplink_rpc::{InMemoryErp, Session};
use serde_json::{Value, json};

/// Two warehouses, each with its own internal stock location.
fn shop() -> InMemoryErp {
    let erp = standard_install();
    for (name, code) in [("Main Warehouse", "WH"), ("Annex", "AX")] {
        let location = erp
            .insert(
                "stock.location",
                json!({
                    "name": "Stock",
                    "complete_name": format!("{code}/Stock"),
                    "usage": "internal",
                }),
            )
            .expect("seed location");
        erp.insert(
            "stock.warehouse",
            json!({"name": name, "code": code, "lot_stock_id": location.get()}),
        )
        .expect("seed warehouse");
    }
    erp
}

fn run(session: &Session<InMemoryErp>, script: &str) -> String {
    let mut output = Vec::new();
    Shell::new(session, ProductDefaults::default(), script.as_bytes(), &mut output)
        .run()
        .expect("shell run");
    String::from_utf8(output).expect("utf-8 output")
}

fn quantities(erp: &InMemoryErp) -> Vec<f64> {
    erp.records("stock.quant")
        .into_iter()
        .filter_map(|(_, q)| q.get("quantity").and_then(Value::as_f64))
        .collect()
}

#[test]
fn complete_process_with_defaults() {
    let session = Session::new(shop(), RemoteId::new(2));

    let out = run(&session, "8\n\n\n\n\n0\n");

    let erp = session.gateway();
    let (_, product) = erp.records("product.product").remove(0);
    assert_eq!(product["name"], json!("Premium Whiskey"));
    assert_eq!(product["default_code"], json!("WHISKY001"));
    assert_eq!(quantities(erp), vec![15.0, 20.0]);

    let orders = erp.records("sale.order");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].1["state"], json!("sale"));
    assert_eq!(erp.records("res.partner").len(), 1);

    assert!(out.contains("Adding 15 units to Main Warehouse..."));
    assert!(out.contains("Adding 20 units to Annex..."));
    assert!(out.contains("Created new customer with ID: 1"));
    assert!(out.contains("Creating sale in warehouse: Main Warehouse"));
    assert!(out.contains("Consolidated Inventory Report:"));
    assert!(out.contains("Total number of orders: 1"));
    assert!(out.contains("--- COMPLETE PROCESS FINISHED ---"));
    assert!(out.trim_end().ends_with("Exiting. Thank you!"));
}

#[test]
fn complete_process_without_sales_skips_the_sale() {
    let erp = shop();
    erp.remove_model("sale.order");
    let session = Session::new(erp, RemoteId::new(2));

    let out = run(&session, "8\n\n\n\n\n");

    assert!(out.contains("Skipping sales process since sales module is not available."));
    assert!(out.contains("Location-wise Inventory Report:"));
    assert!(!out.contains("GENERATING SALES REPORT"));
    assert_eq!(quantities(session.gateway()), vec![15.0, 20.0]);
}

#[test]
fn stocking_prompts_per_warehouse() {
    let erp = shop();
    erp.insert("product.product", json!({"name": "Dry Gin"})).expect("seed product");
    let session = Session::new(erp, RemoteId::new(2));

    let out = run(&session, "4\n1\n\n7\n0\n");

    assert!(out.contains("WH/Stock"));
    assert!(out.contains("1. Dry Gin"));
    assert!(out.contains("Enter quantity to add to Annex (leave empty for 10): "));
    assert_eq!(quantities(session.gateway()), vec![10.0, 7.0]);
}

#[test]
fn processing_a_sale() {
    let erp = shop();
    erp.insert("product.product", json!({"name": "Dry Gin", "list_price": 20.0}))
        .expect("seed product");
    let session = Session::new(erp, RemoteId::new(2));

    let out = run(&session, "5\n1\n2\n3\n0\n");

    let erp = session.gateway();
    let (_, order) = erp.records("sale.order").remove(0);
    assert_eq!(order["amount_total"], json!(60.0));
    assert_eq!(order["warehouse_id"], json!(2));
    assert!(out.contains("Sale order confirmed"));
}

#[test]
fn sale_lists_the_existing_customers_it_chose_from() {
    let erp = shop();
    let acme = erp
        .insert("res.partner", json!({"name": "Acme Existing", "customer_rank": 2}))
        .expect("seed customer");
    erp.insert("product.product", json!({"name": "Dry Gin", "list_price": 20.0}))
        .expect("seed product");
    let session = Session::new(erp, RemoteId::new(2));

    let out = run(&session, "5\n1\n1\n\n0\n");

    assert!(out.contains("Existing customers:"));
    assert!(out.contains(&format!("  - ID: {acme}, Name: Acme Existing")));
    assert!(out.contains(&format!("Using customer ID: {acme}")));
    let (_, order) = session.gateway().records("sale.order").remove(0);
    assert_eq!(order["partner_id"], json!(acme.get()));
}

#[test]
fn failures_and_bad_input_return_to_the_menu() {
    let erp = shop();
    erp.fail("product.product", "*", Fault::transport("connection refused"));
    let session = Session::new(erp, RemoteId::new(2));

    let out = run(&session, "1\nfoo\n6\n0\n");

    assert!(out.contains("Error inspecting products: remote call failed: transport failure"));
    assert!(out.contains("Invalid choice. Please try again."));
    assert!(out.contains("No inventory"));
    assert_eq!(out.matches("Enter your choice (0-9): ").count(), 4);
}

#[test]
fn end_of_input_leaves_the_menu() {
    let session = Session::new(shop(), RemoteId::new(2));
    let out = run(&session, "42\n");
    assert!(out.contains("Invalid choice. Please try again."));
    assert!(!out.contains("Exiting. Thank you!"));
}

#[test]
fn creating_stock_locations_under_the_main_stock() {
    let erp = shop();
    let inventory = erp
        .insert("ir.module.category", json!({"name": "Inventory"}))
        .expect("seed category");
    let admin = erp
        .insert(
            "res.groups",
            json!({"name": "Administrator", "category_id": inventory.get()}),
        )
        .expect("seed group");
    let user = erp
        .insert("res.users", json!({"name": "Mitchell", "groups_id": [admin.get()]}))
        .expect("seed user");
    let session = Session::new(erp, user);

    let out = run(&session, "9\nNugegoda, Kottawa,,\n0\n");

    assert!(out.contains("Logged in as: Mitchell\nUser has inventory management permissions."));
    assert!(out.contains("Parent Location: WH/Stock (ID: 1)"));
    assert!(out.contains(
        "Summary of created locations:\n - Nugegoda (ID: 3)\n - Kottawa (ID: 4)"
    ));
    assert!(out.contains("Found 4 internal stock locations:"));
    let (_, kottawa) = session.gateway().records("stock.location").remove(3);
    assert_eq!(kottawa["location_id"], json!(1));
    assert_eq!(kottawa["usage"], json!("internal"));
}
