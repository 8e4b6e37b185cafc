//! Inventory façade.
//!
//! Warehouses and stock locations, creating new internal locations, setting a
//! product's on-hand quantity at a location through ordered fallback
//! strategies, and the stock report.

pub mod adjust;
pub mod error;
pub mod location;
pub mod report;
pub mod warehouse;

pub use adjust::{
    Adjustment, AdjustmentMode, SetInventoryQuantity, StockAdjustmentReport,
    add_product_to_location,
};
pub use error::InventoryError;
pub use location::{
    CreatedLocation, InventoryGroup, LocationBatch, ParentLocation, PermissionCheck,
    ResolveParentLocation, check_permissions, create_locations, create_stock_location,
};
pub use report::{InventoryReport, LocationStock, StockLine, inventory_report};
pub use warehouse::{
    StockLocation, Warehouse, internal_locations, list_locations, list_warehouses,
};
