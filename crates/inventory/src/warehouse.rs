//! Warehouses and the stock locations they hold.

use std::fmt;

use tracing::info;

use erplink_core::{CallOptions, Many2One, Record, RecordExt, RemoteId, SearchDomain};
use erplink_rpc::{Gateway, Session};

use crate::error::InventoryError;

pub const WAREHOUSE_MODEL: &str = "stock.warehouse";
pub const LOCATION_MODEL: &str = "stock.location";

const WAREHOUSE_FIELDS: [&str; 4] = ["id", "name", "code", "lot_stock_id"];
const LOCATION_FIELDS: [&str; 5] = ["id", "name", "complete_name", "usage", "location_id"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warehouse {
    pub id: RemoteId,
    pub name: String,
    pub code: Option<String>,
    /// The warehouse's main stock location (`lot_stock_id`).
    pub stock_location: Option<Many2One>,
}

impl Warehouse {
    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id()?,
            name: record.text("name").unwrap_or_default().to_string(),
            code: record.text("code").map(str::to_string),
            stock_location: record.reference("lot_stock_id"),
        })
    }
}

impl fmt::Display for Warehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Code: {}, Stock Location: ",
            self.id,
            self.name,
            self.code.as_deref().unwrap_or("N/A")
        )?;
        match &self.stock_location {
            Some(loc) => write!(f, "{} (ID: {})", loc.name, loc.id),
            None => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLocation {
    pub id: RemoteId,
    /// Full path when the remote provides it, else the short name.
    pub name: String,
    pub usage: Option<String>,
    pub parent: Option<Many2One>,
}

impl StockLocation {
    pub(crate) fn from_record(record: &Record) -> Option<Self> {
        let name = record
            .text("complete_name")
            .or_else(|| record.text("name"))
            .unwrap_or_default()
            .to_string();
        Some(Self {
            id: record.id()?,
            name,
            usage: record.text("usage").map(str::to_string),
            parent: record.reference("location_id"),
        })
    }

    pub fn is_internal(&self) -> bool {
        self.usage.as_deref() == Some("internal")
    }
}

impl fmt::Display for StockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Usage: {}",
            self.id,
            self.name,
            self.usage.as_deref().unwrap_or("N/A")
        )
    }
}

pub fn list_warehouses<G: Gateway>(
    session: &Session<G>,
) -> Result<Vec<Warehouse>, InventoryError> {
    let fields = session.known_fields(WAREHOUSE_MODEL, &WAREHOUSE_FIELDS)?;
    let rows = session.search_read(
        WAREHOUSE_MODEL,
        &SearchDomain::all(),
        &CallOptions::new().fields(fields),
    )?;
    let warehouses: Vec<_> = rows.iter().filter_map(Warehouse::from_record).collect();
    info!(count = warehouses.len(), "listed warehouses");
    Ok(warehouses)
}

/// Every stock location, whatever its usage.
pub fn list_locations<G: Gateway>(
    session: &Session<G>,
) -> Result<Vec<StockLocation>, InventoryError> {
    let fields = session.known_fields(LOCATION_MODEL, &LOCATION_FIELDS)?;
    let rows = session.search_read(
        LOCATION_MODEL,
        &SearchDomain::all(),
        &CallOptions::new().fields(fields),
    )?;
    Ok(rows.iter().filter_map(StockLocation::from_record).collect())
}

/// Physical locations only (`usage = internal`).
pub fn internal_locations<G: Gateway>(
    session: &Session<G>,
) -> Result<Vec<StockLocation>, InventoryError> {
    let mut locations = list_locations(session)?;
    locations.retain(StockLocation::is_internal);
    info!(count = locations.len(), "listed internal locations");
    Ok(locations)
}
