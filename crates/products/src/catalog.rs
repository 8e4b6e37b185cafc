//! Read side of the product façade.

use std::fmt;

use tracing::info;

use erplink_core::{CallOptions, Record, RecordExt, RemoteId, SearchDomain};
use erplink_rpc::{Gateway, Session};

use crate::error::ProductError;

pub const PRODUCT_MODEL: &str = "product.product";

/// Fields shown when listing products; filtered through the field catalog.
pub(crate) const SUMMARY_FIELDS: [&str; 7] = [
    "id",
    "name",
    "default_code",
    "type",
    "categ_id",
    "list_price",
    "standard_price",
];

/// A product as listed to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: RemoteId,
    pub name: String,
    pub default_code: Option<String>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub list_price: Option<f64>,
    pub standard_price: Option<f64>,
}

impl ProductSummary {
    /// `None` when the record carries no id.
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id()?,
            name: record.text("name").unwrap_or_default().to_string(),
            default_code: record.text("default_code").map(str::to_string),
            product_type: record.text("type").map(str::to_string),
            category: record.reference("categ_id").map(|c| c.name),
            list_price: record.number("list_price"),
            standard_price: record.number("standard_price"),
        })
    }
}

impl fmt::Display for ProductSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_na = |v: Option<&str>| v.unwrap_or("N/A").to_string();
        let money = |v: Option<f64>| v.map(|p| format!("{p:.2}")).unwrap_or_else(|| "N/A".into());
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Internal Reference: {}", or_na(self.default_code.as_deref()))?;
        writeln!(f, "Type: {}", or_na(self.product_type.as_deref()))?;
        writeln!(f, "Category: {}", or_na(self.category.as_deref()))?;
        writeln!(f, "Sales Price: {}", money(self.list_price))?;
        write!(f, "Cost: {}", money(self.standard_price))
    }
}

/// Every product, reading only the summary fields the remote has.
pub fn list_products<G: Gateway>(
    session: &Session<G>,
) -> Result<Vec<ProductSummary>, ProductError> {
    let fields = session.known_fields(PRODUCT_MODEL, &SUMMARY_FIELDS)?;
    let records = session.search_read(
        PRODUCT_MODEL,
        &SearchDomain::all(),
        &CallOptions::new().fields(fields),
    )?;
    let products: Vec<_> = records.iter().filter_map(ProductSummary::from_record).collect();
    info!(count = products.len(), "listed products");
    Ok(products)
}

/// One product by id, `None` when it does not exist.
pub fn read_product<G: Gateway>(
    session: &Session<G>,
    id: RemoteId,
) -> Result<Option<ProductSummary>, ProductError> {
    let fields = session.known_fields(PRODUCT_MODEL, &SUMMARY_FIELDS)?;
    let records = session.read(PRODUCT_MODEL, &[id], &fields)?;
    Ok(records.first().and_then(ProductSummary::from_record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use erplink_core::Fault;
    use erplink_rpc::in_memory::{InMemoryErp, ModelSpec, standard_install};
    use serde_json::json;

    #[test]
    fn lists_products_with_category_names() {
        let erp = standard_install();
        let cat = erp.insert("product.category", json!({"name": "Liquor"})).unwrap();
        erp.insert(
            "product.product",
            json!({
                "name": "Gin",
                "default_code": "GIN1",
                "categ_id": cat.get(),
                "list_price": 20.0,
            }),
        )
        .unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let products = list_products(&session).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Gin");
        assert_eq!(products[0].category.as_deref(), Some("Liquor"));
        assert_eq!(products[0].default_code.as_deref(), Some("GIN1"));
        assert!(products[0].to_string().contains("Sales Price: 20.00"));
    }

    #[test]
    fn fields_missing_from_the_schema_are_not_requested() {
        let erp = InMemoryErp::new().with_model(ModelSpec::new("product.product").char("name"));
        erp.insert("product.product", json!({"name": "Tonic"})).unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let products = list_products(&session).unwrap();
        assert_eq!(products[0].product_type, None);

        let calls = session.gateway().calls();
        let read = calls.iter().find(|c| c.method == "search_read").unwrap();
        assert_eq!(read.options.fields, Some(vec!["name".to_string()]));
    }

    #[test]
    fn transport_fault_surfaces_as_error() {
        let erp = standard_install();
        erp.fail("product.product", "*", Fault::transport("timed out"));
        let session = Session::new(erp, RemoteId::new(2));
        assert!(matches!(
            list_products(&session),
            Err(ProductError::Remote(Fault::Transport(_)))
        ));
    }
}
