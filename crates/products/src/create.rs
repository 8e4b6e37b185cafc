//! Product creation with schema-aware payloads.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{info, warn};

use erplink_core::{CallOptions, RecordExt, RemoteId, RemoteResult, SearchDomain};
use erplink_executor::{AdaptiveExecutor, AttemptResult, OperationIntent, Strategy};
use erplink_rpc::{Gateway, ModelFields, Session};

use crate::catalog::{PRODUCT_MODEL, ProductSummary, read_product};
use crate::error::ProductError;

const CATEGORY_MODEL: &str = "product.category";
const PREFERRED_CATEGORIES: [&str; 4] = ["Goods", "Beverages", "Alcoholic Beverages", "Liquor"];
const PREFERRED_UNITS: [&str; 4] = ["Units", "Unit(s)", "Bottles", "Bottle(s)"];
const PREFERRED_TYPES: [&str; 2] = ["product", "stockable"];
const DEFAULT_TYPE: &str = "product";

/// Operator input for a new product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub code: String,
    pub sales_price: f64,
    pub cost_price: f64,
}

impl NewProduct {
    fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::InvalidInput("product name is empty".into()));
        }
        let prices = [("sales price", self.sales_price), ("cost price", self.cost_price)];
        for (label, price) in prices {
            if !price.is_finite() || price < 0.0 {
                return Err(ProductError::InvalidInput(format!(
                    "{label} must be a non-negative number, got {price}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: RemoteId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOfMeasure {
    pub id: RemoteId,
    pub name: String,
}

impl UnitOfMeasure {
    /// Used when neither unit model answers: id 1 is "Units" on stock installs.
    pub fn builtin() -> Self {
        Self {
            id: RemoteId::new(1),
            name: "Units".into(),
        }
    }
}

/// First category whose name contains a preferred word, else the first one.
pub fn pick_category(categories: &[Category]) -> Option<&Category> {
    categories
        .iter()
        .find(|c| PREFERRED_CATEGORIES.iter().any(|p| c.name.contains(p)))
        .or_else(|| categories.first())
}

/// First unit named exactly like a preferred unit, else the first one.
pub fn pick_unit(units: &[UnitOfMeasure]) -> Option<&UnitOfMeasure> {
    units
        .iter()
        .find(|u| PREFERRED_UNITS.contains(&u.name.as_str()))
        .or_else(|| units.first())
}

/// List units of measure from whichever unit model the install has.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolveUnitOfMeasure;

const UOM_MODEL: &str = "uom.uom";
const LEGACY_UOM_MODEL: &str = "product.uom";

impl ResolveUnitOfMeasure {
    fn units_from<G: Gateway>(
        session: &Session<G>,
        model: &str,
    ) -> AttemptResult<Vec<UnitOfMeasure>> {
        let rows = session.search_read(
            model,
            &SearchDomain::all(),
            &CallOptions::new().fields(["id", "name"]),
        )?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(UnitOfMeasure {
                    id: row.id()?,
                    name: row.text("name").unwrap_or_default().to_string(),
                })
            })
            .collect())
    }
}

impl OperationIntent for ResolveUnitOfMeasure {
    type Output = Vec<UnitOfMeasure>;

    fn name(&self) -> &'static str {
        "resolve-unit-of-measure"
    }

    fn candidate_models(&self) -> Vec<&'static str> {
        vec![UOM_MODEL, LEGACY_UOM_MODEL]
    }

    fn strategies<'a, G: Gateway + 'a>(&'a self) -> Vec<Strategy<'a, G, Self::Output>> {
        vec![
            Strategy::new(UOM_MODEL, |s| Self::units_from(s, UOM_MODEL)).requires(UOM_MODEL),
            Strategy::new(LEGACY_UOM_MODEL, |s| Self::units_from(s, LEGACY_UOM_MODEL))
                .requires(LEGACY_UOM_MODEL),
        ]
    }
}

/// What [`create_product`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedProduct {
    pub id: RemoteId,
    pub category: Option<Category>,
    pub unit: Option<UnitOfMeasure>,
    /// The values sent to `create`.
    pub payload: Map<String, Value>,
    /// The record as read back; `None` when the read-back failed.
    pub record: Option<ProductSummary>,
}

impl fmt::Display for CreatedProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created product ID: {}", self.id)?;
        if let Some(category) = &self.category {
            writeln!(f, "Category: {} (ID: {})", category.name, category.id)?;
        }
        if let Some(unit) = &self.unit {
            writeln!(f, "Unit of Measure: {} (ID: {})", unit.name, unit.id)?;
        }
        match &self.record {
            Some(record) => write!(f, "{record}"),
            None => write!(f, "(product details could not be read back)"),
        }
    }
}

/// Create a product, naming only fields the remote schema has.
///
/// Category and unit lookups degrade to "none"; a non-fatal failure to load
/// the product schema omits every optional field. Only the `create` call
/// itself and fatal faults fail the operation.
pub fn create_product<G: Gateway>(
    session: &Session<G>,
    product: &NewProduct,
) -> Result<CreatedProduct, ProductError> {
    product.validate()?;

    let categories = tolerate("product categories", list_categories(session))?;
    let category = pick_category(&categories).cloned();

    let units = AdaptiveExecutor::new(session)
        .run(&ResolveUnitOfMeasure)?
        .into_value()
        .unwrap_or_else(|| vec![UnitOfMeasure::builtin()]);
    let unit = pick_unit(&units).cloned();

    let schema = match session.model_fields(PRODUCT_MODEL) {
        Ok(fields) => Some(fields),
        Err(fault) if fault.is_fatal() => return Err(fault.into()),
        Err(fault) => {
            warn!(error = %fault, "product schema unavailable, omitting optional fields");
            None
        }
    };

    let payload = build_payload(product, category.as_ref(), unit.as_ref(), schema.as_deref());
    info!(name = %product.name, fields = ?payload.keys().collect::<Vec<_>>(), "creating product");
    let id = session
        .create(PRODUCT_MODEL, payload.clone())
        .map_err(|fault| match fault {
            f if f.is_fatal() => ProductError::Remote(f),
            f => ProductError::CreationRejected(f),
        })?;
    info!(id = %id, "product created");

    let record = match read_product(session, id) {
        Ok(record) => record,
        Err(err) => {
            warn!(id = %id, error = %err, "could not read back created product");
            None
        }
    };

    Ok(CreatedProduct {
        id,
        category,
        unit,
        payload,
        record,
    })
}

fn list_categories<G: Gateway>(session: &Session<G>) -> RemoteResult<Vec<Category>> {
    let rows = session.search_read(
        CATEGORY_MODEL,
        &SearchDomain::all(),
        &CallOptions::new().fields(["id", "name", "complete_name"]),
    )?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(Category {
                id: row.id()?,
                name: row.text("name").unwrap_or_default().to_string(),
            })
        })
        .collect())
}

/// Non-fatal lookup failures become an empty list.
fn tolerate<T>(what: &str, result: RemoteResult<Vec<T>>) -> Result<Vec<T>, ProductError> {
    match result {
        Ok(items) => Ok(items),
        Err(fault) if fault.is_fatal() => Err(fault.into()),
        Err(fault) => {
            warn!(error = %fault, "could not load {what}");
            Ok(Vec::new())
        }
    }
}

fn product_type(schema: &ModelFields) -> Option<String> {
    let field = schema.get("type")?;
    let chosen = field
        .selection
        .iter()
        .find(|(value, _)| PREFERRED_TYPES.contains(&value.as_str()))
        .or_else(|| field.selection.first())
        .map(|(value, _)| value.clone());
    Some(chosen.unwrap_or_else(|| DEFAULT_TYPE.to_string()))
}

fn build_payload(
    product: &NewProduct,
    category: Option<&Category>,
    unit: Option<&UnitOfMeasure>,
    schema: Option<&ModelFields>,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("name".into(), Value::from(product.name.clone()));
    if let Some(category) = category {
        payload.insert("categ_id".into(), Value::from(category.id));
    }
    payload.insert("default_code".into(), Value::from(product.code.clone()));
    payload.insert("list_price".into(), Value::from(product.sales_price));
    payload.insert("standard_price".into(), Value::from(product.cost_price));

    let Some(schema) = schema else {
        return payload;
    };
    if let Some(kind) = product_type(schema) {
        payload.insert("type".into(), Value::from(kind));
    }
    for flag in ["sale_ok", "purchase_ok"] {
        if schema.contains(flag) {
            payload.insert(flag.into(), Value::Bool(true));
        }
    }
    if let Some(unit) = unit {
        for field in ["uom_id", "uom_po_id"] {
            if schema.contains(field) {
                payload.insert(field.into(), Value::from(unit.id));
            }
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use erplink_core::Fault;
    use erplink_rpc::in_memory::{FieldKind, InMemoryErp, ModelSpec, standard_install};
    use serde_json::json;

    fn whiskey() -> NewProduct {
        NewProduct {
            name: "Premium Whiskey".into(),
            code: "WHISKY001".into(),
            sales_price: 45.99,
            cost_price: 30.0,
        }
    }

    fn keys(payload: &Map<String, Value>) -> Vec<&str> {
        let mut keys: Vec<_> = payload.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn full_schema_gets_every_optional_field() {
        let erp = standard_install();
        erp.insert("product.category", json!({"name": "All"})).unwrap();
        let liquor = erp.insert("product.category", json!({"name": "Liquor"})).unwrap();
        erp.insert("uom.uom", json!({"name": "Dozens"})).unwrap();
        let units = erp.insert("uom.uom", json!({"name": "Units"})).unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let created = create_product(&session, &whiskey()).unwrap();

        assert_eq!(created.category.as_ref().map(|c| c.id), Some(liquor));
        assert_eq!(created.unit.as_ref().map(|u| u.id), Some(units));
        assert_eq!(created.payload["type"], json!("product"));
        assert_eq!(created.payload["uom_po_id"], json!(units.get()));
        assert_eq!(
            keys(&created.payload),
            vec![
                "categ_id", "default_code", "list_price", "name", "purchase_ok", "sale_ok",
                "standard_price", "type", "uom_id", "uom_po_id",
            ]
        );
        let record = created.record.unwrap();
        assert_eq!(record.name, "Premium Whiskey");
        assert_eq!(record.category.as_deref(), Some("Liquor"));
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let erp = InMemoryErp::new()
            .with_model(ModelSpec::new("product.category").char("name"))
            .with_model(ModelSpec::new("uom.uom").char("name"))
            .with_model(
                ModelSpec::new("product.product")
                    .char("name")
                    .char("default_code")
                    .float("list_price")
                    .float("standard_price")
                    .many2one("categ_id", "product.category"),
            );
        erp.insert("uom.uom", json!({"name": "Units"})).unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let created = create_product(&session, &whiskey()).unwrap();

        assert!(created.unit.is_some());
        assert_eq!(
            keys(&created.payload),
            vec!["default_code", "list_price", "name", "standard_price"]
        );
    }

    #[test]
    fn legacy_unit_model_then_builtin_unit() {
        let erp = standard_install();
        erp.remove_model("uom.uom");
        erp.add_model(ModelSpec::new("product.uom").char("name"));
        let bottles = erp.insert("product.uom", json!({"name": "Bottles"})).unwrap();
        let session = Session::new(erp, RemoteId::new(2));
        let created = create_product(&session, &whiskey()).unwrap();
        assert_eq!(created.unit.map(|u| u.id), Some(bottles));

        let erp = InMemoryErp::new().with_model(
            ModelSpec::new("product.product")
                .char("name")
                .char("default_code")
                .float("list_price")
                .float("standard_price"),
        );
        let session = Session::new(erp, RemoteId::new(2));
        let created = create_product(&session, &whiskey()).unwrap();
        assert_eq!(created.unit, Some(UnitOfMeasure::builtin()));
        assert_eq!(created.category, None);
    }

    #[test]
    fn type_falls_back_to_first_option_or_default() {
        let schema_of = |spec: ModelSpec| {
            let erp = InMemoryErp::new().with_model(spec);
            Session::new(erp, RemoteId::new(2))
                .model_fields(PRODUCT_MODEL)
                .unwrap()
        };

        let with_options = schema_of(
            ModelSpec::new("product.product")
                .char("name")
                .selection("type", &[("consu", "Goods"), ("service", "Service")]),
        );
        assert_eq!(product_type(&with_options).as_deref(), Some("consu"));

        let no_options = schema_of(
            ModelSpec::new("product.product")
                .char("name")
                .field("type", FieldKind::Selection(Vec::new())),
        );
        assert_eq!(product_type(&no_options).as_deref(), Some("product"));

        let no_field = schema_of(ModelSpec::new("product.product").char("name"));
        assert_eq!(product_type(&no_field), None);
    }

    #[test]
    fn missing_unit_model_is_skipped_not_failed() {
        let erp = standard_install();
        erp.remove_model("uom.uom");
        erp.add_model(ModelSpec::new("product.uom").char("name"));
        erp.insert("product.uom", json!({"name": "Units"})).unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let outcome = AdaptiveExecutor::new(&session)
            .run(&ResolveUnitOfMeasure)
            .unwrap();

        assert_eq!(outcome.skipped, vec!["uom.uom"]);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.succeeded_strategy(), Some("product.uom"));
        assert_eq!(session.gateway().call_count("uom.uom", "search_read"), 0);
    }

    #[test]
    fn rejected_create_is_reported() {
        let erp = standard_install();
        erp.fail("product.product", "create", Fault::validation("The product code must be unique"));
        let session = Session::new(erp, RemoteId::new(2));
        assert!(matches!(
            create_product(&session, &whiskey()),
            Err(ProductError::CreationRejected(Fault::RemoteValidation(_)))
        ));
    }

    #[test]
    fn invalid_prices_are_rejected_before_any_call() {
        let session = Session::new(standard_install(), RemoteId::new(2));
        let product = NewProduct {
            sales_price: f64::NAN,
            ..whiskey()
        };
        assert!(matches!(
            create_product(&session, &product),
            Err(ProductError::InvalidInput(_))
        ));
        assert!(session.gateway().calls().is_empty());
    }

    #[test]
    fn preferred_names_win_over_list_order() {
        let unit = |id, name: &str| UnitOfMeasure {
            id: RemoteId::new(id),
            name: name.into(),
        };
        let units = vec![unit(4, "kg"), unit(9, "Unit(s)")];
        assert_eq!(pick_unit(&units).map(|u| u.id), Some(RemoteId::new(9)));

        let category = |id, name: &str| Category {
            id: RemoteId::new(id),
            name: name.into(),
        };
        let categories = vec![category(1, "All"), category(5, "All / Beverages")];
        assert_eq!(pick_category(&categories).map(|c| c.id), Some(RemoteId::new(5)));
        assert_eq!(pick_category(&categories[..1]).map(|c| c.id), Some(RemoteId::new(1)));
        assert_eq!(pick_category(&[]), None);
    }
}
