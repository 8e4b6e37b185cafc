//! Product schema inspection.

use std::fmt;

use serde_json::Value;
use tracing::{info, warn};

use erplink_core::{CallOptions, SearchDomain};
use erplink_rpc::fields::parse_selection;
use erplink_rpc::{FieldInfo, Gateway, Session};

use crate::catalog::PRODUCT_MODEL;
use crate::error::ProductError;

/// Fields an operator cares about when setting up products.
const IMPORTANT_FIELDS: [&str; 10] = [
    "name",
    "type",
    "categ_id",
    "default_code",
    "list_price",
    "standard_price",
    "uom_id",
    "purchase_ok",
    "sale_ok",
    "taxes_id",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescription {
    pub name: String,
    pub label: Option<String>,
    pub field_type: Option<String>,
    pub help: Option<String>,
    pub options: Vec<(String, String)>,
}

impl From<&FieldInfo> for FieldDescription {
    fn from(info: &FieldInfo) -> Self {
        Self {
            name: info.name.clone(),
            label: info.label.clone(),
            field_type: info.field_type.clone(),
            help: info.help.clone(),
            options: info.selection.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFieldReport {
    /// Important fields present on the remote, in display order.
    pub fields: Vec<FieldDescription>,
    /// Number of fields the remote reported for the product model.
    pub total_fields: usize,
    /// `type` options found through `ir.model.fields` when `fields_get`
    /// reported none.
    pub type_options_fallback: Vec<(String, String)>,
}

impl fmt::Display for ProductFieldReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Product Fields ({} reported):", self.total_fields)?;
        for field in &self.fields {
            writeln!(f)?;
            writeln!(f, "{}:", field.name)?;
            writeln!(f, "  Label: {}", field.label.as_deref().unwrap_or("N/A"))?;
            writeln!(f, "  Type: {}", field.field_type.as_deref().unwrap_or("N/A"))?;
            writeln!(f, "  Help: {}", field.help.as_deref().unwrap_or("N/A"))?;
            if !field.options.is_empty() {
                writeln!(f, "  Options:")?;
                for (value, label) in &field.options {
                    writeln!(f, "    - {value}: {label}")?;
                }
            }
        }
        if !self.type_options_fallback.is_empty() {
            writeln!(f)?;
            writeln!(f, "Product Type Field Options:")?;
            for (value, label) in &self.type_options_fallback {
                writeln!(f, "  - {value}: {label}")?;
            }
        }
        Ok(())
    }
}

/// Describe the important product fields the remote exposes.
///
/// When `type` comes back without options, they are looked up on
/// `product.template` through `ir.model.fields`; a failure there is logged
/// and leaves the fallback empty.
pub fn inspect_fields<G: Gateway>(
    session: &Session<G>,
) -> Result<ProductFieldReport, ProductError> {
    let catalog = session.model_fields(PRODUCT_MODEL)?;
    let fields: Vec<FieldDescription> = IMPORTANT_FIELDS
        .iter()
        .filter_map(|name| catalog.get(name))
        .map(FieldDescription::from)
        .collect();

    let type_options_fallback = match catalog.get("type") {
        Some(info) if info.selection.is_empty() => match type_options_from_registry(session) {
            Ok(options) => options,
            Err(fault) if fault.is_fatal() => return Err(fault.into()),
            Err(fault) => {
                warn!(error = %fault, "could not retrieve product type options");
                Vec::new()
            }
        },
        _ => Vec::new(),
    };

    info!(
        total = catalog.len(),
        important = fields.len(),
        "inspected product fields"
    );
    Ok(ProductFieldReport {
        fields,
        total_fields: catalog.len(),
        type_options_fallback,
    })
}

fn type_options_from_registry<G: Gateway>(
    session: &Session<G>,
) -> erplink_core::RemoteResult<Vec<(String, String)>> {
    let domain = SearchDomain::all()
        .eq("model", "product.template")
        .eq("name", "type");
    let rows = session.search_read(
        "ir.model.fields",
        &domain,
        &CallOptions::new().fields(["selection", "ttype"]).limit(1),
    )?;
    Ok(rows
        .first()
        .map(|row| {
            let selection = row.get("selection").filter(|v| !matches!(v, Value::Bool(false)));
            parse_selection(selection)
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use erplink_core::RemoteId;
    use erplink_rpc::in_memory::{FieldKind, InMemoryErp, ModelSpec, standard_install};
    use serde_json::json;

    #[test]
    fn reports_present_important_fields_with_options() {
        let session = Session::new(standard_install(), RemoteId::new(2));
        let report = inspect_fields(&session).unwrap();

        let names: Vec<_> = report.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "name",
                "type",
                "categ_id",
                "default_code",
                "list_price",
                "standard_price",
                "uom_id",
                "purchase_ok",
                "sale_ok",
            ]
        );
        let product_type = &report.fields[1];
        assert!(product_type.options.contains(&("product".into(), "Storable Product".into())));
        assert!(report.type_options_fallback.is_empty());
        assert!(report.to_string().contains("Price at which the product is sold"));
    }

    #[test]
    fn type_options_fall_back_to_the_field_registry() {
        let erp = InMemoryErp::new()
            .with_model(
                ModelSpec::new("product.product")
                    .char("name")
                    .field("type", FieldKind::Selection(Vec::new())),
            )
            .with_model(
                ModelSpec::new("ir.model.fields")
                    .char("model")
                    .char("name")
                    .char("ttype"),
            );
        erp.on("ir.model.fields", "search_read", |_, _| {
            Ok(json!([{
                "id": 7,
                "ttype": "selection",
                "selection": [["consu", "Goods"], ["service", "Service"]],
            }]))
        });
        let session = Session::new(erp, RemoteId::new(2));

        let report = inspect_fields(&session).unwrap();
        assert_eq!(
            report.type_options_fallback,
            vec![
                ("consu".to_string(), "Goods".to_string()),
                ("service".to_string(), "Service".to_string()),
            ]
        );
    }

    #[test]
    fn missing_registry_is_not_an_error() {
        let erp = InMemoryErp::new().with_model(
            ModelSpec::new("product.product")
                .char("name")
                .field("type", FieldKind::Selection(Vec::new())),
        );
        let session = Session::new(erp, RemoteId::new(2));

        let report = inspect_fields(&session).unwrap();
        assert!(report.type_options_fallback.is_empty());
        assert_eq!(report.fields.len(), 2);
    }
}
