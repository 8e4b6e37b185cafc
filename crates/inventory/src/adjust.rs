//! Setting a product's on-hand quantity at one location.
//!
//! Installs differ in which inventory models they expose and which of them
//! accept direct writes, so the adjustment is an [`OperationIntent`] with four
//! strategies tried in order:
//!
//! 1. `update-existing-quant`: add to the quant already stored for the pair
//! 2. `create-quant`: create a quant holding the quantity
//! 3. `change-quantity-wizard`: `stock.change.product.qty` then `change_product_qty`
//! 4. `scrap-workaround`: a negative `stock.scrap` then `action_validate`
//!
//! An existing quant is incremented; a new one starts at the given quantity.
//! The wizard sets an absolute quantity, replacing whatever was on hand.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{info, warn};

use erplink_core::{CallOptions, RecordExt, RemoteId, RemoteResult, SearchDomain};
use erplink_executor::{
    AdaptiveExecutor, AttemptError, AttemptResult, OperationIntent, Strategy, StrategyOutcome,
};
use erplink_rpc::{Gateway, Session};

use crate::error::InventoryError;

const QUANT_MODEL: &str = "stock.quant";
const WIZARD_MODEL: &str = "stock.change.product.qty";
const SCRAP_MODEL: &str = "stock.scrap";

/// Put `quantity` of `product` at `location`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetInventoryQuantity {
    pub product: RemoteId,
    pub location: RemoteId,
    pub quantity: f64,
}

/// How the winning strategy changed stock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjustmentMode {
    /// Existing quant incremented from `previous`.
    Incremented { previous: f64 },
    /// New quant created at the requested quantity.
    Created,
    /// Quantity set to an absolute value by the wizard. `replaced` is the
    /// quantity a readable quant held beforehand.
    SetAbsolute { replaced: Option<f64> },
    /// Negative scrap validated at the location.
    Scrapped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    /// The quant, wizard or scrap record the strategy wrote.
    pub record: RemoteId,
    pub mode: AdjustmentMode,
    /// Quantity on hand afterwards, when the strategy knows it.
    pub resulting: Option<f64>,
}

impl SetInventoryQuantity {
    fn pair_domain(&self) -> SearchDomain {
        SearchDomain::all()
            .eq("product_id", self.product)
            .eq("location_id", self.location)
    }

    fn existing_quant<G: Gateway>(
        &self,
        session: &Session<G>,
    ) -> RemoteResult<Option<(RemoteId, f64)>> {
        let quants = session.search_read(
            QUANT_MODEL,
            &self.pair_domain(),
            &CallOptions::new().fields(["id", "quantity"]).limit(1),
        )?;
        Ok(quants
            .first()
            .and_then(|q| Some((q.id()?, q.number("quantity").unwrap_or(0.0)))))
    }

    fn update_existing_quant<G: Gateway>(
        &self,
        session: &Session<G>,
    ) -> AttemptResult<Adjustment> {
        let Some((quant, current)) = self.existing_quant(session)? else {
            return Err(AttemptError::declined(
                "no quant stored for this product and location",
            ));
        };
        let total = current + self.quantity;
        let mut values = Map::new();
        values.insert("quantity".into(), Value::from(total));
        session.write(QUANT_MODEL, &[quant], values)?;
        info!(quant = %quant, previous = current, total, "updated existing quant");
        Ok(Adjustment {
            record: quant,
            mode: AdjustmentMode::Incremented { previous: current },
            resulting: Some(total),
        })
    }

    fn create_quant<G: Gateway>(&self, session: &Session<G>) -> AttemptResult<Adjustment> {
        if self.existing_quant(session)?.is_some() {
            return Err(AttemptError::declined(
                "a quant already exists for this product and location",
            ));
        }
        let mut values = Map::new();
        values.insert("product_id".into(), Value::from(self.product));
        values.insert("location_id".into(), Value::from(self.location));
        values.insert("quantity".into(), Value::from(self.quantity));
        if let Some(company) = best_effort("company", default_company(session))? {
            values.insert("company_id".into(), Value::from(company));
        }
        if let Some(owner) = best_effort("owner", user_partner(session))? {
            values.insert("owner_id".into(), Value::from(owner));
        }

        let quant = session.create(QUANT_MODEL, values)?;
        info!(quant = %quant, quantity = self.quantity, "created quant");
        Ok(Adjustment {
            record: quant,
            mode: AdjustmentMode::Created,
            resulting: Some(self.quantity),
        })
    }

    fn change_quantity_wizard<G: Gateway>(
        &self,
        session: &Session<G>,
    ) -> AttemptResult<Adjustment> {
        let replaced = best_effort("existing quantity", self.existing_quant(session))?
            .map(|(_, quantity)| quantity);
        let mut values = Map::new();
        values.insert("product_id".into(), Value::from(self.product));
        values.insert("new_quantity".into(), Value::from(self.quantity));
        if session.has_field(WIZARD_MODEL, "location_id")? {
            values.insert("location_id".into(), Value::from(self.location));
        }
        let wizard = session.create(WIZARD_MODEL, values)?;
        Ok(Adjustment {
            record: wizard,
            mode: AdjustmentMode::SetAbsolute { replaced },
            resulting: Some(self.quantity),
        })
    }

    fn scrap_workaround<G: Gateway>(&self, session: &Session<G>) -> AttemptResult<Adjustment> {
        let mut values = Map::new();
        values.insert("product_id".into(), Value::from(self.product));
        values.insert("scrap_qty".into(), Value::from(-self.quantity));
        values.insert("location_id".into(), Value::from(self.location));
        values.insert("scrap_location_id".into(), Value::from(self.location));
        let scrap = session.create(SCRAP_MODEL, values)?;
        Ok(Adjustment {
            record: scrap,
            mode: AdjustmentMode::Scrapped,
            resulting: None,
        })
    }
}

impl OperationIntent for SetInventoryQuantity {
    type Output = Adjustment;

    fn name(&self) -> &'static str {
        "set-inventory-quantity"
    }

    fn candidate_models(&self) -> Vec<&'static str> {
        vec![QUANT_MODEL, WIZARD_MODEL, SCRAP_MODEL]
    }

    fn strategies<'a, G: Gateway + 'a>(&'a self) -> Vec<Strategy<'a, G, Adjustment>> {
        vec![
            Strategy::new("update-existing-quant", move |s| self.update_existing_quant(s))
                .requires(QUANT_MODEL),
            Strategy::new("create-quant", move |s| self.create_quant(s)).requires(QUANT_MODEL),
            Strategy::new("change-quantity-wizard", move |s| self.change_quantity_wizard(s))
                .requires(WIZARD_MODEL)
                .then(|s, adjustment: &Adjustment| {
                    s.call_on(WIZARD_MODEL, "change_product_qty", &[adjustment.record])
                        .map(|_| ())
                }),
            Strategy::new("scrap-workaround", move |s| self.scrap_workaround(s))
                .requires(SCRAP_MODEL)
                .then(|s, adjustment: &Adjustment| {
                    s.call_on(SCRAP_MODEL, "action_validate", &[adjustment.record])
                        .map(|_| ())
                }),
        ]
    }
}

/// Optional lookups: a non-fatal fault means "leave the field out".
fn best_effort<T>(what: &str, result: RemoteResult<Option<T>>) -> RemoteResult<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(fault) if fault.is_fatal() => Err(fault),
        Err(fault) => {
            warn!(error = %fault, "could not determine {what}");
            Ok(None)
        }
    }
}

fn default_company<G: Gateway>(session: &Session<G>) -> RemoteResult<Option<RemoteId>> {
    let companies = session.search("res.company", &SearchDomain::all(), Some(1))?;
    Ok(companies.first().copied())
}

fn user_partner<G: Gateway>(session: &Session<G>) -> RemoteResult<Option<RemoteId>> {
    let users = session.read("res.users", &[session.uid()], &["partner_id"])?;
    Ok(users
        .first()
        .and_then(|u| u.reference("partner_id"))
        .map(|p| p.id))
}

/// Outcome of [`add_product_to_location`] with per-attempt diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdjustmentReport {
    pub product_name: String,
    pub request: SetInventoryQuantity,
    pub outcome: StrategyOutcome<Adjustment>,
}

impl StockAdjustmentReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

impl fmt::Display for StockAdjustmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request = &self.request;
        writeln!(
            f,
            "Adding {} x {} (ID: {}) to location {}",
            request.quantity, self.product_name, request.product, request.location
        )?;
        for skipped in &self.outcome.skipped {
            writeln!(f, "  - {skipped}: skipped, model not available")?;
        }
        for failure in &self.outcome.failures {
            writeln!(f, "  - {}: {}", failure.strategy, failure.error)?;
        }
        match &self.outcome.succeeded {
            Some(success) => {
                write!(f, "  + {}: ", success.strategy)?;
                match (success.value.mode, success.value.resulting) {
                    (AdjustmentMode::Incremented { previous }, Some(total)) => {
                        write!(f, "added {} to {previous}, new total {total}", request.quantity)
                    }
                    (AdjustmentMode::SetAbsolute { replaced: Some(previous) }, Some(total))
                        if previous != 0.0 =>
                    {
                        let note = format!("replaced {previous}, not added");
                        write!(f, "quantity on hand is now {total} ({note})")
                    }
                    (_, Some(total)) => write!(f, "quantity on hand is now {total}"),
                    (_, None) => write!(f, "added {} units", request.quantity),
                }
            }
            None => write!(f, "All inventory adjustment methods failed"),
        }
    }
}

/// Put `quantity` of `product` at `location` using the first strategy the
/// remote accepts.
///
/// `Ok` is returned whether or not a strategy succeeded; check
/// [`StockAdjustmentReport::is_success`]. Transport and auth faults are `Err`.
pub fn add_product_to_location<G: Gateway>(
    session: &Session<G>,
    product: RemoteId,
    location: RemoteId,
    quantity: f64,
) -> Result<StockAdjustmentReport, InventoryError> {
    if !quantity.is_finite() {
        return Err(InventoryError::InvalidQuantity(quantity.to_string()));
    }

    let product_name = match session.read("product.product", &[product], &["name"]) {
        Ok(rows) => rows.first().and_then(|r| r.text("name").map(str::to_string)),
        Err(fault) if fault.is_fatal() => return Err(fault.into()),
        Err(fault) => {
            warn!(product = %product, error = %fault, "could not read product name");
            None
        }
    }
    .unwrap_or_else(|| format!("Product ID {product}"));

    let request = SetInventoryQuantity {
        product,
        location,
        quantity,
    };
    info!(product = %product, location = %location, quantity, "adjusting inventory");
    let outcome = AdaptiveExecutor::new(session).run(&request)?;
    if !outcome.is_success() {
        warn!(product = %product, location = %location, "all inventory adjustment methods failed");
    }
    Ok(StockAdjustmentReport {
        product_name,
        request,
        outcome,
    })
}
