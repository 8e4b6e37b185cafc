//! Customer resolution: reuse an existing customer or create a sample one.

use std::fmt;

use serde_json::{Map, Value};
use tracing::info;

use erplink_core::{CallOptions, Record, RecordExt, RemoteId, SearchDomain};
use erplink_executor::{AdaptiveExecutor, AttemptResult, OperationIntent, Strategy};
use erplink_rpc::{Gateway, Session};

use crate::availability::check_sales_available;
use crate::error::SalesError;

const PARTNER_MODEL: &str = "res.partner";
const EXISTING_LIMIT: usize = 5;

/// How the install marks partners as customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerMarker {
    /// `customer_rank > 0`.
    Rank,
    /// The older boolean `customer` flag.
    LegacyFlag,
}

impl CustomerMarker {
    fn domain(self) -> SearchDomain {
        match self {
            CustomerMarker::Rank => SearchDomain::all().with("customer_rank", ">", 0),
            CustomerMarker::LegacyFlag => SearchDomain::all().eq("customer", true),
        }
    }

    fn mark(self, values: &mut Map<String, Value>) {
        match self {
            CustomerMarker::Rank => values.insert("customer_rank".into(), Value::from(1)),
            CustomerMarker::LegacyFlag => values.insert("customer".into(), Value::Bool(true)),
        };
    }
}

/// Values for the customer created when none exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerTemplate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Default for CustomerTemplate {
    fn default() -> Self {
        Self {
            name: "Sample Customer".into(),
            email: "sample@example.com".into(),
            phone: "+9412345678".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: RemoteId,
    pub name: String,
    pub email: Option<String>,
}

impl Customer {
    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id()?,
            name: record.text("name").unwrap_or_default().to_string(),
            email: record.text("email").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerResolution {
    pub customer: RemoteId,
    /// `true` when no customer existed and one was created.
    pub created: bool,
    /// Up to five existing customers found by the lookup.
    pub existing: Vec<Customer>,
    pub marker: CustomerMarker,
}

impl fmt::Display for CustomerResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let via = match self.marker {
            CustomerMarker::Rank => "",
            CustomerMarker::LegacyFlag => " (legacy customer flag)",
        };
        if self.created {
            return write!(f, "Created new customer with ID: {}{via}", self.customer);
        }
        write!(f, "Existing customers{via}:")?;
        for customer in &self.existing {
            write!(f, "\n  - ID: {}, Name: {}", customer.id, customer.name)?;
        }
        write!(f, "\nUsing customer ID: {}", self.customer)
    }
}

/// Find a customer to sell to, creating one from `template` if needed.
#[derive(Debug, Clone, Default)]
pub struct ResolveCustomer {
    pub template: CustomerTemplate,
}

impl ResolveCustomer {
    fn resolve<G: Gateway>(
        &self,
        session: &Session<G>,
        marker: CustomerMarker,
    ) -> AttemptResult<CustomerResolution> {
        let rows = session.search_read(
            PARTNER_MODEL,
            &marker.domain(),
            &CallOptions::new()
                .fields(["id", "name", "email"])
                .limit(EXISTING_LIMIT),
        )?;
        let existing: Vec<Customer> = rows.iter().filter_map(Customer::from_record).collect();
        if let Some(first) = existing.first() {
            info!(customer = %first.id, found = existing.len(), "reusing existing customer");
            return Ok(CustomerResolution {
                customer: first.id,
                created: false,
                existing,
                marker,
            });
        }

        let mut values = Map::new();
        values.insert("name".into(), Value::from(self.template.name.clone()));
        values.insert("email".into(), Value::from(self.template.email.clone()));
        values.insert("phone".into(), Value::from(self.template.phone.clone()));
        marker.mark(&mut values);
        let customer = session.create(PARTNER_MODEL, values)?;
        info!(customer = %customer, ?marker, "created customer");
        Ok(CustomerResolution {
            customer,
            created: true,
            existing,
            marker,
        })
    }
}

impl OperationIntent for ResolveCustomer {
    type Output = CustomerResolution;

    fn name(&self) -> &'static str {
        "resolve-customer"
    }

    fn strategies<'a, G: Gateway + 'a>(&'a self) -> Vec<Strategy<'a, G, CustomerResolution>> {
        vec![
            Strategy::new("customer-rank", move |s| self.resolve(s, CustomerMarker::Rank)),
            Strategy::new("legacy-customer-flag", move |s| {
                self.resolve(s, CustomerMarker::LegacyFlag)
            }),
        ]
    }
}

/// Reuse the first existing customer or create one; requires sales.
pub fn resolve_customer<G: Gateway>(
    session: &Session<G>,
    template: &CustomerTemplate,
) -> Result<CustomerResolution, SalesError> {
    let availability = check_sales_available(session)?;
    if !availability.is_available() {
        return Err(SalesError::Unavailable(availability));
    }
    let intent = ResolveCustomer {
        template: template.clone(),
    };
    AdaptiveExecutor::new(session)
        .run(&intent)?
        .into_value()
        .ok_or(SalesError::CustomerUnresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use erplink_core::Fault;
    use erplink_rpc::in_memory::{InMemoryErp, ModelSpec, standard_install};
    use serde_json::json;

    #[test]
    fn existing_customer_is_reused_without_create() {
        let erp = standard_install();
        erp.insert("res.partner", json!({"name": "Vendor", "customer_rank": 0})).unwrap();
        let acme = erp
            .insert(
                "res.partner",
                json!({"name": "Acme", "email": "buy@acme.test", "customer_rank": 3}),
            )
            .unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let resolution = resolve_customer(&session, &CustomerTemplate::default()).unwrap();

        assert_eq!(resolution.customer, acme);
        assert!(!resolution.created);
        assert_eq!(resolution.existing[0].email.as_deref(), Some("buy@acme.test"));
        assert_eq!(session.gateway().call_count("res.partner", "create"), 0);
        assert_eq!(
            resolution.to_string(),
            format!("Existing customers:\n  - ID: {acme}, Name: Acme\nUsing customer ID: {acme}")
        );
    }

    #[test]
    fn missing_customer_is_created_once() {
        let session = Session::new(standard_install(), RemoteId::new(2));

        let resolution = resolve_customer(&session, &CustomerTemplate::default()).unwrap();

        assert!(resolution.created);
        assert_eq!(resolution.marker, CustomerMarker::Rank);
        assert_eq!(session.gateway().call_count("res.partner", "create"), 1);
        let stored = session.gateway().record("res.partner", resolution.customer).unwrap();
        assert_eq!(stored["name"], json!("Sample Customer"));
        assert_eq!(stored["phone"], json!("+9412345678"));
        assert_eq!(stored["customer_rank"], json!(1));
        assert_eq!(
            resolution.to_string(),
            format!("Created new customer with ID: {}", resolution.customer)
        );
    }

    #[test]
    fn legacy_customer_flag_is_used_without_customer_rank() {
        let erp = standard_install();
        erp.remove_model("res.partner");
        erp.add_model(
            ModelSpec::new("res.partner")
                .char("name")
                .char("email")
                .char("phone")
                .boolean("customer"),
        );
        let old = erp.insert("res.partner", json!({"name": "Old Co", "customer": true})).unwrap();
        let session = Session::new(erp, RemoteId::new(2));

        let resolution = resolve_customer(&session, &CustomerTemplate::default()).unwrap();

        assert_eq!(resolution.customer, old);
        assert_eq!(resolution.marker, CustomerMarker::LegacyFlag);
        assert!(resolution.to_string().starts_with("Existing customers (legacy customer flag):"));
    }

    #[test]
    fn sales_must_be_available() {
        let erp = InMemoryErp::new().with_model(ModelSpec::new("res.partner").char("name"));
        let session = Session::new(erp, RemoteId::new(2));
        assert_eq!(
            resolve_customer(&session, &CustomerTemplate::default()),
            Err(SalesError::Unavailable(crate::SalesAvailability::Unavailable))
        );
    }

    #[test]
    fn transport_fault_aborts_resolution() {
        let erp = standard_install();
        erp.fail("res.partner", "search_read", Fault::transport("reset"));
        let session = Session::new(erp, RemoteId::new(2));
        assert!(matches!(
            resolve_customer(&session, &CustomerTemplate::default()),
            Err(SalesError::Aborted(_))
        ));
        assert_eq!(session.gateway().call_count("res.partner", "create"), 0);
    }
}
