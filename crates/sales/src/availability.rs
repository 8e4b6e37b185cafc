use tracing::info;

use erplink_core::RemoteResult;
use erplink_rpc::{Gateway, Session, probe_model};

pub const SALE_ORDER_MODEL: &str = "sale.order";
const POS_ORDER_MODEL: &str = "pos.order";

/// Whether the remote can take sale orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesAvailability {
    Available,
    /// Only point of sale is installed; orders cannot be created here.
    PointOfSaleOnly,
    Unavailable,
}

impl SalesAvailability {
    pub fn is_available(self) -> bool {
        self == SalesAvailability::Available
    }

    /// Message shown to the operator.
    pub fn note(self) -> &'static str {
        match self {
            SalesAvailability::Available => "Sales module is available.",
            SalesAvailability::PointOfSaleOnly => {
                "Traditional Sales module is not available, but Point of Sale module is available."
            }
            SalesAvailability::Unavailable => {
                "Sales module is not available in this instance. \
                 You can still use the inventory features."
            }
        }
    }
}

/// `sale.order`, else `pos.order` for the diagnostic only.
pub fn check_sales_available<G: Gateway>(session: &Session<G>) -> RemoteResult<SalesAvailability> {
    let availability = if probe_model(session, SALE_ORDER_MODEL)? {
        SalesAvailability::Available
    } else if probe_model(session, POS_ORDER_MODEL)? {
        SalesAvailability::PointOfSaleOnly
    } else {
        SalesAvailability::Unavailable
    };
    info!(?availability, "checked sales availability");
    Ok(availability)
}
