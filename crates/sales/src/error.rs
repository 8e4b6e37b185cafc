use thiserror::Error;

use erplink_core::{Fault, RemoteId};
use erplink_executor::Aborted;
use erplink_inventory::InventoryError;

use crate::availability::SalesAvailability;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SalesError {
    #[error("remote call failed: {0}")]
    Remote(#[from] Fault),

    #[error(transparent)]
    Aborted(#[from] Aborted),

    #[error("{}", .0.note())]
    Unavailable(SalesAvailability),

    #[error("product {0} not found")]
    ProductNotFound(RemoteId),

    #[error("no customer could be found or created")]
    CustomerUnresolved,

    #[error("sale order rejected: {0}")]
    OrderRejected(Fault),

    /// The order header exists; only its line was refused.
    #[error("sale order {order} created but its line was rejected: {fault}")]
    LineRejected { order: RemoteId, fault: Fault },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("fallback inventory report failed: {0}")]
    Inventory(#[from] InventoryError),
}
