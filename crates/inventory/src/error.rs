use thiserror::Error;

use erplink_core::Fault;
use erplink_executor::Aborted;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("remote call failed: {0}")]
    Remote(#[from] Fault),

    #[error(transparent)]
    Aborted(#[from] Aborted),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid location name: {0:?}")]
    InvalidLocationName(String),

    #[error("no internal stock location to create new locations under")]
    NoParentLocation,

    #[error("could not create location {name:?}: {fault}{}", access_hint(.fault))]
    LocationRejected { name: String, fault: Fault },
}

impl InventoryError {
    /// Transport and auth failures, directly or through an aborted intent.
    pub fn is_fatal(&self) -> bool {
        match self {
            InventoryError::Remote(fault) => fault.is_fatal(),
            InventoryError::Aborted(_) => true,
            _ => false,
        }
    }
}

fn access_hint(fault: &Fault) -> &'static str {
    let message = fault.message().to_lowercase();
    let denied = ["access denied", "access right", "not allowed"]
        .iter()
        .any(|marker| message.contains(marker));
    if denied {
        "\nPermission denied: this user cannot create stock locations. \
         Ask an administrator or use the web interface."
    } else {
        ""
    }
}
