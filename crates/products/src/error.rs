use thiserror::Error;

use erplink_core::Fault;
use erplink_executor::Aborted;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("remote call failed: {0}")]
    Remote(#[from] Fault),

    #[error("product creation rejected: {0}")]
    CreationRejected(Fault),

    #[error("invalid product input: {0}")]
    InvalidInput(String),
}

impl From<Aborted> for ProductError {
    fn from(aborted: Aborted) -> Self {
        ProductError::Remote(aborted.fault)
    }
}
