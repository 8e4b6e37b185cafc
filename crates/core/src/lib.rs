//! `erplink-core`: shared building blocks for talking to a remote ERP.
//!
//! This crate contains **pure** primitives (no IO): the fault taxonomy every
//! remote call reports through, remote identifiers, search domains and call
//! options.

pub mod domain;
pub mod error;
pub mod id;
pub mod options;
pub mod record;

pub use domain::{Condition, SearchDomain};
pub use error::{Fault, FaultKind, RemoteResult};
pub use id::{Many2One, RemoteId};
pub use options::CallOptions;
pub use record::{Record, RecordExt};
