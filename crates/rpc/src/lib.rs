//! `erplink-rpc`: the remote call surface.
//!
//! - [`Gateway`]: one blocking call to a named remote method, faults as values
//! - [`jsonrpc`]: wire codec and fault classification
//! - [`session`]: bootstrap (version + authenticate) and the per-session [`Session`]
//! - [`probe`]: read-only capability probing of candidate models
//! - [`fields`]: session-scoped field catalog for optional-field probing
//! - [`in_memory`]: an in-memory ERP used by tests across the workspace

pub mod fields;
pub mod gateway;
pub mod http;
pub mod in_memory;
pub mod jsonrpc;
pub mod probe;
pub mod session;

pub use fields::{FieldCatalog, FieldInfo, ModelFields};
pub use gateway::Gateway;
pub use http::{JsonRpcClient, JsonRpcGateway};
pub use in_memory::InMemoryErp;
pub use probe::{Capabilities, probe, probe_model};
pub use session::{ConnectionParams, RemoteHandle, Session, connect};
