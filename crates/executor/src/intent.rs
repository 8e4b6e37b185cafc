//! Operation intents: named goals that expand into ordered strategies.

use erplink_rpc::Gateway;

use crate::strategy::Strategy;

/// A user-level goal (e.g. "set inventory quantity") carrying its own
/// parameters and no remote identity.
pub trait OperationIntent {
    type Output;

    /// Name used in logs and outcomes.
    fn name(&self) -> &'static str;

    /// Models to probe before trying strategies. Strategies requiring a model
    /// probed as unavailable are skipped; an empty list disables probing.
    fn candidate_models(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Strategies in priority order.
    fn strategies<'a, G: Gateway + 'a>(&'a self) -> Vec<Strategy<'a, G, Self::Output>>;
}
