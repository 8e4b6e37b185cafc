//! Capability Prober: which candidate models can this remote answer for?

use std::collections::BTreeSet;

use tracing::{debug, info};

use erplink_core::{RemoteResult, SearchDomain};

use crate::gateway::Gateway;
use crate::session::Session;

/// Result of probing a list of candidate models.
///
/// `listing` keeps candidate order for diagnostics; [`Capabilities::available`]
/// is order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    listing: Vec<(String, bool)>,
}

impl Capabilities {
    pub fn is_available(&self, model: &str) -> bool {
        self.listing.iter().any(|(m, ok)| *ok && m == model)
    }

    /// Probed and found missing. Models never probed are not unavailable.
    pub fn is_unavailable(&self, model: &str) -> bool {
        self.listing.iter().any(|(m, ok)| !*ok && m == model)
    }

    pub fn available(&self) -> BTreeSet<String> {
        self.listing
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// `(model, available)` in the order the candidates were given.
    pub fn listing(&self) -> &[(String, bool)] {
        &self.listing
    }
}

/// Existence check for one model: `search([], limit=1)`.
///
/// Validation and capability faults mean "unavailable"; transport and auth
/// faults are returned, since they say nothing about the model.
pub fn probe_model<G: Gateway>(session: &Session<G>, model: &str) -> RemoteResult<bool> {
    match session.search(model, &SearchDomain::all(), Some(1)) {
        Ok(_) => Ok(true),
        Err(fault) if fault.is_fatal() => Err(fault),
        Err(fault) => {
            debug!(model, error = %fault, "model unavailable");
            Ok(false)
        }
    }
}

/// Probe every candidate (duplicates once) without mutating remote state.
pub fn probe<G: Gateway>(session: &Session<G>, candidates: &[&str]) -> RemoteResult<Capabilities> {
    let mut listing: Vec<(String, bool)> = Vec::with_capacity(candidates.len());
    for model in candidates {
        if listing.iter().any(|(m, _)| m == model) {
            continue;
        }
        let available = probe_model(session, model)?;
        info!(model, available, "probed model");
        listing.push((model.to_string(), available));
    }
    Ok(Capabilities { listing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::{InMemoryErp, ModelSpec};
    use erplink_core::{Fault, RemoteId};

    fn only_y() -> Session<InMemoryErp> {
        let erp = InMemoryErp::new().with_model(ModelSpec::new("y.model").char("name"));
        Session::new(erp, RemoteId::new(2))
    }

    #[test]
    fn only_callable_candidates_are_available_regardless_of_order() {
        let session = only_y();
        let expected: BTreeSet<String> = ["y.model".to_string()].into();

        let forward = probe(&session, &["x.model", "y.model", "z.model"]).unwrap();
        let backward = probe(&session, &["z.model", "y.model", "x.model"]).unwrap();

        assert_eq!(forward.available(), expected);
        assert_eq!(backward.available(), expected);
        assert_eq!(
            forward.listing(),
            &[
                ("x.model".to_string(), false),
                ("y.model".to_string(), true),
                ("z.model".to_string(), false),
            ]
        );
    }

    #[test]
    fn probing_is_read_only_and_bounded() {
        let session = only_y();
        probe(&session, &["y.model", "y.model"]).unwrap();
        let calls = session.gateway().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "search");
        assert_eq!(calls[0].options.limit, Some(1));
    }

    #[test]
    fn transport_fault_aborts_probe() {
        let session = only_y();
        session
            .gateway()
            .fail("y.model", "search", Fault::transport("connection reset"));
        assert!(matches!(
            probe(&session, &["x.model", "y.model"]),
            Err(Fault::Transport(_))
        ));
    }
}
