//! Remote fault model.

use thiserror::Error;

/// Result type used by every remote call.
pub type RemoteResult<T> = Result<T, Fault>;

/// Classified failure of a remote call.
///
/// A `Fault` is always handed to the caller as a value; the gateway never
/// panics on a remote error. The classification decides whether a fallback
/// strategy is worth trying (see [`Fault::is_fatal`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Network/endpoint unreachable, bad HTTP status, undecodable response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Credentials rejected or session no longer valid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Schema, permission or business-rule rejection.
    #[error("remote rejected the call: {0}")]
    RemoteValidation(String),

    /// The model or method does not exist in this remote install.
    #[error("capability absent: {0}")]
    CapabilityAbsent(String),
}

/// Discriminant of a [`Fault`], handy for matching and logging.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FaultKind {
    Transport,
    Auth,
    RemoteValidation,
    CapabilityAbsent,
}

impl core::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            FaultKind::Transport => "transport",
            FaultKind::Auth => "auth",
            FaultKind::RemoteValidation => "remote_validation",
            FaultKind::CapabilityAbsent => "capability_absent",
        };
        f.write_str(name)
    }
}

impl Fault {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::RemoteValidation(msg.into())
    }

    pub fn absent(msg: impl Into<String>) -> Self {
        Self::CapabilityAbsent(msg.into())
    }

    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::Transport(_) => FaultKind::Transport,
            Fault::Auth(_) => FaultKind::Auth,
            Fault::RemoteValidation(_) => FaultKind::RemoteValidation,
            Fault::CapabilityAbsent(_) => FaultKind::CapabilityAbsent,
        }
    }

    /// Raw message carried by the fault.
    pub fn message(&self) -> &str {
        match self {
            Fault::Transport(m)
            | Fault::Auth(m)
            | Fault::RemoteValidation(m)
            | Fault::CapabilityAbsent(m) => m,
        }
    }

    /// Whether the fault makes any further call against this session pointless.
    ///
    /// Transport and auth faults abort a whole intent; validation and
    /// capability faults only rule out the strategy that hit them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Fault::Transport(_) | Fault::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_auth_are_fatal() {
        assert!(Fault::transport("down").is_fatal());
        assert!(Fault::auth("bad password").is_fatal());
        assert!(!Fault::validation("invalid field").is_fatal());
        assert!(!Fault::absent("stock.scrap").is_fatal());
    }

    #[test]
    fn message_and_kind_are_preserved() {
        let fault = Fault::absent("Object stock.inventory doesn't exist");
        assert_eq!(fault.kind(), FaultKind::CapabilityAbsent);
        assert_eq!(fault.message(), "Object stock.inventory doesn't exist");
        assert_eq!(
            fault.to_string(),
            "capability absent: Object stock.inventory doesn't exist"
        );
    }
}
