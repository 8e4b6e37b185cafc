//! Strategies: one candidate way of satisfying an intent.

use thiserror::Error;

use erplink_core::{Fault, RemoteResult};
use erplink_rpc::{Gateway, Session};

/// Why a single strategy did not satisfy its intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// A remote call inside the strategy failed.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The strategy ran but its precondition on remote data did not hold, or
    /// its success predicate rejected the result.
    #[error("declined: {0}")]
    Declined(String),
}

impl AttemptError {
    pub fn declined(reason: impl Into<String>) -> Self {
        Self::Declined(reason.into())
    }

    /// Fatal faults abort the whole intent instead of moving on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AttemptError::Fault(f) if f.is_fatal())
    }
}

pub type AttemptResult<T> = Result<T, AttemptError>;

type Action<'a, G, T> = Box<dyn Fn(&Session<G>) -> AttemptResult<T> + 'a>;
type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;
type FollowUp<'a, G, T> = Box<dyn Fn(&Session<G>, &T) -> RemoteResult<()> + 'a>;

/// `(precondition, action, success test, follow-up)` for one way of doing
/// something remotely.
///
/// - precondition: every model in [`Strategy::required_models`] must not
///   have been probed as unavailable
/// - action: one or more gateway calls producing a value
/// - success test: predicate over that value (accepts everything by default)
/// - follow-up: optional call run after the success test holds, e.g.
///   "create" then "validate"
pub struct Strategy<'a, G, T> {
    name: &'static str,
    requires: Vec<&'static str>,
    action: Action<'a, G, T>,
    accept: Option<Predicate<'a, T>>,
    follow_up: Option<FollowUp<'a, G, T>>,
}

impl<'a, G: Gateway, T> Strategy<'a, G, T> {
    pub fn new<F>(name: &'static str, action: F) -> Self
    where
        F: Fn(&Session<G>) -> AttemptResult<T> + 'a,
    {
        Self {
            name,
            requires: Vec::new(),
            action: Box::new(action),
            accept: None,
            follow_up: None,
        }
    }

    /// Declare a remote model the strategy cannot work without.
    pub fn requires(mut self, model: &'static str) -> Self {
        self.requires.push(model);
        self
    }

    pub fn accept_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'a,
    {
        self.accept = Some(Box::new(predicate));
        self
    }

    pub fn then<F>(mut self, follow_up: F) -> Self
    where
        F: Fn(&Session<G>, &T) -> RemoteResult<()> + 'a,
    {
        self.follow_up = Some(Box::new(follow_up));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn required_models(&self) -> &[&'static str] {
        &self.requires
    }

    /// Run action, success test and follow-up once.
    pub(crate) fn attempt(&self, session: &Session<G>) -> AttemptResult<T> {
        let value = (self.action)(session)?;
        if let Some(accept) = &self.accept {
            if !accept(&value) {
                return Err(AttemptError::declined("result did not pass the success check"));
            }
        }
        if let Some(follow_up) = &self.follow_up {
            follow_up(session, &value)?;
        }
        Ok(value)
    }
}

impl<G, T> core::fmt::Debug for Strategy<'_, G, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("has_follow_up", &self.follow_up.is_some())
            .finish()
    }
}
