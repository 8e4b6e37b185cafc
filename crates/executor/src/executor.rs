//! Executor state machine: `Pending -> Trying(i) -> {Succeeded | AllFailed}`.

use thiserror::Error;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use erplink_core::Fault;
use erplink_rpc::{Capabilities, Gateway, Session, probe};

use crate::intent::OperationIntent;
use crate::strategy::{AttemptError, Strategy};

/// Where an intent's execution currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    Trying { index: usize, strategy: &'static str },
    Succeeded { strategy: &'static str },
    AllFailed,
}

/// A strategy that was attempted and did not satisfy the intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub error: AttemptError,
}

/// The winning strategy and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Success<T> {
    pub strategy: &'static str,
    pub value: T,
}

/// Result of running an intent to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome<T> {
    pub intent: &'static str,
    pub run_id: Uuid,
    pub succeeded: Option<Success<T>>,
    /// Failures in the order the strategies were tried.
    pub failures: Vec<StrategyFailure>,
    /// Strategies never attempted because a required model is unavailable.
    pub skipped: Vec<&'static str>,
}

impl<T> StrategyOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.succeeded.is_some()
    }

    pub fn state(&self) -> ExecutionState {
        match &self.succeeded {
            Some(s) => ExecutionState::Succeeded {
                strategy: s.strategy,
            },
            None => ExecutionState::AllFailed,
        }
    }

    pub fn succeeded_strategy(&self) -> Option<&'static str> {
        self.succeeded.as_ref().map(|s| s.strategy)
    }

    pub fn value(&self) -> Option<&T> {
        self.succeeded.as_ref().map(|s| &s.value)
    }

    pub fn into_value(self) -> Option<T> {
        self.succeeded.map(|s| s.value)
    }
}

/// A transport or auth fault stopped the intent; later strategies were not tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{intent} aborted in strategy {strategy}: {fault}")]
pub struct Aborted {
    pub intent: &'static str,
    pub strategy: &'static str,
    pub fault: Fault,
    /// Failures recorded before the abort.
    pub failures: Vec<StrategyFailure>,
}

/// Runs ordered strategy lists against one session.
pub struct AdaptiveExecutor<'s, G> {
    session: &'s Session<G>,
}

impl<'s, G: Gateway> AdaptiveExecutor<'s, G> {
    pub fn new(session: &'s Session<G>) -> Self {
        Self { session }
    }

    /// Probe the intent's candidate models, then try its strategies.
    pub fn run<I: OperationIntent>(
        &self,
        intent: &I,
    ) -> Result<StrategyOutcome<I::Output>, Aborted> {
        let candidates = intent.candidate_models();
        let capabilities = if candidates.is_empty() {
            None
        } else {
            Some(probe(self.session, &candidates).map_err(|fault| Aborted {
                intent: intent.name(),
                strategy: "capability-probe",
                fault,
                failures: Vec::new(),
            })?)
        };
        self.execute(intent.name(), capabilities.as_ref(), intent.strategies())
    }

    /// Try `strategies` in order until one succeeds.
    ///
    /// At most one strategy succeeds; strategies are never combined.
    pub fn execute<T>(
        &self,
        intent: &'static str,
        capabilities: Option<&Capabilities>,
        strategies: Vec<Strategy<'_, G, T>>,
    ) -> Result<StrategyOutcome<T>, Aborted> {
        let run_id = Uuid::now_v7();
        let span = info_span!("intent", intent, run_id = %run_id);
        let _guard = span.enter();

        let mut state = ExecutionState::Pending;
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        debug!(?state, strategies = strategies.len(), "intent received");

        for (index, strategy) in strategies.iter().enumerate() {
            let missing = strategy
                .required_models()
                .iter()
                .copied()
                .find(|model| capabilities.is_some_and(|c| c.is_unavailable(model)));
            if let Some(model) = missing {
                debug!(strategy = strategy.name(), model, "skipping strategy, model unavailable");
                skipped.push(strategy.name());
                continue;
            }

            state = ExecutionState::Trying {
                index,
                strategy: strategy.name(),
            };
            info!(?state, "trying strategy");

            match strategy.attempt(self.session) {
                Ok(value) => {
                    state = ExecutionState::Succeeded {
                        strategy: strategy.name(),
                    };
                    info!(?state, failed_before = failures.len(), "intent satisfied");
                    return Ok(StrategyOutcome {
                        intent,
                        run_id,
                        succeeded: Some(Success {
                            strategy: strategy.name(),
                            value,
                        }),
                        failures,
                        skipped,
                    });
                }
                Err(AttemptError::Fault(fault)) if fault.is_fatal() => {
                    warn!(strategy = strategy.name(), error = %fault, "aborting intent");
                    return Err(Aborted {
                        intent,
                        strategy: strategy.name(),
                        fault,
                        failures,
                    });
                }
                Err(error) => {
                    warn!(strategy = strategy.name(), error = %error, "strategy failed");
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }

        state = ExecutionState::AllFailed;
        warn!(?state, attempted = failures.len(), skipped = skipped.len(), "no strategy succeeded");
        Ok(StrategyOutcome {
            intent,
            run_id,
            succeeded: None,
            failures,
            skipped,
        })
    }
}
