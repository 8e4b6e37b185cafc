//! Adaptive Operation Executor.
//!
//! An intent is satisfied by trying an ordered list of [`Strategy`] values
//! until one succeeds. Strategies whose required models the remote lacks are
//! skipped; failures are collected in order; transport/auth faults abort.

pub mod executor;
pub mod intent;
pub mod strategy;

pub use executor::{
    AdaptiveExecutor, Aborted, ExecutionState, StrategyFailure, StrategyOutcome, Success,
};
pub use intent::OperationIntent;
pub use strategy::{AttemptError, AttemptResult, Strategy};
