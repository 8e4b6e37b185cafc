//! Remote Call Gateway.

use serde_json::Value;

use erplink_core::{CallOptions, RemoteResult};

/// A single blocking call to a named remote operation.
///
/// Implementations never retry and never panic on remote errors: every
/// failure is classified into a [`erplink_core::Fault`] and returned.
pub trait Gateway {
    fn invoke(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        options: &CallOptions,
    ) -> RemoteResult<Value>;
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn invoke(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        options: &CallOptions,
    ) -> RemoteResult<Value> {
        (**self).invoke(model, method, args, options)
    }
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn invoke(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        options: &CallOptions,
    ) -> RemoteResult<Value> {
        (**self).invoke(model, method, args, options)
    }
}
