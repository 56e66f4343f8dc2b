use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::{
    context::RequestContext,
    error::MethodError,
    request::Params,
    response::ResultWriter,
};

/// Trait for handling a JSON-RPC method.
///
/// The handler reads the raw parameters, writes its success payload into
/// `result` and reports faults through [`MethodError`]. A
/// [`crate::JsonRpcErrorObject`] is sent back verbatim; any other fault becomes
/// an InternalError.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        params: &Params,
        result: &mut ResultWriter,
    ) -> Result<(), MethodError>;
}

/// A simple function-based handler
///
/// The function returns the result as a [`Value`], which is written into the
/// result sink on success.
pub struct FnHandler<F>
where
    F: Fn(RequestContext, Params) -> BoxFuture<'static, Result<Value, MethodError>> + Send + Sync,
{
    handler_fn: F,
}

impl<F> FnHandler<F>
where
    F: Fn(RequestContext, Params) -> BoxFuture<'static, Result<Value, MethodError>> + Send + Sync,
{
    pub fn new(handler_fn: F) -> Self {
        Self { handler_fn }
    }
}

/// Wrap an async function as a [`MethodHandler`].
pub fn handler_fn<F>(handler_fn: F) -> FnHandler<F>
where
    F: Fn(RequestContext, Params) -> BoxFuture<'static, Result<Value, MethodError>> + Send + Sync,
{
    FnHandler::new(handler_fn)
}

#[async_trait]
impl<F> MethodHandler for FnHandler<F>
where
    F: Fn(RequestContext, Params) -> BoxFuture<'static, Result<Value, MethodError>> + Send + Sync,
{
    async fn handle(
        &self,
        ctx: &RequestContext,
        params: &Params,
        result: &mut ResultWriter,
    ) -> Result<(), MethodError> {
        let value = (self.handler_fn)(ctx.clone(), params.clone()).await?;
        result.write_json(&value)?;
        Ok(())
    }
}
