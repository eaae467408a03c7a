//! Command/query dispatch.
//!
//! Every command or query is a type implementing [`Request`]; its handler is
//! the `handle` method, so any request type in the crate is dispatchable
//! without runtime registration. [`Mediator::send`] wraps each dispatch in a
//! span named after the request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug_span};

use crate::application::{
    error::AppError,
    repos::{CommentsRepo, PostsRepo, PostsWriteRepo},
};

/// Repositories available to request handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub posts: Arc<dyn PostsRepo>,
    pub posts_write: Arc<dyn PostsWriteRepo>,
    pub comments: Arc<dyn CommentsRepo>,
}

#[async_trait]
pub trait Request: Send + Sized + 'static {
    type Response: Send;

    const NAME: &'static str;

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError>;
}

#[derive(Clone)]
pub struct Mediator {
    context: HandlerContext,
}

impl Mediator {
    pub fn new(context: HandlerContext) -> Self {
        Self { context }
    }

    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, AppError> {
        let span = debug_span!(target: "withrisk::mediator", "dispatch", request = R::NAME);
        request.handle(&self.context).instrument(span).await
    }
}
