//! Comment commands and queries.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::mediator::{HandlerContext, Request};
use crate::application::repos::CreateCommentParams;
use crate::domain::entities::CommentRecord;

#[derive(Debug, Clone, Copy)]
pub struct ListComments {
    pub post_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author: String,
    pub body: String,
}

#[async_trait]
impl Request for ListComments {
    type Response = Vec<CommentRecord>;

    const NAME: &'static str = "comments.list";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        if ctx.posts.find_by_id(self.post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }
        Ok(ctx.comments.list_for_post(self.post_id).await?)
    }
}

#[async_trait]
impl Request for CreateComment {
    type Response = CommentRecord;

    const NAME: &'static str = "comments.create";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        if self.body.trim().is_empty() {
            return Err(AppError::invalid_field("body", "must not be empty"));
        }
        if ctx.posts.find_by_id(self.post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        let comment = ctx
            .comments
            .create_comment(CreateCommentParams {
                post_id: self.post_id,
                author: self.author,
                body: self.body.trim().to_string(),
            })
            .await?;

        info!(
            target = "withrisk::comments",
            post_id = %comment.post_id,
            comment_id = %comment.id,
            "comment created"
        );
        Ok(comment)
    }
}
