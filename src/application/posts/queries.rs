use async_trait::async_trait;

use crate::application::error::AppError;
use crate::application::mediator::{HandlerContext, Request};
use crate::application::repos::PostQueryFilter;
use crate::domain::entities::PostRecord;

use super::types::{DEFAULT_LIST_LIMIT, ListPosts, MAX_LIST_LIMIT, PostDetails};

#[async_trait]
impl Request for ListPosts {
    type Response = Vec<PostRecord>;

    const NAME: &'static str = "posts.list";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        let filter = PostQueryFilter {
            category: self
                .category
                .map(|category| category.trim().to_string())
                .filter(|category| !category.is_empty()),
            limit: self
                .limit
                .unwrap_or(DEFAULT_LIST_LIMIT)
                .clamp(1, MAX_LIST_LIMIT),
        };

        Ok(ctx.posts.list_posts(&filter).await?)
    }
}

#[async_trait]
impl Request for PostDetails {
    type Response = PostRecord;

    const NAME: &'static str = "posts.details";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        ctx.posts
            .find_by_id(self.id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }
}
