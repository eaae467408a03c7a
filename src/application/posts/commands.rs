use async_trait::async_trait;
use tracing::info;

use crate::application::error::AppError;
use crate::application::mediator::{HandlerContext, Request};
use crate::application::repos::{CreatePostParams, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug};

use super::types::{CreatePost, DeletePost, EditPost, ensure_non_empty, normalize_category};

#[async_trait]
impl Request for CreatePost {
    type Response = PostRecord;

    const NAME: &'static str = "posts.create";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        ensure_non_empty(&self.title, "title")?;
        ensure_non_empty(&self.body, "body")?;
        ensure_non_empty(&self.category, "category")?;

        let reader = ctx.posts.clone();
        let slug = generate_unique_slug(&self.title, move |candidate| {
            let reader = reader.clone();
            async move {
                reader
                    .find_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        .map_err(|err| match err {
            SlugAsyncError::Slug(SlugError::EmptyInput | SlugError::Unrepresentable { .. }) => {
                AppError::invalid_field("title", "must contain letters or digits")
            }
            SlugAsyncError::Slug(SlugError::Exhausted { .. }) => {
                AppError::Repo(RepoError::Duplicate {
                    constraint: "posts_slug_key".to_string(),
                })
            }
            SlugAsyncError::Predicate(err) => AppError::Repo(err),
        })?;

        let post = ctx
            .posts_write
            .create_post(CreatePostParams {
                slug,
                title: self.title.trim().to_string(),
                summary: self.summary.trim().to_string(),
                body: self.body,
                category: normalize_category(&self.category),
            })
            .await?;

        info!(
            target = "withrisk::posts",
            post_id = %post.id,
            slug = %post.slug,
            "post created"
        );
        Ok(post)
    }
}

#[async_trait]
impl Request for EditPost {
    type Response = PostRecord;

    const NAME: &'static str = "posts.edit";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        ensure_non_empty(&self.title, "title")?;
        ensure_non_empty(&self.body, "body")?;
        ensure_non_empty(&self.category, "category")?;

        let result = ctx
            .posts_write
            .update_post(UpdatePostParams {
                id: self.id,
                title: self.title.trim().to_string(),
                summary: self.summary.trim().to_string(),
                body: self.body,
                category: normalize_category(&self.category),
            })
            .await;

        match result {
            Ok(post) => Ok(post),
            Err(RepoError::NotFound) => Err(AppError::not_found("Post")),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl Request for DeletePost {
    type Response = ();

    const NAME: &'static str = "posts.delete";

    async fn handle(self, ctx: &HandlerContext) -> Result<Self::Response, AppError> {
        match ctx.posts_write.delete_post(self.id).await {
            Ok(()) => {
                info!(target = "withrisk::posts", post_id = %self.id, "post deleted");
                Ok(())
            }
            Err(RepoError::NotFound) => Err(AppError::not_found("Post")),
            Err(err) => Err(err.into()),
        }
    }
}
