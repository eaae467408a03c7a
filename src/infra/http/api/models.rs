use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::application::comments::CreateComment;
use crate::application::posts::{CreatePost, EditPost, ListPosts};
use crate::domain::entities::{CommentRecord, PostRecord};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    /// Only posts in this category (case-insensitive).
    pub category: Option<String>,
    /// Maximum number of posts, 1 to 100. Defaults to 20.
    pub limit: Option<u32>,
}

impl From<PostListQuery> for ListPosts {
    fn from(query: PostListQuery) -> Self {
        Self {
            category: query.category,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct PostWriteRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub summary: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub body: String,
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub category: String,
}

impl From<PostWriteRequest> for CreatePost {
    fn from(request: PostWriteRequest) -> Self {
        Self {
            title: request.title,
            summary: request.summary,
            body: request.body,
            category: request.category,
        }
    }
}

impl PostWriteRequest {
    pub fn into_edit(self, id: Uuid) -> EditPost {
        EditPost {
            id,
            title: self.title,
            summary: self.summary,
            body: self.body,
            category: self.category,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CommentCreateRequest {
    /// Display name; falls back to the proxy-supplied user, then `anonymous`.
    #[serde(default)]
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub body: String,
}

impl CommentCreateRequest {
    pub fn into_command(self, post_id: Uuid, author: String) -> CreateComment {
        CreateComment {
            post_id,
            author,
            body: self.body,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub category: String,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub updated_at: OffsetDateTime,
}

impl From<PostRecord> for PostResponse {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            slug: record.slug,
            title: record.title,
            summary: record.summary,
            body: record.body,
            category: record.category,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: String,
    pub body: String,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub created_at: OffsetDateTime,
}

impl From<CommentRecord> for CommentResponse {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            author: record.author,
            body: record.body,
            created_at: record.created_at,
        }
    }
}
