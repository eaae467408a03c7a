//! JSON handlers. Each one maps its DTO to a request and hands it to the
//! mediator.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::application::comments::ListComments;
use crate::application::error::{AppError, ErrorBody};
use crate::application::posts::{CreatePost, DeletePost, ListPosts, PostDetails};
use crate::application::user::resolve_author;
use crate::infra::http::user::RequestUser;

use super::extract::{ApiPath, ApiQuery, ValidatedJson};
use super::models::{
    CommentCreateRequest, CommentResponse, PostListQuery, PostResponse, PostWriteRequest,
};
use super::state::ApiState;

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(PostListQuery),
    responses(
        (status = 200, description = "Newest posts first", body = Vec<PostResponse>),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_posts(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = state.mediator.send(ListPosts::from(query)).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = PostWriteRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_post(
    State(state): State<ApiState>,
    ValidatedJson(payload): ValidatedJson<PostWriteRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let post = state.mediator.send(CreatePost::from(payload)).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn get_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state.mediator.send(PostDetails { id }).await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = PostWriteRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn update_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<PostWriteRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state.mediator.send(payload.into_edit(id)).await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post and its comments deleted"),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn delete_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.mediator.send(DeletePost { id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Comments, oldest first", body = Vec<CommentResponse>),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn list_comments(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let comments = state.mediator.send(ListComments { post_id: id }).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = CommentCreateRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody)
    )
)]
pub async fn create_comment(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    user: RequestUser,
    ValidatedJson(payload): ValidatedJson<CommentCreateRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let author = resolve_author(payload.author.as_deref(), &user);
    let comment = state
        .mediator
        .send(payload.into_command(id, author))
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}
