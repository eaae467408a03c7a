//! OpenAPI document and the optional Swagger UI.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::error::{ErrorBody, FieldViolation};

use super::api::{handlers, models};

pub const SWAGGER_UI_PATH: &str = "/swagger";
pub const OPENAPI_JSON_PATH: &str = "/swagger/v1/swagger.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "withrisk API",
        version = "v1",
        description = "Posts and comments for the withrisk blog"
    ),
    paths(
        handlers::list_posts,
        handlers::create_post,
        handlers::get_post,
        handlers::update_post,
        handlers::delete_post,
        handlers::list_comments,
        handlers::create_comment,
    ),
    components(schemas(
        models::PostWriteRequest,
        models::PostResponse,
        models::CommentCreateRequest,
        models::CommentResponse,
        ErrorBody,
        FieldViolation,
    )),
    tags(
        (name = "posts", description = "Blog posts"),
        (name = "comments", description = "Comments on posts")
    )
)]
pub struct ApiDoc;

/// Generates the OpenAPI document on demand.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiDocGenerator;

impl ApiDocGenerator {
    pub fn document(&self) -> utoipa::openapi::OpenApi {
        ApiDoc::openapi()
    }

    /// Router serving the UI at [`SWAGGER_UI_PATH`] and the document at
    /// [`OPENAPI_JSON_PATH`].
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new().merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, self.document()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDocGenerator.document();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        assert!(paths.contains(&"/api/posts".to_string()));
        assert!(paths.contains(&"/api/posts/{id}".to_string()));
        assert!(paths.contains(&"/api/posts/{id}/comments".to_string()));
    }
}
