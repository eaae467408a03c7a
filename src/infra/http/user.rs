use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::application::user::UserAccessor;

use super::middleware::{RequestContext, forwarded_user};

/// The user attached to the current request by a fronting proxy, if any.
#[derive(Clone, Debug, Default)]
pub struct RequestUser(Option<String>);

impl UserAccessor for RequestUser {
    fn username(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<RequestContext>() {
            Some(ctx) => ctx.user.clone(),
            None => forwarded_user(&parts.headers),
        };
        Ok(Self(user))
    }
}
