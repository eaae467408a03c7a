use uuid::Uuid;

use crate::application::error::AppError;

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct ListPosts {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct PostDetails {
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreatePost {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct EditPost {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy)]
pub struct DeletePost {
    pub id: Uuid,
}

pub(super) fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, "must not be empty"));
    }
    Ok(())
}

pub(super) fn normalize_category(value: &str) -> String {
    value.trim().to_string()
}
