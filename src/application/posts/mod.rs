//! Post commands and queries.

mod commands;
mod queries;
mod types;

pub use types::{
    CreatePost, DEFAULT_LIST_LIMIT, DeletePost, EditPost, ListPosts, MAX_LIST_LIMIT, PostDetails,
};
