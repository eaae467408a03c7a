//! Application services: requests, their handlers and the repository seams.

pub mod comments;
pub mod error;
pub mod mediator;
pub mod posts;
pub mod repos;
pub mod seed;
pub mod user;
