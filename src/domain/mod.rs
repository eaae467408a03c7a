//! Domain layer: blog entities, slugs, and connection-string rules.

pub mod connection;
pub mod entities;
pub mod slug;
