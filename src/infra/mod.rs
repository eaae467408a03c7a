//! Infrastructure adapters: persistence, HTTP, telemetry.

pub mod db;
pub mod error;
pub mod http;
pub mod telemetry;
