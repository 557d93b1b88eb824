//! Service health, the landing text and the JSON 404 fallback.

pub mod handlers;
pub mod routes;
