//! Authentication module for managing user accounts and access tokens.
//!
//! This module provides the public interface for user authentication-related functionalities
//! such as adding and removing users, login, token refreshing and the `AuthUser` extractor.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

// Re-exports for convenience
pub use errors::AuthError;
pub use middleware::AuthUser;
pub use models::{Claims, Credentials, TokenKind, TokenPair};
pub use routes::auth_router;
pub use service::{AddUserOutcome, AuthService};
