//! Custom error types specific to authentication failures.

use thiserror::Error;

use crate::database::StoreError;
use crate::security::CryptoError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Bad request")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Wrong token type: an {expected} token is required")]
    WrongTokenKind { expected: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingCredentials => 400,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::WrongTokenKind { .. } => 401,
            AuthError::Store(e) => e.status_code(),
            AuthError::Crypto(_) => 500,
        }
    }
}
