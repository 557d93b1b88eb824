//! Core business logic for the authentication system.
//!
//! Passwords are stored as Fernet tokens and compared after decryption. Sessions
//! are stateless HS256 JWTs: a short-lived access token and a long-lived refresh
//! token, both signed with the backend's secret key.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::info;

use super::errors::AuthError;
use super::models::{Claims, Credentials, TokenKind, TokenPair};
use crate::database::{LogType, Store};
use crate::security::Encryptor;
use crate::services::audit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddUserOutcome {
    Added,
    AlreadyExists,
}

pub struct AuthService {
    store: Arc<dyn Store>,
    encryptor: Arc<Encryptor>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        encryptor: Arc<Encryptor>,
        secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            store,
            encryptor,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub async fn add_user(&self, credentials: &Credentials) -> Result<AddUserOutcome, AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::MissingCredentials);
        }
        if self.store.find_user(&credentials.username).await?.is_some() {
            info!("User already exists: {}", credentials.username);
            return Ok(AddUserOutcome::AlreadyExists);
        }

        let password = self.encryptor.encrypt(credentials.password.as_bytes());
        self.store
            .insert_user(&credentials.username, &password)
            .await?;
        info!("User added: {}", credentials.username);
        Ok(AddUserOutcome::Added)
    }

    /// Checks `credentials` against the stored, encrypted password.
    pub async fn verify(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::MissingCredentials);
        }
        let user = self
            .store
            .find_user(&credentials.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let stored = self.encryptor.decrypt(&user.password)?;
        if stored != credentials.password.as_bytes() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    pub async fn delete_user(&self, credentials: &Credentials) -> Result<(), AuthError> {
        self.verify(credentials).await?;
        if !self.store.delete_user(&credentials.username).await? {
            return Err(AuthError::InvalidCredentials);
        }
        info!("User deleted: {}", credentials.username);
        Ok(())
    }

    /// Verifies the credentials and issues a fresh token pair.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let store = self.store.as_ref();
        match self.verify(credentials).await {
            Ok(()) => {}
            Err(AuthError::InvalidCredentials) => {
                let message = format!("Invalid credentials: {}", credentials.username);
                audit::record(store, LogType::Warning, message).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(AuthError::MissingCredentials) => return Err(AuthError::MissingCredentials),
            Err(e) => {
                audit::record(store, LogType::Error, format!("Error: {e}")).await;
                return Err(e);
            }
        }

        let username = &credentials.username;
        audit::record(store, LogType::Info, format!("Successful login: {username}")).await;

        let pair = TokenPair {
            access_token: self.issue(username, TokenKind::Access)?,
            refresh_token: self.issue(username, TokenKind::Refresh)?,
        };
        let message = format!("Tokens created successfully: {username}");
        audit::record(store, LogType::Info, message).await;
        Ok(pair)
    }

    pub fn issue(&self, username: &str, kind: TokenKind) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            kind,
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Decodes `token` and checks its signature, expiry and kind.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))?;
        if data.claims.kind != expected {
            return Err(AuthError::WrongTokenKind {
                expected: match expected {
                    TokenKind::Access => "access",
                    TokenKind::Refresh => "refresh",
                },
            });
        }
        Ok(data.claims)
    }

    /// Trades a refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        self.issue(&claims.sub, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{LogFilter, MemoryStore};

    fn service(store: Arc<MemoryStore>) -> AuthService {
        let key = Encryptor::generate_key();
        let encryptor = Arc::new(Encryptor::new(&key).expect("key"));
        AuthService::new(
            store,
            encryptor,
            key.as_bytes(),
            Duration::from_secs(900),
            Duration::from_secs(3600),
        )
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn passwords_are_stored_encrypted() {
        let store = Arc::new(MemoryStore::default());
        let auth = service(store.clone());
        let outcome = auth
            .add_user(&credentials("alice", "s3cret"))
            .await
            .expect("add");
        assert_eq!(outcome, AddUserOutcome::Added);

        let stored = store.find_user("alice").await.expect("find").expect("user");
        assert_ne!(stored.password, "s3cret");

        let again = auth
            .add_user(&credentials("alice", "other"))
            .await
            .expect("add");
        assert_eq!(again, AddUserOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn login_checks_the_password_and_audits() {
        let store = Arc::new(MemoryStore::default());
        let auth = service(store.clone());
        auth.add_user(&credentials("bob", "pw")).await.expect("add");

        assert!(matches!(
            auth.login(&credentials("bob", "wrong")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(&credentials("nobody", "pw")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(&credentials("", "")).await,
            Err(AuthError::MissingCredentials)
        ));

        let pair = auth.login(&credentials("bob", "pw")).await.expect("login");
        let claims = auth
            .validate(&pair.access_token, TokenKind::Access)
            .expect("access");
        assert_eq!(claims.sub, "bob");

        let messages: Vec<String> = store
            .find_logs(&LogFilter::default())
            .await
            .expect("logs")
            .into_iter()
            .map(|log| log.message)
            .collect();
        assert!(messages.contains(&"Invalid credentials: bob".to_string()));
        assert!(messages.contains(&"Successful login: bob".to_string()));
        assert!(messages.contains(&"Tokens created successfully: bob".to_string()));
    }

    #[tokio::test]
    async fn token_kinds_are_not_interchangeable() {
        let auth = service(Arc::new(MemoryStore::default()));
        let refresh = auth.issue("carol", TokenKind::Refresh).expect("issue");
        let access = auth.issue("carol", TokenKind::Access).expect("issue");

        assert!(matches!(
            auth.validate(&refresh, TokenKind::Access),
            Err(AuthError::WrongTokenKind { .. })
        ));
        assert!(auth.refresh(&access).is_err());

        let renewed = auth.refresh(&refresh).expect("refresh");
        assert_eq!(
            auth.validate(&renewed, TokenKind::Access).expect("valid").sub,
            "carol"
        );
    }

    #[tokio::test]
    async fn delete_requires_the_right_password() {
        let store = Arc::new(MemoryStore::default());
        let auth = service(store.clone());
        auth.add_user(&credentials("dave", "pw")).await.expect("add");

        assert!(matches!(
            auth.delete_user(&credentials("dave", "nope")).await,
            Err(AuthError::InvalidCredentials)
        ));
        auth.delete_user(&credentials("dave", "pw"))
            .await
            .expect("delete");
        assert!(store.find_user("dave").await.expect("find").is_none());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let ours = service(Arc::new(MemoryStore::default()));
        let theirs = service(Arc::new(MemoryStore::default()));
        let token = theirs.issue("eve", TokenKind::Access).expect("issue");
        assert!(matches!(
            ours.validate(&token, TokenKind::Access),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
