//! Symmetric encryption of stored secrets and videos.
//!
//! Passwords and video files are kept in MongoDB as Fernet tokens. The key is
//! read from `secret.key` in the secrets directory and created on first start.

use std::path::Path;

use fernet::Fernet;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid encryption key")]
    InvalidKey,

    #[error("Cannot decrypt data: token is invalid or was produced with another key")]
    Decrypt,

    #[error("Encrypted payload is not a valid token")]
    MalformedToken,

    #[error("Cannot serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cannot access key file: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Encryptor {
    cipher: Fernet,
}

impl Encryptor {
    pub fn new(key: &str) -> Result<Self, CryptoError> {
        let cipher = Fernet::new(key.trim()).ok_or(CryptoError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn generate_key() -> String {
        Fernet::generate_key()
    }

    pub fn encrypt(&self, data: &[u8]) -> String {
        self.cipher.encrypt(data)
    }

    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CryptoError> {
        self.cipher.decrypt(token).map_err(|_| CryptoError::Decrypt)
    }

    /// Decrypts a token stored as raw bytes.
    pub fn decrypt_bytes(&self, token: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let token = std::str::from_utf8(token).map_err(|_| CryptoError::MalformedToken)?;
        self.decrypt(token)
    }

    pub fn encrypt_value<T: Serialize>(&self, value: &T) -> Result<String, CryptoError> {
        Ok(self.encrypt(&serde_json::to_vec(value)?))
    }

    pub fn decrypt_value<T: DeserializeOwned>(&self, token: &str) -> Result<T, CryptoError> {
        Ok(serde_json::from_slice(&self.decrypt(token)?)?)
    }
}

/// Reads the key at `path`, or generates and stores a new one.
pub fn load_or_create_key(path: &Path) -> Result<String, CryptoError> {
    if path.exists() {
        let key = std::fs::read_to_string(path)?.trim().to_string();
        // Validate before handing it out.
        Encryptor::new(&key)?;
        return Ok(key);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let key = Encryptor::generate_key();
    std::fs::write(path, &key)?;
    info!("Created a new encryption key at {}", path.display());
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    fn encryptor() -> Encryptor {
        Encryptor::new(&Encryptor::generate_key()).expect("key")
    }

    #[test]
    fn ciphertext_differs_from_plaintext() {
        let token = encryptor().encrypt(b"secret password");
        assert!(!token.contains("secret password"));
    }

    #[test]
    fn values_survive_encryption() {
        let enc = encryptor();
        let alice = Person {
            name: "Alice".to_string(),
            age: 30,
        };
        let token = enc.encrypt_value(&alice).expect("encrypt");
        let back: Person = enc.decrypt_value(&token).expect("decrypt");
        assert_eq!(back, alice);
    }

    #[test]
    fn tokens_from_another_key_are_rejected() {
        let token = encryptor().encrypt(b"video bytes");
        assert!(matches!(
            encryptor().decrypt(&token),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        assert!(matches!(
            Encryptor::new("not-a-key"),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn key_file_is_created_once_and_reused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("secrets").join("secret.key");

        let first = load_or_create_key(&path).expect("create");
        assert!(path.exists());
        let second = load_or_create_key(&path).expect("reuse");
        assert_eq!(first, second);
    }
}
