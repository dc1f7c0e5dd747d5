//! Encryption of tenant Odoo API keys at rest, plus the random tokens used
//! for password resets and integration API keys.
//!
//! Ciphertext format: base64(nonce_12bytes || ciphertext || tag_16bytes)

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::AppError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// AES-256-GCM cipher for credentials stored in Postgres.
#[derive(Clone)]
pub struct CredentialCipher {
    key: [u8; KEY_LEN],
}

impl CredentialCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Builds the cipher from the base64 form used in `CREDENTIAL_ENCRYPTION_KEY`.
    pub fn from_base64_key(encoded: &str) -> Result<Self, String> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded.trim().trim_end_matches('=')))
            .map_err(|_| "CREDENTIAL_ENCRYPTION_KEY is not valid base64".to_string())?;
        if bytes.len() != KEY_LEN {
            return Err(format!(
                "CREDENTIAL_ENCRYPTION_KEY has wrong length: {} (expected {})",
                bytes.len(),
                KEY_LEN
            ));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| AppError::InternalServerError("Invalid encryption key".into()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| AppError::InternalServerError("Encryption failed".into()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    /// Fails on wrong key, tampered data or truncated input.
    pub fn decrypt(&self, encoded: &str) -> Result<String, AppError> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|_| AppError::InternalServerError("Invalid ciphertext encoding".into()))?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(AppError::InternalServerError("Ciphertext too short".into()));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| AppError::InternalServerError("Invalid encryption key".into()))?;
        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);
        let plaintext = cipher.decrypt(nonce, &data[NONCE_LEN..]).map_err(|_| {
            AppError::InternalServerError("Decryption failed (wrong key or tampered data)".into())
        })?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::InternalServerError("Decrypted data is not UTF-8".into()))
    }
}

/// 32 random bytes as url-safe base64 without padding (43 characters).
pub fn generate_url_safe_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest, used to store reset tokens without keeping the secret.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// First characters of a secret, safe to put in logs.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{}...", prefix)
}
