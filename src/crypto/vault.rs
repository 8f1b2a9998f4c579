// ABOUTME: AES-256-GCM credential vault for OAuth tokens at rest
// ABOUTME: Prepends a random 96-bit nonce to the ciphertext and base64-encodes the result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::EncryptionKey;
use base64::{engine::general_purpose, Engine as _};
use healthmetrics_core::errors::VaultError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use std::sync::Arc;

/// Encrypts and decrypts tokens with one process-wide key
///
/// Stored format: `base64(nonce || ciphertext || tag)`.
#[derive(Clone)]
pub struct TokenVault {
    key: Arc<LessSafeKey>,
    rng: SystemRandom,
}

impl fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVault").finish_non_exhaustive()
    }
}

impl TokenVault {
    /// Build a vault from raw key bytes
    ///
    /// # Errors
    ///
    /// Returns `VaultError::KeyConfig` unless the key is exactly 32 bytes
    pub fn new(key_bytes: &[u8]) -> Result<Self, VaultError> {
        if key_bytes.len() != AES_256_GCM.key_len() {
            return Err(VaultError::key_config(format!(
                "expected {} bytes, got {}",
                AES_256_GCM.key_len(),
                key_bytes.len()
            )));
        }

        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes)
            .map_err(|_| VaultError::key_config("key rejected by AES-256-GCM"))?;

        Ok(Self {
            key: Arc::new(LessSafeKey::new(unbound)),
            rng: SystemRandom::new(),
        })
    }

    /// Build a vault from a validated configuration key
    ///
    /// # Errors
    ///
    /// Returns `VaultError::KeyConfig` if the key is rejected
    pub fn from_key(key: &EncryptionKey) -> Result<Self, VaultError> {
        Self::new(key.as_bytes())
    }

    /// Encrypt a non-empty plaintext
    ///
    /// # Errors
    ///
    /// Returns `VaultError::EmptyInput` for an empty string, or
    /// `VaultError::EncryptionFailed` if the RNG or seal fails
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        if plaintext.is_empty() {
            return Err(VaultError::EmptyInput);
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| VaultError::encryption_failed("nonce generation failed"))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::encryption_failed("seal failed"))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + in_out.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&in_out);

        Ok(general_purpose::STANDARD.encode(combined))
    }

    /// Decrypt a value produced by [`TokenVault::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns `VaultError::EmptyInput` for an empty string, and
    /// `VaultError::DecryptionFailed` for bad encoding, a short payload,
    /// authentication failure, or non-UTF-8 plaintext
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        if ciphertext.is_empty() {
            return Err(VaultError::EmptyInput);
        }

        let combined = general_purpose::STANDARD
            .decode(ciphertext)
            .map_err(|e| VaultError::decryption_failed(format!("invalid base64: {e}")))?;

        if combined.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(VaultError::decryption_failed("ciphertext too short"));
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| VaultError::decryption_failed("invalid nonce"))?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::decryption_failed("authentication failed"))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| VaultError::decryption_failed("plaintext is not UTF-8"))
    }
}
