// SPDX-License-Identifier: AGPL-3.0-or-later

//! Password-based key vault.
//!
//! Private keys are encrypted at rest with a key derived from the owner's
//! credential secret: PBKDF2-HMAC-SHA256 (100,000 iterations, 128-bit random
//! salt) feeding AES-256-GCM with a fresh 96-bit nonce per encryption. The
//! stored blob is `nonce ‖ ciphertext`, base64-encoded, alongside the
//! base64-encoded salt.
//!
//! GCM's authentication tag means a wrong password or tampered blob fails
//! closed at decrypt time instead of yielding garbage key bytes. Both cases
//! surface as the same [`CryptoError`]; the split is never revealed.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// PBKDF2 iteration count for the at-rest encryption key.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// KDF salt length in bytes (128 bits), unique per account.
const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes (96 bits), unique per encryption.
const NONCE_LEN: usize = 12;

/// Derived key length in bytes (AES-256).
const KEY_LEN: usize = 32;

/// Encrypts and decrypts private keys with a password-derived key.
#[derive(Debug, Clone)]
pub struct KeyVault {
    iterations: u32,
}

impl Default for KeyVault {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyVault {
    /// Create a vault with the standard iteration count.
    pub fn new() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }

    fn derive_key(&self, password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, self.iterations, key.as_mut());
        key
    }

    /// Encrypt a private key under a password.
    ///
    /// Returns `(ciphertext_b64, salt_b64)`. A fresh salt and nonce are drawn
    /// for every call, so encryption is never deterministic.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        password: &str,
    ) -> Result<(String, String), CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = self.derive_key(password, &salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CryptoError::InvalidPasswordOrCorruptData)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok((BASE64.encode(blob), BASE64.encode(salt)))
    }

    /// Decrypt a private key with the password and the account's salt.
    ///
    /// Any decode or cipher failure collapses into the one [`CryptoError`]
    /// variant. The plaintext comes back in a [`Zeroizing`] buffer and is
    /// scrubbed when dropped.
    pub fn decrypt(
        &self,
        ciphertext_b64: &str,
        password: &str,
        salt_b64: &str,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let salt = BASE64
            .decode(salt_b64)
            .map_err(|_| CryptoError::InvalidPasswordOrCorruptData)?;
        let blob = BASE64
            .decode(ciphertext_b64)
            .map_err(|_| CryptoError::InvalidPasswordOrCorruptData)?;

        if blob.len() <= NONCE_LEN {
            return Err(CryptoError::InvalidPasswordOrCorruptData);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);

        let key = self.derive_key(password, &salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::InvalidPasswordOrCorruptData)?;

        Ok(Zeroizing::new(plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8] = b"ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn roundtrip_recovers_plaintext() {
        let vault = KeyVault::new();
        let (ciphertext, salt) = vault.encrypt(TEST_KEY, "correct horse").unwrap();

        let plaintext = vault.decrypt(&ciphertext, "correct horse", &salt).unwrap();
        assert_eq!(plaintext.as_slice(), TEST_KEY);
    }

    #[test]
    fn wrong_password_fails_closed() {
        let vault = KeyVault::new();
        let (ciphertext, salt) = vault.encrypt(TEST_KEY, "correct horse").unwrap();

        let result = vault.decrypt(&ciphertext, "battery staple", &salt);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidPasswordOrCorruptData)
        ));
    }

    #[test]
    fn encryption_is_never_deterministic() {
        let vault = KeyVault::new();
        let (ct1, salt1) = vault.encrypt(TEST_KEY, "pw").unwrap();
        let (ct2, salt2) = vault.encrypt(TEST_KEY, "pw").unwrap();

        assert_ne!(ct1, ct2);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let vault = KeyVault::new();
        let (ciphertext, salt) = vault.encrypt(TEST_KEY, "pw").unwrap();

        let mut blob = BASE64.decode(&ciphertext).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        let tampered = BASE64.encode(blob);

        let result = vault.decrypt(&tampered, "pw", &salt);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidPasswordOrCorruptData)
        ));
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let vault = KeyVault::new();

        assert!(vault.decrypt("not base64!!", "pw", "c2FsdA==").is_err());
        assert!(vault.decrypt("AAAA", "pw", "not base64!!").is_err());
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let vault = KeyVault::new();
        // Shorter than one nonce: nothing left to decrypt.
        let short = BASE64.encode([0u8; 8]);
        assert!(vault.decrypt(&short, "pw", &BASE64.encode([0u8; 16])).is_err());
    }
}
