//! Cookie encryption at rest: AES-256-GCM, random 12-byte nonce
//! prefixed to the ciphertext, base64 for storage.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;

const NONCE_SIZE: usize = 12;

pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn new(master_key: &[u8]) -> Result<Self> {
        if master_key.len() != 32 {
            return Err(anyhow::anyhow!(
                "Master key must be 32 bytes, got {}",
                master_key.len()
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(master_key)
            .map_err(|err| anyhow::anyhow!("Invalid master key length: {:?}", err))?;

        Ok(Self { cipher })
    }

    /// Builds a cipher from a base64-encoded 32-byte master key, the
    /// form the key takes in the service environment.
    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|err| anyhow::anyhow!("Master key is not valid base64: {}", err))?;
        Self::new(&key)
    }

    /// Encrypts a cookie string into a base64 `nonce || ciphertext`
    /// blob suitable for a redb value.
    pub fn seal(&self, cookie: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut ciphertext = self
            .cipher
            .encrypt(nonce, cookie.as_bytes())
            .map_err(|err| anyhow::anyhow!("Failed to encrypt cookie: {:?}", err))?;
        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.append(&mut ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Reverses [`CredentialCipher::seal`]. Fails on truncation,
    /// tampering or a mismatched key.
    pub fn open(&self, sealed: &str) -> Result<String> {
        let sealed = STANDARD
            .decode(sealed)
            .map_err(|err| anyhow::anyhow!("Sealed cookie is not valid base64: {}", err))?;
        if sealed.len() < NONCE_SIZE {
            return Err(anyhow::anyhow!("Sealed cookie is too short"));
        }

        let (nonce_bytes, payload) = sealed.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, payload)
            .map_err(|err| anyhow::anyhow!("Failed to decrypt cookie: {:?}", err))?;
        Ok(String::from_utf8(plaintext)?)
    }
}
