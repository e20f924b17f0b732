use async_trait::async_trait;

use aes_siv::aead::{Aead, KeyInit};
use aes_siv::{Aes128SivAead, Nonce};
use uuid::Uuid;

use unimig_ports::error::PortError;
use unimig_ports::outbound::SecretsService;

const NONCE_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// AES-SIV with a random nonce stored in front of every ciphertext.
pub struct AesSivSecrets {
    cipher: Aes128SivAead,
}

impl AesSivSecrets {
    pub fn new(key: &[u8]) -> Result<Self, PortError> {
        let cipher = Aes128SivAead::new_from_slice(key).map_err(|_| {
            PortError::Encryption(format!(
                "secret key must be {KEY_LEN} bytes, got {}",
                key.len()
            ))
        })?;
        Ok(Self { cipher })
    }

    pub fn from_hex(key: &str) -> Result<Self, PortError> {
        let bytes =
            hex::decode(key.trim()).map_err(|e| PortError::Encryption(format!("secret key: {e}")))?;
        Self::new(&bytes)
    }
}

#[async_trait]
impl SecretsService for AesSivSecrets {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, PortError> {
        let nonce_bytes = Uuid::new_v4().into_bytes();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| PortError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, PortError> {
        if ciphertext.len() < NONCE_LEN {
            return Err(PortError::Encryption("ciphertext too short".into()));
        }
        let (nonce, payload) = ciphertext.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), payload)
            .map_err(|_| PortError::Encryption("decryption failed".into()))
    }
}
