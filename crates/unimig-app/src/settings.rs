use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use unimig_core::channel::ChannelType;
use unimig_ports::outbound::SecretsService;

use crate::error::AppError;

/// Channel settings split into plain settings and encrypted secure
/// settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodedSettings {
    pub settings: Value,
    /// Base64 encoded ciphertext.
    pub secure_settings: BTreeMap<String, String>,
}

pub struct SettingsTranscoder<'a, S: SecretsService> {
    secrets: &'a S,
}

impl<'a, S: SecretsService> SettingsTranscoder<'a, S> {
    pub fn new(secrets: &'a S) -> Self {
        Self { secrets }
    }

    /// Moves plaintext fields that `kind` keeps secure into the secure map,
    /// unless the secure map already holds a non-empty value, then encrypts
    /// every secure value.
    pub async fn transcode(
        &self,
        kind: &str,
        settings: &Value,
        secure_settings: &BTreeMap<String, Vec<u8>>,
    ) -> Result<TranscodedSettings, AppError> {
        let mut plain: Map<String, Value> = settings.as_object().cloned().unwrap_or_default();
        let mut secure = self.decrypt_all(secure_settings).await?;

        let keys = ChannelType::parse(kind).map_or(&[][..], ChannelType::secure_keys);
        for key in keys {
            if secure.get(*key).is_some_and(|v| !v.is_empty()) {
                continue;
            }
            let value = plain.get(*key).and_then(Value::as_str).unwrap_or_default();
            if !value.is_empty() {
                secure.insert(key.to_string(), value.to_string());
                plain.remove(*key);
            }
        }

        let mut encrypted = BTreeMap::new();
        for (key, value) in secure {
            let ciphertext = self.secrets.encrypt(value.as_bytes()).await?;
            encrypted.insert(key, STANDARD.encode(ciphertext));
        }

        Ok(TranscodedSettings {
            settings: Value::Object(plain),
            secure_settings: encrypted,
        })
    }

    async fn decrypt_all(
        &self,
        secure_settings: &BTreeMap<String, Vec<u8>>,
    ) -> Result<BTreeMap<String, String>, AppError> {
        let mut out = BTreeMap::new();
        for (key, ciphertext) in secure_settings {
            let plaintext = self.secrets.decrypt(ciphertext).await?;
            let value = String::from_utf8(plaintext)
                .map_err(|_| AppError::InvalidSecureSetting(key.clone()))?;
            out.insert(key.clone(), value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockSecrets;
    use serde_json::json;

    fn decode(value: &str) -> String {
        let raw = STANDARD.decode(value).unwrap();
        String::from_utf8(raw).unwrap()
    }

    #[tokio::test]
    async fn plaintext_secret_moves_to_secure_settings() {
        let secrets = MockSecrets;
        let transcoder = SettingsTranscoder::new(&secrets);
        let out = transcoder
            .transcode(
                "slack",
                &json!({"url": "https://hooks", "recipient": "#ops"}),
                &BTreeMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(out.settings, json!({"recipient": "#ops"}));
        assert_eq!(decode(&out.secure_settings["url"]), "enc:https://hooks");
    }

    #[tokio::test]
    async fn existing_secure_value_wins_over_plaintext() {
        let secrets = MockSecrets;
        let transcoder = SettingsTranscoder::new(&secrets);
        let secure = BTreeMap::from([("integrationKey".to_string(), b"enc:secure".to_vec())]);
        let out = transcoder
            .transcode("pagerduty", &json!({"integrationKey": "plain"}), &secure)
            .await
            .unwrap();

        assert_eq!(out.settings, json!({"integrationKey": "plain"}));
        assert_eq!(decode(&out.secure_settings["integrationKey"]), "enc:secure");
    }

    #[tokio::test]
    async fn empty_plaintext_values_stay_put() {
        let secrets = MockSecrets;
        let transcoder = SettingsTranscoder::new(&secrets);
        let out = transcoder
            .transcode("webhook", &json!({"url": "u", "password": ""}), &BTreeMap::new())
            .await
            .unwrap();

        assert_eq!(out.settings, json!({"url": "u", "password": ""}));
        assert!(out.secure_settings.is_empty());
    }

    #[tokio::test]
    async fn unknown_types_only_reencrypt() {
        let secrets = MockSecrets;
        let transcoder = SettingsTranscoder::new(&secrets);
        let secure = BTreeMap::from([("token".to_string(), b"enc:t".to_vec())]);
        let out = transcoder
            .transcode("email", &json!({"token": "plain"}), &secure)
            .await
            .unwrap();

        assert_eq!(out.settings, json!({"token": "plain"}));
        assert_eq!(decode(&out.secure_settings["token"]), "enc:t");
    }

    #[tokio::test]
    async fn undecryptable_secret_fails() {
        let secrets = MockSecrets;
        let transcoder = SettingsTranscoder::new(&secrets);
        let secure = BTreeMap::from([("token".to_string(), b"garbage".to_vec())]);
        let result = transcoder.transcode("line", &json!({}), &secure).await;
        assert!(matches!(result, Err(AppError::Port(_))));
    }
}
