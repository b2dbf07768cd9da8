use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::{rand::SystemRandom, signature};
use serde::Deserialize;
use std::{fs, path::Path};
use tokio::sync::Mutex;
use tracing::debug;
use super::error::CredentialError;

pub const DEFAULT_CREDENTIALS_FILE: &str = "firebase-key.json";

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// refresh this long before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

// service account key file, read once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<ServiceAccountKey, CredentialError> {
        let content = fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_owned(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| CredentialError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    // signed RS256 assertion for the token endpoint
    fn assertion(&self, issued_at: i64) -> Result<String, CredentialError> {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let claims = serde_json::json!({
            "iss": self.client_email,
            "scope": DATASTORE_SCOPE,
            "aud": self.token_uri,
            "iat": issued_at,
            "exp": issued_at + TOKEN_LIFETIME_SECS,
        });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header, payload);

        // key files sometimes carry escaped newlines
        let private_key = self.private_key.replace("\\n", "\n");
        let pem = pem::parse(&private_key).map_err(|e| CredentialError::Key {
            message: e.to_string(),
        })?;
        let key_pair = signature::RsaKeyPair::from_pkcs8(pem.contents()).map_err(|e| {
            CredentialError::Key {
                message: e.to_string(),
            }
        })?;

        let mut signed = vec![0u8; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &signature::RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signed,
            )
            .map_err(|_| CredentialError::Sign)?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(&signed)))
    }
}

struct CachedToken {
    access_token: String,
    expires_at: i64,
}

// hands out bearer tokens for one service account
pub struct TokenSource {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> TokenSource {
        TokenSource {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, CredentialError> {
        self.access_token_at(chrono::Utc::now().timestamp()).await
    }

    async fn access_token_at(&self, now: i64) -> Result<String, CredentialError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(token.access_token.clone());
            }
        }

        debug!(client_email = %self.key.client_email, "requesting access token");
        let token = self.exchange(now).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken, CredentialError> {
        let assertion = self.key.assertion(now)?;
        let exchange_error = |e: reqwest::Error| CredentialError::Exchange {
            message: e.to_string(),
        };

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(exchange_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Exchange {
                message: format!("{}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await.map_err(exchange_error)?;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS),
        })
    }
}
