// Google OAuth 2.0 sign-in
// Exchanges an authorization code for an ID token and verifies it with Google

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKEN_INFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity confirmed by Google
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("Google sign-in is not configured")]
    NotConfigured,

    #[error("Failed to exchange authorization code: {0}")]
    Exchange(String),

    #[error("Invalid Google ID token: {0}")]
    InvalidToken(String),
}

/// Turns an authorization code into a verified Google identity
#[async_trait]
pub trait GoogleIdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, GoogleAuthError>;
}

/// Credentials of the registered OAuth client
#[derive(Debug, Clone)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
}

impl TokenInfo {
    fn into_profile(self, client_id: &str) -> Result<GoogleProfile, GoogleAuthError> {
        if self.aud != client_id {
            return Err(GoogleAuthError::InvalidToken("audience mismatch".to_string()));
        }
        if self.email_verified.as_deref() == Some("false") {
            return Err(GoogleAuthError::InvalidToken("email not verified".to_string()));
        }
        let email = self
            .email
            .ok_or_else(|| GoogleAuthError::InvalidToken("email claim missing".to_string()))?;
        Ok(GoogleProfile {
            email,
            name: self.name,
        })
    }
}

/// `reqwest` client for Google's token and tokeninfo endpoints
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    settings: Option<GoogleOAuthSettings>,
}

impl GoogleOAuthClient {
    /// Builds a client; without settings every exchange fails with `NotConfigured`
    pub fn new(settings: Option<GoogleOAuthSettings>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl GoogleIdentityProvider for GoogleOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let settings = self.settings.as_ref().ok_or(GoogleAuthError::NotConfigured)?;

        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("redirect_uri", settings.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?
            .json()
            .await
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?;

        let info: TokenInfo = self
            .http
            .get(TOKEN_INFO_URL)
            .query(&[("id_token", token.id_token.as_str())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GoogleAuthError::InvalidToken(e.to_string()))?
            .json()
            .await
            .map_err(|e| GoogleAuthError::InvalidToken(e.to_string()))?;

        info.into_profile(&settings.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(aud: &str, verified: Option<&str>) -> TokenInfo {
        TokenInfo {
            aud: aud.to_string(),
            email: Some("driver@gmail.com".to_string()),
            email_verified: verified.map(str::to_string),
            name: Some("Driver".to_string()),
        }
    }

    #[test]
    fn audience_must_match_client() {
        assert!(info("client-1", Some("true")).into_profile("client-1").is_ok());
        assert!(matches!(
            info("someone-else", Some("true")).into_profile("client-1"),
            Err(GoogleAuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn unverified_email_rejected() {
        assert!(info("client-1", Some("false")).into_profile("client-1").is_err());
    }

    #[test]
    fn tokeninfo_payload_parses() {
        let raw = r#"{"aud":"client-1","email":"a@b.com","email_verified":"true","sub":"123"}"#;
        let parsed: TokenInfo = serde_json::from_str(raw).unwrap();
        let profile = parsed.into_profile("client-1").unwrap();
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.name, None);
    }

    #[tokio::test]
    async fn unconfigured_client_refuses() {
        let client = GoogleOAuthClient::new(None);
        let result = client.exchange_code("code").await;
        assert!(matches!(result, Err(GoogleAuthError::NotConfigured)));
    }
}
