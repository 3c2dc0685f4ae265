//! Admin identity
//!
//! Admin requests carry a Google-issued ID token. The token is verified by an
//! [`IdentityVerifier`] and the verified e-mail must appear on the configured
//! allowlist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Identity provider error: {0}")]
    Verifier(String),
}

/// Identity asserted by a verified token
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: Option<String>,
}

/// Token verification seam
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Authenticated admin, inserted into request extensions by the auth layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminSession {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Allowlist plus verifier
#[derive(Clone)]
pub struct AuthContext {
    admin_emails: Vec<String>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthContext {
    /// `admin_emails` are compared case-insensitively
    pub fn new(admin_emails: Vec<String>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let admin_emails = admin_emails
            .into_iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            admin_emails,
            verifier,
        }
    }

    pub fn admin_emails(&self) -> &[String] {
        &self.admin_emails
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }

    /// Allowlist check for an already verified e-mail
    pub fn authorize(&self, identity: VerifiedIdentity) -> Result<AdminSession, IdentityError> {
        if !self.is_admin_email(&identity.email) {
            return Err(IdentityError::NotAuthorized(identity.email));
        }

        Ok(AdminSession {
            email: identity.email.trim().to_lowercase(),
            name: identity.name,
        })
    }

    /// Verify a bearer token and check the allowlist
    pub async fn authenticate(&self, token: &str) -> Result<AdminSession, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::MissingToken);
        }

        let identity = self.verifier.verify(token.trim()).await?;
        self.authorize(identity)
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    email: Option<String>,
    /// Google returns this as the string "true"/"false"
    email_verified: Option<String>,
    aud: Option<String>,
    name: Option<String>,
}

/// Verifies Google ID tokens against the tokeninfo endpoint
pub struct GoogleTokenVerifier {
    http_client: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleTokenVerifier {
    /// With `client_id` set, tokens issued for any other audience are rejected
    pub fn new(client_id: Option<String>) -> Result<Self, IdentityError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Verifier(e.to_string()))?;

        Ok(Self {
            http_client,
            client_id,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .http_client
            .get(GOOGLE_TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| IdentityError::Verifier(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(IdentityError::InvalidToken(format!(
                "tokeninfo rejected token ({})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(IdentityError::Verifier(format!(
                "tokeninfo returned {}",
                status.as_u16()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::Verifier(e.to_string()))?;

        check_token_info(info, self.client_id.as_deref())
    }
}

fn check_token_info(
    info: TokenInfo,
    client_id: Option<&str>,
) -> Result<VerifiedIdentity, IdentityError> {
    if let Some(expected) = client_id {
        if info.aud.as_deref() != Some(expected) {
            return Err(IdentityError::InvalidToken("audience mismatch".to_string()));
        }
    }

    if info.email_verified.as_deref() != Some("true") {
        return Err(IdentityError::InvalidToken("e-mail not verified".to_string()));
    }

    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| IdentityError::InvalidToken("token carries no e-mail".to_string()))?;

    Ok(VerifiedIdentity {
        email,
        name: info.name,
    })
}
