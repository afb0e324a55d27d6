//! JWT token handling
//!
//! Access and refresh tokens are signed with separate secrets so a leaked
//! refresh secret cannot mint access tokens. Preview tokens reuse the access
//! secret but carry their own `type`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use qrest_shared::config::JwtSettings;
use qrest_shared::constants::{TOKEN_TYPE_ACCESS, TOKEN_TYPE_PREVIEW, TOKEN_TYPE_REFRESH};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token creation failed: {0}")]
    CreationError(String),
    #[error("Token validation failed: {0}")]
    ValidationError(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("Unexpected token type: {0}")]
    WrongTokenType(String),
}

/// Identity carried by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
    pub org_id: Option<Uuid>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub org_id: Option<Uuid>,
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub token_type: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            user_id: self.user_id,
            email: self.email.clone(),
            org_id: self.org_id,
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewClaims {
    pub menu_id: Uuid,
    pub org_id: Uuid,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    access_secret: String,
    refresh_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    preview_token_expiry: i64,
}

impl JwtService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            access_secret: settings.access_secret.clone(),
            refresh_secret: settings.refresh_secret.clone(),
            access_token_expiry: settings.access_token_expiry,
            refresh_token_expiry: settings.refresh_token_expiry,
            preview_token_expiry: settings.preview_token_expiry,
        }
    }

    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }

    pub fn preview_token_expiry(&self) -> i64 {
        self.preview_token_expiry
    }

    pub fn generate_access_token(&self, subject: &TokenSubject) -> Result<String, JwtError> {
        let claims = self.claims(subject, TOKEN_TYPE_ACCESS, self.access_token_expiry);
        sign(&claims, &self.access_secret)
    }

    pub fn generate_refresh_token(&self, subject: &TokenSubject) -> Result<String, JwtError> {
        let claims = self.claims(subject, TOKEN_TYPE_REFRESH, self.refresh_token_expiry);
        sign(&claims, &self.refresh_secret)
    }

    pub fn generate_preview_token(&self, menu_id: Uuid, org_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = PreviewClaims {
            menu_id,
            org_id,
            token_type: TOKEN_TYPE_PREVIEW.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.preview_token_expiry)).timestamp(),
        };
        sign(&claims, &self.access_secret)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = verify(token, &self.access_secret)?;
        expect_type(&claims.token_type, TOKEN_TYPE_ACCESS)?;
        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = verify(token, &self.refresh_secret)?;
        expect_type(&claims.token_type, TOKEN_TYPE_REFRESH)?;
        Ok(claims)
    }

    pub fn verify_preview_token(&self, token: &str) -> Result<PreviewClaims, JwtError> {
        let claims: PreviewClaims = verify(token, &self.access_secret)?;
        expect_type(&claims.token_type, TOKEN_TYPE_PREVIEW)?;
        Ok(claims)
    }

    fn claims(&self, subject: &TokenSubject, token_type: &str, expiry: i64) -> Claims {
        let now = Utc::now();
        Claims {
            user_id: subject.user_id,
            email: subject.email.clone(),
            org_id: subject.org_id,
            role: subject.role.clone(),
            token_type: token_type.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
        }
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreationError(e.to_string()))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, JwtError> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::ValidationError(e.to_string()),
    })
}

fn expect_type(actual: &str, expected: &str) -> Result<(), JwtError> {
    if actual == expected {
        Ok(())
    } else {
        Err(JwtError::WrongTokenType(actual.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            access_secret: "access-secret-access-secret-0123456789".into(),
            refresh_secret: "refresh-secret-refresh-secret-0123456789".into(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            preview_token_expiry: 86400,
        }
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            email: "owner@demo.com".into(),
            org_id: Some(Uuid::new_v4()),
            role: Some("OWNER".into()),
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = JwtService::new(&settings());
        let subject = subject();
        let token = service.generate_access_token(&subject).unwrap();
        let claims = service.verify_access_token(&token).unwrap();
        assert_eq!(claims.subject(), subject);
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_refresh_token_not_accepted_as_access() {
        let service = JwtService::new(&settings());
        let refresh = service.generate_refresh_token(&subject()).unwrap();
        assert!(service.verify_access_token(&refresh).is_err());
        assert!(service.verify_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_access_token_not_accepted_as_refresh() {
        let service = JwtService::new(&settings());
        let access = service.generate_access_token(&subject()).unwrap();
        assert!(service.verify_refresh_token(&access).is_err());
    }

    #[test]
    fn test_preview_token_has_own_type() {
        let service = JwtService::new(&settings());
        let menu_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let token = service.generate_preview_token(menu_id, org_id).unwrap();

        let claims = service.verify_preview_token(&token).unwrap();
        assert_eq!(claims.menu_id, menu_id);
        assert_eq!(claims.org_id, org_id);
        assert!(service.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let mut s = settings();
        s.access_token_expiry = -3600;
        let service = JwtService::new(&s);
        let token = service.generate_access_token(&subject()).unwrap();
        assert_eq!(service.verify_access_token(&token).unwrap_err(), JwtError::TokenExpired);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let service = JwtService::new(&settings());
        let subject = subject();
        let a = service.generate_refresh_token(&subject).unwrap();
        let b = service.generate_refresh_token(&subject).unwrap();
        assert_ne!(a, b);
    }
}
