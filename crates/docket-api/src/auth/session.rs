//! Session resolution
//!
//! A request carries two bearer tokens issued by the identity provider: the access
//! token (`Authorization: Bearer ..` or the `accessToken` cookie) and the id token
//! (`X-Id-Token` or the `idToken` cookie). Both must verify for the caller to have an
//! [`Identity`].

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter, Result as FmtResult};

pub const ID_TOKEN_HEADER: &str = "X-Id-Token";
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const ID_TOKEN_COOKIE: &str = "idToken";

/// Raw session material taken from the request. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

impl SessionContext {
    pub fn new(access_token: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            id_token: Some(id_token.into()),
        }
    }

    /// Headers win over cookies.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        let id_header = headers
            .get(ID_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);

        Self {
            access_token: bearer.or_else(|| cookie_value(headers, ACCESS_TOKEN_COOKIE)),
            id_token: id_header.or_else(|| cookie_value(headers, ID_TOKEN_COOKIE)),
        }
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionContext::from_headers(&parts.headers))
    }
}

/// Authenticated principal. Scopes storage keys and submission ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Identity(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Turns session material into an identity, or nothing.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, session: &SessionContext) -> Option<Identity>;
}

/// Claims read from identity-provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(
        rename = "cognito:username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cognito_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// HS256 verification of both session tokens against a shared secret.
pub struct JwtSessionResolver {
    key: DecodingKey,
    access_validation: Validation,
    id_validation: Validation,
}

impl JwtSessionResolver {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut access_validation = Validation::new(Algorithm::HS256);
        // Access tokens carry a client id rather than an audience
        access_validation.validate_aud = false;

        let mut id_validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => id_validation.set_audience(&[aud]),
            None => id_validation.validate_aud = false,
        }

        if let Some(iss) = issuer {
            access_validation.set_issuer(&[iss]);
            id_validation.set_issuer(&[iss]);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            access_validation,
            id_validation,
        }
    }

    fn verify(&self, token: &str, validation: &Validation, kind: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.key, validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, token_kind = kind, "Session token rejected");
                None
            }
        }
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, session: &SessionContext) -> Option<Identity> {
        let access = self.verify(
            session.access_token.as_deref()?,
            &self.access_validation,
            "access",
        )?;
        let id = self.verify(session.id_token.as_deref()?, &self.id_validation, "id")?;

        if access.sub != id.sub {
            tracing::debug!("Access and id tokens belong to different subjects");
            return None;
        }

        id.cognito_username
            .or(access.username)
            .filter(|u| !u.is_empty())
            .map(Identity::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "session-secret-with-at-least-32-chars";

    fn token(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + 600,
            username: None,
            cognito_username: None,
            token_use: None,
            iss: None,
            aud: None,
        }
    }

    fn pair(username: &str) -> SessionContext {
        let mut access = claims("sub-1");
        access.username = Some(format!("{}-access", username));
        access.token_use = Some("access".to_string());
        let mut id = claims("sub-1");
        id.cognito_username = Some(username.to_string());
        id.token_use = Some("id".to_string());
        SessionContext::new(token(&access, SECRET), token(&id, SECRET))
    }

    #[test]
    fn context_reads_headers_then_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer aaa"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=ccc; idToken=ddd"),
        );
        let ctx = SessionContext::from_headers(&headers);
        assert_eq!(ctx.access_token.as_deref(), Some("aaa"));
        assert_eq!(ctx.id_token.as_deref(), Some("ddd"));

        headers.insert(ID_TOKEN_HEADER, HeaderValue::from_static("bbb"));
        let ctx = SessionContext::from_headers(&headers);
        assert_eq!(ctx.id_token.as_deref(), Some("bbb"));
    }

    #[test]
    fn context_empty_without_credentials() {
        let ctx = SessionContext::from_headers(&HeaderMap::new());
        assert_eq!(ctx, SessionContext::default());
    }

    #[tokio::test]
    async fn both_tokens_yield_id_token_username() {
        let resolver = JwtSessionResolver::new(SECRET, None, None);
        assert_eq!(
            resolver.resolve(&pair("amina")).await,
            Some(Identity::new("amina"))
        );
    }

    #[tokio::test]
    async fn falls_back_to_access_token_username() {
        let resolver = JwtSessionResolver::new(SECRET, None, None);
        let mut access = claims("sub-1");
        access.username = Some("omar".to_string());
        let ctx = SessionContext::new(token(&access, SECRET), token(&claims("sub-1"), SECRET));
        assert_eq!(resolver.resolve(&ctx).await, Some(Identity::new("omar")));
    }

    #[tokio::test]
    async fn missing_or_foreign_tokens_resolve_to_none() {
        let resolver = JwtSessionResolver::new(SECRET, None, None);
        let full = pair("amina");

        let only_access = SessionContext {
            access_token: full.access_token.clone(),
            id_token: None,
        };
        assert_eq!(resolver.resolve(&only_access).await, None);

        let mut forged = claims("sub-1");
        forged.cognito_username = Some("amina".to_string());
        let ctx = SessionContext {
            access_token: full.access_token.clone(),
            id_token: Some(token(&forged, "some-other-secret-that-is-long-enough")),
        };
        assert_eq!(resolver.resolve(&ctx).await, None);

        let mut other = claims("sub-2");
        other.cognito_username = Some("amina".to_string());
        let ctx = SessionContext {
            access_token: full.access_token,
            id_token: Some(token(&other, SECRET)),
        };
        assert_eq!(resolver.resolve(&ctx).await, None);
    }

    #[tokio::test]
    async fn expired_tokens_rejected() {
        let resolver = JwtSessionResolver::new(SECRET, None, None);
        let mut access = claims("sub-1");
        access.exp = chrono::Utc::now().timestamp() - 3600;
        access.username = Some("amina".to_string());
        let ctx = SessionContext::new(token(&access, SECRET), token(&claims("sub-1"), SECRET));
        assert_eq!(resolver.resolve(&ctx).await, None);
    }

    #[tokio::test]
    async fn issuer_and_audience_are_checked() {
        let resolver = JwtSessionResolver::new(SECRET, Some("https://idp.example"), Some("web"));

        let mut access = claims("sub-1");
        access.iss = Some("https://idp.example".to_string());
        access.username = Some("amina".to_string());
        let mut id = claims("sub-1");
        id.iss = Some("https://idp.example".to_string());
        id.aud = Some("web".to_string());
        let ctx = SessionContext::new(token(&access, SECRET), token(&id, SECRET));
        assert_eq!(resolver.resolve(&ctx).await, Some(Identity::new("amina")));

        id.aud = Some("mobile".to_string());
        let ctx = SessionContext::new(token(&access, SECRET), token(&id, SECRET));
        assert_eq!(resolver.resolve(&ctx).await, None);
    }
}
