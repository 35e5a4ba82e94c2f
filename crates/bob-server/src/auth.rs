//! Authentication seam.
//!
//! Sessions are issued elsewhere; the server only maps the bearer token of
//! a request onto a [`PrincipalId`] through an [`AuthProvider`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use bob_types::PrincipalId;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// The authenticated caller of an API request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub principal: PrincipalId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read `Authorization: Bearer <token>`. Anything else is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return Self::Anonymous;
        };
        match value.trim().split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
                let token = token.trim();
                if token.is_empty() {
                    Self::Anonymous
                } else {
                    Self::Bearer(token.to_string())
                }
            }
            _ => Self::Anonymous,
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<PrincipalId>;
}

/// Trusts the upstream session layer: the bearer token is the principal id.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrustedBearerAuth;

#[async_trait]
impl AuthProvider for TrustedBearerAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<PrincipalId> {
        match credentials {
            Credentials::Bearer(token) => PrincipalId::new(token)
                .map_err(|e| ServerError::Unauthorized(e.to_string())),
            Credentials::Anonymous => Err(ServerError::Unauthorized("missing bearer token".into())),
        }
    }
}

/// Fixed token to principal table, typically from the `tokens` config key.
pub struct TokenTableAuth {
    tokens: HashMap<String, PrincipalId>,
}

impl TokenTableAuth {
    pub fn new(tokens: &BTreeMap<String, String>) -> ServerResult<Self> {
        let tokens = tokens
            .iter()
            .map(|(token, principal)| {
                PrincipalId::new(principal)
                    .map(|p| (token.clone(), p))
                    .map_err(|e| ServerError::Config(format!("tokens: {e}")))
            })
            .collect::<ServerResult<HashMap<_, _>>>()?;
        Ok(Self { tokens })
    }
}

#[async_trait]
impl AuthProvider for TokenTableAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<PrincipalId> {
        match credentials {
            Credentials::Bearer(token) => self
                .tokens
                .get(token)
                .cloned()
                .ok_or_else(|| ServerError::Unauthorized("unknown token".into())),
            Credentials::Anonymous => Err(ServerError::Unauthorized("missing bearer token".into())),
        }
    }
}

impl std::fmt::Debug for TokenTableAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTableAuth")
            .field("token_count", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ServerResult<Self> {
        let credentials = Credentials::from_headers(&parts.headers);
        let principal = state.auth().authenticate(&credentials).await?;
        Ok(Self { principal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(
            Credentials::from_headers(&headers("Bearer abc")),
            Credentials::Bearer("abc".into())
        );
        assert_eq!(
            Credentials::from_headers(&headers("bearer  abc ")),
            Credentials::Bearer("abc".into())
        );
    }

    #[test]
    fn other_headers_are_anonymous() {
        assert_eq!(Credentials::from_headers(&HeaderMap::new()), Credentials::Anonymous);
        assert_eq!(Credentials::from_headers(&headers("Basic dXNlcg==")), Credentials::Anonymous);
        assert_eq!(Credentials::from_headers(&headers("Bearer ")), Credentials::Anonymous);
    }

    #[tokio::test]
    async fn trusted_bearer_uses_token_as_principal() {
        let auth = TrustedBearerAuth;
        let principal = auth
            .authenticate(&Credentials::Bearer("alice".into()))
            .await
            .unwrap();
        assert_eq!(principal.as_str(), "alice");
        assert!(matches!(
            auth.authenticate(&Credentials::Anonymous).await,
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn token_table_maps_known_tokens() {
        let table = BTreeMap::from([("s3cret".to_string(), "alice".to_string())]);
        let auth = TokenTableAuth::new(&table).unwrap();
        let principal = auth
            .authenticate(&Credentials::Bearer("s3cret".into()))
            .await
            .unwrap();
        assert_eq!(principal.as_str(), "alice");
        assert!(matches!(
            auth.authenticate(&Credentials::Bearer("alice".into())).await,
            Err(ServerError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_table_rejects_blank_principals() {
        let table = BTreeMap::from([("t".to_string(), "  ".to_string())]);
        assert!(matches!(TokenTableAuth::new(&table), Err(ServerError::Config(_))));
    }
}
