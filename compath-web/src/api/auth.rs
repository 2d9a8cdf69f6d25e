//! HTTP Basic authentication for curator routes
//!
//! Credentials are `email:password`, verified against the `users` table.
//! The authenticated user is attached to the request as [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use compath_common::db::users::{authenticate, is_admin, User};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated user of the current request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub is_admin: bool,
}

impl CurrentUser {
    /// Reject non-admin users with 403
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "{} is not an administrator",
                self.user.email
            )))
        }
    }
}

/// Decode `Authorization: Basic ...` into (email, password)
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

/// Authentication middleware
///
/// Applied to protected routes only. Returns 401 when credentials are
/// missing, malformed, wrong, or belong to an inactive account.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let (email, password) = basic_credentials(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing Basic credentials".to_string()))?;

    let user = match authenticate(&state.ctx.db, &email, &password).await? {
        Some(user) => user,
        None => {
            warn!("Rejected login for {}", email);
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }
    };

    let admin = is_admin(&state.ctx.db, user.id).await?;
    debug!("Authenticated {} (admin: {})", user.email, admin);

    request.extensions_mut().insert(CurrentUser {
        user,
        is_admin: admin,
    });
    Ok(next.run(request).await)
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
    fn test_basic_credentials() {
        let encoded = BASE64_STANDARD.encode("curator@example.org:pa:ss");
        assert_eq!(
            basic_credentials(&headers(&format!("Basic {}", encoded))),
            Some(("curator@example.org".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn test_malformed_credentials() {
        assert!(basic_credentials(&HeaderMap::new()).is_none());
        assert!(basic_credentials(&headers("Bearer abc")).is_none());
        assert!(basic_credentials(&headers("Basic not-base64!")).is_none());

        let no_colon = BASE64_STANDARD.encode("curator@example.org");
        assert!(basic_credentials(&headers(&format!("Basic {}", no_colon))).is_none());
    }
}
