//! Admin authorization middleware.
//!
//! Admin routes expect `Authorization: Bearer <ADMIN_TOKEN>`. When no token
//! is configured the routes are open, which is only meant for local
//! development.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use super::AppState;

/// Reject admin requests without the configured bearer token
///
/// - **Missing header**: Returns `401 Unauthorized`
/// - **Wrong token**: Returns `403 Forbidden`
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !tokens_match(token.as_bytes(), expected.as_bytes()) {
        tracing::warn!(uri = %request.uri(), "Rejected admin request with invalid token");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    given.ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(b"secret-token-123", b"secret-token-123"));
        assert!(!tokens_match(b"secret-token-124", b"secret-token-123"));
        assert!(!tokens_match(b"secret", b"secret-token-123"));
        assert!(!tokens_match(b"", b"x"));
    }
}
