//! Request guards: origin allow-list middleware and token extractor

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{
        HeaderMap, HeaderName, StatusCode,
        header::{HOST, LOCATION, ORIGIN, REFERER},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use share_core::OriginDecision;
use share_core::token::{TOKEN_HEADER, TokenDecision, presented_token};

use crate::error::ApiError;
use crate::state::SharedState;

/// Query parameters that may carry the token
#[derive(Debug, Default, Deserialize)]
struct TokenParams {
    token: Option<String>,
}

/// Proof that the request carried a currently valid token.
///
/// Put it first in a handler's arguments so rejection happens before any
/// other extraction or filesystem work.
#[derive(Debug, Clone, Copy)]
pub struct RequireToken;

impl FromRequestParts<SharedState> for RequireToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
        let params = Query::<TokenParams>::try_from_uri(&parts.uri)
            .map(|Query(p)| p)
            .unwrap_or_default();

        match state.tokens.validate(presented_token(header, params.token.as_deref())) {
            TokenDecision::Allowed => Ok(RequireToken),
            TokenDecision::Rejected => {
                tracing::warn!("Rejected token for {}", parts.uri.path());
                Err(ApiError::InvalidToken)
            }
        }
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> &str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

/// Origin allow-list middleware. Failing requests are redirected to the
/// decoy URL with a bare 302.
pub async fn origin_guard(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let decision = {
        let headers = request.headers();
        let host = match header_str(headers, HOST) {
            "" => request.uri().authority().map(|a| a.as_str()).unwrap_or(""),
            host => host,
        };
        state.guard.check(
            request.uri().path(),
            header_str(headers, ORIGIN),
            header_str(headers, REFERER),
            host,
        )
    };

    match decision {
        OriginDecision::Proceed => next.run(request).await,
        OriginDecision::Deflect => {
            tracing::debug!("Deflecting {} {}", request.method(), request.uri().path());
            (StatusCode::FOUND, [(LOCATION, state.decoy_url.clone())]).into_response()
        }
    }
}
