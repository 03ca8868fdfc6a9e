use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id.
    pub sub: String,
    pub exp: usize,
}

fn bearer_token(req: &Request) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))
}

pub fn decode_subject(token: &str, secret: &str) -> Result<Uuid> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
    data.claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| Error::Unauthorized("invalid_subject".to_string()))
}

/// Resolves the bearer token to an `Actor` and stores it in the request
/// extensions. The role comes from the registry, never from the token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let principal_id = decode_subject(bearer_token(&req)?, &state.jwt_secret)?;
    let actor = state.identity_service.resolve_actor(principal_id).await?;
    tracing::debug!(actor = %actor, "request authenticated");
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
