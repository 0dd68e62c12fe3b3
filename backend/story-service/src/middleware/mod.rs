/// HTTP middleware for story-service
///
/// Bearer-token authentication that tolerates anonymous requests: handlers
/// decide whether they need an identity by extracting `UserId` (401 when
/// missing) or `Option<UserId>`.
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

// =====================================================================
// JWT validation
// =====================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated user
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// HS256 token validation with a secret shared with the identity service.
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Returns the subject of a valid, unexpired token.
    pub fn validate(&self, token: &str) -> Result<String, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid or expired token: {e}")))?;

        if data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".into()));
        }
        Ok(data.claims.sub)
    }

    /// Sign a token for `sub`; used by tooling and tests.
    pub fn issue(&self, sub: &str, ttl_secs: i64) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + ttl_secs,
            iat: now,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }
}

// =====================================================================
// Authentication middleware
// =====================================================================

/// Authenticated user identifier stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validates `Authorization: Bearer <jwt>` when present. Requests without
/// the header pass through anonymously; a malformed or invalid token is
/// rejected with 401.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    validator: Arc<JwtValidator>,
}

impl JwtAuthMiddleware {
    pub fn new(validator: Arc<JwtValidator>) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    validator: Arc<JwtValidator>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let validator = self.validator.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().map(str::to_string));

            match auth_header {
                None => {
                    debug!(path = %req.path(), "Anonymous request");
                }
                Some(Err(_)) => {
                    return Err(AppError::Unauthorized("Malformed Authorization header".into()).into())
                }
                Some(Ok(value)) => {
                    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                        AppError::Unauthorized("Invalid Authorization scheme".into())
                    })?;
                    let user_id = validator.validate(token.trim())?;
                    req.extensions_mut().insert(UserId(user_id));
                }
            }

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Authentication required".into()).into()),
        )
    }
}
