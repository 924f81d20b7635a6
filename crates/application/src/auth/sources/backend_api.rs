//! Client for the backend-of-record `/auth/*` endpoints.
//!
//! Shared by the backend and federated identity strategies. It talks to the
//! transport directly: the credential for `/auth/profile` is always passed
//! explicitly, never read from the credential store.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use artdesk_domain::{ApiRequest, ApiResponse, Token, UserProfile};

use crate::ports::{HttpTransport, IdentityError};

/// Field names a login response may carry the session token under.
const TOKEN_FIELDS: [&str; 3] = ["token", "accessToken", "access_token"];

#[derive(Clone)]
pub(crate) struct BackendAuthApi {
    transport: Arc<dyn HttpTransport>,
}

impl BackendAuthApi {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// `POST /auth/login`.
    pub(crate) async fn login(&self, email: &str, password: &str) -> Result<Value, IdentityError> {
        self.call(ApiRequest::post("/auth/login").json(json!({
            "email": email,
            "password": password,
        })))
        .await
    }

    /// `POST /auth/register`, optionally carrying a provider credential so the
    /// backend can link the account.
    pub(crate) async fn register(
        &self,
        body: Value,
        credential: Option<&Token>,
    ) -> Result<Value, IdentityError> {
        let mut request = ApiRequest::post("/auth/register").json(body);
        if let Some(token) = credential {
            request.set_header("Authorization", token.authorization_header());
        }
        self.call(request).await
    }

    /// `POST /auth/forgot-password`.
    pub(crate) async fn forgot_password(&self, email: &str) -> Result<(), IdentityError> {
        self.call(ApiRequest::post("/auth/forgot-password").json(json!({ "email": email })))
            .await
            .map(drop)
    }

    /// `POST /auth/reset-password`.
    pub(crate) async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        self.call(ApiRequest::post("/auth/reset-password").json(json!({
            "email": email,
            "code": code,
            "password": new_password,
        })))
        .await
        .map(drop)
    }

    /// `POST /auth/verify-email`.
    pub(crate) async fn verify_email(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.call(ApiRequest::post("/auth/verify-email").json(json!({
            "email": email,
            "code": code,
        })))
        .await
        .map(drop)
    }

    /// `POST /auth/verify-otp`.
    pub(crate) async fn verify_otp(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.call(ApiRequest::post("/auth/verify-otp").json(json!({
            "email": email,
            "otp": code,
        })))
        .await
        .map(drop)
    }

    /// `GET /auth/profile` with an explicit bearer credential.
    pub(crate) async fn profile(&self, credential: &Token) -> Result<UserProfile, IdentityError> {
        let request = ApiRequest::get("/auth/profile")
            .with_header("Authorization", credential.authorization_header());
        let payload = self.call(request).await?;
        parse_profile(extract_user(&payload).unwrap_or(payload))
    }

    async fn call(&self, request: ApiRequest) -> Result<Value, IdentityError> {
        debug!(method = %request.method, path = %request.path, "auth request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| IdentityError::unavailable(e.to_string()))?;
        interpret(&response)
    }
}

/// Maps a backend response onto the identity error vocabulary: 4xx is a
/// rejection, anything else non-2xx means the backend is unavailable.
fn interpret(response: &ApiResponse) -> Result<Value, IdentityError> {
    if response.is_success() {
        return response
            .payload()
            .map_err(|e| IdentityError::unavailable(e.to_string()));
    }
    let message = response.error_message();
    if response.status.is_client_error() {
        Err(IdentityError::rejected(message))
    } else {
        Err(IdentityError::unavailable(message))
    }
}

/// Session token from a login or registration payload.
pub(crate) fn extract_token(payload: &Value) -> Option<String> {
    TOKEN_FIELDS
        .iter()
        .find_map(|field| payload.get(*field).and_then(Value::as_str))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// The `user` object embedded in a payload, if any.
pub(crate) fn extract_user(payload: &Value) -> Option<Value> {
    payload.get("user").filter(|user| user.is_object()).cloned()
}

pub(crate) fn parse_profile(value: Value) -> Result<UserProfile, IdentityError> {
    serde_json::from_value(value)
        .map_err(|e| IdentityError::unavailable(format!("malformed user profile: {e}")))
}
