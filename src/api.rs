//! Thin HTTP client for the back-office API.
//!
//! Failures are sorted into three buckets the dashboard reports differently:
//! the server answered with an error status, no answer arrived at all, or the
//! answer did not have the expected shape.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use ureq::Agent;

pub mod endpoints {
    pub const USER_SUMMARY: &str = "/users/summary";
    pub const LOGIN: &str = "/auth/login";
}

pub const MISSING_CREDENTIALS: &str = "Please enter both email and password.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },

    #[error("no response from server: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    UnexpectedShape(String),

    #[error("{0}")]
    Validation(&'static str),
}

impl ApiError {
    /// Message suitable for an alert banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { status: 401, .. } => "Invalid email or password.".to_string(),
            ApiError::Server { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Server { status, .. } => {
                format!("Server error ({status}). Please try again.")
            }
            ApiError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::UnexpectedShape(_) => {
                "Unexpected response from the server. Please try again later.".to_string()
            }
            ApiError::Validation(message) => message.to_string(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::Validation(MISSING_CREDENTIALS));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserSummary {
    pub total_users: u64,
    pub active_users: u64,
    #[serde(default)]
    pub at_risk_users: u64,
    #[serde(default)]
    pub total_kg_recycled: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct LoginResponse {
    user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
struct LoginUser {
    name: String,
}

pub struct ApiClient {
    base_url: String,
    agent: Agent,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // statuses are classified here, not turned into transport errors
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub fn get_json(&self, endpoint: &str) -> ApiResult<serde_json::Value> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET");
        let response = self.agent.get(&url).call().map_err(network_error)?;
        read_json(response)
    }

    pub fn post_json(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> ApiResult<serde_json::Value> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "POST");
        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(body.to_string())
            .map_err(network_error)?;
        read_json(response)
    }

    pub fn fetch_user_summary(&self) -> ApiResult<UserSummary> {
        let body = self.get_json(endpoints::USER_SUMMARY)?;
        decode(body)
    }

    /// Post credentials and return the signed-in user's name.
    pub fn login(&self, credentials: &Credentials) -> ApiResult<String> {
        credentials.validate()?;
        let body = serde_json::to_value(credentials)
            .map_err(|e| ApiError::UnexpectedShape(e.to_string()))?;
        let response: LoginResponse = decode(self.post_json(endpoints::LOGIN, &body)?)?;
        Ok(response.user.name)
    }
}

fn network_error(err: ureq::Error) -> ApiError {
    tracing::warn!(error = %err, "request failed");
    ApiError::Network(err.to_string())
}

fn read_json(mut response: ureq::http::Response<ureq::Body>) -> ApiResult<serde_json::Value> {
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::UnexpectedShape(e.to_string()))?;
    classify(status, &body)
}

/// Sort a raw status and body into a JSON value or an [`ApiError`].
pub fn classify(status: u16, body: &str) -> ApiResult<serde_json::Value> {
    let json = serde_json::from_str::<serde_json::Value>(body);
    if !(200..300).contains(&status) {
        let message = json
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_default();
        tracing::warn!(status, %message, "server returned an error");
        return Err(ApiError::Server { status, message });
    }
    json.map_err(|e| ApiError::UnexpectedShape(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::UnexpectedShape(e.to_string()))
}
